//! EIP-712 signing of Farcaster `SignedKeyRequest` messages.
//!
//! The application's custody account is derived from its BIP-39 seed phrase
//! on the default Ethereum path (`m/44'/60'/0'/0/0`). The signature proves to
//! the `SignedKeyRequestValidator` contract on Optimism that the app (by FID)
//! asked for the given signer key.

use std::fmt;

use alloy::primitives::{address, hex, Address, Bytes, U256};
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::SignerSync;
use alloy::sol;
use alloy::sol_types::{eip712_domain, Eip712Domain, SolStruct};

use crate::errors::ServiceError;

/// Lifetime of a key request signature, in seconds.
pub const SIGNED_KEY_REQUEST_TTL_SECS: u64 = 86_400;

pub const SIGNED_KEY_REQUEST_VALIDATOR: Address =
    address!("00000000fc700472606ed4fa22623acf62c60553");

sol! {
    #[derive(Debug)]
    struct SignedKeyRequest {
        uint256 requestFid;
        bytes key;
        uint256 deadline;
    }
}

pub fn signed_key_request_domain() -> Eip712Domain {
    eip712_domain! {
        name: "Farcaster SignedKeyRequestValidator",
        version: "1",
        chain_id: 10,
        verifying_contract: SIGNED_KEY_REQUEST_VALIDATOR,
    }
}

/// The application identity: its FID plus the custody key that owns it.
pub struct AppSigner {
    fid: u64,
    wallet: PrivateKeySigner,
}

impl fmt::Debug for AppSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppSigner")
            .field("fid", &self.fid)
            .field("address", &self.wallet.address())
            .finish()
    }
}

impl AppSigner {
    pub fn from_mnemonic(fid: u64, phrase: &str) -> Result<Self, ServiceError> {
        let wallet = MnemonicBuilder::<English>::default()
            .phrase(phrase)
            .build()
            .map_err(|e| ServiceError::Signature(format!("invalid mnemonic: {e}")))?;
        Ok(Self { fid, wallet })
    }

    pub fn fid(&self) -> u64 {
        self.fid
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign a key request for `public_key` (hex, `0x`-prefixed) valid until `deadline`.
    /// Returns the 65-byte `r || s || v` signature as `0x` hex.
    pub fn sign_key_request(&self, public_key: &str, deadline: u64) -> Result<String, ServiceError> {
        let key: Bytes = public_key
            .trim()
            .parse()
            .map_err(|e| ServiceError::Signature(format!("public key is not hex: {e}")))?;
        if key.is_empty() {
            return Err(ServiceError::Signature("public key is empty".into()));
        }

        let request = SignedKeyRequest {
            requestFid: U256::from(self.fid),
            key,
            deadline: U256::from(deadline),
        };
        let hash = request.eip712_signing_hash(&signed_key_request_domain());
        let signature = self
            .wallet
            .sign_hash_sync(&hash)
            .map_err(|e| ServiceError::Signature(e.to_string()))?;
        Ok(hex::encode_prefixed(signature.as_bytes()))
    }
}
