//! Service layer for the Farcaster relay.
//! - Talks to the Neynar API through a single shared client.
//! - Signs Farcaster key requests with the application's custody key.
//! - Keeps a write-once cache of approved signers keyed by FID.

pub mod errors;
pub mod metrics;
pub mod neynar;
pub mod signing;
pub mod storage;
pub mod cast;
pub mod signer;
