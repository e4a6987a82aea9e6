use serde::{Deserialize, Serialize};

/// Lifecycle state Neynar reports for a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerState {
    Generated,
    PendingApproval,
    Approved,
    Revoked,
    #[serde(other)]
    Unknown,
}

impl SignerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generated => "generated",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Revoked => "revoked",
            Self::Unknown => "unknown",
        }
    }
}

/// Signer object as returned by the Neynar signer endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignerRecord {
    pub signer_uuid: String,
    pub public_key: String,
    pub status: SignerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fid: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signer_approval_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl Channel {
    /// The channel `url`, used as a cast's `parent` when posting into this channel.
    pub fn parent(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CastBody<'a> {
    pub signer_uuid: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CastEnvelope {
    pub cast: Option<CastHash>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CastHash {
    pub hash: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelEnvelope {
    pub channel: Channel,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignedKeyBody<'a> {
    pub signer_uuid: &'a str,
    pub app_fid: u64,
    pub deadline: u64,
    pub signature: &'a str,
}

/// Error payload Neynar attaches to non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
