//! Signer lifecycle: creating a signer for the app and polling its approval.

use chrono::Utc;
use tracing::info;

use crate::errors::ServiceError;
use crate::metrics;
use crate::neynar::{NeynarClient, SignerState};
use crate::signing::{AppSigner, SIGNED_KEY_REQUEST_TTL_SECS};
use crate::storage::SignerStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedSigner {
    pub signer_uuid: String,
    pub deeplink_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerStatus {
    pub signer_uuid: String,
    pub status: SignerState,
    pub fid: Option<u64>,
    pub deeplink: Option<String>,
    /// Whether this read wrote a new cache entry.
    pub cached: bool,
}

/// Create a signer, sign its key request as the app, and register it.
///
/// Fails before any outbound call when the app identity is not configured.
pub async fn create_signer(
    neynar: &NeynarClient,
    app: Option<&AppSigner>,
) -> Result<ConnectedSigner, ServiceError> {
    let app = app.ok_or_else(|| {
        ServiceError::Config("Environment variables not set: APP_FID and APP_MNEMONIC are required".into())
    })?;

    let signer = neynar.create_signer().await?;
    let deadline = Utc::now().timestamp().max(0) as u64 + SIGNED_KEY_REQUEST_TTL_SECS;
    let signature = app.sign_key_request(&signer.public_key, deadline)?;

    let registered = neynar
        .register_signed_key(&signer.signer_uuid, app.fid(), deadline, &signature)
        .await?;
    let deeplink_url = registered
        .signer_approval_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServiceError::upstream("register_signed_key", "response missing signer_approval_url"))?;

    metrics::SIGNERS_CREATED_TOTAL.inc();
    info!(event = "signer_created", signer_uuid = %signer.signer_uuid, app_fid = app.fid(), deadline, "signer created");
    Ok(ConnectedSigner { signer_uuid: signer.signer_uuid, deeplink_url })
}

/// Poll a signer's state, caching it by FID the first time it is seen approved.
pub async fn signer_status(
    neynar: &NeynarClient,
    store: &dyn SignerStore,
    signer_uuid: Option<&str>,
) -> Result<SignerStatus, ServiceError> {
    let signer_uuid = signer_uuid
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ServiceError::Validation("signer_uuid query parameter is required".into()))?;

    let record = neynar.lookup_signer(signer_uuid).await?;

    let mut cached = false;
    if let (SignerState::Approved, Some(fid)) = (record.status, record.fid) {
        cached = store.put_if_absent(fid, record.clone()).await?;
        if cached {
            metrics::SIGNER_CACHED_TOTAL.inc();
            info!(event = "signer_cached", fid, signer_uuid = %record.signer_uuid, "approved signer cached");
        }
    }

    info!(event = "signer_status", signer_uuid = %record.signer_uuid, status = record.status.as_str(), "signer status read");
    Ok(SignerStatus {
        signer_uuid: record.signer_uuid,
        status: record.status,
        fid: record.fid,
        deeplink: record.signer_approval_url.filter(|u| !u.is_empty()),
        cached,
    })
}
