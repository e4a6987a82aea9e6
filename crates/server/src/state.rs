use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use configs::AppConfig;
use service::{
    neynar::NeynarClient,
    signing::AppSigner,
    storage::{open_signer_store, SignerStore},
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub neynar: NeynarClient,
    pub signers: Arc<dyn SignerStore>,
    /// `None` when APP_FID / APP_MNEMONIC are not configured.
    pub app_signer: Option<Arc<AppSigner>>,
}

impl AppState {
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let neynar = NeynarClient::new(&cfg.neynar)?;
        let signers = open_signer_store(&cfg.cache.path).await?;

        let app_signer = match cfg.app.identity() {
            Some((fid, mnemonic)) => {
                let signer = AppSigner::from_mnemonic(fid, mnemonic)
                    .context("APP_MNEMONIC does not derive a valid account")?;
                info!(app_fid = fid, address = %signer.address(), "app signer ready");
                Some(Arc::new(signer))
            }
            None => {
                warn!("APP_FID / APP_MNEMONIC not set; /api/connect will fail");
                None
            }
        };

        Ok(Self { neynar, signers, app_signer })
    }
}
