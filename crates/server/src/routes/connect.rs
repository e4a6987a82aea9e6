use axum::{extract::State, Json};
use serde::Serialize;

use service::errors::ServiceError;
use service::signer::create_signer;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOutput {
    pub status: u16,
    pub signer_uuid: String,
    pub deeplink_url: String,
}

/// `POST /api/connect`: create a signer and return the approval deep-link.
pub async fn connect(State(state): State<AppState>) -> Result<Json<ConnectOutput>, ApiError> {
    let connected = create_signer(&state.neynar, state.app_signer.as_deref())
        .await
        .map_err(|e| {
            let public = public_message(&e);
            ApiError::from_service(e, public)
        })?;
    Ok(Json(ConnectOutput {
        status: 200,
        signer_uuid: connected.signer_uuid,
        deeplink_url: connected.deeplink_url,
    }))
}

fn public_message(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::Config(_) => "Environment variables not set",
        ServiceError::Signature(_) => "Failed to generate signature",
        ServiceError::Upstream { op: "register_signed_key", .. } => "Failed to register signed key",
        _ => "Failed to create signer",
    }
}
