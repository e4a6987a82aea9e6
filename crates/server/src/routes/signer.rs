use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use service::signer as signer_service;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignerQuery {
    pub signer_uuid: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerStatusOutput {
    pub status: u16,
    pub uuid: String,
    pub signer_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deeplink: Option<String>,
}

/// `GET /api/signer?signer_uuid=`: report approval state, caching approved signers.
pub async fn signer_status(
    State(state): State<AppState>,
    query: Result<Query<SignerQuery>, QueryRejection>,
) -> Result<Json<SignerStatusOutput>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let status = signer_service::signer_status(&state.neynar, state.signers.as_ref(), q.signer_uuid.as_deref())
        .await
        .map_err(|e| ApiError::from_service(e, "Failed to get signer connection status"))?;
    Ok(Json(SignerStatusOutput {
        status: 200,
        uuid: status.signer_uuid,
        signer_status: status.status.as_str(),
        fid: status.fid,
        deeplink: status.deeplink,
    }))
}
