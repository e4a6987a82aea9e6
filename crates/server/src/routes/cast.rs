use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Serialize;

use service::cast::{self as cast_service, CastInput};

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CastOutput {
    pub status: u16,
    pub hash: String,
}

/// `POST /api/cast`: publish a cast on behalf of an approved signer.
pub async fn post_cast(
    State(state): State<AppState>,
    payload: Result<Json<CastInput>, JsonRejection>,
) -> Result<Json<CastOutput>, ApiError> {
    let Json(input) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let posted = cast_service::post_cast(&state.neynar, input)
        .await
        .map_err(|e| ApiError::from_service(e, "Unable to send cast"))?;
    Ok(Json(CastOutput { status: 200, hash: posted.hash }))
}
