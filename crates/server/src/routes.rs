use axum::{
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use crate::errors::ApiError;
use crate::state::AppState;

pub mod cast;
pub mod connect;
pub mod signer;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let body = service::metrics::encode_metrics()
        .map_err(|e| ApiError::from_service(e, "Unable to encode metrics"))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

/// Build the application router: health/metrics plus the three Neynar-backed endpoints.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    service::metrics::init();

    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics));

    let api = Router::new()
        .route("/api/cast", post(cast::post_cast))
        .route("/api/connect", post(connect::connect))
        .route("/api/signer", get(signer::signer_status));

    public
        .merge(api)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx and other failures at ERROR
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
