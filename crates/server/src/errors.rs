use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use service::errors::ServiceError;

/// Handler error. Client errors echo their message; server errors return a
/// fixed public message and log the cause.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{public}: {source}")]
    Internal {
        public: &'static str,
        #[source]
        source: ServiceError,
    },
}

impl ApiError {
    /// Map a service failure, using `public` as the message for server errors.
    pub fn from_service(err: ServiceError, public: &'static str) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::BadRequest(msg),
            source => Self::Internal { public, source },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::BadRequest(message) => ErrorBody { error: "bad_request", message },
            Self::Internal { public, source } => {
                error!(error = %source, "{public}");
                ErrorBody { error: "internal_error", message: public.to_string() }
            }
        };
        (status, Json(body)).into_response()
    }
}
