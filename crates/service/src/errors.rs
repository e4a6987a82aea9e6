use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("upstream error ({op}): {message}")]
    Upstream { op: &'static str, message: String },
    #[error("signature error: {0}")]
    Signature(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("metrics error: {0}")]
    Metrics(String),
}

impl ServiceError {
    pub fn upstream(op: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream { op, message: message.into() }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
