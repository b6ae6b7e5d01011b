use crate::shared::error::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    Payload(String),
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::Network(err.to_string())
    }
}
