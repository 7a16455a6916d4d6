//! Errors from talking to the attendance backend.

use attendance_core::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to parse backend response: {0}")]
    Decode(String),
}

impl From<ApiError> for SyncError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, message } => SyncError::Rejected { status, message },
            ApiError::Http(e) => SyncError::Transport(e.to_string()),
            ApiError::Url(e) => SyncError::Transport(e.to_string()),
            ApiError::Decode(msg) => SyncError::Decode(msg),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
