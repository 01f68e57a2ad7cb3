//! Error types for the QI adapter.

use thiserror::Error;

/// Result type for QI operations.
pub type QiResult<T> = Result<T, QiError>;

/// Errors that can occur when interacting with the QI queue.
#[derive(Debug, Error)]
pub enum QiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing API token.
    #[error("Missing QI API token (set QI_TOKEN)")]
    MissingToken,

    /// Job not found remotely or on disk.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Job execution failed remotely.
    #[error("Job failed: {0}")]
    JobFailed(String),

    /// API error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

impl From<QiError> for clifftest_hal::HalError {
    fn from(e: QiError) -> Self {
        match e {
            QiError::JobNotFound(id) => clifftest_hal::HalError::JobNotFound(id),
            QiError::JobFailed(msg) => clifftest_hal::HalError::JobFailed(msg),
            QiError::MissingToken => {
                clifftest_hal::HalError::Configuration("missing QI API token".to_string())
            }
            _ => clifftest_hal::HalError::Backend(e.to_string()),
        }
    }
}
