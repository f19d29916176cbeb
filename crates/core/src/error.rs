use thiserror::Error;

#[derive(Error, Debug)]
pub enum CareformError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot write field '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CareformError>;
