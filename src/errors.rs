// src/errors.rs

use thiserror::Error;

pub type CortexResult<T> = Result<T, CortexError>;

#[derive(Debug, Error)]
pub enum CortexError {
    #[error("api error: {0}")]
    Api(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl CortexError {
    pub fn api_error(msg: impl Into<String>) -> Self {
        CortexError::Api(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        CortexError::Config(msg.into())
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        CortexError::Storage(msg.into())
    }
}
