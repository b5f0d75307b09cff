//! Error types for the homedash service

/// Errors that can occur in the homedash service
#[derive(Debug, thiserror::Error)]
pub enum HomedashError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("System metrics error: {0}")]
    System(String),
}

/// Result type alias for homedash operations
pub type Result<T> = std::result::Result<T, HomedashError>;
