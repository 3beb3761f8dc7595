use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid page URL: {0}")]
    InvalidUrl(String),

    #[error("could not access {url}: {reason}")]
    PageUnreachable { url: String, reason: String },

    #[error("directory not found: {0}")]
    StoreNotFound(String),

    #[error("no images found in the directory: {0}")]
    StoreEmpty(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
