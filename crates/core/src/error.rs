use thiserror::Error;

pub type NotifyResult<T> = Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("History store error: {0}")]
    History(String),

    #[error("Durable cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
