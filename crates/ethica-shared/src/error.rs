use thiserror::Error;

#[derive(Error, Debug)]
pub enum EthicaError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
