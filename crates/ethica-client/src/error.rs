use ethica_reconcile::ReconcileError;
use ethica_shared::{EthicaError, RecordId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never got a usable answer (connect, timeout, body read).
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Server responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unknown status: {0}")]
    UnknownStatus(RecordId),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] EthicaError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Notice surface closed")]
    NoticeClosed,
}

impl ClientError {
    /// The server took the request but its answer could not be read, so the
    /// change it carried has to be assumed applied.
    pub fn accepted_by_server(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            },
            None => Self::Transport(e.to_string()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
