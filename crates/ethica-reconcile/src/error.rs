use ethica_shared::LocalId;
use thiserror::Error;

use crate::optimistic::MutationState;

/// Misuse of the optimistic mutation ledger. The merge functions themselves
/// never fail.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    /// No mutation was registered under this local id.
    #[error("Unknown mutation: {0}")]
    UnknownMutation(LocalId),

    /// The mutation already left the pending state.
    #[error("Mutation {local_id} already settled as {state:?}")]
    AlreadySettled {
        local_id: LocalId,
        state: MutationState,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReconcileError>;
