//! In-flight optimistic mutations.
//!
//! Every optimistic send gets a [`LocalId`] and moves through
//!
//! ```text
//! Pending ──confirm──▶ Confirmed(server id)
//!    │
//!    └────fail──────▶ Failed
//! ```
//!
//! A settled mutation stays in the ledger until [`OptimisticLedger::prune_settled`]
//! runs, so a second settlement before that is reported as
//! [`ReconcileError::AlreadySettled`]. After pruning it is
//! [`ReconcileError::UnknownMutation`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ethica_shared::{LocalId, RecordId};
use tracing::debug;

use crate::error::{ReconcileError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationState {
    Pending,
    Confirmed(RecordId),
    Failed,
}

impl MutationState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// One optimistic change awaiting its server round trip.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub local_id: LocalId,
    /// Status whose thread holds the placeholder.
    pub status_id: RecordId,
    pub state: MutationState,
    pub started_at: DateTime<Utc>,
}

impl Mutation {
    fn settle(&mut self, next: MutationState) -> Result<()> {
        if self.state.is_settled() {
            return Err(ReconcileError::AlreadySettled {
                local_id: self.local_id,
                state: self.state.clone(),
            });
        }
        self.state = next;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct OptimisticLedger {
    mutations: HashMap<LocalId, Mutation>,
}

impl OptimisticLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending mutation and return its placeholder id.
    pub fn begin(&mut self, status_id: RecordId) -> LocalId {
        let local_id = LocalId::new();
        debug!(local = %local_id, status = %status_id, "Optimistic mutation started");
        self.mutations.insert(
            local_id,
            Mutation {
                local_id,
                status_id,
                state: MutationState::Pending,
                started_at: Utc::now(),
            },
        );
        local_id
    }

    pub fn confirm(&mut self, local_id: LocalId, server_id: RecordId) -> Result<&Mutation> {
        let mutation = self.get_mut(local_id)?;
        mutation.settle(MutationState::Confirmed(server_id))?;
        debug!(local = %local_id, state = ?mutation.state, "Optimistic mutation confirmed");
        Ok(&*mutation)
    }

    pub fn fail(&mut self, local_id: LocalId) -> Result<&Mutation> {
        let mutation = self.get_mut(local_id)?;
        mutation.settle(MutationState::Failed)?;
        debug!(local = %local_id, "Optimistic mutation failed");
        Ok(&*mutation)
    }

    pub fn get(&self, local_id: LocalId) -> Option<&Mutation> {
        self.mutations.get(&local_id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Mutation> {
        self.mutations
            .values()
            .filter(|m| m.state == MutationState::Pending)
    }

    pub fn pending_count(&self) -> usize {
        self.pending().count()
    }

    /// Mutations held, settled ones included.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Forget every settled mutation, returning how many were dropped.
    pub fn prune_settled(&mut self) -> usize {
        let before = self.mutations.len();
        self.mutations.retain(|_, m| !m.state.is_settled());
        before - self.mutations.len()
    }

    fn get_mut(&mut self, local_id: LocalId) -> Result<&mut Mutation> {
        self.mutations
            .get_mut(&local_id)
            .ok_or(ReconcileError::UnknownMutation(local_id))
    }
}
