//! # ethica-reconcile
//!
//! Folds partial updates into a held [`Application`] snapshot.
//!
//! [`merge`] is the single entry point for HTTP responses and push events
//! alike. It is pure: the input snapshot is never mutated, and the returned
//! [`Reconciled`] either shares the input (`changed == false`) or carries a
//! new snapshot that still shares every untouched collection with the old
//! one. The [`thread`] helpers apply the same rules to one status's
//! feedback thread, [`optimistic`] tracks in-flight sends, and [`listing`]
//! keeps the paginated application list.
//!
//! [`Application`]: ethica_shared::Application

pub mod entities;
pub mod identity;
pub mod listing;
pub mod merge;
pub mod optimistic;
pub mod thread;

mod error;

pub use error::ReconcileError;
pub use identity::{Identified, Upsert};
pub use listing::ApplicationList;
pub use merge::{merge, Reconciled};
pub use optimistic::{Mutation, MutationState, OptimisticLedger};
