//! # ethica-shared
//!
//! Domain types shared by every Ethica crate: the Application aggregate and
//! its nested entities, the sparse partial-update types that travel in HTTP
//! responses and push events, and the push/response protocol envelopes.

pub mod constants;
pub mod error;
pub mod models;
pub mod partial;
pub mod patch;
pub mod protocol;
pub mod types;
pub mod wire;

pub use error::EthicaError;
pub use models::*;
pub use partial::*;
pub use patch::Patch;
pub use types::{Delivery, LocalId, MessageId, RecordId, ReviewType, Role};
