//! # ethica-client
//!
//! Display-session layer of the Ethica tracker. Holds one application's
//! snapshot, feeds HTTP responses and push events through the reconciler,
//! and runs the optimistic feedback flow. Transport collaborators are passed
//! in explicitly: [`transport::ApplicationApi`] for request/response calls,
//! [`events::NoticeSink`] for the user-visible notice surface, and a
//! `tokio::sync::mpsc` receiver for push events.

pub mod bridge;
pub mod commands;
pub mod config;
pub mod events;
pub mod http;
pub mod state;
pub mod transport;

mod error;

pub use error::ClientError;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over
/// `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
