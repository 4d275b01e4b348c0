//! # ethica-replay
//!
//! Replays a recorded push-event log against an application snapshot and
//! prints the reconciled result.
//!
//! ```text
//! ethica-replay <snapshot.json> <events.ndjson>
//! ```
//!
//! Notices are written to the log; the final snapshot goes to stdout as
//! pretty JSON.

mod replay;

use std::path::PathBuf;

use anyhow::bail;
use ethica_client::bridge::{push_channel, run_push_loop};
use ethica_client::config::ClientConfig;
use ethica_client::events::LogNotices;
use ethica_client::state::{lock_session, Session, Viewer};
use ethica_shared::constants::APP_NAME;
use ethica_shared::Role;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    ethica_client::init_tracing("info,ethica_client=debug,ethica_reconcile=debug");

    info!("Starting {} replay v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and inputs
    // -----------------------------------------------------------------------
    let config = ClientConfig::from_env();
    info!(
        api_url = %config.api_url,
        push_buffer = config.push_buffer,
        "Loaded configuration"
    );

    let mut args = std::env::args().skip(1);
    let (Some(snapshot_path), Some(events_path)) = (args.next(), args.next()) else {
        bail!("usage: ethica-replay <snapshot.json> <events.ndjson>");
    };
    let snapshot_path = PathBuf::from(snapshot_path);
    let events_path = PathBuf::from(events_path);

    let application = replay::load_snapshot(&snapshot_path)?;
    let log = replay::read_events(&events_path)?;
    info!(
        application = %application.id,
        events = log.events.len(),
        skipped = log.skipped.len(),
        "Inputs loaded"
    );

    // -----------------------------------------------------------------------
    // 3. Replay through the push loop
    // -----------------------------------------------------------------------
    // Replays see every topic, so the viewer is a reviewer.
    let viewer = Viewer {
        user_id: application.user_id.clone(),
        display_name: "replay".to_string(),
        role: Role::Staff,
    };
    let state = Session::new(viewer, application, &config).into_shared();

    let (push_tx, push_rx) = push_channel(&config);
    let bridge = tokio::spawn(run_push_loop(state.clone(), LogNotices, push_rx));

    for envelope in log.events {
        push_tx.send(envelope).await?;
    }
    drop(push_tx);

    let processed = bridge.await?;

    // -----------------------------------------------------------------------
    // 4. Report
    // -----------------------------------------------------------------------
    let (snapshot, announced) = {
        let session = lock_session(&state)?;
        (session.snapshot(), session.list().len())
    };
    info!(
        processed,
        announced,
        statuses = snapshot.statuses.len(),
        pending = snapshot.pending_message_count(),
        "Replay finished"
    );

    println!("{}", serde_json::to_string_pretty(&*snapshot)?);
    Ok(())
}
