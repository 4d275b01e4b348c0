//! Input files for a replay run.
//!
//! The snapshot is one Application JSON document. The event log holds one
//! `{ "topic", "event", "data" }` envelope per line; blank lines and lines
//! that do not decode are skipped.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use ethica_shared::protocol::PushEnvelope;
use ethica_shared::Application;
use tracing::warn;

pub fn load_snapshot(path: &Path) -> Result<Application> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid snapshot JSON in {}", path.display()))
}

/// Decoded envelopes plus the 1-based numbers of lines that did not decode.
#[derive(Debug, Default)]
pub struct EventLog {
    pub events: Vec<PushEnvelope>,
    pub skipped: Vec<usize>,
}

/// Read the event log. A line that does not decode is skipped with a
/// warning so the rest of the replay still runs.
pub fn read_events(path: &Path) -> Result<EventLog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read event log {}", path.display()))?;

    let mut log = EventLog::default();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(envelope) => log.events.push(envelope),
            Err(e) => {
                warn!(
                    file = %path.display(),
                    line = idx + 1,
                    error = %e,
                    "Skipping invalid push event"
                );
                log.skipped.push(idx + 1);
            }
        }
    }
    Ok(log)
}
