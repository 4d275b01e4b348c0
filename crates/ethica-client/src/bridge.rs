//! Push event bridge.
//!
//! The real-time transport adapter (websocket, broadcaster SDK, replay file)
//! lives outside this crate. It subscribes to the topics returned by
//! [`subscription_topics`] and forwards every delivered event into the
//! channel from [`push_channel`]; [`run_push_loop`] folds them into the
//! session until the sender side goes away.

use ethica_shared::protocol::{PushEnvelope, Topic};
use ethica_shared::Application;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::events::{emit_notice, NoticeSink};
use crate::state::{lock_session, SharedSession, Viewer};

/// Topics `viewer` should join while looking at `application`.
pub fn subscription_topics(viewer: &Viewer, application: &Application) -> Vec<Topic> {
    [
        Topic::for_application(&application.id),
        Topic::ApplicationList,
    ]
    .into_iter()
    .filter(|topic| viewer.can_subscribe(topic, application))
    .collect()
}

pub fn push_channel(
    config: &ClientConfig,
) -> (mpsc::Sender<PushEnvelope>, mpsc::Receiver<PushEnvelope>) {
    mpsc::channel(config.push_buffer)
}

/// Apply push events to `state` until the channel closes. Returns the number
/// of events processed.
pub async fn run_push_loop<N: NoticeSink>(
    state: SharedSession,
    notices: N,
    mut push_rx: mpsc::Receiver<PushEnvelope>,
) -> usize {
    info!("Push bridge started");
    let mut processed = 0usize;

    while let Some(envelope) = push_rx.recv().await {
        processed += 1;
        debug!(
            topic = %envelope.topic,
            event = envelope.event.name(),
            "Push event received"
        );

        let notice = match lock_session(&state) {
            Ok(mut session) => session.apply_push(&envelope),
            Err(e) => {
                error!(error = %e, "Dropping push event");
                continue;
            }
        };

        if let Some(notice) = notice {
            emit_notice(&notices, notice);
        }
    }

    warn!(processed, "Push loop ended");
    processed
}
