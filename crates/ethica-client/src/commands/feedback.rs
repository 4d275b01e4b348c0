use ethica_shared::{Message, RecordId};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::events::{emit_notice, Notice, NoticeSink};
use crate::state::{lock_session, SharedSession};
use crate::transport::ApplicationApi;

/// Post feedback to the thread of `status_id`.
///
/// The message shows up immediately with a `sending...` marker. It is
/// swapped for the server's copy once confirmed, or taken back out (with an
/// error notice) if the request fails. Either way the settled mutation is
/// dropped from the ledger.
pub async fn send_feedback<A, N>(
    state: &SharedSession,
    api: &A,
    notices: &N,
    status_id: &RecordId,
    body: &str,
) -> Result<Message>
where
    A: ApplicationApi,
    N: NoticeSink + ?Sized,
{
    let (application_id, local_id, ttl) = {
        let mut session = lock_session(state)?;
        let local_id = session.begin_feedback(status_id, body)?;
        (session.application_id().clone(), local_id, session.notice_ttl())
    };
    info!(status = %status_id, local = %local_id, "Sending feedback");

    match api.send_message(&application_id, status_id, body).await {
        Ok(confirmed) => {
            let mut session = lock_session(state)?;
            let changed = session.confirm_feedback(local_id, confirmed.clone())?;
            let pruned = session.prune_settled();
            debug!(local = %local_id, id = ?confirmed.id, changed, pruned, "Feedback confirmed");
            Ok(confirmed)
        }
        Err(e) => {
            warn!(local = %local_id, error = %e, "Feedback send failed, rolling back");
            match lock_session(state) {
                Ok(mut session) => {
                    if let Err(rollback) = session.fail_feedback(local_id) {
                        error!(local = %local_id, error = %rollback, "Rollback failed");
                    }
                    session.prune_settled();
                }
                Err(lock) => error!(error = %lock, "Rollback skipped"),
            }
            emit_notice(notices, Notice::error("Failed to send feedback", ttl));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use ethica_shared::protocol::{FeedbackUpdated, PushEnvelope, PushEvent, Topic};
    use ethica_shared::{ApplicationPatch, Delivery, MessageId};

    use super::*;
    use crate::commands::testing::{shared_session, FakeApi};
    use crate::error::ClientError;
    use crate::events::{ChannelNotices, NoticeLevel};
    use crate::state::SharedSession;

    fn thread(state: &SharedSession, status: usize) -> Vec<Message> {
        lock_session(state).unwrap().snapshot().statuses[status]
            .messages
            .to_vec()
    }

    #[tokio::test]
    async fn test_confirmed_send_replaces_pending_message() {
        let state = shared_session();
        let (notices, mut notice_rx) = ChannelNotices::new();

        let sent = send_feedback(
            &state,
            &FakeApi::online(),
            &notices,
            &RecordId::from("s2"),
            "Uploaded the revised protocol",
        )
        .await
        .unwrap();

        let messages = thread(&state, 1);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, sent.id);
        assert_eq!(messages[0].delivery, Delivery::Sent);
        assert!(thread(&state, 0).is_empty());
        assert!(notice_rx.try_recv().is_err());
        assert!(lock_session(&state).unwrap().ledger().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_sends_do_not_grow_ledger() {
        let state = shared_session();
        let (notices, _rx) = ChannelNotices::new();
        let status = RecordId::from("s1");

        for body in ["First", "Second", "Third"] {
            send_feedback(&state, &FakeApi::online(), &notices, &status, body)
                .await
                .unwrap();
        }
        send_feedback(&state, &FakeApi::offline(), &notices, &status, "Lost")
            .await
            .unwrap_err();

        assert!(lock_session(&state).unwrap().ledger().is_empty());
    }

    #[tokio::test]
    async fn test_failed_send_rolls_back() {
        let state = shared_session();
        let before = lock_session(&state).unwrap().snapshot();
        let (notices, mut notice_rx) = ChannelNotices::new();

        let err = send_feedback(
            &state,
            &FakeApi::offline(),
            &notices,
            &RecordId::from("s2"),
            "Hello",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ClientError::Transport(_)));
        assert!(thread(&state, 1).is_empty());
        assert_eq!(*lock_session(&state).unwrap().snapshot(), *before);

        let notice = notice_rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);

        assert!(lock_session(&state).unwrap().ledger().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_status_sends_nothing() {
        let state = shared_session();
        let api = FakeApi::online();
        let (notices, _rx) = ChannelNotices::new();

        let err = send_feedback(&state, &api, &notices, &RecordId::from("s9"), "Hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownStatus(_)));
        assert_eq!(api.calls(), 0);
    }

    /// Backend whose push for the new message lands before the HTTP answer.
    struct RacingApi {
        inner: FakeApi,
        state: SharedSession,
    }

    impl ApplicationApi for RacingApi {
        async fn send_message(
            &self,
            application_id: &RecordId,
            status_id: &RecordId,
            body: &str,
        ) -> Result<Message> {
            let message = self.inner.send_message(application_id, status_id, body).await?;
            let push = PushEnvelope::new(
                &Topic::for_application(application_id),
                PushEvent::SendAndUpdateFeedback(FeedbackUpdated {
                    message_thread: message.clone(),
                    message: None,
                }),
            );
            lock_session(&self.state)?.apply_push(&push);
            Ok(message)
        }

        async fn update_application(
            &self,
            application_id: &RecordId,
            patch: &ApplicationPatch,
        ) -> Result<ethica_shared::protocol::ActionResponse> {
            self.inner.update_application(application_id, patch).await
        }

        async fn fetch_application(
            &self,
            application_id: &RecordId,
        ) -> Result<ethica_shared::Application> {
            self.inner.fetch_application(application_id).await
        }

        async fn fetch_page(
            &self,
            page: u32,
            per_page: u32,
        ) -> Result<ethica_shared::protocol::ApplicationPage> {
            self.inner.fetch_page(page, per_page).await
        }
    }

    #[tokio::test]
    async fn test_push_before_response_leaves_single_copy() {
        let state = shared_session();
        let api = RacingApi {
            inner: FakeApi::online(),
            state: state.clone(),
        };
        let (notices, _rx) = ChannelNotices::new();

        send_feedback(&state, &api, &notices, &RecordId::from("s1"), "Thanks")
            .await
            .unwrap();

        let messages = thread(&state, 0);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId::from(RecordId::from("m1")));
        assert!(!messages[0].id.is_pending());

        assert_eq!(lock_session(&state).unwrap().ledger().pending_count(), 0);
    }
}
