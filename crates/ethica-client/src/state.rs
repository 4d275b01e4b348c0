//! Session state shared between action callers and the push loop.
//!
//! The [`Session`] is wrapped in `Arc<Mutex<>>` ([`SharedSession`]). Every
//! mutation goes through the reconciler and replaces the held snapshot
//! wholesale; the lock is only ever held for synchronous work.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ethica_reconcile::thread::{append_message, confirm_message, discard_message, upsert_message};
use ethica_reconcile::{merge, ApplicationList, OptimisticLedger, Reconciled};
use ethica_shared::constants::DEFAULT_UPDATE_NOTICE;
use ethica_shared::protocol::{ActionResponse, PushEnvelope, PushEvent, Topic};
use ethica_shared::{
    Application, ApplicationPatch, Delivery, EthicaError, LocalId, Message, MessageId, RecordId,
    Role,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::events::Notice;

/// The signed-in user looking at the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_id: RecordId,
    /// Shown as the author of optimistic feedback.
    pub display_name: String,
    pub role: Role,
}

impl Viewer {
    /// Owning researchers see their own application; reviewers see all.
    pub fn can_view(&self, application: &Application) -> bool {
        self.role.is_reviewer() || application.user_id == self.user_id
    }

    /// Mirrors the server's channel join rule.
    pub fn can_subscribe(&self, topic: &Topic, application: &Application) -> bool {
        match topic {
            Topic::Application(id) => id == &application.id && self.can_view(application),
            Topic::ApplicationList => self.role.is_reviewer(),
        }
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

pub fn lock_session(state: &SharedSession) -> Result<MutexGuard<'_, Session>> {
    state
        .lock()
        .map_err(|e| ClientError::LockPoisoned(e.to_string()))
}

/// One display session over a single application.
#[derive(Debug)]
pub struct Session {
    snapshot: Arc<Application>,
    ledger: OptimisticLedger,
    list: ApplicationList,
    viewer: Viewer,
    notice_ttl: Duration,
}

impl Session {
    pub fn new(viewer: Viewer, application: Application, config: &ClientConfig) -> Self {
        Self {
            snapshot: Arc::new(application),
            ledger: OptimisticLedger::new(),
            list: ApplicationList::new(config.page_size),
            viewer,
            notice_ttl: config.notice_ttl,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    /// The current snapshot. Cheap: only the top-level `Arc` is cloned.
    pub fn snapshot(&self) -> Arc<Application> {
        Arc::clone(&self.snapshot)
    }

    pub fn application_id(&self) -> &RecordId {
        &self.snapshot.id
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn ledger(&self) -> &OptimisticLedger {
        &self.ledger
    }

    pub fn list(&self) -> &ApplicationList {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ApplicationList {
        &mut self.list
    }

    pub fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }

    /// Merge a partial into the snapshot. Returns whether anything changed.
    pub fn apply_patch(&mut self, patch: &ApplicationPatch) -> bool {
        if self.targets_other(patch) {
            return false;
        }
        self.commit(merge(&self.snapshot, patch))
    }

    /// Fold the answer to one of our own actions in. The server's
    /// `message`, if any, comes back as a success notice. A response naming
    /// another application is dropped whole, message included.
    pub fn apply_response(&mut self, response: ActionResponse) -> Option<Notice> {
        if self.targets_other(&response.application) {
            return None;
        }
        let changed = self.commit(merge(&self.snapshot, &response.application));
        debug!(changed, "Action response merged");
        response
            .message
            .map(|text| Notice::success(text, self.notice_ttl))
    }

    /// Fold one push event in. Returns the notice to surface, if any.
    pub fn apply_push(&mut self, envelope: &PushEnvelope) -> Option<Notice> {
        let topic = match envelope.topic() {
            Ok(topic) => topic,
            Err(e) => {
                warn!(topic = %envelope.topic, error = %e, "Ignoring push on unknown topic");
                return None;
            }
        };

        match (&topic, &envelope.event) {
            (Topic::ApplicationList, PushEvent::ApplicationCreated(created)) => {
                let title = created.application.research_title.clone();
                self.list
                    .push_created(created.application.clone())
                    .then(|| Notice::info(format!("{title} was submitted"), self.notice_ttl))
            }
            (Topic::Application(id), _) if id != self.application_id() => {
                debug!(topic = %topic, current = %self.snapshot.id, "Push for another application ignored");
                None
            }
            (Topic::Application(_), PushEvent::ApplicationUpdated(update)) => {
                let changed = self.apply_patch(&update.application);
                changed.then(|| self.update_notice(update.message.as_deref()))
            }
            (Topic::Application(_), PushEvent::SendAndUpdateFeedback(feedback)) => {
                let changed = self.commit(upsert_message(
                    &self.snapshot,
                    feedback.message_thread.clone(),
                ));
                changed.then(|| self.update_notice(feedback.message.as_deref()))
            }
            (topic, event) => {
                warn!(%topic, event = event.name(), "Event not expected on this topic");
                None
            }
        }
    }

    /// Put a pending feedback message on the thread of `status_id` and
    /// register it in the ledger.
    pub fn begin_feedback(&mut self, status_id: &RecordId, body: &str) -> Result<LocalId> {
        if self.snapshot.status(status_id).is_none() {
            return Err(ClientError::UnknownStatus(status_id.clone()));
        }

        let local_id = self.ledger.begin(status_id.clone());
        let draft = Message {
            id: MessageId::pending(local_id),
            status_id: status_id.clone(),
            body: body.to_string(),
            author: self.viewer.display_name.clone(),
            delivery: Delivery::Sending,
            updated_at: None,
            extra: Default::default(),
        };
        self.commit(append_message(&self.snapshot, status_id, draft));
        Ok(local_id)
    }

    /// Replace the pending message with the server-confirmed one.
    pub fn confirm_feedback(&mut self, local_id: LocalId, confirmed: Message) -> Result<bool> {
        let server_id = confirmed.id.record_id().cloned().ok_or_else(|| {
            EthicaError::Protocol("confirmed message carries no server id".to_string())
        })?;
        let status_id = self.ledger.confirm(local_id, server_id)?.status_id.clone();
        Ok(self.commit(confirm_message(
            &self.snapshot,
            &status_id,
            local_id,
            confirmed,
        )))
    }

    /// Roll the pending message back out of its thread.
    pub fn fail_feedback(&mut self, local_id: LocalId) -> Result<bool> {
        let status_id = self.ledger.fail(local_id)?.status_id.clone();
        Ok(self.commit(discard_message(&self.snapshot, &status_id, local_id)))
    }

    /// Drop settled mutations from the ledger.
    pub fn prune_settled(&mut self) -> usize {
        self.ledger.prune_settled()
    }

    fn commit(&mut self, reconciled: Reconciled) -> bool {
        if reconciled.changed {
            self.snapshot = reconciled.snapshot;
        }
        reconciled.changed
    }

    fn targets_other(&self, patch: &ApplicationPatch) -> bool {
        match &patch.id {
            Some(id) if id != &self.snapshot.id => {
                warn!(patch = %id, current = %self.snapshot.id, "Partial for another application ignored");
                true
            }
            _ => false,
        }
    }

    fn update_notice(&self, message: Option<&str>) -> Notice {
        let text = match message {
            Some(text) => text.to_string(),
            None => format!("{} {DEFAULT_UPDATE_NOTICE}", self.snapshot.research_title),
        };
        Notice::info(text, self.notice_ttl)
    }
}

#[cfg(test)]
mod tests {
    use ethica_reconcile::MutationState;
    use ethica_shared::protocol::{ApplicationCreated, ApplicationUpdated, FeedbackUpdated};
    use ethica_shared::{ApplicationSummary, Patch, Status};

    use super::*;
    use crate::events::NoticeLevel;

    fn viewer(role: Role) -> Viewer {
        Viewer {
            user_id: RecordId::from("u1"),
            display_name: "R. Cruz".into(),
            role,
        }
    }

    fn application() -> Application {
        let status = |id: &str, sequence| Status {
            id: RecordId::from(id),
            application_id: RecordId::from("1"),
            sequence,
            ..Default::default()
        };
        Application {
            id: RecordId::from("1"),
            user_id: RecordId::from("u1"),
            research_title: "Sleep and Memory".into(),
            statuses: Arc::new(vec![status("s1", 1), status("s2", 2)]),
            ..Default::default()
        }
    }

    fn session() -> Session {
        Session::new(viewer(Role::Researcher), application(), &ClientConfig::default())
    }

    fn on_application(id: &str, event: PushEvent) -> PushEnvelope {
        PushEnvelope::new(&Topic::Application(RecordId::from(id)), event)
    }

    fn server_message(id: &str, status: &str, body: &str) -> Message {
        Message {
            id: RecordId::from(id).into(),
            status_id: RecordId::from(status),
            body: body.into(),
            author: "Chair".into(),
            delivery: Delivery::Sent,
            updated_at: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_viewer_subscriptions() {
        let app = application();
        let own = Topic::for_application(&app.id);

        assert!(viewer(Role::Researcher).can_subscribe(&own, &app));
        assert!(!viewer(Role::Researcher).can_subscribe(&Topic::ApplicationList, &app));
        assert!(viewer(Role::Staff).can_subscribe(&Topic::ApplicationList, &app));

        let stranger = Viewer {
            user_id: RecordId::from("u9"),
            ..viewer(Role::Researcher)
        };
        assert!(!stranger.can_subscribe(&own, &app));
        assert!(Viewer { role: Role::Chairperson, ..stranger }.can_subscribe(&own, &app));
    }

    #[test]
    fn test_push_update_uses_default_notice() {
        let mut session = session();
        let event = PushEvent::ApplicationUpdated(ApplicationUpdated {
            application: ApplicationPatch {
                protocol_code: Patch::Set("2024-017".into()),
                ..Default::default()
            },
            message: None,
        });

        let notice = session.apply_push(&on_application("1", event)).unwrap();
        assert_eq!(notice.text, "Sleep and Memory has a new update");
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(session.snapshot().protocol_code.as_deref(), Some("2024-017"));
    }

    #[test]
    fn test_unchanged_push_is_silent() {
        let mut session = session();
        let before = session.snapshot();
        let event = PushEvent::ApplicationUpdated(ApplicationUpdated {
            application: ApplicationPatch {
                research_title: Some("Sleep and Memory".into()),
                ..Default::default()
            },
            message: Some("Updated".into()),
        });

        assert!(session.apply_push(&on_application("1", event)).is_none());
        assert!(Arc::ptr_eq(&before, &session.snapshot()));
    }

    #[test]
    fn test_push_for_other_application_ignored() {
        let mut session = session();
        let before = session.snapshot();
        let event = PushEvent::ApplicationUpdated(ApplicationUpdated {
            application: ApplicationPatch {
                protocol_code: Patch::Set("X".into()),
                ..Default::default()
            },
            message: None,
        });

        assert!(session.apply_push(&on_application("2", event)).is_none());
        assert!(Arc::ptr_eq(&before, &session.snapshot()));
    }

    #[test]
    fn test_partial_naming_other_application_ignored() {
        let mut session = session();
        let before = session.snapshot();
        let event = PushEvent::ApplicationUpdated(ApplicationUpdated {
            application: ApplicationPatch {
                id: Some(RecordId::from("2")),
                protocol_code: Patch::Set("X".into()),
                ..Default::default()
            },
            message: Some("Protocol code assigned".into()),
        });

        assert!(session.apply_push(&on_application("1", event)).is_none());
        assert!(Arc::ptr_eq(&before, &session.snapshot()));

        let response = ActionResponse {
            application: ApplicationPatch {
                id: Some(RecordId::from("2")),
                protocol_code: Patch::Set("X".into()),
                ..Default::default()
            },
            message: Some("Protocol code assigned".into()),
        };
        assert!(session.apply_response(response).is_none());
        assert!(session.snapshot().protocol_code.is_none());
    }

    #[test]
    fn test_feedback_push_carries_event_message() {
        let mut session = session();
        let event = PushEvent::SendAndUpdateFeedback(FeedbackUpdated {
            message_thread: server_message("m1", "s2", "Please revise section 3"),
            message: Some("New feedback on Initial Review".into()),
        });

        let notice = session.apply_push(&on_application("1", event.clone())).unwrap();
        assert_eq!(notice.text, "New feedback on Initial Review");
        assert_eq!(session.snapshot().statuses[1].messages.len(), 1);

        // Replayed event: nothing new, no notice.
        assert!(session.apply_push(&on_application("1", event)).is_none());
    }

    #[test]
    fn test_created_goes_to_list_only() {
        let mut session = session();
        let before = session.snapshot();
        let event = PushEvent::ApplicationCreated(ApplicationCreated {
            application: ApplicationSummary {
                id: RecordId::from("7"),
                research_title: "Coastal Fisheries".into(),
                ..Default::default()
            },
        });

        let envelope = PushEnvelope::new(&Topic::ApplicationList, event);
        let notice = session.apply_push(&envelope).unwrap();
        assert_eq!(notice.text, "Coastal Fisheries was submitted");
        assert_eq!(session.list().len(), 1);
        assert!(Arc::ptr_eq(&before, &session.snapshot()));
    }

    #[test]
    fn test_event_on_wrong_topic_ignored() {
        let mut session = session();
        let event = PushEvent::ApplicationUpdated(ApplicationUpdated {
            application: ApplicationPatch {
                protocol_code: Patch::Set("X".into()),
                ..Default::default()
            },
            message: None,
        });
        let envelope = PushEnvelope::new(&Topic::ApplicationList, event);
        assert!(session.apply_push(&envelope).is_none());
        assert!(session.snapshot().protocol_code.is_none());
    }

    #[test]
    fn test_response_message_becomes_success_notice() {
        let mut session = session();
        let notice = session
            .apply_response(ActionResponse {
                application: ApplicationPatch {
                    protocol_code: Patch::Set("2024-017".into()),
                    ..Default::default()
                },
                message: Some("Protocol code assigned".into()),
            })
            .unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(session.snapshot().protocol_code.as_deref(), Some("2024-017"));
    }

    #[test]
    fn test_feedback_lifecycle() {
        let mut session = session();
        let local = session
            .begin_feedback(&RecordId::from("s2"), "Uploaded the revised protocol")
            .unwrap();

        let thread = session.snapshot().statuses[1].messages.clone();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].delivery, Delivery::Sending);
        assert_eq!(thread[0].author, "R. Cruz");

        let confirmed = server_message("m5", "s2", "Uploaded the revised protocol");
        assert!(session.confirm_feedback(local, confirmed.clone()).unwrap());
        assert_eq!(session.snapshot().statuses[1].messages.as_slice(), &[confirmed]);
        assert_eq!(
            session.ledger().get(local).map(|m| m.state.clone()),
            Some(MutationState::Confirmed(RecordId::from("m5")))
        );
    }

    #[test]
    fn test_failed_feedback_rolls_back() {
        let mut session = session();
        let before = session.snapshot();
        let local = session.begin_feedback(&RecordId::from("s1"), "Hello").unwrap();

        assert!(session.fail_feedback(local).unwrap());
        assert_eq!(*session.snapshot(), *before);
        assert!(matches!(
            session.fail_feedback(local),
            Err(ClientError::Reconcile(_))
        ));
    }

    #[test]
    fn test_feedback_on_unknown_status() {
        let mut session = session();
        let err = session
            .begin_feedback(&RecordId::from("s9"), "Hello")
            .unwrap_err();
        assert!(matches!(err, ClientError::UnknownStatus(id) if id.as_str() == "s9"));
        assert_eq!(session.ledger().pending_count(), 0);
    }
}
