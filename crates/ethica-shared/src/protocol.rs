use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{TOPIC_APPLICATION_LIST, TOPIC_APPLICATION_PREFIX};
use crate::error::EthicaError;
use crate::models::{Application, ApplicationSummary, Message};
use crate::partial::ApplicationPatch;
use crate::types::RecordId;

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// `application.{id}`: updates to one application.
    Application(RecordId),
    /// `application-list`: newly created applications.
    ApplicationList,
}

impl Topic {
    pub fn for_application(id: &RecordId) -> Self {
        Self::Application(id.clone())
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Application(id) => write!(f, "{TOPIC_APPLICATION_PREFIX}{id}"),
            Self::ApplicationList => f.write_str(TOPIC_APPLICATION_LIST),
        }
    }
}

impl FromStr for Topic {
    type Err = EthicaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Private channels are announced with a `private-` prefix by the broadcaster.
        let s = s.strip_prefix("private-").unwrap_or(s);
        if s == TOPIC_APPLICATION_LIST {
            return Ok(Self::ApplicationList);
        }
        match s.strip_prefix(TOPIC_APPLICATION_PREFIX) {
            Some(id) if !id.is_empty() => Ok(Self::Application(RecordId::from(id))),
            _ => Err(EthicaError::InvalidTopic(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Push events
// ---------------------------------------------------------------------------

/// Events delivered on the push channels.
///
/// Wire form: `{ "event": "<Name>", "data": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    ApplicationUpdated(ApplicationUpdated),
    SendAndUpdateFeedback(FeedbackUpdated),
    ApplicationCreated(ApplicationCreated),
}

impl PushEvent {
    pub fn from_json(data: &str) -> Result<Self, EthicaError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ApplicationUpdated(_) => crate::constants::EVENT_APPLICATION_UPDATED,
            Self::SendAndUpdateFeedback(_) => crate::constants::EVENT_SEND_AND_UPDATE_FEEDBACK,
            Self::ApplicationCreated(_) => crate::constants::EVENT_APPLICATION_CREATED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationUpdated {
    pub application: ApplicationPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackUpdated {
    pub message_thread: Message,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationCreated {
    pub application: ApplicationSummary,
}

/// A push event together with the topic it arrived on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushEnvelope {
    pub topic: String,
    #[serde(flatten)]
    pub event: PushEvent,
}

impl PushEnvelope {
    pub fn new(topic: &Topic, event: PushEvent) -> Self {
        Self {
            topic: topic.to_string(),
            event,
        }
    }

    pub fn topic(&self) -> Result<Topic, EthicaError> {
        self.topic.parse()
    }
}

// ---------------------------------------------------------------------------
// HTTP responses
// ---------------------------------------------------------------------------

/// Body returned by every state-changing application action.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionResponse {
    pub application: ApplicationPatch,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body returned by the feedback thread actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageThreadResponse {
    pub message_thread: Message,
}

/// Body returned when fetching one application in full.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub application: Application,
}

/// Body sent when posting feedback to a status thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub body: String,
}

/// One page of the application list, in the backend's paginator shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationPage {
    pub data: Vec<ApplicationSummary>,
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;

    #[test]
    fn test_topic_roundtrip() {
        let topic = Topic::for_application(&RecordId::from("12"));
        assert_eq!(topic.to_string(), "application.12");
        assert_eq!("application.12".parse::<Topic>().unwrap(), topic);
        assert_eq!(
            "private-application.12".parse::<Topic>().unwrap(),
            topic
        );
        assert_eq!(
            "application-list".parse::<Topic>().unwrap(),
            Topic::ApplicationList
        );
        assert!("application.".parse::<Topic>().is_err());
        assert!("channel:1".parse::<Topic>().is_err());
    }

    #[test]
    fn test_decode_application_updated() {
        let json = r#"{
            "event": "ApplicationUpdated",
            "data": {
                "application": {"id": 1, "review_type": "expedited"},
                "message": "Review type assigned"
            }
        }"#;
        let event = PushEvent::from_json(json).unwrap();
        match event {
            PushEvent::ApplicationUpdated(update) => {
                assert_eq!(update.message.as_deref(), Some("Review type assigned"));
                assert_eq!(
                    update.application.review_type,
                    Patch::Set(crate::types::ReviewType::Expedited)
                );
            }
            other => panic!("unexpected event: {}", other.name()),
        }
    }

    #[test]
    fn test_loose_review_type_does_not_sink_the_event() {
        let json = r#"{
            "event": "ApplicationUpdated",
            "data": {
                "application": {"id": 1, "protocol_code": "PC-001", "review_type": "full board"}
            }
        }"#;
        let PushEvent::ApplicationUpdated(update) = PushEvent::from_json(json).unwrap() else {
            panic!("expected ApplicationUpdated");
        };
        assert_eq!(
            update.application.review_type,
            Patch::Set(crate::types::ReviewType::FullBoard)
        );
        assert_eq!(update.application.protocol_code, Patch::Set("PC-001".to_string()));

        let unknown = json.replace("full board", "panel");
        let PushEvent::ApplicationUpdated(update) = PushEvent::from_json(&unknown).unwrap() else {
            panic!("expected ApplicationUpdated");
        };
        assert!(update.application.review_type.is_absent());
        assert_eq!(update.application.protocol_code, Patch::Set("PC-001".to_string()));
    }

    #[test]
    fn test_decode_feedback_envelope() {
        let json = r#"{
            "topic": "application.4",
            "event": "SendAndUpdateFeedback",
            "data": {
                "message_thread": {"id": 88, "status_id": 3, "body": "Please revise", "author": "Chair"}
            }
        }"#;
        let envelope: PushEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.topic().unwrap(), Topic::Application(RecordId::from("4")));
        match envelope.event {
            PushEvent::SendAndUpdateFeedback(fb) => {
                assert_eq!(fb.message_thread.status_id, RecordId::from("3"));
                assert!(fb.message.is_none());
            }
            other => panic!("unexpected event: {}", other.name()),
        }
    }
}
