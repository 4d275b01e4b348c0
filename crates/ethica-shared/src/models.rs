//! The Application aggregate as held by a display session.
//!
//! Collections and singular nested entities sit behind `Arc` so a new
//! snapshot can share every part an update did not touch with the previous
//! one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{PIPELINE_LENGTH, PIPELINE_STAGES};
use crate::types::{Delivery, MessageId, RecordId, ReviewType};
use crate::wire;

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// One ethics-review case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: RecordId,
    /// Owning researcher.
    pub user_id: RecordId,
    pub research_title: String,
    #[serde(default)]
    pub applicant_names: Vec<String>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Assigned at pipeline stage 2.
    #[serde(default, deserialize_with = "wire::optional")]
    pub protocol_code: Option<String>,
    /// Assigned at pipeline stage 4.
    #[serde(default, deserialize_with = "wire::optional")]
    pub review_type: Option<ReviewType>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub payment: Option<Arc<Payment>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub statuses: Arc<Vec<Status>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub requirements: Arc<Vec<Requirement>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub documents: Arc<Vec<Document>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub review_results: Arc<Vec<ReviewResult>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub panel_members: Arc<Vec<PanelMember>>,
    #[serde(default, deserialize_with = "wire::shared_items")]
    pub reviewer_reports: Arc<Vec<ReviewerReport>>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub decision_letter: Option<Arc<DecisionLetter>>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub ethics_clearance: Option<Arc<EthicsClearance>>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub message_post: Option<Arc<MessagePost>>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub meeting: Option<Arc<Meeting>>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this client does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    pub fn status(&self, id: &RecordId) -> Option<&Status> {
        self.statuses.iter().find(|s| &s.id == id)
    }

    /// The stage currently being worked on: the highest-sequence status
    /// that has not ended.
    pub fn active_status(&self) -> Option<&Status> {
        self.statuses
            .iter()
            .filter(|s| !s.is_complete())
            .max_by_key(|s| s.sequence)
    }

    /// Number of completed pipeline stages.
    pub fn completed_stages(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_complete()).count()
    }

    pub fn pending_message_count(&self) -> usize {
        self.statuses
            .iter()
            .flat_map(|s| s.messages.iter())
            .filter(|m| m.id.is_pending())
            .count()
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// One pipeline stage instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Status {
    pub id: RecordId,
    pub application_id: RecordId,
    pub name: String,
    /// 1..=PIPELINE_LENGTH, defines pipeline order.
    pub sequence: u8,
    /// Free text, conventionally one of the `STATE_*` constants.
    pub state: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub start: Option<DateTime<Utc>>,
    /// `Some` once the stage is complete.
    #[serde(deserialize_with = "wire::timestamp")]
    pub end: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::shared_items")]
    pub messages: Arc<Vec<Message>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Status {
    pub fn is_complete(&self) -> bool {
        self.end.is_some()
    }

    /// Canonical stage name for this status's sequence number.
    pub fn stage_name(&self) -> Option<&'static str> {
        stage_name(self.sequence)
    }
}

pub fn stage_name(sequence: u8) -> Option<&'static str> {
    if !(1..=PIPELINE_LENGTH).contains(&sequence) {
        return None;
    }
    PIPELINE_STAGES.get(usize::from(sequence - 1)).copied()
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A feedback entry in a status's thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub status_id: RecordId,
    #[serde(default)]
    pub body: String,
    /// Author display name.
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub delivery: Delivery,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Identified collection items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirement {
    pub id: RecordId,
    pub name: String,
    pub file_path: Option<String>,
    pub status: String,
    pub remarks: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub id: RecordId,
    pub name: String,
    pub file_path: Option<String>,
    pub category: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewResult {
    pub id: RecordId,
    pub reviewer: Option<String>,
    pub file_path: Option<String>,
    pub status: String,
    pub remarks: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelMember {
    pub id: RecordId,
    pub name: String,
    pub role: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewerReport {
    pub id: RecordId,
    pub reviewer: Option<String>,
    pub file_path: Option<String>,
    pub status: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Singular nested entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionLetter {
    pub id: RecordId,
    pub file_path: Option<String>,
    pub is_signed: bool,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EthicsClearance {
    pub id: RecordId,
    pub file_path: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Announcement posted by the chairperson on an application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePost {
    pub id: RecordId,
    pub body: String,
    pub author: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Meeting {
    pub id: RecordId,
    #[serde(deserialize_with = "wire::timestamp")]
    pub scheduled_at: Option<DateTime<Utc>>,
    pub venue: Option<String>,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub id: RecordId,
    /// Decimal amounts also arrive as strings.
    #[serde(deserialize_with = "wire::decimal")]
    pub amount: Option<f64>,
    pub reference: Option<String>,
    pub proof_path: Option<String>,
    pub status: String,
    #[serde(deserialize_with = "wire::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Row of the paginated application list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSummary {
    pub id: RecordId,
    #[serde(default)]
    pub research_title: String,
    #[serde(default)]
    pub applicant_names: Vec<String>,
    #[serde(default, deserialize_with = "wire::timestamp")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub protocol_code: Option<String>,
    #[serde(default, deserialize_with = "wire::optional")]
    pub review_type: Option<ReviewType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::types::LocalId;

    fn status(id: &str, sequence: u8, ended: bool) -> Status {
        Status {
            id: RecordId::from(id),
            sequence,
            end: ended.then(Utc::now),
            ..Default::default()
        }
    }

    #[test]
    fn test_active_status_is_highest_open_stage() {
        let app = Application {
            statuses: Arc::new(vec![status("s1", 1, true), status("s2", 2, false)]),
            ..Default::default()
        };
        assert_eq!(app.active_status().map(|s| s.sequence), Some(2));
        assert_eq!(app.completed_stages(), 1);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(stage_name(1), Some("Submission of Requirements"));
        assert_eq!(stage_name(10), Some("Ethics Clearance"));
        assert_eq!(stage_name(0), None);
        assert_eq!(stage_name(11), None);
    }

    #[test]
    fn test_unknown_fields_are_kept() {
        let json = r#"{
            "id": 3,
            "user_id": 9,
            "research_title": "Sleep and memory",
            "study_site": "Ward 4",
            "statuses": [{"id": 1, "sequence": 1, "state": "Pending", "messages": []}]
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.id, RecordId::from("3"));
        assert_eq!(app.statuses.len(), 1);
        assert_eq!(app.extra.get("study_site"), Some(&Value::from("Ward 4")));

        let back = serde_json::to_value(&app).unwrap();
        assert_eq!(back["study_site"], Value::from("Ward 4"));
    }

    #[test]
    fn test_nested_unknown_fields_are_kept() {
        let json = r#"{
            "id": 3,
            "user_id": 9,
            "research_title": "Sleep and memory",
            "requirements": [{"id": 1, "name": "Consent form", "uploaded_by": "R. Cruz"}],
            "meeting": {"id": 2, "room_capacity": 12}
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(
            app.requirements[0].extra.get("uploaded_by"),
            Some(&Value::from("R. Cruz"))
        );

        let back = serde_json::to_value(&app).unwrap();
        assert_eq!(back["requirements"][0]["uploaded_by"], Value::from("R. Cruz"));
        assert_eq!(back["meeting"]["room_capacity"], Value::from(12));
    }

    #[test]
    fn test_backend_shapes_decode() {
        let json = r#"{
            "id": 3,
            "user_id": 9,
            "research_title": "Sleep and memory",
            "protocol_code": "PC-001",
            "review_type": "full board",
            "payment": {"id": 1, "amount": "1500.00", "status": "Paid"},
            "meeting": {"id": 1, "scheduled_at": "2024-05-01 09:30:00"},
            "statuses": [
                {"id": 1, "sequence": 1, "start": "2024-04-01 08:00:00"},
                {"id": 2, "sequence": "second"}
            ]
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.protocol_code.as_deref(), Some("PC-001"));
        assert_eq!(app.review_type, Some(ReviewType::FullBoard));
        assert_eq!(app.payment.as_ref().and_then(|p| p.amount), Some(1500.0));
        assert_eq!(
            app.meeting.as_ref().and_then(|m| m.scheduled_at),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).single()
        );
        // The status with an unreadable sequence is dropped on its own.
        assert_eq!(app.statuses.len(), 1);
        assert!(app.statuses[0].start.is_some());
    }

    #[test]
    fn test_unreadable_field_does_not_sink_the_record() {
        let json = r#"{
            "id": 3,
            "user_id": 9,
            "research_title": "Sleep",
            "review_type": "panel",
            "submitted_at": "soon"
        }"#;
        let app: Application = serde_json::from_str(json).unwrap();
        assert_eq!(app.research_title, "Sleep");
        assert!(app.review_type.is_none());
        assert!(app.submitted_at.is_none());
    }

    #[test]
    fn test_pending_message_count() {
        let mut s = status("s1", 1, false);
        s.messages = Arc::new(vec![Message {
            id: MessageId::pending(LocalId::new()),
            status_id: s.id.clone(),
            body: "draft".into(),
            author: "R. Cruz".into(),
            delivery: Delivery::Sending,
            updated_at: None,
            extra: Map::new(),
        }]);
        let app = Application {
            statuses: Arc::new(vec![s]),
            ..Default::default()
        };
        assert_eq!(app.pending_message_count(), 1);
    }
}
