//! Sparse partial updates of the Application aggregate.
//!
//! Nullable fields use [`Patch`]; non-nullable fields use `Option`, where a
//! `null` on the wire is treated the same as an omitted key. Collection
//! patches carry per-item patches that are merged by identifier, and every
//! item patch must carry its `id`.
//!
//! Decoding is lenient per field: a value of an unexpected shape is dropped
//! with a warning and the rest of the partial still applies. Keys this client
//! does not model land in `extra` at every level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::{
    Application, DecisionLetter, EthicsClearance, Meeting, MessagePost, Payment,
};
use crate::patch::Patch;
use crate::types::{Delivery, MessageId, RecordId, ReviewType};
use crate::wire;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPatch {
    /// Identity of the target application. Never applied.
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_id: Option<RecordId>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub research_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub applicant_names: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub submitted_at: Patch<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub protocol_code: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub review_type: Patch<ReviewType>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub payment: Patch<Payment>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub statuses: Option<Vec<StatusPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub requirements: Option<Vec<RequirementPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub documents: Option<Vec<DocumentPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub review_results: Option<Vec<ReviewResultPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub panel_members: Option<Vec<PanelMemberPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub reviewer_reports: Option<Vec<ReviewerReportPatch>>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub decision_letter: Patch<DecisionLetter>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub ethics_clearance: Patch<EthicsClearance>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub message_post: Patch<MessagePost>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub meeting: Patch<Meeting>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    /// Unknown keys, passed through to the snapshot untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ApplicationPatch {
    /// True when the patch carries no field at all.
    pub fn is_empty(&self) -> bool {
        *self == Self {
            id: self.id.clone(),
            ..Self::default()
        }
    }

    /// Build the patch that restores, from `current`, every top-level scalar
    /// and singular field that `self` touches. Collections are left out: the
    /// server stays the source of truth for them.
    pub fn inverse(&self, current: &Application) -> ApplicationPatch {
        fn restore<T: Clone>(touched: bool, value: Option<&T>) -> Patch<T> {
            if touched {
                Patch::from_option(value.cloned())
            } else {
                Patch::Absent
            }
        }

        ApplicationPatch {
            id: Some(current.id.clone()),
            user_id: self.user_id.as_ref().map(|_| current.user_id.clone()),
            research_title: self
                .research_title
                .as_ref()
                .map(|_| current.research_title.clone()),
            applicant_names: self
                .applicant_names
                .as_ref()
                .map(|_| current.applicant_names.clone()),
            submitted_at: restore(
                !self.submitted_at.is_absent(),
                current.submitted_at.as_ref(),
            ),
            protocol_code: restore(
                !self.protocol_code.is_absent(),
                current.protocol_code.as_ref(),
            ),
            review_type: restore(!self.review_type.is_absent(), current.review_type.as_ref()),
            payment: restore(!self.payment.is_absent(), current.payment.as_deref()),
            decision_letter: restore(
                !self.decision_letter.is_absent(),
                current.decision_letter.as_deref(),
            ),
            ethics_clearance: restore(
                !self.ethics_clearance.is_absent(),
                current.ethics_clearance.as_deref(),
            ),
            message_post: restore(!self.message_post.is_absent(), current.message_post.as_deref()),
            meeting: restore(!self.meeting.is_absent(), current.meeting.as_deref()),
            updated_at: restore(!self.updated_at.is_absent(), current.updated_at.as_ref()),
            extra: self
                .extra
                .keys()
                .map(|k| (k.clone(), current.extra.get(k).cloned().unwrap_or(Value::Null)))
                .collect(),
            ..ApplicationPatch::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Item patches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_id: Option<RecordId>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub sequence: Option<u8>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub state: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub start: Patch<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub end: Patch<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "wire::items",
        skip_serializing_if = "Option::is_none"
    )]
    pub messages: Option<Vec<MessagePatch>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePatch {
    pub id: MessageId,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_id: Option<RecordId>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub body: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub author: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivery: Option<Delivery>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub file_path: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub remarks: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub file_path: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub category: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewResultPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub reviewer: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub file_path: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub remarks: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PanelMemberPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub role: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewerReportPatch {
    pub id: RecordId,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub reviewer: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub file_path: Patch<String>,
    #[serde(
        default,
        deserialize_with = "wire::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "wire::timestamp_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub updated_at: Patch<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
