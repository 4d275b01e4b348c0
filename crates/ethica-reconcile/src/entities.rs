//! [`Identified`] and [`Upsert`] for every nested entity of the aggregate.

use chrono::{DateTime, Utc};
use ethica_shared::{
    DecisionLetter, Document, DocumentPatch, EthicsClearance, Meeting, Message, MessageId,
    MessagePatch, MessagePost, PanelMember, PanelMemberPatch, Payment, RecordId, Requirement,
    RequirementPatch, ReviewResult, ReviewResultPatch, ReviewerReport, ReviewerReportPatch,
    Status, StatusPatch,
};

use crate::identity::{Identified, Upsert};
use crate::merge::{assign, assign_nullable, merge_extra, upsert_into};

macro_rules! identified_by_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identified for $ty {
                type Key = RecordId;

                fn key(&self) -> &RecordId {
                    &self.id
                }

                fn version(&self) -> Option<&DateTime<Utc>> {
                    self.updated_at.as_ref()
                }
            }
        )+
    };
}

macro_rules! identified_patch {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Identified for $ty {
                type Key = RecordId;

                fn key(&self) -> &RecordId {
                    &self.id
                }

                fn version(&self) -> Option<&DateTime<Utc>> {
                    self.updated_at.as_set()
                }
            }
        )+
    };
}

identified_by_record!(
    Status,
    Requirement,
    Document,
    ReviewResult,
    PanelMember,
    ReviewerReport,
    DecisionLetter,
    EthicsClearance,
    MessagePost,
    Meeting,
    Payment,
);

identified_patch!(
    StatusPatch,
    RequirementPatch,
    DocumentPatch,
    ReviewResultPatch,
    PanelMemberPatch,
    ReviewerReportPatch,
);

impl Identified for Message {
    type Key = MessageId;

    fn key(&self) -> &MessageId {
        &self.id
    }

    fn version(&self) -> Option<&DateTime<Utc>> {
        self.updated_at.as_ref()
    }
}

impl Identified for MessagePatch {
    type Key = MessageId;

    fn key(&self) -> &MessageId {
        &self.id
    }

    fn version(&self) -> Option<&DateTime<Utc>> {
        self.updated_at.as_set()
    }
}

// ---------------------------------------------------------------------------
// Status and its thread
// ---------------------------------------------------------------------------

impl Upsert for Status {
    type Patch = StatusPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &StatusPatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.application_id, p.application_id.as_ref());
        changed |= assign(&mut self.name, p.name.as_ref());
        changed |= assign(&mut self.sequence, p.sequence.as_ref());
        changed |= assign(&mut self.state, p.state.as_ref());
        changed |= assign_nullable(&mut self.start, &p.start);
        changed |= assign_nullable(&mut self.end, &p.end);
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }

    fn apply_nested(&mut self, p: &StatusPatch) -> bool {
        upsert_into(&mut self.messages, p.messages.as_deref())
    }
}

impl Upsert for Message {
    type Patch = MessagePatch;

    fn blank(key: &MessageId) -> Self {
        Self {
            id: key.clone(),
            status_id: RecordId::default(),
            body: String::new(),
            author: String::new(),
            delivery: Default::default(),
            updated_at: None,
            extra: Default::default(),
        }
    }

    fn apply_fields(&mut self, p: &MessagePatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.status_id, p.status_id.as_ref());
        changed |= assign(&mut self.body, p.body.as_ref());
        changed |= assign(&mut self.author, p.author.as_ref());
        changed |= assign(&mut self.delivery, p.delivery.as_ref());
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}

// ---------------------------------------------------------------------------
// Flat collections
// ---------------------------------------------------------------------------

impl Upsert for Requirement {
    type Patch = RequirementPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &RequirementPatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.name, p.name.as_ref());
        changed |= assign_nullable(&mut self.file_path, &p.file_path);
        changed |= assign(&mut self.status, p.status.as_ref());
        changed |= assign_nullable(&mut self.remarks, &p.remarks);
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}

impl Upsert for Document {
    type Patch = DocumentPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &DocumentPatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.name, p.name.as_ref());
        changed |= assign_nullable(&mut self.file_path, &p.file_path);
        changed |= assign_nullable(&mut self.category, &p.category);
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}

impl Upsert for ReviewResult {
    type Patch = ReviewResultPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &ReviewResultPatch) -> bool {
        let mut changed = false;
        changed |= assign_nullable(&mut self.reviewer, &p.reviewer);
        changed |= assign_nullable(&mut self.file_path, &p.file_path);
        changed |= assign(&mut self.status, p.status.as_ref());
        changed |= assign_nullable(&mut self.remarks, &p.remarks);
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}

impl Upsert for PanelMember {
    type Patch = PanelMemberPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &PanelMemberPatch) -> bool {
        let mut changed = false;
        changed |= assign(&mut self.name, p.name.as_ref());
        changed |= assign_nullable(&mut self.role, &p.role);
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}

impl Upsert for ReviewerReport {
    type Patch = ReviewerReportPatch;

    fn blank(key: &RecordId) -> Self {
        Self {
            id: key.clone(),
            ..Default::default()
        }
    }

    fn apply_fields(&mut self, p: &ReviewerReportPatch) -> bool {
        let mut changed = false;
        changed |= assign_nullable(&mut self.reviewer, &p.reviewer);
        changed |= assign_nullable(&mut self.file_path, &p.file_path);
        changed |= assign(&mut self.status, p.status.as_ref());
        changed |= assign_nullable(&mut self.updated_at, &p.updated_at);
        changed |= merge_extra(&mut self.extra, &p.extra);
        changed
    }
}
