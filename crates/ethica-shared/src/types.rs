use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::constants::{DELIVERY_FAILED, DELIVERY_SENDING, DELIVERY_SENT};

// Server-assigned identifier. The backend emits either integers or strings,
// both are normalised to text.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client-side placeholder identity for an item the server has not
/// confirmed yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct LocalId(pub Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "local:{}", self.0)
    }
}

/// Identity of a feedback message.
///
/// A message typed locally lives as `Pending` until the server answers with
/// its real identifier. Server payloads always decode as `Confirmed`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum MessageId {
    Confirmed(RecordId),
    Pending { local_id: LocalId },
}

impl MessageId {
    pub fn pending(local_id: LocalId) -> Self {
        Self::Pending { local_id }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    pub fn local_id(&self) -> Option<LocalId> {
        match self {
            Self::Pending { local_id } => Some(*local_id),
            Self::Confirmed(_) => None,
        }
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match self {
            Self::Confirmed(id) => Some(id),
            Self::Pending { .. } => None,
        }
    }
}

impl From<RecordId> for MessageId {
    fn from(id: RecordId) -> Self {
        Self::Confirmed(id)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "{id}"),
            Self::Pending { local_id } => write!(f, "{local_id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewType {
    Exempted,
    Expedited,
    FullBoard,
}

impl ReviewType {
    const VARIANTS: &'static [&'static str] = &["exempted", "expedited", "full-board"];

    /// Case, spaces and underscores are ignored: `Full Board`, `full_board`
    /// and `full board` all name the same type.
    pub fn parse(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match key.as_str() {
            "exempted" | "exempt" => Some(Self::Exempted),
            "expedited" => Some(Self::Expedited),
            "full-board" | "fullboard" => Some(Self::FullBoard),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ReviewType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| <D::Error as serde::de::Error>::unknown_variant(&raw, Self::VARIANTS))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Researcher,
    Staff,
    Chairperson,
}

impl Role {
    /// Staff and chairpersons see every application.
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Self::Staff | Self::Chairperson)
    }
}

/// Delivery/read marker shown next to a feedback message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum Delivery {
    Sending,
    #[default]
    Sent,
    Failed,
    /// Any other marker the server provides, typically a read timestamp.
    Marker(String),
}

impl From<String> for Delivery {
    fn from(s: String) -> Self {
        match s.as_str() {
            DELIVERY_SENDING => Self::Sending,
            DELIVERY_SENT => Self::Sent,
            DELIVERY_FAILED => Self::Failed,
            _ => Self::Marker(s),
        }
    }
}

impl From<Delivery> for String {
    fn from(d: Delivery) -> Self {
        match d {
            Delivery::Sending => DELIVERY_SENDING.to_string(),
            Delivery::Sent => DELIVERY_SENT.to_string(),
            Delivery::Failed => DELIVERY_FAILED.to_string(),
            Delivery::Marker(s) => s,
        }
    }
}
