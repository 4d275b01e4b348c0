//! Tri-state field used by partial updates.
//!
//! JSON partials distinguish a key that is missing from a key that is present
//! with `null`. `Patch<T>` keeps that distinction after decoding:
//!
//! | JSON            | `Patch<T>`   | meaning            |
//! |-----------------|--------------|--------------------|
//! | key omitted     | `Absent`     | leave untouched    |
//! | `"key": null`   | `Clear`      | explicitly clear   |
//! | `"key": value`  | `Set(value)` | replace or merge   |
//!
//! Fields must be declared with
//! `#[serde(default, skip_serializing_if = "Patch::is_absent")]` so that a
//! missing key falls back to `Absent`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Absent,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(v) => Some(v),
            _ => None,
        }
    }

    /// `None` maps to `Clear`, the inverse of a nullable field's value.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Set(v),
            None => Self::Clear,
        }
    }

    /// Interpret the patch against the current nullable value.
    ///
    /// Returns `None` when the field is absent, otherwise the value the field
    /// should hold afterwards.
    pub fn resolve(&self) -> Option<Option<&T>> {
        match self {
            Self::Absent => None,
            Self::Clear => Some(None),
            Self::Set(v) => Some(Some(v)),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Set(v) => serializer.serialize_some(v),
            Self::Absent | Self::Clear => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}
