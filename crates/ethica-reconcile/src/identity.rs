//! Identity and versioning of nested entities.

use chrono::{DateTime, Utc};

/// An entity addressable by a stable key, optionally carrying a version
/// stamp (`updated_at`).
pub trait Identified {
    type Key: PartialEq + std::fmt::Debug;

    fn key(&self) -> &Self::Key;

    fn version(&self) -> Option<&DateTime<Utc>>;
}

/// A collection item that can absorb a partial of itself.
pub trait Upsert: Identified + Clone {
    type Patch: Identified<Key = Self::Key>;

    /// An item holding only `key`, every other field defaulted.
    fn blank(key: &Self::Key) -> Self;

    /// Copy every field present in `patch` except nested collections.
    /// Returns whether any field changed.
    fn apply_fields(&mut self, patch: &Self::Patch) -> bool;

    /// Merge nested collections carried by `patch`.
    fn apply_nested(&mut self, _patch: &Self::Patch) -> bool {
        false
    }

    /// Build a new item from a partial that matched nothing.
    fn from_patch(patch: &Self::Patch) -> Self {
        let mut item = Self::blank(patch.key());
        item.apply_fields(patch);
        item.apply_nested(patch);
        item
    }
}

/// Both sides carry a version stamp and the stamps agree.
pub fn same_version<A, B>(a: &A, b: &B) -> bool
where
    A: Identified,
    B: Identified<Key = A::Key>,
{
    matches!((a.version(), b.version()), (Some(x), Some(y)) if x == y)
}

/// Whether `incoming` should replace `current` wholesale.
///
/// Differing keys always supersede. With equal keys, version stamps decide
/// when both sides have one; otherwise fields are compared one by one.
pub fn supersedes<T>(current: &T, incoming: &T) -> bool
where
    T: Identified + PartialEq,
{
    if current.key() != incoming.key() {
        return true;
    }
    match (current.version(), incoming.version()) {
        (Some(a), Some(b)) => a != b,
        _ => current != incoming,
    }
}
