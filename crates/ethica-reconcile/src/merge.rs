//! The Application State Reconciler.
//!
//! | field shape                 | compared by                         | merged by               |
//! |-----------------------------|-------------------------------------|-------------------------|
//! | scalar                      | `!=`                                | replace                 |
//! | singular entity             | key, then version, then fields      | replace / clear         |
//! | identified collection       | per item: version, then fields      | upsert by key, additive |
//! | plain list / unknown field  | `!=`                                | replace                 |

use std::sync::Arc;

use ethica_shared::{Application, ApplicationPatch, Patch};
use serde_json::{Map, Value};

use crate::identity::{same_version, supersedes, Identified, Upsert};

/// Outcome of folding an update into a snapshot.
#[derive(Debug, Clone)]
pub struct Reconciled {
    pub snapshot: Arc<Application>,
    /// `false` guarantees `snapshot` is the input snapshot itself.
    pub changed: bool,
}

impl Reconciled {
    pub fn unchanged(current: &Arc<Application>) -> Self {
        Self {
            snapshot: Arc::clone(current),
            changed: false,
        }
    }

    pub fn changed(next: Application) -> Self {
        Self {
            snapshot: Arc::new(next),
            changed: true,
        }
    }
}

/// Fold `patch` into `current`.
pub fn merge(current: &Arc<Application>, patch: &ApplicationPatch) -> Reconciled {
    if patch.is_empty() {
        return Reconciled::unchanged(current);
    }

    let mut next = Application::clone(current);
    let mut changed = false;

    changed |= assign(&mut next.user_id, patch.user_id.as_ref());
    changed |= assign(&mut next.research_title, patch.research_title.as_ref());
    changed |= assign(&mut next.applicant_names, patch.applicant_names.as_ref());
    changed |= assign_nullable(&mut next.submitted_at, &patch.submitted_at);
    changed |= assign_nullable(&mut next.protocol_code, &patch.protocol_code);
    changed |= assign_nullable(&mut next.review_type, &patch.review_type);
    changed |= assign_nullable(&mut next.updated_at, &patch.updated_at);

    changed |= replace_singular(&mut next.payment, &patch.payment);
    changed |= replace_singular(&mut next.decision_letter, &patch.decision_letter);
    changed |= replace_singular(&mut next.ethics_clearance, &patch.ethics_clearance);
    changed |= replace_singular(&mut next.message_post, &patch.message_post);
    changed |= replace_singular(&mut next.meeting, &patch.meeting);

    changed |= upsert_into(&mut next.statuses, patch.statuses.as_deref());
    changed |= upsert_into(&mut next.requirements, patch.requirements.as_deref());
    changed |= upsert_into(&mut next.documents, patch.documents.as_deref());
    changed |= upsert_into(&mut next.review_results, patch.review_results.as_deref());
    changed |= upsert_into(&mut next.panel_members, patch.panel_members.as_deref());
    changed |= upsert_into(&mut next.reviewer_reports, patch.reviewer_reports.as_deref());

    changed |= merge_extra(&mut next.extra, &patch.extra);

    if changed {
        Reconciled::changed(next)
    } else {
        Reconciled::unchanged(current)
    }
}

/// Replace a non-nullable field when a different value is present.
pub fn assign<T: PartialEq + Clone>(slot: &mut T, incoming: Option<&T>) -> bool {
    match incoming {
        Some(value) if slot != value => {
            *slot = value.clone();
            true
        }
        _ => false,
    }
}

/// Set or clear a nullable field.
pub fn assign_nullable<T: PartialEq + Clone>(slot: &mut Option<T>, incoming: &Patch<T>) -> bool {
    match incoming.resolve() {
        Some(value) if slot.as_ref() != value => {
            *slot = value.cloned();
            true
        }
        _ => false,
    }
}

/// Copy unmodelled keys over, one by one. Keys the incoming map omits stay.
pub fn merge_extra(slot: &mut Map<String, Value>, incoming: &Map<String, Value>) -> bool {
    let mut changed = false;
    for (key, value) in incoming {
        if slot.get(key) != Some(value) {
            slot.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

/// Replace, add or clear a singular nested entity.
pub fn replace_singular<T>(slot: &mut Option<Arc<T>>, incoming: &Patch<T>) -> bool
where
    T: Identified + PartialEq + Clone,
{
    match incoming {
        Patch::Absent => false,
        Patch::Clear => slot.take().is_some(),
        Patch::Set(value) => {
            let replace = match slot.as_deref() {
                Some(current) => supersedes(current, value),
                None => true,
            };
            if replace {
                *slot = Some(Arc::new(value.clone()));
            }
            replace
        }
    }
}

/// Upsert `incoming` into the shared collection, swapping in a new `Arc`
/// only when something changed.
pub fn upsert_into<T: Upsert>(slot: &mut Arc<Vec<T>>, incoming: Option<&[T::Patch]>) -> bool {
    match incoming.and_then(|patches| upsert_all(slot, patches)) {
        Some(merged) => {
            *slot = merged;
            true
        }
        None => false,
    }
}

/// Merge item partials into `current` by key.
///
/// Matching items absorb the partial's present fields in place; unknown
/// keys are appended in arrival order; items the partial does not mention
/// are kept. When an item and its partial carry the same version stamp the
/// item's own fields are left alone and only nested collections are merged.
///
/// Returns `None` when nothing changed.
pub fn upsert_all<T: Upsert>(current: &Arc<Vec<T>>, patches: &[T::Patch]) -> Option<Arc<Vec<T>>> {
    let mut next: Option<Vec<T>> = None;

    for patch in patches {
        let items: &[T] = next.as_deref().unwrap_or(current.as_slice());

        let outcome = match items.iter().position(|item| item.key() == patch.key()) {
            Some(idx) => {
                let mut candidate = items[idx].clone();
                let mut touched = false;
                if !same_version(&candidate, patch) {
                    touched |= candidate.apply_fields(patch);
                }
                touched |= candidate.apply_nested(patch);
                touched.then_some((Some(idx), candidate))
            }
            None => Some((None, T::from_patch(patch))),
        };

        if let Some((slot, item)) = outcome {
            let items = next.get_or_insert_with(|| current.to_vec());
            match slot {
                Some(idx) => items[idx] = item,
                None => items.push(item),
            }
        }
    }

    next.map(Arc::new)
}
