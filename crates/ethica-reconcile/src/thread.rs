//! Status and feedback-thread helpers.
//!
//! Each helper touches one collection: the status list, or the message list
//! of the single status it names. Every other part of the snapshot stays
//! shared with the input.

use std::sync::Arc;

use ethica_shared::{Application, LocalId, Message, RecordId, Status};

use crate::merge::Reconciled;

/// Add a status to the tail of the pipeline.
///
/// A status whose id is already present replaces the held one instead of
/// being duplicated.
pub fn append_status(current: &Arc<Application>, status: Status) -> Reconciled {
    let mut next = Application::clone(current);
    let statuses = Arc::make_mut(&mut next.statuses);

    match statuses.iter().position(|s| s.id == status.id) {
        Some(idx) if statuses[idx] == status => return Reconciled::unchanged(current),
        Some(idx) => statuses[idx] = status,
        None => statuses.push(status),
    }
    Reconciled::changed(next)
}

/// Append `message` to the thread of `status_id`.
pub fn append_message(
    current: &Arc<Application>,
    status_id: &RecordId,
    message: Message,
) -> Reconciled {
    update_thread(current, status_id, |messages| {
        let mut messages = messages.to_vec();
        messages.push(message);
        Some(messages)
    })
}

/// Swap the pending message `local_id` for its server-confirmed version.
///
/// If the confirmed message is already in the thread (its push event beat
/// the HTTP response) the pending entry is dropped instead and the pushed
/// copy takes the response's fields. If the pending
/// entry is gone, the confirmed message is appended unless already present.
pub fn confirm_message(
    current: &Arc<Application>,
    status_id: &RecordId,
    local_id: LocalId,
    confirmed: Message,
) -> Reconciled {
    update_thread(current, status_id, |messages| {
        let pending = messages
            .iter()
            .position(|m| m.id.local_id() == Some(local_id));
        let existing = messages.iter().position(|m| m.id == confirmed.id);

        let mut next = messages.to_vec();
        match (pending, existing) {
            (Some(p), Some(e)) => {
                next[e] = confirmed;
                next.remove(p);
            }
            (Some(p), None) => next[p] = confirmed,
            (None, None) => next.push(confirmed),
            (None, Some(e)) if next[e] == confirmed => return None,
            (None, Some(e)) => next[e] = confirmed,
        }
        Some(next)
    })
}

/// Remove the pending message `local_id` after its send failed.
pub fn discard_message(
    current: &Arc<Application>,
    status_id: &RecordId,
    local_id: LocalId,
) -> Reconciled {
    update_thread(current, status_id, |messages| {
        let idx = messages
            .iter()
            .position(|m| m.id.local_id() == Some(local_id))?;
        let mut next = messages.to_vec();
        next.remove(idx);
        Some(next)
    })
}

/// Merge a server-pushed message into its status's thread by id.
pub fn upsert_message(current: &Arc<Application>, message: Message) -> Reconciled {
    let status_id = message.status_id.clone();
    update_thread(current, &status_id, |messages| {
        let mut next = messages.to_vec();
        match next.iter().position(|m| m.id == message.id) {
            Some(idx) if next[idx] == message => return None,
            Some(idx) => next[idx] = message,
            None => next.push(message),
        }
        Some(next)
    })
}

/// Run `edit` on the thread of `status_id`. `edit` returns `None` to signal
/// that nothing changed.
fn update_thread<F>(current: &Arc<Application>, status_id: &RecordId, edit: F) -> Reconciled
where
    F: FnOnce(&[Message]) -> Option<Vec<Message>>,
{
    let Some(idx) = current.statuses.iter().position(|s| &s.id == status_id) else {
        tracing::debug!(status = %status_id, "No such status, thread left untouched");
        return Reconciled::unchanged(current);
    };
    let Some(messages) = edit(&current.statuses[idx].messages) else {
        return Reconciled::unchanged(current);
    };

    let mut next = Application::clone(current);
    Arc::make_mut(&mut next.statuses)[idx].messages = Arc::new(messages);
    Reconciled::changed(next)
}
