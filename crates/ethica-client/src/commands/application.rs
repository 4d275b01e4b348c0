use std::sync::Arc;

use ethica_shared::{Application, ApplicationPatch};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::events::{emit_notice, Notice, NoticeSink};
use crate::state::{lock_session, SharedSession};
use crate::transport::ApplicationApi;

/// Run an action and merge the server's answer. Nothing is shown locally
/// before the server responds.
pub async fn update_application<A, N>(
    state: &SharedSession,
    api: &A,
    notices: &N,
    patch: &ApplicationPatch,
) -> Result<Arc<Application>>
where
    A: ApplicationApi,
    N: NoticeSink + ?Sized,
{
    let application_id = lock_session(state)?.application_id().clone();
    let response = api.update_application(&application_id, patch).await?;

    let mut session = lock_session(state)?;
    if let Some(notice) = session.apply_response(response) {
        emit_notice(notices, notice);
    }
    Ok(session.snapshot())
}

/// Apply `patch` locally at once, then confirm it with the server.
///
/// On failure the touched top-level fields are restored to their previous
/// values and an error notice is surfaced. Collections are left for the
/// server to correct. A response that arrives but cannot be decoded is not a
/// failure: the server has applied the change, so the local copy stays.
pub async fn update_optimistic<A, N>(
    state: &SharedSession,
    api: &A,
    notices: &N,
    patch: ApplicationPatch,
) -> Result<Arc<Application>>
where
    A: ApplicationApi,
    N: NoticeSink + ?Sized,
{
    let (application_id, rollback, ttl) = {
        let mut session = lock_session(state)?;
        let rollback = patch.inverse(&session.snapshot());
        let changed = session.apply_patch(&patch);
        debug!(changed, "Optimistic update applied");
        (
            session.application_id().clone(),
            rollback,
            session.notice_ttl(),
        )
    };

    match api.update_application(&application_id, &patch).await {
        Ok(response) => {
            let mut session = lock_session(state)?;
            if let Some(notice) = session.apply_response(response) {
                emit_notice(notices, notice);
            }
            Ok(session.snapshot())
        }
        Err(e) if e.accepted_by_server() => {
            warn!(
                application = %application_id,
                error = %e,
                "Update accepted but response unreadable, keeping local change"
            );
            Ok(lock_session(state)?.snapshot())
        }
        Err(e) => {
            warn!(application = %application_id, error = %e, "Update failed, reverting");
            match lock_session(state) {
                Ok(mut session) => {
                    session.apply_patch(&rollback);
                }
                Err(lock) => error!(error = %lock, "Revert skipped"),
            }
            emit_notice(notices, Notice::error("Failed to update application", ttl));
            Err(e)
        }
    }
}

/// Re-read the whole application and fold it in.
///
/// The fetched aggregate is merged rather than swapped in, so feedback still
/// awaiting confirmation stays on its thread.
pub async fn refresh_application<A: ApplicationApi>(
    state: &SharedSession,
    api: &A,
) -> Result<bool> {
    let application_id = lock_session(state)?.application_id().clone();
    let fetched = api.fetch_application(&application_id).await?;
    let patch: ApplicationPatch = serde_json::from_value(serde_json::to_value(&fetched)?)?;

    let changed = lock_session(state)?.apply_patch(&patch);
    info!(application = %application_id, changed, "Application refreshed");
    Ok(changed)
}

/// Fetch the next page of the application list. Returns `false` once every
/// page has been loaded.
pub async fn load_next_page<A: ApplicationApi>(state: &SharedSession, api: &A) -> Result<bool> {
    let (page, per_page) = {
        let session = lock_session(state)?;
        let list = session.list();
        let page = if list.current_page() == 0 {
            Some(1)
        } else {
            list.next_page()
        };
        (page, list.per_page())
    };
    let Some(page) = page else {
        debug!("Application list fully loaded");
        return Ok(false);
    };

    let fetched = api.fetch_page(page, per_page).await?;
    let mut session = lock_session(state)?;
    let changed = session.list_mut().merge_page(fetched);
    debug!(page, changed, total = session.list().total(), "Application page merged");
    Ok(true)
}
