//! Request/response collaborator consumed by the session.
//!
//! Implemented over HTTP by [`crate::http::HttpApi`]; tests substitute
//! in-memory fakes.

use std::future::Future;

use ethica_shared::protocol::{ActionResponse, ApplicationPage};
use ethica_shared::{Application, ApplicationPatch, Message, RecordId};

use crate::error::Result;

pub trait ApplicationApi: Send + Sync {
    /// Post feedback to a status thread; resolves to the server-confirmed message.
    fn send_message(
        &self,
        application_id: &RecordId,
        status_id: &RecordId,
        body: &str,
    ) -> impl Future<Output = Result<Message>> + Send;

    /// Apply a state-changing action; resolves to the partial the server
    /// wants merged.
    fn update_application(
        &self,
        application_id: &RecordId,
        patch: &ApplicationPatch,
    ) -> impl Future<Output = Result<ActionResponse>> + Send;

    fn fetch_application(
        &self,
        application_id: &RecordId,
    ) -> impl Future<Output = Result<Application>> + Send;

    fn fetch_page(&self, page: u32, per_page: u32)
        -> impl Future<Output = Result<ApplicationPage>> + Send;
}
