//! Session actions.
//!
//! Each action takes the shared session plus the collaborators it needs.
//! The session lock is taken for the synchronous parts only and released
//! before any network await.

pub mod application;
pub mod feedback;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use ethica_shared::protocol::{ActionResponse, ApplicationPage};
    use ethica_shared::{
        Application, ApplicationPatch, Delivery, Message, RecordId, Role, Status,
    };

    use crate::config::ClientConfig;
    use crate::error::{ClientError, Result};
    use crate::state::{Session, SharedSession, Viewer};
    use crate::transport::ApplicationApi;

    /// In-memory backend. Every call fails with a transport error when
    /// `offline` is set. With `garbled`, updates are accepted but answered
    /// with a body that does not decode.
    #[derive(Debug, Default)]
    pub struct FakeApi {
        pub offline: bool,
        pub garbled: bool,
        pub application: Application,
        pub page: ApplicationPage,
        pub response_message: Option<String>,
        pub calls: AtomicUsize,
    }

    impl FakeApi {
        pub fn online() -> Self {
            Self::default()
        }

        pub fn offline() -> Self {
            Self {
                offline: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn call(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(ClientError::Transport("offline".into()));
            }
            Ok(())
        }
    }

    impl ApplicationApi for FakeApi {
        async fn send_message(
            &self,
            _application_id: &RecordId,
            status_id: &RecordId,
            body: &str,
        ) -> Result<Message> {
            self.call()?;
            Ok(Message {
                id: RecordId::from("m1").into(),
                status_id: status_id.clone(),
                body: body.to_string(),
                author: "R. Cruz".into(),
                delivery: Delivery::Sent,
                updated_at: None,
                extra: Default::default(),
            })
        }

        async fn update_application(
            &self,
            _application_id: &RecordId,
            patch: &ApplicationPatch,
        ) -> Result<ActionResponse> {
            self.call()?;
            if self.garbled {
                let err = serde_json::from_str::<ActionResponse>("<html>").unwrap_err();
                return Err(ClientError::Decode(err));
            }
            Ok(ActionResponse {
                application: patch.clone(),
                message: self.response_message.clone(),
            })
        }

        async fn fetch_application(&self, _application_id: &RecordId) -> Result<Application> {
            self.call()?;
            Ok(self.application.clone())
        }

        async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ApplicationPage> {
            self.call()?;
            Ok(ApplicationPage {
                current_page: page,
                per_page,
                ..self.page.clone()
            })
        }
    }

    pub fn application() -> Application {
        let status = |id: &str, sequence| Status {
            id: RecordId::from(id),
            application_id: RecordId::from("1"),
            sequence,
            ..Default::default()
        };
        Application {
            id: RecordId::from("1"),
            user_id: RecordId::from("u1"),
            research_title: "Sleep and Memory".into(),
            statuses: Arc::new(vec![status("s1", 1), status("s2", 2)]),
            ..Default::default()
        }
    }

    pub fn shared_session() -> SharedSession {
        let viewer = Viewer {
            user_id: RecordId::from("u1"),
            display_name: "R. Cruz".into(),
            role: Role::Researcher,
        };
        Session::new(viewer, application(), &ClientConfig::default()).into_shared()
    }
}
