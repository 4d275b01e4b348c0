//! `reqwest` implementation of [`ApplicationApi`].

use ethica_shared::protocol::{
    ActionResponse, ApplicationPage, ApplicationResponse, MessageThreadResponse, NewMessage,
};
use ethica_shared::{Application, ApplicationPatch, Message, RecordId};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::transport::ApplicationApi;

#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = self
            .authorize(request)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl ApplicationApi for HttpApi {
    async fn send_message(
        &self,
        application_id: &RecordId,
        status_id: &RecordId,
        body: &str,
    ) -> Result<Message> {
        let url = self.url(&format!(
            "applications/{application_id}/statuses/{status_id}/messages"
        ));
        debug!(%url, "Posting feedback");
        let request = self.client.post(url).json(&NewMessage {
            body: body.to_string(),
        });
        let response: MessageThreadResponse = self.send(request).await?;
        Ok(response.message_thread)
    }

    async fn update_application(
        &self,
        application_id: &RecordId,
        patch: &ApplicationPatch,
    ) -> Result<ActionResponse> {
        let url = self.url(&format!("applications/{application_id}"));
        debug!(%url, "Updating application");
        self.send(self.client.patch(url).json(patch)).await
    }

    async fn fetch_application(&self, application_id: &RecordId) -> Result<Application> {
        let url = self.url(&format!("applications/{application_id}"));
        let response: ApplicationResponse = self.send(self.client.get(url)).await?;
        Ok(response.application)
    }

    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<ApplicationPage> {
        let url = self.url("applications");
        let request = self
            .client
            .get(url)
            .query(&[("page", page), ("per_page", per_page)]);
        self.send(request).await
    }
}
