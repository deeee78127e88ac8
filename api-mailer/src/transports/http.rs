use crate::{DeliveryError, HttpResponse, MailerError, MultipartPayload, transports::HttpTransport};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, MailerError> {
        Self::builder().build()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_multipart(
        &self,
        url: &str,
        payload: MultipartPayload,
    ) -> Result<HttpResponse, DeliveryError> {
        let form = build_form(payload)?;

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(format!("Failed to read response body: {e}")))?;

        debug!(url, status, "Mail API responded");
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Default)]
pub struct ReqwestTransportBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ReqwestTransportBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, MailerError> {
        // A redirected POST comes back as a GET without the form; the 3xx is reported instead.
        let mut builder = Client::builder().redirect(Policy::none());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            builder = builder.user_agent(user_agent);
        }

        Ok(ReqwestTransport::with_client(builder.build()?))
    }
}

fn build_form(payload: MultipartPayload) -> Result<Form, DeliveryError> {
    let (fields, files) = payload.into_parts();
    let mut form = Form::new();

    for (name, value) in fields {
        form = form.text(name, value);
    }

    for file in files {
        let mut part = Part::bytes(file.content).file_name(file.file_name);

        if let Some(content_type) = file.content_type {
            part = part.mime_str(&content_type).map_err(|e| {
                DeliveryError::Transport(format!(
                    "Invalid attachment content type {content_type}: {e}"
                ))
            })?;
        }

        form = form.part(file.name, part);
    }

    Ok(form)
}
