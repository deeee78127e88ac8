use crate::{
    ApiMailer, DeliveryError, HttpResponse, MailerConfig, MiniJinjaTemplateEngine,
    MultipartPayload, transports::HttpTransport,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub(crate) const TEST_API_URL: &str = "https://mail.example.com/api/send";

/// Transport double that records every request and answers with a fixed result.
pub(crate) struct RecordingTransport {
    response: Result<HttpResponse, DeliveryError>,
    requests: Mutex<Vec<(String, MultipartPayload)>>,
}

impl RecordingTransport {
    pub(crate) fn responding(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(HttpResponse::new(status, body)),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn ok() -> Arc<Self> {
        Self::responding(200, "{\"status\":\"sent\"}")
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err(DeliveryError::Transport(message.to_string())),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<(String, MultipartPayload)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn post_multipart(
        &self,
        url: &str,
        payload: MultipartPayload,
    ) -> Result<HttpResponse, DeliveryError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), payload));
        self.response.clone()
    }
}

pub(crate) fn mailer_with<P: AsRef<Path>>(
    transport: Arc<RecordingTransport>,
    template_base_path: P,
) -> ApiMailer {
    let mut config = MailerConfig::new(TEST_API_URL);
    config.template_base_path = template_base_path.as_ref().to_path_buf();

    ApiMailer::new(config, Arc::new(MiniJinjaTemplateEngine::new()), transport).unwrap()
}
