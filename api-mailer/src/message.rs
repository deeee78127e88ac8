use crate::payload::ATTACHMENT_FIELD;
use crate::templates::TemplateData;
use crate::{ApiMailer, DeliveryError, FilePart, MultipartPayload};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// An ordered list of addresses. A single address converts into a one-element list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressList(Vec<String>);

impl AddressList {
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for AddressList {
    fn from(address: &str) -> Self {
        Self(vec![address.to_string()])
    }
}

impl From<String> for AddressList {
    fn from(address: String) -> Self {
        Self(vec![address])
    }
}

impl From<&String> for AddressList {
    fn from(address: &String) -> Self {
        Self(vec![address.clone()])
    }
}

impl From<Vec<String>> for AddressList {
    fn from(addresses: Vec<String>) -> Self {
        Self(addresses)
    }
}

impl From<Vec<&str>> for AddressList {
    fn from(addresses: Vec<&str>) -> Self {
        addresses.as_slice().into()
    }
}

impl From<&[&str]> for AddressList {
    fn from(addresses: &[&str]) -> Self {
        Self(addresses.iter().map(|a| a.to_string()).collect())
    }
}

impl From<&[String]> for AddressList {
    fn from(addresses: &[String]) -> Self {
        Self(addresses.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for AddressList {
    fn from(addresses: [&str; N]) -> Self {
        addresses.as_slice().into()
    }
}

/// Everything needed to produce an attachment's bytes at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    /// Read from disk when the message is sent.
    File {
        path: PathBuf,
        display_name: String,
        content_type: Option<String>,
    },
    Content {
        #[serde(skip)]
        content: Vec<u8>,
        display_name: String,
        content_type: String,
    },
}

impl Attachment {
    pub fn display_name(&self) -> &str {
        match self {
            Self::File { display_name, .. } | Self::Content { display_name, .. } => display_name,
        }
    }

    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::File { content_type, .. } => content_type.as_deref(),
            Self::Content { content_type, .. } => Some(content_type),
        }
    }

    /// Returns the bytes to upload, or `None` when there is nothing to send.
    async fn resolve_content(&self) -> Option<Vec<u8>> {
        let content = match self {
            Self::File { path, .. } => match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read attachment, skipping"
                    );
                    return None;
                }
            },
            Self::Content { content, .. } => content.clone(),
        };

        if content.is_empty() {
            warn!(file_name = self.display_name(), "Attachment is empty, skipping");
            return None;
        }

        Some(content)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentOptions {
    pub display_name: Option<String>,
    pub content_type: Option<String>,
}

impl AttachmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn content_type<S: Into<String>>(mut self, content_type: S) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// An email under construction, bound to the [`ApiMailer`] that delivers it.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip)]
    mailer: ApiMailer,
    from: Option<String>,
    to: Vec<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    reply_to: Vec<String>,
    subject: Option<String>,
    text_body: Option<String>,
    html_body: Option<String>,
    attachments: Vec<Attachment>,
}

impl Message {
    pub fn new(mailer: ApiMailer) -> Self {
        Self {
            mailer,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            subject: None,
            text_body: None,
            html_body: None,
            attachments: Vec::new(),
        }
    }

    pub fn set_from<S: Into<String>>(&mut self, from: S) -> &mut Self {
        self.from = Some(from.into());
        self
    }

    pub fn set_to<A: Into<AddressList>>(&mut self, to: A) -> &mut Self {
        self.to = to.into().into_inner();
        self
    }

    pub fn set_cc<A: Into<AddressList>>(&mut self, cc: A) -> &mut Self {
        self.cc = cc.into().into_inner();
        self
    }

    pub fn set_bcc<A: Into<AddressList>>(&mut self, bcc: A) -> &mut Self {
        self.bcc = bcc.into().into_inner();
        self
    }

    pub fn set_reply_to<A: Into<AddressList>>(&mut self, reply_to: A) -> &mut Self {
        self.reply_to = reply_to.into().into_inner();
        self
    }

    pub fn set_subject<S: Into<String>>(&mut self, subject: S) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn set_text_body<S: Into<String>>(&mut self, text: S) -> &mut Self {
        self.text_body = Some(text.into());
        self
    }

    pub fn set_html_body<S: Into<String>>(&mut self, html: S) -> &mut Self {
        self.html_body = Some(html.into());
        self
    }

    /// Attaches the file at `path`, read when the message is sent.
    ///
    /// A path that is not an existing file is logged and ignored; the message
    /// is returned unchanged.
    pub fn attach<P: AsRef<Path>>(&mut self, path: P, options: AttachmentOptions) -> &mut Self {
        let path = path.as_ref();

        if !path.is_file() {
            warn!(path = %path.display(), "Attachment file not found, skipping");
            return self;
        }

        let display_name = options.display_name.unwrap_or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        });

        self.attachments.push(Attachment::File {
            path: path.to_path_buf(),
            display_name,
            content_type: options.content_type,
        });
        self
    }

    pub fn attach_content<C, S>(
        &mut self,
        content: C,
        file_name: S,
        options: AttachmentOptions,
    ) -> &mut Self
    where
        C: Into<Vec<u8>>,
        S: Into<String>,
    {
        self.attachments.push(Attachment::Content {
            content: content.into(),
            display_name: options.display_name.unwrap_or_else(|| file_name.into()),
            content_type: options
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        });
        self
    }

    pub fn mailer(&self) -> &ApiMailer {
        &self.mailer
    }

    pub fn from_address(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &[String] {
        &self.to
    }

    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[String] {
        &self.reply_to
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn text_body(&self) -> Option<&str> {
        self.text_body.as_deref()
    }

    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// The value of the outgoing `body` field: the HTML body unless it is empty.
    pub fn body(&self) -> &str {
        match self.html_body.as_deref() {
            Some(html) if !html.is_empty() => html,
            _ => self.text_body.as_deref().unwrap_or_default(),
        }
    }

    /// Applies the entries of `params` that name a message field.
    ///
    /// Values must be a string (or, for address fields, an array of strings);
    /// anything else is ignored. When both spellings of a key are present the
    /// camelCase one (`replyTo`, `textBody`, `htmlBody`) wins.
    pub(crate) fn apply_params(&mut self, params: &TemplateData) {
        let lookup = |keys: &[&'static str]| {
            keys.iter()
                .find_map(|key| params.get(key).map(|value| (*key, value)))
        };

        if let Some((key, value)) = lookup(&["from"]) {
            applied(key, value.as_str().map(|v| self.set_from(v)));
        }
        if let Some((key, value)) = lookup(&["to"]) {
            applied(key, address_list(value).map(|v| self.set_to(v)));
        }
        if let Some((key, value)) = lookup(&["cc"]) {
            applied(key, address_list(value).map(|v| self.set_cc(v)));
        }
        if let Some((key, value)) = lookup(&["bcc"]) {
            applied(key, address_list(value).map(|v| self.set_bcc(v)));
        }
        if let Some((key, value)) = lookup(&["replyTo", "reply_to"]) {
            applied(key, address_list(value).map(|v| self.set_reply_to(v)));
        }
        if let Some((key, value)) = lookup(&["subject"]) {
            applied(key, value.as_str().map(|v| self.set_subject(v)));
        }
        if let Some((key, value)) = lookup(&["textBody", "text_body"]) {
            applied(key, value.as_str().map(|v| self.set_text_body(v)));
        }
        if let Some((key, value)) = lookup(&["htmlBody", "html_body"]) {
            applied(key, value.as_str().map(|v| self.set_html_body(v)));
        }
    }

    /// Builds the multipart body of the send request.
    ///
    /// File attachments are read here; unreadable or empty attachments are
    /// left out of the payload.
    pub async fn to_payload(&self) -> MultipartPayload {
        let mut payload = MultipartPayload::new();

        payload.push_field("to", json_list(&self.to));
        payload.push_field("subject", self.subject.clone().unwrap_or_default());
        payload.push_field("body", self.body());

        for (name, list) in [
            ("cc", &self.cc),
            ("bcc", &self.bcc),
            ("replyTo", &self.reply_to),
        ] {
            if !list.is_empty() {
                payload.push_field(name, json_list(list));
            }
        }

        for attachment in &self.attachments {
            if let Some(content) = attachment.resolve_content().await {
                payload.push_file(FilePart {
                    name: ATTACHMENT_FIELD.to_string(),
                    file_name: attachment.display_name().to_string(),
                    content_type: attachment.content_type().map(str::to_string),
                    content,
                });
            }
        }

        payload
    }

    /// Delivers the message with a single POST to the mailer's API URL.
    ///
    /// Any 2xx answer is a success. Every failure is logged before it is
    /// returned, so callers that only need a yes/no can check `is_ok()`.
    #[must_use = "delivery failures are only reported through the returned Result"]
    pub async fn send(&self) -> Result<(), DeliveryError> {
        let payload = self.to_payload().await;
        let url = self.mailer.api_url();

        debug!(
            url,
            fields = payload.fields().len(),
            attachments = payload.files().len(),
            "Sending email via API"
        );

        let result = match self.mailer.transport().post_multipart(url, payload).await {
            Ok(response) if response.is_success() => {
                info!(status = response.status, recipients = self.to.len(), "Email accepted by API");
                Ok(())
            }
            Ok(response) => Err(DeliveryError::Status {
                status: response.status,
                body: response.body,
            }),
            Err(e) => Err(e),
        };

        match &result {
            Err(DeliveryError::Status { status, body }) => {
                error!(status, response = %body, "Failed to send email via API");
            }
            Err(DeliveryError::Transport(message)) => {
                error!(error = %message, "Failed to send email via API");
            }
            Ok(()) => {}
        }

        result
    }
}

fn applied<T>(key: &str, result: Option<T>) {
    if result.is_none() {
        debug!(key, "Ignoring message parameter with unexpected type");
    }
}

fn address_list(value: &Value) -> Option<AddressList> {
    match value {
        Value::String(address) => Some(AddressList::from(address)),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(AddressList::from),
        _ => None,
    }
}

fn json_list(list: &[String]) -> String {
    Value::from(list.to_vec()).to_string()
}
