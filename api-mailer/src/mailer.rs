use crate::templates::{MiniJinjaTemplateEngine, TemplateData, TemplateEngine};
use crate::transports::HttpTransport;
use crate::{MailerConfig, MailerError, Message};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// The two body variants a template can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Html,
    Text,
}

impl BodyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composes [`Message`]s from templates and hands them the transport to send with.
///
/// Cloning is cheap and every clone shares the same configuration, engine and
/// transport.
#[derive(Clone)]
pub struct ApiMailer {
    inner: Arc<MailerInner>,
}

struct MailerInner {
    config: MailerConfig,
    engine: Arc<dyn TemplateEngine>,
    transport: Arc<dyn HttpTransport>,
}

impl fmt::Debug for ApiMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiMailer")
            .field("api_url", &self.inner.config.api_url)
            .field("template_base_path", &self.inner.config.template_base_path)
            .finish_non_exhaustive()
    }
}

impl ApiMailer {
    /// Fails with [`MailerError::Config`] when `config.api_url` is empty.
    pub fn new(
        config: MailerConfig,
        engine: Arc<dyn TemplateEngine>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, MailerError> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(MailerInner {
                config,
                engine,
                transport,
            }),
        })
    }

    /// Builds the configured transport and a [`MiniJinjaTemplateEngine`].
    pub fn from_config(config: MailerConfig) -> Result<Self, MailerError> {
        config.validate()?;
        let transport = config.build_transport()?;
        Self::new(config, Arc::new(MiniJinjaTemplateEngine::new()), transport)
    }

    pub fn from_env() -> Result<Self, MailerError> {
        Self::from_config(MailerConfig::from_env()?)
    }

    pub fn api_url(&self) -> &str {
        &self.inner.config.api_url
    }

    pub fn config(&self) -> &MailerConfig {
        &self.inner.config
    }

    pub(crate) fn transport(&self) -> &dyn HttpTransport {
        self.inner.transport.as_ref()
    }

    /// A new, empty message bound to this mailer.
    pub fn message(&self) -> Message {
        Message::new(self.clone())
    }

    /// Creates a message, rendering `template` into its bodies when given.
    ///
    /// Entries of `params` that name a message field (`to`, `subject`,
    /// `htmlBody`, ...) are applied after rendering, so they win over rendered
    /// content. All of `params` is also visible to the templates.
    pub async fn compose(
        &self,
        template: Option<&str>,
        params: TemplateData,
    ) -> Result<Message, MailerError> {
        let mut message = self.message();

        if let Some(template) = template {
            self.render_content(&mut message, template, &params).await?;
        }

        message.apply_params(&params);
        Ok(message)
    }

    async fn render_content(
        &self,
        message: &mut Message,
        view: &str,
        params: &TemplateData,
    ) -> Result<(), MailerError> {
        if let Some(html) = self.render_body(view, BodyKind::Html, message, params).await? {
            message.set_html_body(html);
        }

        // Rendered after the HTML body is set, so text templates can read it.
        if let Some(text) = self.render_body(view, BodyKind::Text, message, params).await? {
            message.set_text_body(text);
        }

        Ok(())
    }

    async fn render_body(
        &self,
        view: &str,
        kind: BodyKind,
        message: &Message,
        params: &TemplateData,
    ) -> Result<Option<String>, MailerError> {
        let Some(view_file) = self.find_view_file(view, kind) else {
            debug!(view, %kind, "No view file found, skipping body");
            return Ok(None);
        };

        let snapshot = serde_json::to_value(message)?;
        let mut data = params.clone();
        data.set("message", snapshot.clone());

        debug!(view, %kind, path = %view_file.display(), "Rendering email view");
        let content = self.inner.engine.render_file(&view_file, &data).await?;

        let Some(layout) = self.layout(kind) else {
            return Ok(Some(content));
        };

        let mut layout_data = TemplateData::new().insert("content", &content)?;
        layout_data.set("message", snapshot);

        let layout_file = self.template_path(layout);
        let wrapped = self
            .inner
            .engine
            .render_file(&layout_file, &layout_data)
            .await?;
        Ok(Some(wrapped))
    }

    /// Resolves the view file for one body kind: `<view>-<kind>` first, then
    /// the generic `<view>`. `None` when neither exists.
    pub fn find_view_file(&self, view: &str, kind: BodyKind) -> Option<PathBuf> {
        let specific = self.template_path(&format!("{view}-{kind}"));
        if specific.is_file() {
            return Some(specific);
        }

        let generic = self.template_path(view);
        generic.is_file().then_some(generic)
    }

    fn layout(&self, kind: BodyKind) -> Option<&str> {
        match kind {
            BodyKind::Html => self.inner.config.html_layout.as_deref(),
            BodyKind::Text => self.inner.config.text_layout.as_deref(),
        }
    }

    fn template_path(&self, name: &str) -> PathBuf {
        let config = &self.inner.config;

        if config.view_extension.is_empty() {
            config.template_base_path.join(name)
        } else {
            config
                .template_base_path
                .join(format!("{name}.{}", config.view_extension))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, TEST_API_URL, mailer_with};
    use crate::TransportConfig;
    use serde_json::json;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    /// A template directory with the default layouts.
    fn template_dir() -> TempDir {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "layouts/html.tmpl",
            "<html><body>{{ content|safe }}</body></html>",
        );
        write(dir.path(), "layouts/text.tmpl", "{{ content }}\n-- \nThe Team");
        dir
    }

    fn mailer_without_layouts(dir: &Path) -> ApiMailer {
        let mut config = MailerConfig::new(TEST_API_URL);
        config.template_base_path = dir.to_path_buf();
        config.html_layout = None;
        config.text_layout = None;

        ApiMailer::new(
            config,
            Arc::new(MiniJinjaTemplateEngine::new()),
            RecordingTransport::ok(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_requires_api_url() {
        let result = ApiMailer::new(
            MailerConfig::default(),
            Arc::new(MiniJinjaTemplateEngine::new()),
            RecordingTransport::ok(),
        );

        assert!(matches!(result, Err(MailerError::Config(_))));
    }

    #[test]
    fn test_from_config_with_file_transport() {
        let dir = tempdir().unwrap();
        let mut config = MailerConfig::new(TEST_API_URL);
        config.transport = TransportConfig::File {
            output_dir: dir.path().join("outbox"),
        };

        let mailer = ApiMailer::from_config(config).unwrap();
        assert_eq!(mailer.api_url(), TEST_API_URL);
    }

    #[test]
    fn test_find_view_file_prefers_specific() {
        let dir = template_dir();
        write(dir.path(), "welcome-html.tmpl", "<p>Welcome</p>");
        write(dir.path(), "welcome.tmpl", "Welcome");

        let mailer = mailer_with(RecordingTransport::ok(), dir.path());

        assert_eq!(
            mailer.find_view_file("welcome", BodyKind::Html),
            Some(dir.path().join("welcome-html.tmpl"))
        );
        assert_eq!(
            mailer.find_view_file("welcome", BodyKind::Text),
            Some(dir.path().join("welcome.tmpl"))
        );
        assert_eq!(mailer.find_view_file("missing", BodyKind::Html), None);
    }

    #[test]
    fn test_find_view_file_without_extension() {
        let dir = tempdir().unwrap();
        write(dir.path(), "receipt-text", "Thanks");

        let mut config = MailerConfig::new(TEST_API_URL);
        config.template_base_path = dir.path().to_path_buf();
        config.view_extension = String::new();
        let mailer = ApiMailer::new(
            config,
            Arc::new(MiniJinjaTemplateEngine::new()),
            RecordingTransport::ok(),
        )
        .unwrap();

        assert_eq!(
            mailer.find_view_file("receipt", BodyKind::Text),
            Some(dir.path().join("receipt-text"))
        );
    }

    #[tokio::test]
    async fn test_compose_without_template() {
        let mailer = mailer_with(RecordingTransport::ok(), "does-not-matter");
        let params = TemplateData::from_json(json!({
            "to": "a@x.com",
            "subject": "Hi",
            "textBody": "Hello"
        }))
        .unwrap();

        let message = mailer.compose(None, params).await.unwrap();

        assert_eq!(message.to(), ["a@x.com"]);
        assert_eq!(message.subject(), Some("Hi"));
        assert_eq!(message.text_body(), Some("Hello"));
        assert_eq!(message.html_body(), None);
    }

    #[tokio::test]
    async fn test_compose_specific_then_generic() {
        let dir = tempdir().unwrap();
        write(dir.path(), "welcome-html.tmpl", "<p>Hi {{ name }}</p>");
        write(dir.path(), "welcome.tmpl", "Hi {{ name }}");

        let mailer = mailer_without_layouts(dir.path());
        let params = TemplateData::new().insert("name", "Ada").unwrap();

        let message = mailer.compose(Some("welcome"), params).await.unwrap();

        assert_eq!(message.html_body(), Some("<p>Hi Ada</p>"));
        assert_eq!(message.text_body(), Some("Hi Ada"));
    }

    #[tokio::test]
    async fn test_compose_skips_missing_kind() {
        let dir = template_dir();
        write(dir.path(), "alert-text.tmpl", "Disk almost full");

        let mailer = mailer_with(RecordingTransport::ok(), dir.path());
        let message = mailer
            .compose(Some("alert"), TemplateData::new())
            .await
            .unwrap();

        assert_eq!(message.html_body(), None);
        assert_eq!(
            message.text_body(),
            Some("Disk almost full\n-- \nThe Team")
        );
    }

    #[tokio::test]
    async fn test_compose_wraps_in_layout() {
        let dir = template_dir();
        write(dir.path(), "welcome-html.tmpl", "<p>Hi {{ name }}</p>");
        write(dir.path(), "welcome-text.tmpl", "Hi {{ name }}");

        let mailer = mailer_with(RecordingTransport::ok(), dir.path());
        let params = TemplateData::new().insert("name", "Ada").unwrap();

        let message = mailer.compose(Some("welcome"), params).await.unwrap();

        assert_eq!(
            message.html_body(),
            Some("<html><body><p>Hi Ada</p></body></html>")
        );
        assert_eq!(message.text_body(), Some("Hi Ada\n-- \nThe Team"));
    }

    #[tokio::test]
    async fn test_templates_see_message() {
        let dir = tempdir().unwrap();
        write(dir.path(), "layouts/brand.tmpl", "[{{ message.to | length }} recipients] {{ content }}");
        write(dir.path(), "notice-text.tmpl", "{{ message.attachments | length }} files");

        let mut config = MailerConfig::new(TEST_API_URL);
        config.template_base_path = dir.path().to_path_buf();
        config.html_layout = None;
        config.text_layout = Some("layouts/brand".to_string());
        let mailer = ApiMailer::new(
            config,
            Arc::new(MiniJinjaTemplateEngine::new()),
            RecordingTransport::ok(),
        )
        .unwrap();

        let message = mailer
            .compose(Some("notice"), TemplateData::new())
            .await
            .unwrap();

        assert_eq!(message.text_body(), Some("[0 recipients] 0 files"));
    }

    #[tokio::test]
    async fn test_text_view_sees_rendered_html_body() {
        let dir = tempdir().unwrap();
        write(dir.path(), "receipt-html.tmpl", "<p>Paid {{ amount }}</p>");
        write(dir.path(), "receipt-text.tmpl", "Fallback for: {{ message.html_body }}");

        let mailer = mailer_without_layouts(dir.path());
        let params = TemplateData::from_json(json!({ "amount": "$5" })).unwrap();

        let message = mailer.compose(Some("receipt"), params).await.unwrap();

        assert_eq!(message.html_body(), Some("<p>Paid $5</p>"));
        assert_eq!(message.text_body(), Some("Fallback for: <p>Paid $5</p>"));
    }

    #[tokio::test]
    async fn test_text_layout_sees_rendered_html_body() {
        let dir = tempdir().unwrap();
        write(dir.path(), "layouts/text.tmpl", "{{ content }} ({{ message.html_body is none }})");
        write(dir.path(), "receipt-html.tmpl", "<p>Paid</p>");
        write(dir.path(), "receipt-text.tmpl", "Paid");

        let mut config = MailerConfig::new(TEST_API_URL);
        config.template_base_path = dir.path().to_path_buf();
        config.html_layout = None;
        let mailer = ApiMailer::new(
            config,
            Arc::new(MiniJinjaTemplateEngine::new()),
            RecordingTransport::ok(),
        )
        .unwrap();

        let message = mailer
            .compose(Some("receipt"), TemplateData::new())
            .await
            .unwrap();

        assert_eq!(message.text_body(), Some("Paid (false)"));
    }

    #[tokio::test]
    async fn test_params_override_rendered_body() {
        let dir = tempdir().unwrap();
        write(dir.path(), "welcome.tmpl", "rendered");

        let mailer = mailer_without_layouts(dir.path());
        let params = TemplateData::from_json(json!({ "htmlBody": "<b>explicit</b>" })).unwrap();

        let message = mailer.compose(Some("welcome"), params).await.unwrap();

        assert_eq!(message.html_body(), Some("<b>explicit</b>"));
        assert_eq!(message.text_body(), Some("rendered"));
    }

    #[tokio::test]
    async fn test_missing_layout_fails_compose() {
        let dir = tempdir().unwrap();
        write(dir.path(), "welcome.tmpl", "Hi");

        let mailer = mailer_with(RecordingTransport::ok(), dir.path());
        let result = mailer.compose(Some("welcome"), TemplateData::new()).await;

        assert!(matches!(result, Err(MailerError::TemplateNotFound(_))));
    }

    #[tokio::test]
    async fn test_compose_then_send() {
        let dir = template_dir();
        write(dir.path(), "welcome-html.tmpl", "<p>Hi {{ name }}</p>");

        let transport = RecordingTransport::ok();
        let mailer = mailer_with(transport.clone(), dir.path());
        let params = TemplateData::from_json(json!({ "name": "Ada", "to": ["ada@x.com"] })).unwrap();

        let mut message = mailer.compose(Some("welcome"), params).await.unwrap();
        message.set_subject("Welcome").set_cc("team@x.com");

        assert!(message.send().await.is_ok());

        let requests = transport.requests();
        let (_, payload) = &requests[0];
        assert_eq!(payload.field("to"), Some("[\"ada@x.com\"]"));
        assert_eq!(payload.field("cc"), Some("[\"team@x.com\"]"));
        assert_eq!(
            payload.field("body"),
            Some("<html><body><p>Hi Ada</p></body></html>")
        );
    }
}
