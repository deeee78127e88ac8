use crate::transports::{FileTransport, HttpTransport, ReqwestTransport};
use crate::MailerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TEMPLATE_PATH: &str = "mail";
pub const DEFAULT_VIEW_EXTENSION: &str = "tmpl";
pub const DEFAULT_HTML_LAYOUT: &str = "layouts/html";
pub const DEFAULT_TEXT_LAYOUT: &str = "layouts/text";
pub const DEFAULT_USER_AGENT: &str = concat!("api-mailer/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailerConfig {
    /// Endpoint that receives the multipart send request.
    pub api_url: String,
    #[serde(default = "default_template_path")]
    pub template_base_path: PathBuf,
    /// Extension of view and layout files, without the leading dot.
    #[serde(default = "default_view_extension")]
    pub view_extension: String,
    /// Layout wrapped around rendered HTML bodies; `None` disables wrapping.
    #[serde(default = "default_html_layout")]
    pub html_layout: Option<String>,
    /// Layout wrapped around rendered text bodies; `None` disables wrapping.
    #[serde(default = "default_text_layout")]
    pub text_layout: Option<String>,
    #[serde(default)]
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportConfig {
    Http { timeout_secs: Option<u64> },
    File { output_dir: PathBuf },
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Http { timeout_secs: None }
    }
}

fn default_template_path() -> PathBuf {
    PathBuf::from(DEFAULT_TEMPLATE_PATH)
}

fn default_view_extension() -> String {
    DEFAULT_VIEW_EXTENSION.to_string()
}

fn default_html_layout() -> Option<String> {
    Some(DEFAULT_HTML_LAYOUT.to_string())
}

fn default_text_layout() -> Option<String> {
    Some(DEFAULT_TEXT_LAYOUT.to_string())
}

impl MailerConfig {
    pub fn new<S: Into<String>>(api_url: S) -> Self {
        Self {
            api_url: api_url.into(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, MailerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `MAILER_*` keys resolved through `lookup`.
    ///
    /// An empty `MAILER_HTML_LAYOUT` or `MAILER_TEXT_LAYOUT` disables that layout.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MailerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("MAILER_API_URL").unwrap_or_default();

        let transport = if let Some(output_dir) = lookup("MAILER_FILE_OUTPUT_DIR") {
            TransportConfig::File {
                output_dir: PathBuf::from(output_dir),
            }
        } else {
            TransportConfig::Http {
                timeout_secs: lookup("MAILER_TIMEOUT_SECS").and_then(|t| t.parse().ok()),
            }
        };

        let layout = |key: &str, default: &str| match lookup(key) {
            Some(value) if value.is_empty() => None,
            Some(value) => Some(value),
            None => Some(default.to_string()),
        };

        let config = Self {
            api_url,
            template_base_path: lookup("MAILER_TEMPLATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_template_path),
            view_extension: lookup("MAILER_VIEW_EXTENSION")
                .unwrap_or_else(default_view_extension),
            html_layout: layout("MAILER_HTML_LAYOUT", DEFAULT_HTML_LAYOUT),
            text_layout: layout("MAILER_TEXT_LAYOUT", DEFAULT_TEXT_LAYOUT),
            transport,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MailerError> {
        if self.api_url.trim().is_empty() {
            return Err(MailerError::Config("api_url is required".to_string()));
        }

        Ok(())
    }

    pub fn build_transport(&self) -> Result<Arc<dyn HttpTransport>, MailerError> {
        match &self.transport {
            TransportConfig::Http { timeout_secs } => {
                let mut builder = ReqwestTransport::builder().user_agent(DEFAULT_USER_AGENT);

                if let Some(secs) = timeout_secs {
                    builder = builder.timeout(Duration::from_secs(*secs));
                }

                Ok(Arc::new(builder.build()?))
            }
            TransportConfig::File { output_dir } => Ok(Arc::new(FileTransport::new(output_dir)?)),
        }
    }
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            template_base_path: default_template_path(),
            view_extension: default_view_extension(),
            html_layout: default_html_layout(),
            text_layout: default_text_layout(),
            transport: TransportConfig::default(),
        }
    }
}
