use crate::{MailerError, templates::TemplateData};
use async_trait::async_trait;
use minijinja::{AutoEscape, Environment};
use std::io::ErrorKind;
use std::path::Path;

#[async_trait]
pub trait TemplateEngine: Send + Sync {
    /// Renders the template stored at `path` with `data` as its context.
    async fn render_file(&self, path: &Path, data: &TemplateData) -> Result<String, MailerError>;
}

/// Renders template files from disk with minijinja.
///
/// Templates whose name ends in `html` (`welcome-html`, `layouts/html`) are
/// HTML-escaped; layouts print the already rendered body with `{{ content|safe }}`.
#[derive(Debug, Clone, Default)]
pub struct MiniJinjaTemplateEngine;

impl MiniJinjaTemplateEngine {
    pub fn new() -> Self {
        Self
    }

    fn environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(auto_escape_for);
        env
    }
}

fn auto_escape_for(name: &str) -> AutoEscape {
    if name.ends_with("html") {
        AutoEscape::Html
    } else {
        AutoEscape::None
    }
}

#[async_trait]
impl TemplateEngine for MiniJinjaTemplateEngine {
    async fn render_file(&self, path: &Path, data: &TemplateData) -> Result<String, MailerError> {
        let source = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                MailerError::TemplateNotFound(path.to_path_buf())
            } else {
                MailerError::Io(e)
            }
        })?;

        let name = path.with_extension("").to_string_lossy().into_owned();
        let mut env = self.environment();
        env.add_template_owned(name.clone(), source)?;

        let rendered = env.get_template(&name)?.render(&data.data)?;
        Ok(rendered)
    }
}
