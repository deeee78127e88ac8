use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a message was not accepted by the mail API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The API answered with a non-2xx status.
    #[error("Mail API responded with status {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connect error, timeout, unreadable body).
    #[error("Mail API request failed: {0}")]
    Transport(String),
}

impl DeliveryError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) => None,
        }
    }

    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::Transport(_) => None,
        }
    }
}
