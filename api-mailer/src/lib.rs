//! Compose emails from templates and deliver them through a multipart HTTP mail API.
//!
//! An [`ApiMailer`] holds the endpoint URL, the template lookup settings, a
//! [`TemplateEngine`] and an [`HttpTransport`]. [`ApiMailer::compose`] renders the
//! HTML and text variants of a template into a new [`Message`], which is then
//! adjusted with chained setters and delivered with [`Message::send`].
//!
//! ```rust,no_run
//! use api_mailer::prelude::*;
//!
//! # async fn run() -> Result<(), MailerError> {
//! let mailer = ApiMailer::from_env()?;
//! let params = TemplateData::new().insert("name", "Ada")?;
//!
//! let mut message = mailer.compose(Some("welcome"), params).await?;
//! message
//!     .set_to(["ada@example.com", "team@example.com"])
//!     .set_subject("Welcome aboard")
//!     .attach_content(b"hello".to_vec(), "hello.txt", AttachmentOptions::new());
//!
//! if let Err(err) = message.send().await {
//!     eprintln!("delivery failed: {err}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod mailer;
pub mod message;
pub mod payload;
pub mod templates;
pub mod transports;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{MailerConfig, TransportConfig};
pub use error::{DeliveryError, MailerError};
pub use mailer::{ApiMailer, BodyKind};
pub use message::{AddressList, Attachment, AttachmentOptions, Message};
pub use payload::{FilePart, HttpResponse, MultipartPayload};
pub use templates::{MiniJinjaTemplateEngine, TemplateData, TemplateEngine};
pub use transports::{FileTransport, HttpTransport, ReqwestTransport};

pub mod prelude {
    pub use crate::{
        AddressList, ApiMailer, Attachment, AttachmentOptions, DeliveryError, FileTransport,
        HttpTransport, MailerConfig, MailerError, Message, MiniJinjaTemplateEngine,
        MultipartPayload, ReqwestTransport, TemplateData, TemplateEngine, TransportConfig,
    };
}
