mod file;
mod http;

pub use file::FileTransport;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};

use crate::{DeliveryError, HttpResponse, MultipartPayload};
use async_trait::async_trait;

/// Executes the single multipart POST behind [`crate::Message::send`].
///
/// Implementations report any answer from the server as `Ok`, whatever its
/// status; `Err` is reserved for requests that produced no response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn post_multipart(
        &self,
        url: &str,
        payload: MultipartPayload,
    ) -> Result<HttpResponse, DeliveryError>;
}
