use crate::{DeliveryError, HttpResponse, MailerError, MultipartPayload, transports::HttpTransport};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Writes each send request to a JSON file instead of calling the API.
///
/// Every request is answered with `202 Accepted`. Meant for development
/// setups where no mail API is reachable.
#[derive(Debug, Clone)]
pub struct FileTransport {
    output_dir: PathBuf,
}

impl FileTransport {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self, MailerError> {
        let output_dir = output_dir.as_ref().to_path_buf();

        if !output_dir.exists() {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl HttpTransport for FileTransport {
    async fn post_multipart(
        &self,
        url: &str,
        payload: MultipartPayload,
    ) -> Result<HttpResponse, DeliveryError> {
        let id = Uuid::new_v4().to_string();

        let fields: Vec<_> = payload
            .fields()
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        let files: Vec<_> = payload
            .files()
            .iter()
            .map(|file| {
                json!({
                    "name": file.name,
                    "file_name": file.file_name,
                    "content_type": file.content_type,
                    "size": file.size(),
                })
            })
            .collect();

        let record = json!({
            "id": id,
            "url": url,
            "created_at": Utc::now().to_rfc3339(),
            "fields": fields,
            "files": files,
        });

        let path = self.output_dir.join(format!("{id}.json"));
        let contents = serde_json::to_vec_pretty(&record)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| DeliveryError::Transport(format!("Failed to write {}: {e}", path.display())))?;

        info!(path = %path.display(), "Wrote email request to file");
        Ok(HttpResponse::new(202, json!({ "id": id }).to_string()))
    }
}
