use serde::Serialize;

/// Form name shared by every file part of a send request.
pub const ATTACHMENT_FIELD: &str = "attachments[]";

/// The multipart body of a send request, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultipartPayload {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilePart {
    pub name: String,
    pub file_name: String,
    pub content_type: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl FilePart {
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field<K, V>(&mut self, name: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.fields.push((name.into(), value.into()));
    }

    pub fn push_file(&mut self, file: FilePart) {
        self.files.push(file);
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// First value of the text field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn files(&self) -> &[FilePart] {
        &self.files
    }

    pub fn into_parts(self) -> (Vec<(String, String)>, Vec<FilePart>) {
        (self.fields, self.files)
    }
}

/// Status and body of the API's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new<S: Into<String>>(status: u16, body: S) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
