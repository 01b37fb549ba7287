use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT_MIME_TYPE: &str = "image/jpeg";
pub const PNG_MIME_TYPE: &str = "image/png";

/// Base64 image data tagged with its MIME type.
///
/// Payloads never carry a `data:` URL prefix; use [`ImagePayload::from_data_url`]
/// to strip one and [`ImagePayload::to_data_url`] to render one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn png(data: impl Into<String>) -> Self {
        Self::new(data, PNG_MIME_TYPE)
    }

    /// Accepts either a `data:<mime>;base64,<data>` URL or bare base64.
    pub fn from_data_url(value: &str) -> Self {
        let value = value.trim();
        match value.strip_prefix("data:").and_then(|rest| rest.split_once(',')) {
            Some((header, data)) => {
                let mime = header.strip_suffix(";base64").unwrap_or(header);
                let mime = if mime.is_empty() {
                    DEFAULT_INPUT_MIME_TYPE
                } else {
                    mime
                };
                Self::new(data, mime)
            }
            None => Self::new(value, DEFAULT_INPUT_MIME_TYPE),
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}
