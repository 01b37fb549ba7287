use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    models::{Credential, RequestEnvelope, ResponseEnvelope},
};

/// The one wire boundary: a single `generateContent` invocation.
#[async_trait]
pub trait RemoteCall: Send + Sync {
    async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        envelope: &RequestEnvelope,
    ) -> Result<ResponseEnvelope>;
}

#[async_trait]
impl<T: RemoteCall + ?Sized> RemoteCall for Arc<T> {
    async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        envelope: &RequestEnvelope,
    ) -> Result<ResponseEnvelope> {
        (**self).generate_content(credential, model, envelope).await
    }
}

#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StudioConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| StudioError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// Builds the failure message for a non-2xx response.
pub(crate) fn parse_error(body: &[u8], http_status: u16) -> StudioError {
    if let Ok(parsed) = serde_json::from_slice::<GoogleErrorBody>(body) {
        let code = if parsed.error.code == 0 {
            http_status
        } else {
            parsed.error.code
        };
        return StudioError::RemoteCallFailure(match parsed.error.status {
            Some(status) => format!("HTTP {} {}: {}", code, status, parsed.error.message),
            None => format!("HTTP {}: {}", code, parsed.error.message),
        });
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        StudioError::RemoteCallFailure(format!("HTTP {}", http_status))
    } else {
        StudioError::RemoteCallFailure(format!("HTTP {}: {}", http_status, text))
    }
}

#[async_trait]
impl RemoteCall for HttpTransport {
    async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        envelope: &RequestEnvelope,
    ) -> Result<ResponseEnvelope> {
        let body = envelope.to_json()?;
        let url = self.endpoint(model);

        log::debug!("POST {} ({} bytes)", url, body.len());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", credential.expose())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                log::error!("Gemini request to {} failed: {}", model, e);
                StudioError::RemoteCallFailure(e.to_string())
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::RemoteCallFailure(e.to_string()))?;

        if !status.is_success() {
            let err = parse_error(&bytes, status.as_u16());
            log::error!("Gemini service error for {}: {}", model, err);
            return Err(err);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            StudioError::RemoteCallFailure(format!("Malformed response from {}: {}", model, e))
        })
    }
}
