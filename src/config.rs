use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::StudioError;
use crate::models::Operation;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXTURE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_CREDENTIAL_ENV: &str = "GEMINI_API_KEY";

/// Model identifiers used for each operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSet {
    pub texture: String,
    pub generation: String,
    pub analysis: String,
}

impl Default for ModelSet {
    fn default() -> Self {
        ModelSet {
            texture: DEFAULT_TEXTURE_MODEL.to_string(),
            generation: DEFAULT_GENERATION_MODEL.to_string(),
            analysis: DEFAULT_ANALYSIS_MODEL.to_string(),
        }
    }
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_operation(&self, operation: Operation) -> &str {
        match operation {
            Operation::TextureSwap => &self.texture,
            Operation::Generate => &self.generation,
            Operation::Analyze => &self.analysis,
        }
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        ModelSet {
            texture: env::var("STORM_TEXTURE_MODEL").unwrap_or(defaults.texture),
            generation: env::var("STORM_GENERATION_MODEL").unwrap_or(defaults.generation),
            analysis: env::var("STORM_ANALYSIS_MODEL").unwrap_or(defaults.analysis),
        }
    }

    pub fn with_model(mut self, operation: Operation, model: impl Into<String>) -> Self {
        let model = model.into();
        match operation {
            Operation::TextureSwap => self.texture = model,
            Operation::Generate => self.generation = model,
            Operation::Analyze => self.analysis = model,
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialBackend {
    Memory,
    File,
    Env,
}

impl FromStr for CredentialBackend {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CredentialBackend::Memory),
            "file" => Ok(CredentialBackend::File),
            "env" => Ok(CredentialBackend::Env),
            other => Err(StudioError::ConfigError(format!(
                "Unknown credential backend '{}', expected memory, file or env",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudioConfig {
    pub base_url: String,
    pub models: ModelSet,
    pub credential_backend: CredentialBackend,
    pub credential_file: PathBuf,
    pub credential_env: String,
    pub request_timeout_secs: Option<u64>,
}

pub fn default_credential_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".stormai")
        .join("credentials.json")
}

impl Default for StudioConfig {
    fn default() -> Self {
        StudioConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            models: ModelSet::default(),
            credential_backend: CredentialBackend::File,
            credential_file: default_credential_file(),
            credential_env: DEFAULT_CREDENTIAL_ENV.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl StudioConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, StudioError> {
        let defaults = Self::default();

        let credential_backend = match env::var("STORM_CREDENTIAL_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.credential_backend,
        };

        let request_timeout_secs = match env::var("STORM_REQUEST_TIMEOUT_SECS") {
            Ok(value) => Some(value.trim().parse().map_err(|_| {
                StudioError::ConfigError(format!(
                    "STORM_REQUEST_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    value
                ))
            })?),
            Err(_) => None,
        };

        Ok(StudioConfig {
            base_url: env::var("STORM_API_BASE_URL").unwrap_or(defaults.base_url),
            models: ModelSet::from_env(),
            credential_backend,
            credential_file: env::var("STORM_CREDENTIAL_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.credential_file),
            credential_env: env::var("STORM_CREDENTIAL_ENV").unwrap_or(defaults.credential_env),
            request_timeout_secs,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models(mut self, models: ModelSet) -> Self {
        self.models = models;
        self
    }

    pub fn with_memory_credentials(mut self) -> Self {
        self.credential_backend = CredentialBackend::Memory;
        self
    }

    pub fn with_credential_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credential_backend = CredentialBackend::File;
        self.credential_file = path.into();
        self
    }

    pub fn with_credential_env(mut self, var: impl Into<String>) -> Self {
        self.credential_backend = CredentialBackend::Env;
        self.credential_env = var.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }
}
