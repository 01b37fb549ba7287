use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Missing required input: {0}")]
    MissingRequiredInput(String),
    #[error("No API key configured")]
    MissingCredential,
    #[error("Remote call failed: {0}")]
    RemoteCallFailure(String),
    #[error("No image returned: {0}")]
    NoImageReturned(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("IO error: {0}")]
    IoError(String),
}

impl StudioError {
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, StudioError::MissingCredential)
    }

    /// True for failures raised before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            StudioError::MissingRequiredInput(_) | StudioError::MissingCredential
        )
    }
}

impl From<std::io::Error> for StudioError {
    fn from(e: std::io::Error) -> Self {
        StudioError::IoError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_failures() {
        assert!(StudioError::MissingCredential.is_local());
        assert!(StudioError::MissingRequiredInput("prompt".into()).is_local());
        assert!(!StudioError::RemoteCallFailure("boom".into()).is_local());
        assert!(!StudioError::NoImageReturned("empty".into()).is_local());
    }

    #[test]
    fn test_display_keeps_cause() {
        let err = StudioError::RemoteCallFailure("HTTP 403: API key not valid".into());
        assert_eq!(err.to_string(), "Remote call failed: HTTP 403: API key not valid");
        assert!(StudioError::MissingCredential.is_missing_credential());
    }
}
