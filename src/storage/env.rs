use async_trait::async_trait;

use crate::{
    error::{Result, StudioError},
    storage::traits::KeyValueStore,
};

/// Read-only store backed by one environment variable, whatever key is asked.
pub struct EnvStore {
    var: String,
}

impl EnvStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl KeyValueStore for EnvStore {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(std::env::var(&self.var)
            .ok()
            .filter(|value| !value.trim().is_empty()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<()> {
        Err(StudioError::StorageError(format!(
            "Credential comes from ${} and cannot be changed here",
            self.var
        )))
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(StudioError::StorageError(format!(
            "Credential comes from ${}; unset the variable instead",
            self.var
        )))
    }

    fn backend_name(&self) -> &'static str {
        "env"
    }
}
