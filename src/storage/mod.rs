pub mod env;
pub mod file;
pub mod memory;
pub mod traits;

use crate::{
    config::{CredentialBackend, StudioConfig},
    error::Result,
    models::Credential,
};
use std::sync::Arc;

pub use env::EnvStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

/// Fixed key the credential is stored under.
pub const CREDENTIAL_KEY: &str = "storm_ai_api_key";

/// Holds the single API credential. Every call goes straight to the backend.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        let backend: Arc<dyn KeyValueStore> = match config.credential_backend {
            CredentialBackend::Memory => Arc::new(MemoryStore::new()),
            CredentialBackend::File => Arc::new(FileStore::new(config.credential_file.clone())),
            CredentialBackend::Env => Arc::new(EnvStore::new(config.credential_env.clone())),
        };
        log::debug!("Credential store backend: {}", backend.backend_name());
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub async fn get(&self) -> Result<Option<Credential>> {
        Ok(self.backend.get(CREDENTIAL_KEY).await?.map(Credential::new))
    }

    /// Overwrites any stored value. Rejecting blank input is the caller's job.
    pub async fn set(&self, value: &str) -> Result<()> {
        self.backend.set(CREDENTIAL_KEY, value).await
    }

    pub async fn remove(&self) -> Result<()> {
        self.backend.remove(CREDENTIAL_KEY).await
    }

    pub async fn has_credential(&self) -> Result<bool> {
        Ok(self
            .get()
            .await?
            .map_or(false, |credential| !credential.expose().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let store = CredentialStore::in_memory();
        assert!(store.get().await.unwrap().is_none());

        store.set("k1").await.unwrap();
        assert_eq!(store.get().await.unwrap(), Some(Credential::new("k1")));

        store.remove().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_backend() {
        let store = CredentialStore::in_memory();
        let reader = store.clone();
        store.set("k2").await.unwrap();
        assert!(reader.has_credential().await.unwrap());
        store.remove().await.unwrap();
        assert!(!reader.has_credential().await.unwrap());
    }

    #[tokio::test]
    async fn test_uses_fixed_key() {
        let backend = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(backend.clone());
        store.set("k3").await.unwrap();
        assert_eq!(backend.get(CREDENTIAL_KEY).await.unwrap().as_deref(), Some("k3"));
    }

    #[tokio::test]
    async fn test_from_config_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let config = StudioConfig::new().with_credential_file(dir.path().join("keys.json"));
        let store = CredentialStore::from_config(&config);
        assert_eq!(store.backend().backend_name(), "file");

        store.set("persisted").await.unwrap();
        let again = CredentialStore::from_config(&config);
        assert_eq!(again.get().await.unwrap(), Some(Credential::new("persisted")));
    }
}
