use async_trait::async_trait;
use keyring::Entry;

use super::{KeyValueStore, StorageResult};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "etuni";

/// Stores each key as its own OS keychain entry under a shared service name.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> StorageResult<Entry> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    fn backend_name(&self) -> &'static str {
        "keyring"
    }

    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        for key in keys {
            match self.entry(key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_a_new_instance() {
        let service = format!("etuni-test-{}", std::process::id());
        let store = KeyringStore::with_service(&service);
        if let Err(e) = store.set("token", "abc123").await {
            eprintln!("skipping: no OS keychain available ({})", e);
            return;
        }

        // A fresh store builds fresh entries, so this reads the platform keychain
        let reopened = KeyringStore::with_service(&service);
        assert_eq!(reopened.get("token").await.unwrap().as_deref(), Some("abc123"));

        reopened.remove_many(&["token", "userRole"]).await.unwrap();
        assert_eq!(store.get("token").await.unwrap(), None);
    }
}
