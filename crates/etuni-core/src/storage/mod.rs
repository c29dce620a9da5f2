//! Durable key-value storage for session state.
//!
//! The token store persists the bearer token and a few dependent identifiers
//! through the `KeyValueStore` trait. Three backends are provided:
//! - `MemoryStore`: process-local, used by tests and ephemeral sessions
//! - `FileStore`: a JSON map on disk
//! - `KeyringStore`: one OS keychain entry per key

pub mod file;
pub mod keychain;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

/// Result type for durable storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value store.
///
/// Implementations must be safe to share across tasks; the token store holds
/// one behind an `Arc` and calls it from a background writer task.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove every listed key. Missing keys are not an error.
    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()>;
}
