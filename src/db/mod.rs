//! Persistence layer
//!
//! A synchronous key-value store of named string blobs with whole-value,
//! last-writer-wins semantics, and the survey repository on top of it.

pub mod file_store;
pub mod memory_store;
pub mod survey;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use survey::SurveyRepository;

/// Persistence read/write failure
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stored value for key '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored value for key '{key}' is not valid UTF-8: {source}")]
    NotUtf8 {
        key: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("failed to encode value for key '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StorageError {
    /// The stored bytes exist but cannot be decoded.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::Corrupt { .. } | StorageError::NotUtf8 { .. })
    }
}

/// Named blob storage, the process-side counterpart of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
