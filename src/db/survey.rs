//! Survey record set persistence: one JSON blob under a fixed key

use tracing::{info, warn};

use super::{KeyValueStore, StorageError};
use crate::defaults::STORAGE_KEY;
use crate::types::RecordSet;

pub struct SurveyRepository<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> SurveyRepository<S> {
    pub fn new(store: S) -> Self {
        Self::with_key(store, STORAGE_KEY)
    }

    pub fn with_key(store: S, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// Strict load; corrupt JSON is an error.
    pub fn load(&self) -> Result<Option<RecordSet>, StorageError> {
        let Some(content) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: self.key.clone(),
                source,
            })
    }

    /// Fail-open load: unreadable or corrupt data is treated as empty, and a
    /// corrupt entry is cleared so the next start is clean.
    pub fn load_or_recover(&self) -> Option<RecordSet> {
        match self.load() {
            Ok(Some(records)) => {
                info!("Loaded {} stored records", records.len());
                Some(records)
            }
            Ok(None) => None,
            Err(e) if e.is_corrupt() => {
                warn!("Discarding stored survey data: {}", e);
                if let Err(e) = self.store.remove(&self.key) {
                    warn!("Failed to clear corrupt survey data: {}", e);
                }
                None
            }
            Err(e) => {
                warn!("Failed to load survey data, starting empty: {}", e);
                None
            }
        }
    }

    pub fn save(&self, records: &RecordSet) -> Result<(), StorageError> {
        let json = serde_json::to_string(records).map_err(|source| StorageError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.set(&self.key, &json)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}
