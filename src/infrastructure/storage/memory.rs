use anyhow::Result;
use dashmap::DashMap;

use crate::domain::models::Storage;
use crate::domain::models::StorageKey;

/// State that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    values: DashMap<StorageKey, String>,
}

impl Storage for MemoryStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        return self.values.get(&key).map(|val| return val.to_string());
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        self.values.insert(key, value.to_string());
        return Ok(());
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        self.values.remove(&key);
        return Ok(());
    }
}
