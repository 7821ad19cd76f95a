#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;

use crate::domain::models::Storage;
use crate::domain::models::StorageKey;

/// Keeps client state in a single JSON object on disk so it survives between
/// invocations.
pub struct FileStorage {
    pub file_path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(file_path: PathBuf) -> FileStorage {
        return FileStorage {
            file_path,
            lock: Mutex::new(()),
        };
    }

    // Serializes file access only, poisoning carries no state.
    fn guard(&self) -> MutexGuard<'_, ()> {
        return self.lock.lock().unwrap_or_else(|e| return e.into_inner());
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(_) => return BTreeMap::new(),
        };

        match serde_json::from_str(&contents) {
            Ok(values) => return values,
            Err(err) => {
                tracing::warn!(
                    error = ?err,
                    path = ?self.file_path,
                    "State file is corrupt, starting empty"
                );
                return BTreeMap::new();
            }
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_string_pretty(values)?;
        fs::write(&self.file_path, payload)?;

        return Ok(());
    }

    fn update<F: FnOnce(&mut BTreeMap<String, String>)>(&self, f: F) -> Result<()> {
        let _guard = self.guard();

        let mut values = self.read_all();
        f(&mut values);

        return self.write_all(&values);
    }
}

impl Storage for FileStorage {
    fn get(&self, key: StorageKey) -> Option<String> {
        let _guard = self.guard();
        return self.read_all().remove(&key.to_string());
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        return self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        });
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        return self.update(|values| {
            values.remove(&key.to_string());
        });
    }
}
