pub mod file;
pub mod memory;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Storage;
use crate::domain::models::StorageName;

pub type StorageBox = Arc<dyn Storage + Send + Sync>;

pub struct StorageManager {}

impl StorageManager {
    pub fn get(name: StorageName) -> Result<StorageBox> {
        if name == StorageName::File {
            let path = PathBuf::from(Config::get(ConfigKey::StateFile));
            return Ok(Arc::new(file::FileStorage::new(path)));
        }

        if name == StorageName::Memory {
            return Ok(Arc::<memory::MemoryStorage>::default());
        }

        bail!(format!("No storage implemented for {name}"))
    }
}
