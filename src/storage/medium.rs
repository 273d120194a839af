//! Durable key-value medium behind the store.
//! The core requires only `get`/`set`/`remove` over string keys and string
//! values; implementations fail solely on medium faults (an absent key is
//! `None`, never an error).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::AppResult;

/// Persistent string-keyed string storage scoped to one client instance.
pub trait StorageMedium: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

fn sanitize_filename(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// One UTF-8 file per key under an owned directory, written via a temp file
/// and rename so a crashed write never leaves a half-written slot.
pub struct DirMedium {
    dir: PathBuf,
}

impl DirMedium {
    pub fn new<P: AsRef<Path>>(dir: P) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_filename(key)))
    }
}

impl StorageMedium for DirMedium {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&path)?))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!(target: "tradepost::storage", "medium.set key='{}' bytes={}", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Ephemeral medium for tests and throwaway stores.
#[derive(Default)]
pub struct MemMedium {
    map: RwLock<HashMap<String, String>>,
}

impl StorageMedium for MemMedium {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.map.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.map.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.map.write().remove(key);
        Ok(())
    }
}
