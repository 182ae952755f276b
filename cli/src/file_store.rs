use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use twin_match_core::{KeyValueStore, StorageError};

/// Progress backend kept as one flat JSON object on disk. Every write rewrites
/// the whole file through a temporary sibling and a rename, so a crash leaves
/// either the old or the new record.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RefCell<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a progress file", path.display()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("Could not read {}", path.display()));
            }
        };
        log::debug!("Opened {} with {} keys", path.display(), entries.len());
        Ok(Self {
            path,
            entries: RefCell::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(&*self.entries.borrow())
            .map_err(|err| StorageError::Backend(err.to_string()))?;
        write_atomic(&self.path, &raw).map_err(|err| {
            StorageError::Backend(format!("{}: {err}", self.path.display()))
        })
    }

    /// Puts back what `key` held before a change that could not be saved.
    fn restore(&self, key: &str, previous: Option<String>) {
        let mut entries = self.entries.borrow_mut();
        match previous {
            Some(value) => entries.insert(key.to_string(), value),
            None => entries.remove(key),
        };
    }
}

fn write_atomic(path: &Path, data: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    fs::rename(&tmp_path, path)
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.flush().inspect_err(|_| self.restore(key, previous))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let Some(previous) = self.entries.borrow_mut().remove(key) else {
            return Ok(());
        };
        self.flush().inspect_err(|_| self.restore(key, Some(previous)))
    }
}
