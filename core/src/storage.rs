use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::*;

/// Persistence backend behind the progress store. Implementations may sit on
/// browser local storage, a mobile key-value store or a plain file; the core
/// only ever uses these three calls.
#[allow(async_fn_in_trait)]
pub trait KeyValueStore {
    async fn get(&self, key: &str) -> core::result::Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> core::result::Result<(), StorageError>;
    async fn remove(&self, key: &str) -> core::result::Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    async fn get(&self, key: &str) -> core::result::Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> core::result::Result<(), StorageError> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> core::result::Result<(), StorageError> {
        (**self).remove(key).await
    }
}

/// Logical keys of the persisted progress record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProgressKey {
    CompletedLevels,
    UnlockedLevels,
    GlobalHints,
    RewardRemaining,
    LastInterstitialAd,
}

impl ProgressKey {
    pub const ALL: [Self; 5] = [
        Self::CompletedLevels,
        Self::UnlockedLevels,
        Self::GlobalHints,
        Self::RewardRemaining,
        Self::LastInterstitialAd,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompletedLevels => "completed_levels",
            Self::UnlockedLevels => "unlocked_levels",
            Self::GlobalHints => "global_hints",
            Self::RewardRemaining => "reward_remaining",
            Self::LastInterstitialAd => "last_interstitial_ad",
        }
    }

    pub fn qualified(self, namespace: &str) -> String {
        format!("{namespace}{}", self.as_str())
    }
}

/// In-memory backend, also handy for hosts without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K: Into<String>, V: Into<String>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            entries: RefCell::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
            writes: Cell::new(0),
        }
    }

    /// Current raw value, bypassing the async interface.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of `set` and `remove` calls served so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> core::result::Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> core::result::Result<(), StorageError> {
        self.writes.set(self.writes.get() + 1);
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> core::result::Result<(), StorageError> {
        self.writes.set(self.writes.get() + 1);
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
