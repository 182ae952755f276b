use futures_util::lock::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::*;

/// Result of a progress operation that never fails outright. A degraded value
/// is the documented default (or best effort) returned because the backend
/// could not be read or written; the error says why.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailSoft<T> {
    Fresh(T),
    Degraded(T, StorageError),
}

impl<T> FailSoft<T> {
    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Degraded(value, _) => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(value) | Self::Degraded(value, _) => value,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(..))
    }

    pub fn error(&self) -> Option<&StorageError> {
        match self {
            Self::Fresh(_) => None,
            Self::Degraded(_, error) => Some(error),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FailSoft<U> {
        match self {
            Self::Fresh(value) => FailSoft::Fresh(f(value)),
            Self::Degraded(value, error) => FailSoft::Degraded(f(value), error),
        }
    }

    /// Keeps this value, inheriting the first error of either side.
    pub fn merge<U>(self, other: FailSoft<U>) -> Self {
        match (self, other) {
            (Self::Fresh(value), FailSoft::Degraded(_, error)) => Self::Degraded(value, error),
            (this, _) => this,
        }
    }

    fn degrade(self, error: StorageError) -> Self {
        match self {
            Self::Fresh(value) => Self::Degraded(value, error),
            degraded => degraded,
        }
    }

    /// Whether what was read can be written back without clobbering data the
    /// backend merely failed to return.
    fn safe_to_overwrite(&self) -> bool {
        !matches!(self, Self::Degraded(_, StorageError::Backend(_)))
    }
}

/// One entry of the level-select screen.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStatus {
    pub level: Level,
    pub unlocked: bool,
    pub completed: bool,
}

/// Durable player progress: completed and unlocked levels, the global hint and
/// reward-credit balances, and the interstitial cooldown.
///
/// Every operation is a read-modify-write against the backend. They are
/// serialized through an async lock so overlapping calls from different tasks
/// (a hint being spent while a completion unlocks the next level) cannot lose
/// each other's writes.
pub struct ProgressStore<S, C> {
    backend: S,
    clock: C,
    rules: ProgressRules,
    txn: Mutex<()>,
}

impl<S: KeyValueStore, C: Clock> ProgressStore<S, C> {
    pub fn new(backend: S, clock: C, rules: ProgressRules) -> Self {
        Self {
            backend,
            clock,
            rules,
            txn: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn rules(&self) -> &ProgressRules {
        &self.rules
    }

    pub async fn completed_levels(&self) -> FailSoft<BTreeSet<Level>> {
        let _txn = self.txn.lock().await;
        self.load_completed().await
    }

    /// Records `level` as completed and, below the progression cap, unlocks the
    /// level after it.
    pub async fn complete_level(&self, level: Level) -> FailSoft<()> {
        let _txn = self.txn.lock().await;

        let completed = self.load_completed().await;
        let mut outcome = FailSoft::Fresh(());
        if completed.safe_to_overwrite() {
            let mut levels = completed.value().clone();
            if levels.insert(level) {
                outcome = outcome.merge(
                    self.store_levels(ProgressKey::CompletedLevels, &levels)
                        .await,
                );
            }
        }
        outcome = outcome.merge(completed);

        if level < self.rules.max_progression_level {
            outcome = outcome.merge(self.add_unlocked(level + 1).await);
        }
        outcome
    }

    pub async fn is_level_completed(&self, level: Level) -> FailSoft<bool> {
        self.completed_levels()
            .await
            .map(|levels| levels.contains(&level))
    }

    /// Unlocked levels. Level 1 is always part of the set; if the stored set
    /// lacks it, it is added and written back before returning.
    pub async fn unlocked_levels(&self) -> FailSoft<BTreeSet<Level>> {
        let _txn = self.txn.lock().await;
        self.load_unlocked().await
    }

    pub async fn unlock_level(&self, level: Level) -> FailSoft<()> {
        let _txn = self.txn.lock().await;
        self.add_unlocked(level).await
    }

    pub async fn is_level_unlocked(&self, level: Level) -> FailSoft<bool> {
        self.unlocked_levels()
            .await
            .map(|levels| levels.contains(&level))
    }

    /// Status of every level from 1 to the configured total.
    pub async fn level_overview(&self) -> FailSoft<Vec<LevelStatus>> {
        let _txn = self.txn.lock().await;
        let unlocked = self.load_unlocked().await;
        let completed = self.load_completed().await;

        let overview = (1..=self.rules.total_levels)
            .map(|level| LevelStatus {
                level,
                unlocked: unlocked.value().contains(&level),
                completed: completed.value().contains(&level),
            })
            .collect();
        FailSoft::Fresh(overview).merge(unlocked).merge(completed)
    }

    pub async fn global_hints(&self) -> FailSoft<u32> {
        let _txn = self.txn.lock().await;
        self.load_balance(ProgressKey::GlobalHints, self.rules.starting_hints)
            .await
    }

    pub async fn add_global_hints(&self, amount: u32) -> FailSoft<u32> {
        let _txn = self.txn.lock().await;
        let current = self
            .load_balance(ProgressKey::GlobalHints, self.rules.starting_hints)
            .await;
        let updated = current.value().saturating_add(amount);
        self.replace_balance(ProgressKey::GlobalHints, current, updated)
            .await
    }

    /// Spends one hint and returns the new balance. An empty balance stays at
    /// zero and nothing is written.
    pub async fn use_global_hint(&self) -> FailSoft<u32> {
        let _txn = self.txn.lock().await;
        let current = self
            .load_balance(ProgressKey::GlobalHints, self.rules.starting_hints)
            .await;
        if *current.value() == 0 {
            return current;
        }
        let updated = current.value() - 1;
        self.replace_balance(ProgressKey::GlobalHints, current, updated)
            .await
    }

    pub async fn reward_remaining(&self) -> FailSoft<u32> {
        let _txn = self.txn.lock().await;
        self.load_balance(
            ProgressKey::RewardRemaining,
            self.rules.starting_reward_credits,
        )
        .await
    }

    pub async fn set_reward_remaining(&self, credits: u32) -> FailSoft<()> {
        let _txn = self.txn.lock().await;
        self.store_count(ProgressKey::RewardRemaining, u64::from(credits))
            .await
    }

    /// Spends one reward credit, with the same floor at zero as hints.
    pub async fn use_reward(&self) -> FailSoft<u32> {
        let _txn = self.txn.lock().await;
        let current = self
            .load_balance(
                ProgressKey::RewardRemaining,
                self.rules.starting_reward_credits,
            )
            .await;
        if *current.value() == 0 {
            return current;
        }
        let updated = current.value() - 1;
        self.replace_balance(ProgressKey::RewardRemaining, current, updated)
            .await
    }

    pub async fn last_interstitial_ad_time(&self) -> FailSoft<Option<u64>> {
        let _txn = self.txn.lock().await;
        self.load_last_interstitial().await
    }

    /// True when no interstitial was ever shown, or the last one is at least
    /// the cooldown old.
    pub async fn should_show_interstitial_ad(&self) -> FailSoft<bool> {
        let _txn = self.txn.lock().await;
        let now = self.clock.now_millis();
        let cooldown = self.rules.interstitial_cooldown_ms;
        self.load_last_interstitial().await.map(|last| match last {
            None => true,
            Some(shown_at) => now.saturating_sub(shown_at) >= cooldown,
        })
    }

    pub async fn save_last_interstitial_ad_time(&self) -> FailSoft<()> {
        let _txn = self.txn.lock().await;
        let now = self.clock.now_millis();
        self.store_count(ProgressKey::LastInterstitialAd, now).await
    }

    /// Forgets completed and unlocked levels and both balances. The interstitial
    /// cooldown is kept.
    pub async fn reset_progress(&self) -> FailSoft<()> {
        let _txn = self.txn.lock().await;
        let mut outcome = FailSoft::Fresh(());
        for key in [
            ProgressKey::CompletedLevels,
            ProgressKey::UnlockedLevels,
            ProgressKey::GlobalHints,
            ProgressKey::RewardRemaining,
        ] {
            if let Err(err) = self.backend.remove(&self.key(key)).await {
                log::error!("Could not reset {}: {err}", key.as_str());
                outcome = outcome.degrade(err);
            }
        }
        log::info!("Progress reset");
        outcome
    }

    fn key(&self, key: ProgressKey) -> String {
        key.qualified(&self.rules.namespace)
    }

    async fn load_completed(&self) -> FailSoft<BTreeSet<Level>> {
        soften(
            ProgressKey::CompletedLevels,
            self.read_levels(ProgressKey::CompletedLevels).await,
            |levels| levels.unwrap_or_default(),
            BTreeSet::new,
        )
    }

    async fn load_unlocked(&self) -> FailSoft<BTreeSet<Level>> {
        let stored = match self.read_levels(ProgressKey::UnlockedLevels).await {
            Ok(stored) => stored,
            Err(err) => {
                log::warn!("Could not read unlocked levels, only level 1 is open: {err}");
                return FailSoft::Degraded(BTreeSet::from([1]), err);
            }
        };

        let missing = stored.is_none();
        let mut levels = stored.unwrap_or_default();
        if levels.insert(1) || missing {
            let written = self
                .store_levels(ProgressKey::UnlockedLevels, &levels)
                .await;
            return FailSoft::Fresh(levels).merge(written);
        }
        FailSoft::Fresh(levels)
    }

    async fn add_unlocked(&self, level: Level) -> FailSoft<()> {
        let unlocked = self.load_unlocked().await;
        if !unlocked.safe_to_overwrite() {
            return unlocked.map(|_| ());
        }

        let mut levels = unlocked.value().clone();
        let outcome = FailSoft::Fresh(()).merge(unlocked);
        if levels.insert(level) {
            log::debug!("Unlocked level {level}");
            return outcome.merge(
                self.store_levels(ProgressKey::UnlockedLevels, &levels)
                    .await,
            );
        }
        outcome
    }

    async fn load_balance(&self, key: ProgressKey, default: u32) -> FailSoft<u32> {
        soften(
            key,
            self.read_count(key).await,
            |count| count.map_or(default, |count| u32::try_from(count).unwrap_or(u32::MAX)),
            || default,
        )
    }

    async fn replace_balance(
        &self,
        key: ProgressKey,
        current: FailSoft<u32>,
        updated: u32,
    ) -> FailSoft<u32> {
        if !current.safe_to_overwrite() {
            return current.map(|_| updated);
        }
        let written = self.store_count(key, u64::from(updated)).await;
        FailSoft::Fresh(updated).merge(current).merge(written)
    }

    async fn load_last_interstitial(&self) -> FailSoft<Option<u64>> {
        soften(
            ProgressKey::LastInterstitialAd,
            self.read_count(ProgressKey::LastInterstitialAd).await,
            |shown_at| shown_at.filter(|&millis| millis > 0),
            || None,
        )
    }

    async fn read_levels(
        &self,
        key: ProgressKey,
    ) -> core::result::Result<Option<BTreeSet<Level>>, StorageError> {
        let Some(raw) = self.backend.get(&self.key(key)).await? else {
            return Ok(None);
        };
        serde_json::from_str::<Vec<Level>>(&raw)
            .map(|levels| Some(levels.into_iter().collect()))
            .map_err(|err| malformed(key, err))
    }

    async fn read_count(&self, key: ProgressKey) -> core::result::Result<Option<u64>, StorageError> {
        let Some(raw) = self.backend.get(&self.key(key)).await? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|err| malformed(key, err))
    }

    async fn store_levels(&self, key: ProgressKey, levels: &BTreeSet<Level>) -> FailSoft<()> {
        let raw = match serde_json::to_string(levels) {
            Ok(raw) => raw,
            Err(err) => return FailSoft::Degraded((), malformed(key, err)),
        };
        self.store_raw(key, &raw).await
    }

    async fn store_count(&self, key: ProgressKey, count: u64) -> FailSoft<()> {
        self.store_raw(key, &count.to_string()).await
    }

    async fn store_raw(&self, key: ProgressKey, raw: &str) -> FailSoft<()> {
        match self.backend.set(&self.key(key), raw).await {
            Ok(()) => FailSoft::Fresh(()),
            Err(err) => {
                log::error!("Could not save {}: {err}", key.as_str());
                FailSoft::Degraded((), err)
            }
        }
    }
}

fn malformed(key: ProgressKey, err: impl core::fmt::Display) -> StorageError {
    StorageError::Malformed {
        key: key.as_str().to_string(),
        reason: err.to_string(),
    }
}

/// Turns a backend read into a fail-soft value, logging the fault.
fn soften<R, T>(
    key: ProgressKey,
    read: core::result::Result<R, StorageError>,
    present: impl FnOnce(R) -> T,
    fallback: impl FnOnce() -> T,
) -> FailSoft<T> {
    match read {
        Ok(raw) => FailSoft::Fresh(present(raw)),
        Err(err) => {
            log::warn!("Could not read {}, using default: {err}", key.as_str());
            FailSoft::Degraded(fallback(), err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use futures::future::join;
    use std::cell::Cell;
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    const NS: &str = "@twin_match:";

    fn key(key: ProgressKey) -> String {
        key.qualified(NS)
    }

    fn store<'a>(
        backend: &'a MemoryStore,
        clock: &'a ManualClock,
    ) -> ProgressStore<&'a MemoryStore, &'a ManualClock> {
        ProgressStore::new(backend, clock, ProgressRules::default())
    }

    fn levels(levels: impl IntoIterator<Item = Level>) -> BTreeSet<Level> {
        levels.into_iter().collect()
    }

    /// Backend whose reads and writes can be made to fail independently.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: Cell<bool>,
        fail_writes: Cell<bool>,
    }

    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> core::result::Result<Option<String>, StorageError> {
            if self.fail_reads.get() {
                return Err(StorageError::Backend("read refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> core::result::Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Backend("write refused".to_string()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> core::result::Result<(), StorageError> {
            if self.fail_writes.get() {
                return Err(StorageError::Backend("write refused".to_string()));
            }
            self.inner.remove(key).await
        }
    }

    /// Backend that suspends once inside every call, so joined operations
    /// interleave at each await.
    #[derive(Default)]
    struct YieldingStore {
        inner: MemoryStore,
    }

    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                return Poll::Ready(());
            }
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    impl KeyValueStore for YieldingStore {
        async fn get(&self, key: &str) -> core::result::Result<Option<String>, StorageError> {
            YieldOnce(false).await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> core::result::Result<(), StorageError> {
            YieldOnce(false).await;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> core::result::Result<(), StorageError> {
            YieldOnce(false).await;
            self.inner.remove(key).await
        }
    }

    #[test]
    fn fresh_record_has_documented_defaults() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        block_on(async {
            assert_eq!(progress.completed_levels().await, FailSoft::Fresh(levels([])));
            assert_eq!(progress.unlocked_levels().await, FailSoft::Fresh(levels([1])));
            assert_eq!(progress.global_hints().await, FailSoft::Fresh(3));
            assert_eq!(progress.reward_remaining().await, FailSoft::Fresh(3));
            assert_eq!(progress.last_interstitial_ad_time().await, FailSoft::Fresh(None));
        });

        assert_eq!(backend.raw(&key(ProgressKey::UnlockedLevels)).as_deref(), Some("[1]"));
    }

    #[test]
    fn completing_a_level_unlocks_the_next_one_once() {
        let backend = MemoryStore::with_entries([(
            key(ProgressKey::UnlockedLevels),
            "[1,2,3,4,5]",
        )]);
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        block_on(async {
            assert!(!progress.complete_level(5).await.is_degraded());
            assert!(!progress.complete_level(5).await.is_degraded());

            assert_eq!(progress.unlocked_levels().await.into_value(), levels(1..=6));
            assert_eq!(progress.completed_levels().await.into_value(), levels([5]));
            assert!(progress.is_level_completed(5).await.into_value());
            assert!(progress.is_level_unlocked(6).await.into_value());
            assert!(!progress.is_level_unlocked(7).await.into_value());
        });

        assert_eq!(backend.raw(&key(ProgressKey::CompletedLevels)).as_deref(), Some("[5]"));
    }

    #[test]
    fn progression_stops_at_the_cap() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        block_on(async {
            let _ = progress.complete_level(29).await;
            let _ = progress.complete_level(30).await;
            let _ = progress.complete_level(31).await;

            let unlocked = progress.unlocked_levels().await.into_value();
            assert!(unlocked.contains(&30));
            assert!(!unlocked.contains(&31));
            assert!(!unlocked.contains(&32));
            assert_eq!(progress.completed_levels().await.into_value(), levels([29, 30, 31]));
        });
    }

    #[test]
    fn missing_level_one_is_restored_and_persisted() {
        let backend = MemoryStore::with_entries([(key(ProgressKey::UnlockedLevels), "[3,2]")]);
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        let unlocked = block_on(progress.unlocked_levels());

        assert_eq!(unlocked, FailSoft::Fresh(levels([1, 2, 3])));
        assert_eq!(
            backend.raw(&key(ProgressKey::UnlockedLevels)).as_deref(),
            Some("[1,2,3]")
        );
    }

    #[test]
    fn spending_an_empty_hint_balance_writes_nothing() {
        let backend = MemoryStore::with_entries([(key(ProgressKey::GlobalHints), "0")]);
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        let remaining = block_on(progress.use_global_hint());

        assert_eq!(remaining, FailSoft::Fresh(0));
        assert_eq!(backend.write_count(), 0);
    }

    #[test]
    fn hint_and_reward_balances_floor_at_zero() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        block_on(async {
            assert_eq!(progress.use_global_hint().await.into_value(), 2);
            assert_eq!(progress.use_global_hint().await.into_value(), 1);
            assert_eq!(progress.use_global_hint().await.into_value(), 0);
            assert_eq!(progress.use_global_hint().await.into_value(), 0);
            assert_eq!(progress.add_global_hints(3).await.into_value(), 3);

            let _ = progress.set_reward_remaining(1).await;
            assert_eq!(progress.use_reward().await.into_value(), 0);
            assert_eq!(progress.use_reward().await.into_value(), 0);
        });

        assert_eq!(backend.raw(&key(ProgressKey::GlobalHints)).as_deref(), Some("3"));
        assert_eq!(backend.raw(&key(ProgressKey::RewardRemaining)).as_deref(), Some("0"));
    }

    #[test]
    fn malformed_values_degrade_to_defaults() {
        let backend = MemoryStore::with_entries([
            (key(ProgressKey::CompletedLevels), "not json"),
            (key(ProgressKey::UnlockedLevels), "{\"a\":1}"),
            (key(ProgressKey::GlobalHints), "lots"),
            (key(ProgressKey::RewardRemaining), "-1"),
        ]);
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        block_on(async {
            let completed = progress.completed_levels().await;
            assert!(completed.is_degraded());
            assert!(matches!(completed.error(), Some(StorageError::Malformed { .. })));
            assert_eq!(completed.into_value(), levels([]));

            assert_eq!(progress.unlocked_levels().await.into_value(), levels([1]));
            assert_eq!(progress.global_hints().await.into_value(), 3);
            assert_eq!(progress.reward_remaining().await.into_value(), 3);
        });
    }

    #[test]
    fn malformed_completed_set_is_healed_on_next_completion() {
        let backend = MemoryStore::with_entries([(key(ProgressKey::CompletedLevels), "oops")]);
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        let outcome = block_on(progress.complete_level(1));

        assert!(outcome.is_degraded());
        assert_eq!(backend.raw(&key(ProgressKey::CompletedLevels)).as_deref(), Some("[1]"));
    }

    #[test]
    fn unreadable_backend_never_clobbers_stored_progress() {
        let backend = FlakyStore::default();
        let clock = ManualClock::new(0);
        let progress = ProgressStore::new(&backend, &clock, ProgressRules::default());

        block_on(async {
            let _ = progress.complete_level(4).await;
            backend.fail_reads.set(true);

            let outcome = progress.complete_level(9).await;
            assert!(outcome.is_degraded());
            assert!(progress.use_global_hint().await.is_degraded());
            assert_eq!(progress.unlocked_levels().await.into_value(), levels([1]));

            backend.fail_reads.set(false);
            assert_eq!(progress.completed_levels().await.into_value(), levels([4]));
            assert_eq!(progress.unlocked_levels().await.into_value(), levels([1, 5]));
            assert_eq!(progress.global_hints().await.into_value(), 3);
        });
    }

    #[test]
    fn overlapping_operations_do_not_lose_writes() {
        let backend = YieldingStore::default();
        let clock = ManualClock::new(0);
        let progress = ProgressStore::new(&backend, &clock, ProgressRules::default());

        block_on(async {
            let (first, second) = join(progress.use_global_hint(), progress.use_global_hint()).await;
            let mut spent = [first.into_value(), second.into_value()];
            spent.sort_unstable();
            assert_eq!(spent, [1, 2]);
            assert_eq!(progress.global_hints().await.into_value(), 1);

            let (completed, unlocked) = join(progress.complete_level(3), progress.unlock_level(9)).await;
            assert!(!completed.is_degraded() && !unlocked.is_degraded());
            assert_eq!(progress.unlocked_levels().await.into_value(), levels([1, 4, 9]));
            assert_eq!(progress.completed_levels().await.into_value(), levels([3]));
        });
    }

    #[test]
    fn failed_writes_are_reported_not_raised() {
        let backend = FlakyStore::default();
        backend.fail_writes.set(true);
        let clock = ManualClock::new(0);
        let progress = ProgressStore::new(&backend, &clock, ProgressRules::default());

        block_on(async {
            let spent = progress.use_global_hint().await;
            assert!(spent.is_degraded());
            assert_eq!(spent.into_value(), 2);

            assert!(progress.complete_level(1).await.is_degraded());
            assert!(progress.save_last_interstitial_ad_time().await.is_degraded());
            assert!(progress.reset_progress().await.is_degraded());
        });
    }

    #[test]
    fn interstitial_respects_the_five_minute_cooldown() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(1_700_000_000_000);
        let progress = store(&backend, &clock);

        block_on(async {
            assert!(progress.should_show_interstitial_ad().await.into_value());

            let _ = progress.save_last_interstitial_ad_time().await;
            assert!(!progress.should_show_interstitial_ad().await.into_value());

            clock.advance(299_999);
            assert!(!progress.should_show_interstitial_ad().await.into_value());

            clock.advance(1);
            assert!(progress.should_show_interstitial_ad().await.into_value());
            assert_eq!(
                progress.last_interstitial_ad_time().await.into_value(),
                Some(1_700_000_000_000)
            );
        });
    }

    #[test]
    fn reset_clears_progress_but_keeps_the_ad_cooldown() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(5_000);
        let progress = store(&backend, &clock);

        block_on(async {
            let _ = progress.complete_level(3).await;
            let _ = progress.add_global_hints(2).await;
            let _ = progress.set_reward_remaining(0).await;
            let _ = progress.save_last_interstitial_ad_time().await;

            assert!(!progress.reset_progress().await.is_degraded());

            assert_eq!(progress.completed_levels().await.into_value(), levels([]));
            assert_eq!(progress.global_hints().await.into_value(), 3);
            assert_eq!(progress.reward_remaining().await.into_value(), 3);
        });

        assert_eq!(backend.raw(&key(ProgressKey::LastInterstitialAd)).as_deref(), Some("5000"));
        assert_eq!(backend.raw(&key(ProgressKey::CompletedLevels)), None);
    }

    #[test]
    fn overview_lists_every_level() {
        let backend = MemoryStore::new();
        let clock = ManualClock::new(0);
        let progress = store(&backend, &clock);

        let overview = block_on(async {
            let _ = progress.complete_level(1).await;
            progress.level_overview().await.into_value()
        });

        assert_eq!(overview.len(), 200);
        assert_eq!(
            overview[0],
            LevelStatus {
                level: 1,
                unlocked: true,
                completed: true
            }
        );
        assert!(overview[1].unlocked && !overview[1].completed);
        assert!(!overview[2].unlocked);
    }
}
