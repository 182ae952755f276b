use serde::{Deserialize, Serialize};

/// Handle of a scheduled callback, unique within one [`TimerQueue`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// Compare the two unresolved cards once both faces had time to be seen.
    ResolveMatch,
    /// Put every card back the way it was before the hint revealed the board.
    HintExpiry,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTimer {
    pub id: TimerId,
    pub kind: TimerKind,
    pub due_ms: u64,
}

/// Deferred callbacks owned by a round. Nothing fires on its own: the owner
/// pops whatever is due whenever the host reports the current time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerQueue {
    next_id: u64,
    pending: Vec<ScheduledTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, due_ms: u64) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(ScheduledTimer { id, kind, due_ms });
        log::trace!("scheduled {kind:?} at {due_ms}");
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.id != id);
        before != self.pending.len()
    }

    /// Drops every pending callback, returning how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|timer| timer.kind == kind)
    }

    pub fn deadline_of(&self, kind: TimerKind) -> Option<u64> {
        self.pending
            .iter()
            .filter(|timer| timer.kind == kind)
            .map(|timer| timer.due_ms)
            .min()
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.iter().map(|timer| timer.due_ms).min()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTimer> {
        self.pending.iter()
    }

    /// Removes and returns the earliest timer due at `now_ms`. Timers due at the
    /// same instant come out in scheduling order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTimer> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= now_ms)
            .min_by_key(|(_, timer)| (timer.due_ms, timer.id))?;
        Some(self.pending.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_due_returns_timers_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let late = queue.schedule(TimerKind::HintExpiry, 10_000);
        let early = queue.schedule(TimerKind::ResolveMatch, 1_000);

        assert_eq!(queue.next_deadline(), Some(1_000));
        assert_eq!(queue.pop_due(500), None);
        assert_eq!(queue.pop_due(20_000).map(|timer| timer.id), Some(early));
        assert_eq!(queue.pop_due(20_000).map(|timer| timer.id), Some(late));
        assert!(queue.is_empty());
    }

    #[test]
    fn equal_deadlines_keep_scheduling_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(TimerKind::HintExpiry, 5);
        queue.schedule(TimerKind::ResolveMatch, 5);

        assert_eq!(queue.pop_due(5).unwrap().kind, TimerKind::HintExpiry);
        assert_eq!(queue.pop_due(5).unwrap().kind, TimerKind::ResolveMatch);
    }

    #[test]
    fn cancelled_timers_never_fire() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(TimerKind::ResolveMatch, 1);
        queue.schedule(TimerKind::HintExpiry, 2);

        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert_eq!(queue.cancel_all(), 1);
        assert_eq!(queue.pop_due(u64::MAX), None);
    }
}
