//! Single-threaded timer queue.
//!
//! Components register one-shot or repeating entries under a caller-defined
//! key and get back a [`TimerHandle`] they can cancel later. The owner of the
//! queue pops due entries with [`TimerQueue::pop_due`] and dispatches them.
//! Nothing here sleeps; the queue only compares deadlines against the `now`
//! it is given.

use std::fmt;

/// Cancel handle for a scheduled entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<K> {
    handle: TimerHandle,
    key: K,
    due_ms: u64,
    period_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TimerQueue<K> {
    entries: Vec<Entry<K>>,
    next_id: u64,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<K: Copy + fmt::Debug> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `key` once at `at_ms`.
    pub fn schedule_once(&mut self, key: K, at_ms: u64) -> TimerHandle {
        self.push(key, at_ms, None)
    }

    /// Fire `key` at `first_ms` and then every `period_ms` after each firing.
    ///
    /// The next due time is measured from the instant the entry was popped,
    /// so a long stall produces one late firing rather than a burst.
    pub fn schedule_repeating(&mut self, key: K, first_ms: u64, period_ms: u64) -> TimerHandle {
        self.push(key, first_ms, Some(period_ms.max(1)))
    }

    fn push(&mut self, key: K, due_ms: u64, period_ms: Option<u64>) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        tracing::trace!(?key, due_ms, ?period_ms, "timer scheduled");
        self.entries.push(Entry {
            handle,
            key,
            due_ms,
            period_ms,
        });
        handle
    }

    /// Remove an entry. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.handle != handle);
        before != self.entries.len()
    }

    /// Remove every entry whose key matches `pred`. Returns how many were removed.
    pub fn cancel_matching(&mut self, pred: impl Fn(&K) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !pred(&e.key));
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    /// Due time of the given entry, if it is still pending.
    pub fn due_ms(&self, handle: TimerHandle) -> Option<u64> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| e.due_ms)
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.entries.iter().map(|e| e.due_ms).min()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pop the earliest entry due at or before `now_ms`.
    ///
    /// Ties are broken by registration order. Repeating entries are pushed
    /// forward to `now_ms + period` and stay in the queue.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(TimerHandle, K)> {
        let idx = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due_ms <= now_ms)
            .min_by_key(|(_, e)| (e.due_ms, e.handle))
            .map(|(i, _)| i)?;

        let fired = (self.entries[idx].handle, self.entries[idx].key);
        match self.entries[idx].period_ms {
            Some(period) => self.entries[idx].due_ms = now_ms + period,
            None => {
                self.entries.swap_remove(idx);
            }
        }
        Some(fired)
    }
}
