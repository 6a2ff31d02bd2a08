//! Jittered combo call schedule.
//!
//! Active only during work phases. The first call lands after a short settle
//! delay; each later call is scheduled from the moment the previous one
//! fired, at the base interval plus or minus up to a second of jitter.

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use crate::timer::{Difficulty, TimerHandle, TimerKey, TimerQueue, WorkoutConfig};

/// Delay between the start of a round and its first combo.
pub const SETTLE_MS: u64 = 2_000;
/// Maximum jitter applied either side of the base interval.
pub const MAX_JITTER_MS: u64 = 1_000;
/// Hard-tier combos are long; calls closer than this overlap.
pub const HARD_MIN_INTERVAL_MS: u64 = 8_000;
/// No calls once less than this remains in the round.
pub const SUPPRESS_WINDOW_MS: u64 = 12_000;

/// Base interval after the hard-tier floor is applied.
pub fn effective_interval_ms(tier: Difficulty, base_ms: u64) -> u64 {
    match tier {
        Difficulty::Hard => base_ms.max(HARD_MIN_INTERVAL_MS),
        _ => base_ms,
    }
}

/// Base interval shifted by `draw` in `[0, 1)`: 0 gives `-MAX_JITTER_MS`,
/// 0.5 gives no shift, values near 1 approach `+MAX_JITTER_MS`.
pub fn jittered_interval_ms(base_ms: u64, draw: f64) -> u64 {
    let draw = if draw.is_finite() { draw.clamp(0.0, 1.0) } else { 0.5 };
    let offset = (draw * 2.0 - 1.0) * MAX_JITTER_MS as f64;
    (base_ms as f64 + offset).round().max(0.0) as u64
}

/// What to do with a combo firing that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireDecision {
    Call,
    /// Too close to the end of the round.
    Skip,
}

pub struct ComboScheduler {
    rng: Mcg128Xsl64,
    pending: Option<TimerHandle>,
    /// Time left until the next call, held while paused.
    suspended_ms: Option<u64>,
    interval_ms: u64,
    single_per_round: bool,
}

impl ComboScheduler {
    /// `seed` = `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            pending: None,
            suspended_ms: None,
            interval_ms: 0,
            single_per_round: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.pending.is_some() || self.suspended_ms.is_some()
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// A work phase just started.
    pub fn begin_work(
        &mut self,
        now_ms: u64,
        config: &WorkoutConfig,
        queue: &mut TimerQueue<TimerKey>,
    ) {
        self.cancel(queue);
        self.interval_ms = effective_interval_ms(config.difficulty, config.combo_interval_ms());
        self.single_per_round = config.single_combo_per_round;
        self.pending = Some(queue.schedule_once(TimerKey::ComboFire, now_ms + SETTLE_MS));
    }

    /// The pending `ComboFire` entry came due.
    ///
    /// A call with too little of the round left is skipped; the schedule
    /// carries on at the normal interval either way.
    pub fn on_fire(
        &mut self,
        now_ms: u64,
        work_remaining_ms: u64,
        queue: &mut TimerQueue<TimerKey>,
    ) -> FireDecision {
        self.pending = None;
        if !self.single_per_round {
            let next = jittered_interval_ms(self.interval_ms, self.rng.gen::<f64>());
            self.pending = Some(queue.schedule_once(TimerKey::ComboFire, now_ms + next));
        }
        if work_remaining_ms < SUPPRESS_WINDOW_MS {
            tracing::debug!(work_remaining_ms, "combo call suppressed near end of round");
            FireDecision::Skip
        } else {
            FireDecision::Call
        }
    }

    pub fn suspend(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) {
        if let Some(handle) = self.pending.take() {
            let due = queue.due_ms(handle).unwrap_or(now_ms);
            queue.cancel(handle);
            self.suspended_ms = Some(due.saturating_sub(now_ms));
        }
    }

    pub fn resume(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) {
        if let Some(left) = self.suspended_ms.take() {
            self.pending = Some(queue.schedule_once(TimerKey::ComboFire, now_ms + left));
        }
    }

    pub fn cancel(&mut self, queue: &mut TimerQueue<TimerKey>) {
        if let Some(handle) = self.pending.take() {
            queue.cancel(handle);
        }
        self.suspended_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(difficulty: Difficulty, interval_secs: u64, single: bool) -> WorkoutConfig {
        WorkoutConfig {
            difficulty,
            combo_interval_secs: interval_secs,
            single_combo_per_round: single,
            ..WorkoutConfig::default()
        }
    }

    #[test]
    fn jitter_is_a_pure_function_of_the_draw() {
        assert_eq!(jittered_interval_ms(6_000, 0.0), 5_000);
        assert_eq!(jittered_interval_ms(6_000, 0.5), 6_000);
        assert_eq!(jittered_interval_ms(6_000, 0.75), 6_500);
        assert_eq!(jittered_interval_ms(6_000, f64::NAN), 6_000);
        assert_eq!(jittered_interval_ms(500, 0.0), 0);
    }

    #[test]
    fn hard_tier_interval_floor() {
        assert_eq!(effective_interval_ms(Difficulty::Hard, 5_000), 8_000);
        assert_eq!(effective_interval_ms(Difficulty::Hard, 9_000), 9_000);
        assert_eq!(effective_interval_ms(Difficulty::Easy, 5_000), 5_000);
    }

    #[test]
    fn first_call_after_settle_delay() {
        let mut q = TimerQueue::new();
        let mut s = ComboScheduler::new(Some(1));
        s.begin_work(10_000, &config(Difficulty::Medium, 6, false), &mut q);
        assert_eq!(q.next_due_ms(), Some(12_000));
        assert!(q.pop_due(11_999).is_none());
        assert_eq!(q.pop_due(12_000).map(|(_, k)| k), Some(TimerKey::ComboFire));
        assert_eq!(s.on_fire(12_000, 100_000, &mut q), FireDecision::Call);
        let next = q.next_due_ms().unwrap();
        assert!((17_000..=19_000).contains(&next), "next call at {next}");
    }

    #[test]
    fn single_combo_mode_stops_after_first_call() {
        let mut q = TimerQueue::new();
        let mut s = ComboScheduler::new(Some(1));
        s.begin_work(0, &config(Difficulty::Easy, 5, true), &mut q);
        q.pop_due(2_000);
        assert_eq!(s.on_fire(2_000, 100_000, &mut q), FireDecision::Call);
        assert!(q.is_empty());
        assert!(!s.is_active());
    }

    #[test]
    fn calls_near_round_end_are_skipped() {
        let mut q = TimerQueue::new();
        let mut s = ComboScheduler::new(Some(1));
        s.begin_work(0, &config(Difficulty::Medium, 6, false), &mut q);
        q.pop_due(2_000);
        assert_eq!(s.on_fire(2_000, 11_999, &mut q), FireDecision::Skip);
        assert_eq!(s.on_fire(2_000, 12_000, &mut q), FireDecision::Call);
    }

    #[test]
    fn suspend_and_resume_preserve_time_to_next_call() {
        let mut q = TimerQueue::new();
        let mut s = ComboScheduler::new(Some(1));
        s.begin_work(0, &config(Difficulty::Medium, 6, false), &mut q);
        s.suspend(500, &mut q);
        assert!(q.is_empty());
        assert!(s.is_active());
        s.resume(60_000, &mut q);
        assert_eq!(q.next_due_ms(), Some(61_500));
        s.cancel(&mut q);
        assert!(q.is_empty());
        assert!(!s.is_active());
    }
}
