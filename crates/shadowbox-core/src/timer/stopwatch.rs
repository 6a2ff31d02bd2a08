//! Free-running round stopwatch.
//!
//! Counts up instead of down. Elapsed time is `accumulated + (now - anchor)`
//! while running, so it is correct however rarely it is sampled.

use serde::{Deserialize, Serialize};

use crate::clock::to_datetime;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchState {
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSplit {
    pub round: u32,
    pub split_ms: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundStopwatch {
    accumulated_ms: u64,
    anchor_ms: Option<u64>,
    started: bool,
    splits: Vec<RoundSplit>,
}

impl RoundStopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> StopwatchState {
        match (self.started, self.anchor_ms) {
            (false, _) => StopwatchState::Idle,
            (true, Some(_)) => StopwatchState::Running,
            (true, None) => StopwatchState::Paused,
        }
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        let running = self
            .anchor_ms
            .map(|a| now_ms.saturating_sub(a))
            .unwrap_or(0);
        self.accumulated_ms + running
    }

    /// Round currently being timed (1-indexed once started).
    pub fn current_round(&self) -> u32 {
        if self.started {
            self.splits.len() as u32 + 1
        } else {
            0
        }
    }

    /// Time spent in the current round so far.
    pub fn current_split_ms(&self, now_ms: u64) -> u64 {
        let marked = self.splits.last().map(|s| s.elapsed_ms).unwrap_or(0);
        self.elapsed_ms(now_ms).saturating_sub(marked)
    }

    pub fn splits(&self) -> &[RoundSplit] {
        &self.splits
    }

    pub fn start(&mut self, now_ms: u64) -> Option<Event> {
        if self.started {
            return None;
        }
        self.started = true;
        self.anchor_ms = Some(now_ms);
        Some(Event::StopwatchStarted {
            at: to_datetime(now_ms),
        })
    }

    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        let anchor = self.anchor_ms.take()?;
        self.accumulated_ms += now_ms.saturating_sub(anchor);
        Some(Event::StopwatchPaused {
            elapsed_ms: self.accumulated_ms,
            at: to_datetime(now_ms),
        })
    }

    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        if self.state() != StopwatchState::Paused {
            return None;
        }
        self.anchor_ms = Some(now_ms);
        Some(Event::StopwatchResumed {
            elapsed_ms: self.accumulated_ms,
            at: to_datetime(now_ms),
        })
    }

    /// Close the current round and start timing the next one.
    pub fn mark_round(&mut self, now_ms: u64) -> Option<Event> {
        if !self.started {
            return None;
        }
        let split = RoundSplit {
            round: self.current_round(),
            split_ms: self.current_split_ms(now_ms),
            elapsed_ms: self.elapsed_ms(now_ms),
        };
        self.splits.push(split);
        Some(Event::RoundMarked {
            round: split.round,
            split_ms: split.split_ms,
            elapsed_ms: split.elapsed_ms,
            at: to_datetime(now_ms),
        })
    }

    pub fn reset(&mut self, now_ms: u64) -> Option<Event> {
        if !self.started {
            return None;
        }
        *self = Self::default();
        Some(Event::StopwatchReset {
            at: to_datetime(now_ms),
        })
    }
}
