//! Phase timer implementation.
//!
//! The phase timer is a deadline-based state machine. Each running phase
//! stores the absolute instant it ends; every tick recomputes
//! `remaining = deadline - now`, so late or skipped ticks never accumulate
//! drift. The timer registers its own repeating tick in the shared
//! [`TimerQueue`]; the owner of the queue is responsible for calling `tick()`
//! when that entry comes due.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Prepare -> Work -> Rest -> Work -> ... -> Work -> Finished
//! Prepare | Work | Rest -> Paused -> (phase paused in)
//! any -> Idle (stop)
//! ```

use serde::{Deserialize, Serialize};

use super::queue::{TimerHandle, TimerQueue};
use super::schedule::{Phase, WorkoutConfig};
use super::TimerKey;
use crate::clock::to_datetime;
use crate::events::Event;

/// Nominal re-evaluation interval. Only affects display smoothness; phase
/// completion is decided by the deadline.
pub const TICK_MS: u64 = 50;

/// Remaining time at or below which the countdown warning is shown.
pub const WARNING_WINDOW_MS: u64 = 10_000;

/// Flat view of the timer state for display and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseState {
    Idle,
    Prepare,
    Work,
    Rest,
    Paused,
    Finished,
}

/// Countdown cues fired as the remaining time crosses whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Countdown {
    TenSeconds,
    Three,
    Two,
    One,
}

impl Countdown {
    /// Cue for the moment `floor(remaining_secs)` becomes `whole`.
    fn for_second(phase: Phase, whole: u64) -> Option<Self> {
        match (phase, whole) {
            (Phase::Work, 9) => Some(Countdown::TenSeconds),
            (Phase::Work | Phase::Rest, 2) => Some(Countdown::Three),
            (Phase::Work | Phase::Rest, 1) => Some(Countdown::Two),
            (Phase::Work | Phase::Rest, 0) => Some(Countdown::One),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Idle,
    Running { phase: Phase, deadline_ms: u64 },
    Paused { phase: Phase, remaining_ms: u64 },
    Finished,
}

#[derive(Debug, Clone)]
pub struct PhaseTimer {
    config: WorkoutConfig,
    /// Settings changed mid-session, adopted at the next work phase.
    pending_config: Option<WorkoutConfig>,
    status: Status,
    round: u32,
    tick: Option<TimerHandle>,
    last_remaining_ms: Option<u64>,
    last_cue_second: Option<u64>,
}

impl PhaseTimer {
    pub fn new(config: WorkoutConfig) -> Self {
        Self {
            config: config.validated(),
            pending_config: None,
            status: Status::Idle,
            round: 0,
            tick: None,
            last_remaining_ms: None,
            last_cue_second: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> PhaseState {
        match self.status {
            Status::Idle => PhaseState::Idle,
            Status::Running { phase, .. } => match phase {
                Phase::Prepare => PhaseState::Prepare,
                Phase::Work => PhaseState::Work,
                Phase::Rest => PhaseState::Rest,
            },
            Status::Paused { .. } => PhaseState::Paused,
            Status::Finished => PhaseState::Finished,
        }
    }

    /// Phase currently running or paused in.
    pub fn phase(&self) -> Option<Phase> {
        match self.status {
            Status::Running { phase, .. } | Status::Paused { phase, .. } => Some(phase),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, Status::Running { .. })
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.total_rounds
    }

    pub fn config(&self) -> &WorkoutConfig {
        &self.config
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        match self.status {
            Status::Running { deadline_ms, .. } => Some(deadline_ms),
            _ => None,
        }
    }

    pub fn paused_remaining_ms(&self) -> Option<u64> {
        match self.status {
            Status::Paused { remaining_ms, .. } => Some(remaining_ms),
            _ => None,
        }
    }

    /// Remaining time in the current phase. Frozen while paused.
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        match self.status {
            Status::Running { deadline_ms, .. } => deadline_ms.saturating_sub(now_ms),
            Status::Paused { remaining_ms, .. } => remaining_ms,
            Status::Idle | Status::Finished => 0,
        }
    }

    /// True while a work or rest phase is inside its final ten seconds.
    pub fn in_warning(&self, now_ms: u64) -> bool {
        match self.status {
            Status::Running {
                phase: Phase::Work | Phase::Rest,
                deadline_ms,
            } => deadline_ms.saturating_sub(now_ms) <= WARNING_WINDOW_MS,
            _ => false,
        }
    }

    /// Replace the settings. Takes effect immediately when no session is
    /// active, otherwise at the start of the next work phase.
    pub fn set_config(&mut self, config: WorkoutConfig) {
        let config = config.validated();
        match self.status {
            Status::Idle | Status::Finished => self.config = config,
            _ => self.pending_config = Some(config),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        match self.status {
            Status::Idle | Status::Finished => {
                if let Some(cfg) = self.pending_config.take() {
                    self.config = cfg;
                }
                self.round = 0;
                self.cancel_tick(queue);
                self.tick = Some(queue.schedule_repeating(
                    TimerKey::PhaseTick,
                    now_ms + TICK_MS,
                    TICK_MS,
                ));
                tracing::info!(
                    total_rounds = self.config.total_rounds,
                    round_secs = self.config.round_secs,
                    rest_secs = self.config.rest_secs,
                    "workout started"
                );
                Some(self.enter(Phase::Prepare, None, now_ms))
            }
            _ => {
                tracing::debug!(state = ?self.state(), "start ignored");
                None
            }
        }
    }

    pub fn pause(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        let Status::Running { phase, deadline_ms } = self.status else {
            tracing::debug!(state = ?self.state(), "pause ignored");
            return None;
        };
        let remaining_ms = deadline_ms.saturating_sub(now_ms);
        self.status = Status::Paused {
            phase,
            remaining_ms,
        };
        self.cancel_tick(queue);
        tracing::info!(?phase, remaining_ms, "timer paused");
        Some(Event::TimerPaused {
            phase,
            remaining_ms,
            at: to_datetime(now_ms),
        })
    }

    pub fn resume(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        let Status::Paused {
            phase,
            remaining_ms,
        } = self.status
        else {
            tracing::debug!(state = ?self.state(), "resume ignored");
            return None;
        };
        self.status = Status::Running {
            phase,
            deadline_ms: now_ms + remaining_ms,
        };
        self.tick = Some(queue.schedule_repeating(
            TimerKey::PhaseTick,
            now_ms + TICK_MS,
            TICK_MS,
        ));
        tracing::info!(?phase, remaining_ms, "timer resumed");
        Some(Event::TimerResumed {
            phase,
            remaining_ms,
            at: to_datetime(now_ms),
        })
    }

    /// Restart the current work or rest phase at its full configured length.
    pub fn resync(&mut self, now_ms: u64) -> Option<Event> {
        let phase = match self.status {
            Status::Running {
                phase: phase @ (Phase::Work | Phase::Rest),
                ..
            } => phase,
            _ => {
                tracing::debug!(state = ?self.state(), "resync ignored");
                return None;
            }
        };
        let remaining_ms = self.config.phase_ms(phase);
        self.status = Status::Running {
            phase,
            deadline_ms: now_ms + remaining_ms,
        };
        self.last_remaining_ms = None;
        self.last_cue_second = None;
        tracing::info!(?phase, remaining_ms, "timer resynced");
        Some(Event::TimerResynced {
            phase,
            remaining_ms,
            at: to_datetime(now_ms),
        })
    }

    pub fn stop(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        self.cancel_tick(queue);
        let was_idle = self.status == Status::Idle;
        self.status = Status::Idle;
        self.round = 0;
        self.last_remaining_ms = None;
        self.last_cue_second = None;
        if let Some(cfg) = self.pending_config.take() {
            self.config = cfg;
        }
        if was_idle {
            return None;
        }
        tracing::info!("workout stopped");
        Some(Event::TimerStopped {
            at: to_datetime(now_ms),
        })
    }

    /// Re-evaluate the deadline. Performs at most one phase transition.
    pub fn tick(&mut self, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Option<Event> {
        let Status::Running { phase, deadline_ms } = self.status else {
            return None;
        };
        let remaining_ms = deadline_ms.saturating_sub(now_ms);
        if remaining_ms == 0 {
            return Some(self.complete(phase, now_ms, queue));
        }

        let cue = self.countdown_crossing(phase, remaining_ms);
        self.last_remaining_ms = Some(remaining_ms);
        cue.map(|cue| Event::CountdownCue {
            cue,
            phase,
            remaining_ms,
            at: to_datetime(now_ms),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, phase: Phase, now_ms: u64, queue: &mut TimerQueue<TimerKey>) -> Event {
        match phase {
            Phase::Prepare => self.enter(Phase::Work, Some(phase), now_ms),
            Phase::Work if self.round < self.config.total_rounds => {
                self.enter(Phase::Rest, Some(phase), now_ms)
            }
            Phase::Work => {
                self.status = Status::Finished;
                self.cancel_tick(queue);
                tracing::info!(rounds = self.round, "workout finished");
                Event::WorkoutFinished {
                    rounds: self.round,
                    at: to_datetime(now_ms),
                }
            }
            Phase::Rest => self.enter(Phase::Work, Some(phase), now_ms),
        }
    }

    fn enter(&mut self, phase: Phase, previous: Option<Phase>, now_ms: u64) -> Event {
        if phase == Phase::Work {
            if let Some(cfg) = self.pending_config.take() {
                self.config = cfg;
            }
            self.round += 1;
            // A shortened workout still finishes the round it is in.
            if self.config.total_rounds < self.round {
                self.config.total_rounds = self.round;
            }
        }
        let duration_ms = self.config.phase_ms(phase);
        self.status = Status::Running {
            phase,
            deadline_ms: now_ms + duration_ms,
        };
        self.last_remaining_ms = None;
        self.last_cue_second = None;
        tracing::info!(?phase, round = self.round, duration_ms, "phase started");
        Event::PhaseStarted {
            phase,
            previous,
            round: self.round,
            total_rounds: self.config.total_rounds,
            duration_ms,
            at: to_datetime(now_ms),
        }
    }

    /// Detect a whole-second boundary crossing since the previous tick.
    ///
    /// At most one cue per tick, never two for the same second.
    fn countdown_crossing(&mut self, phase: Phase, remaining_ms: u64) -> Option<Countdown> {
        let previous = self.last_remaining_ms.unwrap_or(remaining_ms + TICK_MS);
        let whole = remaining_ms / 1000;
        if whole >= previous / 1000 || self.last_cue_second == Some(whole) {
            return None;
        }
        let cue = Countdown::for_second(phase, whole)?;
        self.last_cue_second = Some(whole);
        Some(cue)
    }

    fn cancel_tick(&mut self, queue: &mut TimerQueue<TimerKey>) {
        if let Some(handle) = self.tick.take() {
            queue.cancel(handle);
        }
    }
}
