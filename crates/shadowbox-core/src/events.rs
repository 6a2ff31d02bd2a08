use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::breathing::{BreathKind, Exercise};
use crate::combo::Combo;
use crate::timer::{Countdown, Phase};

/// Every state change in the system produces an Event.
/// Front-ends render them; the completion log listens for `WorkoutFinished`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    PhaseStarted {
        phase: Phase,
        previous: Option<Phase>,
        round: u32,
        total_rounds: u32,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownCue {
        cue: Countdown,
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerResynced {
        phase: Phase,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        at: DateTime<Utc>,
    },
    /// Last work phase ended. Fired once per finished workout.
    WorkoutFinished {
        rounds: u32,
        at: DateTime<Utc>,
    },
    /// The finished workout was written to the completion log.
    CompletionRecorded {
        date: NaiveDate,
        current_streak: u32,
        total_workouts: usize,
        at: DateTime<Utc>,
    },
    ComboCalled {
        combo: Combo,
        display: String,
        round: u32,
        at: DateTime<Utc>,
    },
    /// A combo firing landed too close to the end of the round.
    ComboSkipped {
        round: u32,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    BreathingStarted {
        exercise: Exercise,
        total_cycles: u32,
        at: DateTime<Utc>,
    },
    BreathingPhaseAdvanced {
        cycle: u32,
        completed: BreathKind,
        next: Option<BreathKind>,
        at: DateTime<Utc>,
    },
    BreathingPaused {
        at: DateTime<Utc>,
    },
    BreathingResumed {
        at: DateTime<Utc>,
    },
    BreathingStopped {
        at: DateTime<Utc>,
    },
    BreathingCompleted {
        exercise: Exercise,
        cycles: u32,
        at: DateTime<Utc>,
    },
    StopwatchStarted {
        at: DateTime<Utc>,
    },
    StopwatchPaused {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StopwatchResumed {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    RoundMarked {
        round: u32,
        split_ms: u64,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StopwatchReset {
        at: DateTime<Utc>,
    },
}
