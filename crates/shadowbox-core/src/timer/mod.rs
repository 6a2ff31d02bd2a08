mod engine;
mod queue;
mod schedule;
mod stopwatch;

pub use engine::{Countdown, PhaseState, PhaseTimer, TICK_MS, WARNING_WINDOW_MS};
pub use queue::{TimerHandle, TimerQueue};
pub use schedule::{
    Difficulty, Phase, RawWorkoutSettings, WorkoutConfig, MAX_COMBO_INTERVAL_SECS,
    MAX_PHASE_SECS, MAX_ROUNDS, MIN_COMBO_INTERVAL_SECS, MIN_ROUND_SECS, PREPARE_MS,
};
pub use stopwatch::{RoundSplit, RoundStopwatch, StopwatchState};

/// Keys for entries in the shared [`TimerQueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Phase timer re-evaluation.
    PhaseTick,
    /// Next combo call.
    ComboFire,
    /// One token of a combo being read out. `seq` identifies the combo.
    ComboToken { seq: u64, index: usize },
    /// Breathing runner one-second tick.
    BreathTick,
}
