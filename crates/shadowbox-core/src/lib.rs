//! # Shadowbox Core Library
//!
//! Core logic for the Shadowbox shadow-boxing interval timer. Every
//! operation is available through the standalone CLI binary; any other
//! front-end is a thin layer over the same controllers.
//!
//! ## Architecture
//!
//! - **Timer**: A deadline-based phase state machine driven by a scheduled
//!   callback queue the caller pumps on a short interval
//! - **Combos**: Jittered call scheduling and two interchangeable generators
//!   (curated library and procedural)
//! - **Breathing**: Fixed-pattern guided breathing cycles
//! - **Storage**: TOML configuration and a SQLite key-value store holding
//!   the completed-workout log
//!
//! ## Key Components
//!
//! - [`WorkoutController`]: Owns a workout session end to end
//! - [`PhaseTimer`]: Prepare / work / rest state machine
//! - [`ComboScheduler`] and [`ComboGenerator`]: When and what to call
//! - [`BreathingController`]: Guided breathing session
//! - [`CompletionLog`]: Completed-workout dates and streaks
//! - [`Config`]: Application configuration management

pub mod breathing;
pub mod clock;
pub mod combo;
pub mod controller;
pub mod cues;
pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use breathing::{BreathKind, BreathingRunner, BreathingState, Exercise};
pub use clock::{Clock, ManualClock, SystemClock};
pub use combo::{Combo, ComboGenerator, ComboMode, ComboScheduler, Move};
pub use controller::{
    BreathingController, BreathingSnapshot, CueOutputs, WorkoutController, WorkoutSnapshot,
};
pub use cues::{AudioCueEmitter, Cue, Haptic, HapticEmitter, WakeLock};
pub use error::{ConfigError, CoreError, StorageError, WakeLockError};
pub use events::Event;
pub use stats::{CompletionLog, CompletionStats};
pub use storage::{Config, Database, PersistenceStore};
pub use timer::{
    Difficulty, Phase, PhaseState, PhaseTimer, RoundStopwatch, TimerKey, TimerQueue,
    WorkoutConfig,
};
