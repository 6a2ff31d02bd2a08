mod pattern;
mod runner;

pub use pattern::{BreathKind, BreathPhase, Exercise, RingState};
pub use runner::{BreathingRunner, BreathingState, BREATH_TICK_MS, MAX_CYCLES};
