use serde::{Deserialize, Serialize};

use crate::combo::ComboMode;

/// Length of the get-ready phase before round 1.
pub const PREPARE_MS: u64 = 3_000;

pub const MIN_ROUND_SECS: u64 = 10;
pub const MAX_PHASE_SECS: u64 = 3_600;
pub const MAX_ROUNDS: u32 = 50;
pub const MIN_COMBO_INTERVAL_SECS: u64 = 4;
pub const MAX_COMBO_INTERVAL_SECS: u64 = 10;

/// A timed segment of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Prepare,
    Work,
    Rest,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Prepare => "Get Ready",
            Phase::Work => "Work",
            Phase::Rest => "Rest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (expected easy, medium or hard)")),
        }
    }
}

/// Settings for one workout session.
///
/// The phase timer re-reads its copy at the start of every work phase, so
/// changes made mid-workout land at the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutConfig {
    #[serde(default = "default_round_secs")]
    pub round_secs: u64,
    #[serde(default = "default_rest_secs")]
    pub rest_secs: u64,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_combo_interval_secs")]
    pub combo_interval_secs: u64,
    #[serde(default = "default_true")]
    pub voice_announcements: bool,
    #[serde(default)]
    pub single_combo_per_round: bool,
    #[serde(default)]
    pub combo_mode: ComboMode,
}

fn default_round_secs() -> u64 {
    180
}
fn default_rest_secs() -> u64 {
    60
}
fn default_total_rounds() -> u32 {
    3
}
fn default_combo_interval_secs() -> u64 {
    6
}
fn default_true() -> bool {
    true
}

impl Default for WorkoutConfig {
    fn default() -> Self {
        Self {
            round_secs: default_round_secs(),
            rest_secs: default_rest_secs(),
            total_rounds: default_total_rounds(),
            difficulty: Difficulty::default(),
            combo_interval_secs: default_combo_interval_secs(),
            voice_announcements: true,
            single_combo_per_round: false,
            combo_mode: ComboMode::default(),
        }
    }
}

impl WorkoutConfig {
    /// Clamp every field into its supported range.
    pub fn validated(mut self) -> Self {
        self.round_secs = self.round_secs.clamp(MIN_ROUND_SECS, MAX_PHASE_SECS);
        self.rest_secs = self.rest_secs.min(MAX_PHASE_SECS);
        self.total_rounds = self.total_rounds.clamp(1, MAX_ROUNDS);
        self.combo_interval_secs = self
            .combo_interval_secs
            .clamp(MIN_COMBO_INTERVAL_SECS, MAX_COMBO_INTERVAL_SECS);
        self
    }

    pub fn round_ms(&self) -> u64 {
        self.round_secs.saturating_mul(1000)
    }

    pub fn rest_ms(&self) -> u64 {
        self.rest_secs.saturating_mul(1000)
    }

    pub fn combo_interval_ms(&self) -> u64 {
        self.combo_interval_secs.saturating_mul(1000)
    }

    /// Configured length of `phase` in milliseconds.
    pub fn phase_ms(&self, phase: Phase) -> u64 {
        match phase {
            Phase::Prepare => PREPARE_MS,
            Phase::Work => self.round_ms(),
            Phase::Rest => self.rest_ms(),
        }
    }

    /// Apply raw settings on top of this config.
    ///
    /// Any numeric field that is missing, NaN, infinite or negative keeps the
    /// current value, so a bad read never reaches deadline arithmetic.
    pub fn merged(&self, raw: &RawWorkoutSettings) -> Self {
        let next = Self {
            round_secs: pick_secs("round_secs", raw.round_secs, self.round_secs, false),
            rest_secs: pick_secs("rest_secs", raw.rest_secs, self.rest_secs, true),
            total_rounds: pick_secs(
                "total_rounds",
                raw.total_rounds,
                self.total_rounds as u64,
                false,
            ) as u32,
            difficulty: raw.difficulty.unwrap_or(self.difficulty),
            combo_interval_secs: pick_secs(
                "combo_interval_secs",
                raw.combo_interval_secs,
                self.combo_interval_secs,
                false,
            ),
            voice_announcements: raw.voice_announcements.unwrap_or(self.voice_announcements),
            single_combo_per_round: raw
                .single_combo_per_round
                .unwrap_or(self.single_combo_per_round),
            combo_mode: raw.combo_mode.unwrap_or(self.combo_mode),
        };
        next.validated()
    }
}

fn pick_secs(field: &str, raw: Option<f64>, fallback: u64, allow_zero: bool) -> u64 {
    match raw {
        None => fallback,
        Some(v) if v.is_finite() && (v > 0.0 || (allow_zero && v == 0.0)) => v.round() as u64,
        Some(v) => {
            tracing::warn!(field, value = v, fallback, "ignoring invalid workout setting");
            fallback
        }
    }
}

/// Loosely-typed settings as read from a form, flags, or other outer surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawWorkoutSettings {
    pub round_secs: Option<f64>,
    pub rest_secs: Option<f64>,
    pub total_rounds: Option<f64>,
    pub difficulty: Option<Difficulty>,
    pub combo_interval_secs: Option<f64>,
    pub voice_announcements: Option<bool>,
    pub single_combo_per_round: Option<bool>,
    pub combo_mode: Option<ComboMode>,
}
