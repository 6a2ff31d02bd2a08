mod library;
mod moves;
mod procedural;
mod scheduler;

use serde::{Deserialize, Serialize};

use crate::timer::Difficulty;

pub use library::{library_for, LibraryGenerator};
pub use moves::{Combo, Defense, Move};
pub use procedural::{length_range, ProceduralGenerator, DEFENSE_PROBABILITY, MAX_REDRAWS};
pub use scheduler::{
    effective_interval_ms, jittered_interval_ms, ComboScheduler, FireDecision,
    HARD_MIN_INTERVAL_MS, MAX_JITTER_MS, SETTLE_MS, SUPPRESS_WINDOW_MS,
};

/// Gap between the spoken tokens of one combo.
pub const TOKEN_GAP_MS: u64 = 400;

/// Source of combos for a difficulty tier.
pub trait ComboGenerator: Send {
    fn next_combo(&mut self, tier: Difficulty) -> Combo;

    /// Forget any per-session history.
    fn reset(&mut self) {}
}

/// Which generator a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComboMode {
    #[default]
    Library,
    Procedural,
}

impl ComboMode {
    pub fn generator(self, seed: Option<u64>) -> Box<dyn ComboGenerator> {
        match self {
            ComboMode::Library => Box::new(LibraryGenerator::new(seed)),
            ComboMode::Procedural => Box::new(ProceduralGenerator::new(seed)),
        }
    }
}

impl std::str::FromStr for ComboMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "library" => Ok(ComboMode::Library),
            "procedural" => Ok(ComboMode::Procedural),
            other => Err(format!("unknown combo mode '{other}' (expected library or procedural)")),
        }
    }
}
