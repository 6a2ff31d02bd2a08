use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Exercise {
    #[default]
    #[serde(rename = "box")]
    Box,
    #[serde(rename = "478")]
    FourSevenEight,
    #[serde(rename = "resonant")]
    Resonant,
}

impl Exercise {
    pub fn label(&self) -> &'static str {
        match self {
            Exercise::Box => "Box Breathing",
            Exercise::FourSevenEight => "4-7-8 Breathing",
            Exercise::Resonant => "Resonant Breathing",
        }
    }

    /// The fixed phase list for one cycle.
    pub fn pattern(&self) -> &'static [BreathPhase] {
        match self {
            Exercise::Box => BOX,
            Exercise::FourSevenEight => FOUR_SEVEN_EIGHT,
            Exercise::Resonant => RESONANT,
        }
    }

    pub fn cycle_secs(&self) -> u32 {
        self.pattern().iter().map(|p| p.secs).sum()
    }
}

impl std::str::FromStr for Exercise {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "box" => Ok(Exercise::Box),
            "478" | "4-7-8" => Ok(Exercise::FourSevenEight),
            "resonant" => Ok(Exercise::Resonant),
            other => Err(format!("unknown exercise '{other}' (expected box, 478 or resonant)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreathKind {
    Inhale,
    /// Hold with full lungs.
    Hold,
    Exhale,
    /// Hold with empty lungs.
    HoldOut,
}

impl BreathKind {
    pub fn name(&self) -> &'static str {
        match self {
            BreathKind::Inhale => "Breathe In",
            BreathKind::Hold | BreathKind::HoldOut => "Hold",
            BreathKind::Exhale => "Breathe Out",
        }
    }

    pub fn cue_id(&self) -> &'static str {
        match self {
            BreathKind::Inhale => "inhale",
            BreathKind::Hold | BreathKind::HoldOut => "hold",
            BreathKind::Exhale => "exhale",
        }
    }
}

/// What the guide ring is doing during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RingState {
    Expand,
    Full,
    Contract,
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPhase {
    pub kind: BreathKind,
    pub secs: u32,
    pub ring: RingState,
}

const fn phase(kind: BreathKind, secs: u32, ring: RingState) -> BreathPhase {
    BreathPhase { kind, secs, ring }
}

const BOX: &[BreathPhase] = &[
    phase(BreathKind::Inhale, 4, RingState::Expand),
    phase(BreathKind::Hold, 4, RingState::Full),
    phase(BreathKind::Exhale, 4, RingState::Contract),
    phase(BreathKind::HoldOut, 4, RingState::Empty),
];

const FOUR_SEVEN_EIGHT: &[BreathPhase] = &[
    phase(BreathKind::Inhale, 4, RingState::Expand),
    phase(BreathKind::Hold, 7, RingState::Full),
    phase(BreathKind::Exhale, 8, RingState::Contract),
];

const RESONANT: &[BreathPhase] = &[
    phase(BreathKind::Inhale, 5, RingState::Expand),
    phase(BreathKind::Exhale, 5, RingState::Contract),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_lengths() {
        assert_eq!(Exercise::Box.cycle_secs(), 16);
        assert_eq!(Exercise::FourSevenEight.cycle_secs(), 19);
        assert_eq!(Exercise::Resonant.cycle_secs(), 10);
    }

    #[test]
    fn exercise_serde_names() {
        assert_eq!(
            serde_json::to_string(&Exercise::FourSevenEight).unwrap(),
            "\"478\""
        );
        assert_eq!("4-7-8".parse::<Exercise>(), Ok(Exercise::FourSevenEight));
    }
}
