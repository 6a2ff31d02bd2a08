use std::fmt;

use serde::{Deserialize, Serialize};

/// Defensive moves, only called on the hard tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Defense {
    Slip,
    Roll,
    Pivot,
    Duck,
    Block,
}

impl Defense {
    pub const ALL: [Defense; 5] = [
        Defense::Slip,
        Defense::Roll,
        Defense::Pivot,
        Defense::Duck,
        Defense::Block,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Defense::Slip => "Slip",
            Defense::Roll => "Roll",
            Defense::Pivot => "Pivot",
            Defense::Duck => "Duck",
            Defense::Block => "Block",
        }
    }
}

const PUNCHES: [(&str, &str); 6] = [
    ("Jab", "jab"),
    ("Cross", "cross"),
    ("Lead Hook", "lead-hook"),
    ("Rear Hook", "rear-hook"),
    ("Lead Uppercut", "lead-uppercut"),
    ("Rear Uppercut", "rear-uppercut"),
];

/// One token of a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Move {
    /// Punch number 1..=6.
    Punch(u8),
    Defense(Defense),
}

impl Move {
    pub const MAX_PUNCH: u8 = 6;

    /// Build a punch, rejecting numbers outside 1..=6.
    pub fn punch(number: u8) -> Option<Self> {
        (1..=Self::MAX_PUNCH)
            .contains(&number)
            .then_some(Move::Punch(number))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Move::Punch(n) => PUNCHES
                .get(usize::from(*n).wrapping_sub(1))
                .map(|(name, _)| *name)
                .unwrap_or("Punch"),
            Move::Defense(d) => d.name(),
        }
    }

    /// Audio asset id for this move.
    pub fn cue_id(&self) -> &'static str {
        match self {
            Move::Punch(n) => PUNCHES
                .get(usize::from(*n).wrapping_sub(1))
                .map(|(_, id)| *id)
                .unwrap_or("punch"),
            Move::Defense(Defense::Slip) => "slip",
            Move::Defense(Defense::Roll) => "roll",
            Move::Defense(Defense::Pivot) => "pivot",
            Move::Defense(Defense::Duck) => "duck",
            Move::Defense(Defense::Block) => "block",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Punch(n) => write!(f, "{n}"),
            Move::Defense(d) => f.write_str(d.name()),
        }
    }
}

/// An ordered sequence of moves called as one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Combo {
    pub moves: Vec<Move>,
}

impl Combo {
    pub fn new(moves: Vec<Move>) -> Self {
        Self { moves }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Short form shown on screen, e.g. `1 - 2 - Slip - 2`.
    pub fn display_text(&self) -> String {
        self.moves
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Long form with punch names, e.g. `Jab, Cross, Slip, Cross`.
    pub fn spoken_text(&self) -> String {
        self.moves
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn punch_numbers_are_bounded() {
        assert_eq!(Move::punch(0), None);
        assert_eq!(Move::punch(7), None);
        assert_eq!(Move::punch(3), Some(Move::Punch(3)));
    }

    #[test]
    fn names_and_cues() {
        assert_eq!(Move::Punch(1).name(), "Jab");
        assert_eq!(Move::Punch(6).cue_id(), "rear-uppercut");
        assert_eq!(Move::Defense(Defense::Duck).cue_id(), "duck");
    }

    #[test]
    fn combo_text_forms() {
        let combo = Combo::new(vec![
            Move::Punch(1),
            Move::Punch(2),
            Move::Defense(Defense::Slip),
            Move::Punch(2),
        ]);
        assert_eq!(combo.display_text(), "1 - 2 - Slip - 2");
        assert_eq!(combo.spoken_text(), "Jab, Cross, Slip, Cross");
    }

    #[test]
    fn move_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Move::Defense(Defense::Roll)).unwrap();
        assert_eq!(json, r#"{"kind":"defense","value":"roll"}"#);
    }
}
