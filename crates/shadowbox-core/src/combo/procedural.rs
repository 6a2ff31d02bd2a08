//! Randomly assembled combos.

use std::ops::RangeInclusive;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use super::moves::{Combo, Defense, Move};
use super::ComboGenerator;
use crate::timer::Difficulty;

/// Redraws allowed before a repeated punch is accepted.
pub const MAX_REDRAWS: usize = 10;

/// Chance of a trailing defensive move on the hard tier.
pub const DEFENSE_PROBABILITY: f64 = 0.3;

pub fn length_range(tier: Difficulty) -> RangeInclusive<usize> {
    match tier {
        Difficulty::Easy => 2..=3,
        Difficulty::Medium => 3..=5,
        Difficulty::Hard => 4..=8,
    }
}

pub struct ProceduralGenerator {
    rng: Mcg128Xsl64,
}

impl ProceduralGenerator {
    /// `seed` = `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { rng }
    }

    fn next_punch(&mut self, previous: Option<u8>) -> u8 {
        let rng = &mut self.rng;
        draw_punch(previous, || rng.gen_range(1..=Move::MAX_PUNCH))
    }
}

/// Draw until the punch differs from `previous`, giving up after
/// [`MAX_REDRAWS`] redraws and accepting the repeat.
fn draw_punch(previous: Option<u8>, mut draw: impl FnMut() -> u8) -> u8 {
    let mut punch = draw();
    for _ in 0..MAX_REDRAWS {
        if Some(punch) != previous {
            break;
        }
        punch = draw();
    }
    punch
}

impl ComboGenerator for ProceduralGenerator {
    fn next_combo(&mut self, tier: Difficulty) -> Combo {
        let len = self.rng.gen_range(length_range(tier));
        let mut moves = Vec::with_capacity(len + 1);
        let mut previous = None;
        for _ in 0..len {
            let punch = self.next_punch(previous);
            moves.push(Move::Punch(punch));
            previous = Some(punch);
        }
        if tier == Difficulty::Hard && self.rng.gen_bool(DEFENSE_PROBABILITY) {
            if let Some(defense) = Defense::ALL.choose(&mut self.rng) {
                moves.push(Move::Defense(*defense));
            }
        }
        Combo::new(moves)
    }
}
