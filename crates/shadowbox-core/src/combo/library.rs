//! Curated combo lists.
//!
//! Draws are uniform over the indices not yet used in the current shuffle
//! epoch. Once fewer than two unused entries remain the epoch ends and the
//! used-set is cleared, so for a library of N combos the reset happens after
//! N - 1 draws.

use std::collections::{HashMap, HashSet};

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;

use super::moves::{Combo, Defense, Move};
use super::ComboGenerator;
use crate::timer::Difficulty;

const J: Move = Move::Punch(1);
const C: Move = Move::Punch(2);
const LH: Move = Move::Punch(3);
const RH: Move = Move::Punch(4);
const LU: Move = Move::Punch(5);
const RU: Move = Move::Punch(6);
const SLIP: Move = Move::Defense(Defense::Slip);
const ROLL: Move = Move::Defense(Defense::Roll);
const PIVOT: Move = Move::Defense(Defense::Pivot);
const DUCK: Move = Move::Defense(Defense::Duck);
const BLOCK: Move = Move::Defense(Defense::Block);

const EASY: &[&[Move]] = &[
    &[J, C],
    &[J, J, C],
    &[J, LH],
    &[C, LH],
    &[J, C, LH],
    &[J, RU],
    &[LH, C],
    &[J, J],
    &[C, LH, C],
    &[J, RH],
    &[LU, C],
    &[J, C, J],
];

const MEDIUM: &[&[Move]] = &[
    &[J, C, LH, C],
    &[J, C, LU, C],
    &[J, RU, LH, C],
    &[LH, RH, LH],
    &[J, J, C, LH],
    &[C, LH, C, LH],
    &[J, C, LH, RH],
    &[LU, RU, LH, C],
    &[J, RH, LH],
    &[J, C, J, C],
    &[LH, C, LH, RU],
    &[J, LU, C, LH, C],
];

const HARD: &[&[Move]] = &[
    &[J, C, SLIP, C, LH, C],
    &[J, C, LH, ROLL, LH, C],
    &[J, RU, LH, C, PIVOT],
    &[LH, RH, DUCK, LU, RU],
    &[J, J, C, BLOCK, RH, LH],
    &[J, C, LU, C, LH, ROLL],
    &[SLIP, C, LH, C, DUCK],
    &[J, C, LH, RH, LU, RU],
    &[C, LH, ROLL, LH, C, PIVOT],
    &[J, SLIP, J, C, LH, RH],
    &[LU, RU, LH, RH, BLOCK, C],
    &[J, C, DUCK, LH, C, SLIP, C],
];

/// The curated list for a tier.
pub fn library_for(tier: Difficulty) -> &'static [&'static [Move]] {
    match tier {
        Difficulty::Easy => EASY,
        Difficulty::Medium => MEDIUM,
        Difficulty::Hard => HARD,
    }
}

pub struct LibraryGenerator {
    rng: Mcg128Xsl64,
    used: HashMap<Difficulty, HashSet<usize>>,
}

impl LibraryGenerator {
    /// `seed` = `None` seeds from entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self {
            rng,
            used: HashMap::new(),
        }
    }

    /// Number of indices used in the current epoch for `tier`.
    pub fn used_count(&self, tier: Difficulty) -> usize {
        self.used.get(&tier).map(HashSet::len).unwrap_or(0)
    }

    /// Draw an unused index for `tier` and mark it used.
    pub fn next_index(&mut self, tier: Difficulty) -> usize {
        let size = library_for(tier).len();
        let used = self.used.entry(tier).or_default();
        let unused: Vec<usize> = (0..size).filter(|i| !used.contains(i)).collect();
        let index = unused.choose(&mut self.rng).copied().unwrap_or(0);
        used.insert(index);
        if size - used.len() < 2 {
            tracing::debug!(?tier, "combo library epoch complete");
            used.clear();
        }
        index
    }
}

impl ComboGenerator for LibraryGenerator {
    fn next_combo(&mut self, tier: Difficulty) -> Combo {
        let index = self.next_index(tier);
        Combo::new(library_for(tier)[index].to_vec())
    }

    fn reset(&mut self) {
        self.used.clear();
    }
}
