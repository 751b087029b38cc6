//! Pattern generation
//!
//! A pattern is the set of cells to remember plus the order they are shown in.

use std::collections::VecDeque;

use rand::Rng;
use rand::SeedableRng;
use rand::seq::{SliceRandom, index};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Cells selected for one round and their reveal order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    /// `selected[i]` is true when cell `i` belongs to the pattern
    selected: Vec<bool>,
    /// Permutation of the selected cells
    order: Vec<usize>,
}

impl Pattern {
    /// Build a pattern from an explicit reveal order
    pub fn from_order(order: Vec<usize>, grid_size: usize) -> Result<Self> {
        if order.is_empty() || order.len() > grid_size {
            return Err(GameError::InvalidLength {
                length: order.len(),
                grid_size,
            });
        }

        let mut selected = vec![false; grid_size];
        for &cell in &order {
            if cell >= grid_size {
                return Err(GameError::InvalidOrder(format!(
                    "cell {cell} is outside a grid of {grid_size}"
                )));
            }
            if selected[cell] {
                return Err(GameError::InvalidOrder(format!("cell {cell} appears twice")));
            }
            selected[cell] = true;
        }

        Ok(Self { selected, order })
    }

    /// Number of cells in the pattern
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn grid_size(&self) -> usize {
        self.selected.len()
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.selected.get(cell).copied().unwrap_or(false)
    }

    /// Selected cells in ascending index order
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected
            .iter()
            .enumerate()
            .filter(|&(_, &on)| on)
            .map(|(i, _)| i)
    }

    /// Reveal order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Fresh queue of the cells the player still has to click, front first
    pub fn expected_queue(&self) -> VecDeque<usize> {
        self.order.iter().copied().collect()
    }
}

/// Draw `length` distinct cells from `0..grid_size` and a uniform reveal order for them
pub fn generate<R: Rng + ?Sized>(rng: &mut R, length: usize, grid_size: usize) -> Result<Pattern> {
    if length == 0 || length > grid_size {
        return Err(GameError::InvalidLength { length, grid_size });
    }

    let mut selected = vec![false; grid_size];
    for cell in index::sample(rng, grid_size, length) {
        selected[cell] = true;
    }

    // Shuffle independently of the draw order (Fisher-Yates)
    let mut order: Vec<usize> = (0..grid_size).filter(|&i| selected[i]).collect();
    order.shuffle(rng);

    Ok(Pattern { selected, order })
}

/// Supplies the pattern for each round
pub trait PatternSource {
    fn next_pattern(&mut self, length: usize, grid_size: usize) -> Result<Pattern>;
}

/// Production source backed by a seedable RNG
#[derive(Debug, Clone)]
pub struct RandomPatterns<R = Pcg32> {
    rng: R,
}

impl RandomPatterns<Pcg32> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomPatterns<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> PatternSource for RandomPatterns<R> {
    fn next_pattern(&mut self, length: usize, grid_size: usize) -> Result<Pattern> {
        generate(&mut self.rng, length, grid_size)
    }
}

/// Replays a fixed list of reveal orders, one per round
///
/// Once the list runs out it falls back to the seeded generator so a session
/// can always continue.
#[derive(Debug, Clone)]
pub struct ScriptedPatterns {
    script: VecDeque<Vec<usize>>,
    fallback: RandomPatterns,
}

impl ScriptedPatterns {
    pub fn new<I>(orders: I) -> Self
    where
        I: IntoIterator<Item = Vec<usize>>,
    {
        Self {
            script: orders.into_iter().collect(),
            fallback: RandomPatterns::seeded(0),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PatternSource for ScriptedPatterns {
    fn next_pattern(&mut self, length: usize, grid_size: usize) -> Result<Pattern> {
        match self.script.pop_front() {
            Some(order) => {
                if order.len() != length {
                    return Err(GameError::InvalidLength {
                        length: order.len(),
                        grid_size,
                    });
                }
                Pattern::from_order(order, grid_size)
            }
            None => self.fallback.next_pattern(length, grid_size),
        }
    }
}
