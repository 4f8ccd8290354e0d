use alloc::vec::Vec;
use ndarray::Array2;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::*;

pub trait LayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout;
}

/// How much of the board around the first revealed cell is kept mine-free.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirstMovePolicy {
    /// No guarantee at all
    Random,
    /// The first revealed cell itself is safe
    SafeCell,
    /// The first revealed cell and its neighbours are safe, so it opens as a zero
    SafeZone,
}

impl Default for FirstMovePolicy {
    fn default() -> Self {
        Self::SafeZone
    }
}

/// Uniform placement over every cell the policy leaves eligible.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomLayoutGenerator {
    seed: u64,
    start: Coord2,
    policy: FirstMovePolicy,
}

impl RandomLayoutGenerator {
    pub fn new(seed: u64, start: Coord2, policy: FirstMovePolicy) -> Self {
        Self {
            seed,
            start,
            policy,
        }
    }

    /// Degrades the policy until the requested mines fit outside the safe area.
    fn effective_policy(&self, config: GameConfig) -> FirstMovePolicy {
        use FirstMovePolicy::*;

        let total_cells = config.total_cells();
        let safe_zone = NeighborIter::new(self.start, config.size).count() as CellCount + 1;

        match self.policy {
            Random => Random,
            SafeCell | SafeZone if config.mines + 1 > total_cells => {
                log::warn!("Cannot make first move safe, fallback to random");
                Random
            }
            SafeCell => SafeCell,
            SafeZone if config.mines + safe_zone > total_cells => {
                log::warn!("Cannot make first move a zero, fallback to safe cell");
                SafeCell
            }
            SafeZone => SafeZone,
        }
    }
}

impl LayoutGenerator for RandomLayoutGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use FirstMovePolicy::*;

        let total_cells = config.total_cells();
        let size = config.size;

        // optimize for full boards
        if config.mines >= total_cells {
            if config.mines > total_cells {
                log::warn!(
                    "Minefield already full, generated anyway, requested {} but only fits {}",
                    config.mines,
                    total_cells
                );
            }
            return MineLayout::build(Array2::from_elem(size.to_nd_index(), true));
        }

        let mut excluded: Array2<bool> = Array2::default(size.to_nd_index());
        match self.effective_policy(config) {
            Random => {}
            SafeCell => excluded[self.start.to_nd_index()] = true,
            SafeZone => {
                excluded[self.start.to_nd_index()] = true;
                for coords in NeighborIter::new(self.start, size) {
                    excluded[coords.to_nd_index()] = true;
                }
            }
        }

        let mut candidates: Vec<[usize; 2]> = excluded
            .indexed_iter()
            .filter(|&(_, &skip)| !skip)
            .map(|((row, col), _)| [row, col])
            .collect();

        let amount = usize::from(config.mines).min(candidates.len());
        let mut rng = SmallRng::seed_from_u64(self.seed);
        let (chosen, _) = candidates.partial_shuffle(&mut rng, amount);

        let mut mines: Array2<bool> = Array2::default(size.to_nd_index());
        for &index in chosen.iter() {
            mines[index] = true;
        }

        log::debug!(
            "placed {} mines on {}x{} board, start at {:?}",
            amount,
            size.0,
            size.1,
            self.start
        );
        MineLayout::build(mines)
    }
}
