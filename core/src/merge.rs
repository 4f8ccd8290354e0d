//! Sliding-tile merge game (2048).
//!
//! The score is the sum of all tile values and is recomputed after every
//! change, so it doubles as a checksum of the grid rather than a tally of
//! merge events.

use alloc::vec::Vec;
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Tile value; zero marks an empty cell.
pub type Tile = u32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub rows: Coord,
    pub cols: Coord,
}

impl MergeConfig {
    pub fn new(rows: Coord, cols: Coord) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing slid or merged, no tile should be spawned
    NoChange,
    /// At least one tile changed position or value
    Moved { merges: u16 },
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergeGrid {
    cells: Array2<Tile>,
    score: u32,
    state: EngineState,
}

impl MergeGrid {
    /// Empty grid seeded with two random tiles.
    pub fn new<R: Rng + ?Sized>(config: MergeConfig, rng: &mut R) -> Self {
        let mut grid = Self {
            cells: Array2::zeros((config.rows.into(), config.cols.into())),
            score: 0,
            state: EngineState::Ready,
        };
        grid.spawn_tile(rng);
        grid.spawn_tile(rng);
        grid.refresh();
        log::debug!("new {}x{} merge grid", config.rows, config.cols);
        grid
    }

    /// Builds a grid from explicit tiles, for replays and tests.
    pub fn from_cells(cells: Array2<Tile>) -> Result<Self> {
        let (rows, cols) = cells.dim();
        if cells.is_empty() || rows > Coord::MAX.into() || cols > Coord::MAX.into() {
            return Err(GameError::InvalidBoardShape);
        }
        if cells.iter().any(|&tile| !is_valid_tile(tile)) {
            return Err(GameError::InvalidTile);
        }
        // merges conserve the sum, so no merge can overflow once it fits
        if tile_sum(&cells).is_none() {
            return Err(GameError::InvalidTile);
        }
        let mut grid = Self {
            cells,
            score: 0,
            state: EngineState::Ready,
        };
        grid.refresh();
        Ok(grid)
    }

    pub fn cells(&self) -> &Array2<Tile> {
        &self.cells
    }

    pub fn tile_at(&self, coords: Coord2) -> Result<Tile> {
        self.cells
            .get(coords.to_nd_index())
            .copied()
            .ok_or(GameError::InvalidCoords)
    }

    pub fn size(&self) -> Coord2 {
        dims(&self.cells)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_finished()
    }

    pub fn max_tile(&self) -> Tile {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|&&tile| tile == 0).count()
    }

    /// Whether no empty cell and no adjacent equal pair remain.
    pub fn is_terminal(&self) -> bool {
        if self.cells.iter().any(|&tile| tile == 0) {
            return false;
        }

        let (rows, cols) = self.cells.dim();
        for row in 0..rows {
            for col in 0..cols {
                let tile = self.cells[[row, col]];
                if col + 1 < cols && self.cells[[row, col + 1]] == tile {
                    return false;
                }
                if row + 1 < rows && self.cells[[row + 1, col]] == tile {
                    return false;
                }
            }
        }

        true
    }

    /// Directions that would change the grid.
    pub fn legal_moves(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|&direction| {
                let mut probe = self.cells.clone();
                slide_cells(&mut probe, direction) != MoveOutcome::NoChange
            })
            .collect()
    }

    /// Slides and merges every line towards `direction` without spawning.
    ///
    /// Leaves the grid untouched and returns [`MoveOutcome::NoChange`] when no
    /// cell would differ, which the caller uses to skip the spawn.
    pub fn slide(&mut self, direction: Direction) -> MoveOutcome {
        if self.state.is_finished() {
            return MoveOutcome::NoChange;
        }

        let outcome = slide_cells(&mut self.cells, direction);
        if outcome.has_update() {
            log::trace!("slide {:?}: {:?}", direction, outcome);
            self.state.mark_started();
            self.refresh();
        }
        outcome
    }

    /// Places a 2 (90%) or a 4 (10%) on a uniformly chosen empty cell.
    pub fn spawn_tile<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Coord2> {
        let empty: Vec<_> = self
            .cells
            .indexed_iter()
            .filter(|&(_, &tile)| tile == 0)
            .map(|(index, _)| index)
            .collect();

        if empty.is_empty() {
            return None;
        }
        if self.score.checked_add(4).is_none() {
            log::warn!("tile sum {} leaves no room for a spawn", self.score);
            return None;
        }

        let (row, col) = empty[rng.random_range(0..empty.len())];
        let value = if rng.random_bool(0.9) { 2 } else { 4 };
        self.cells[[row, col]] = value;
        self.refresh();

        // dimensions come from Coord-sized configs or are checked in `from_cells`
        Some((row as Coord, col as Coord))
    }

    /// Host turn: slide, spawn on a real move, then re-check for game over.
    pub fn play<R: Rng + ?Sized>(&mut self, direction: Direction, rng: &mut R) -> MoveOutcome {
        let outcome = self.slide(direction);
        if outcome.has_update() {
            self.spawn_tile(rng);
        }
        outcome
    }

    fn refresh(&mut self) {
        self.score = self.cells.iter().sum();
        if self.is_terminal() {
            self.state.finish(false);
        }
    }
}

fn tile_sum(cells: &Array2<Tile>) -> Option<u32> {
    cells.iter().try_fold(0u32, |sum, &tile| sum.checked_add(tile))
}

fn is_valid_tile(tile: Tile) -> bool {
    tile == 0 || (tile >= 2 && tile.is_power_of_two())
}

/// Indices of line `index`, ordered from the leading edge of `direction`.
fn line_indices(dim: (usize, usize), direction: Direction, index: usize) -> Vec<[usize; 2]> {
    let (rows, cols) = dim;
    match direction {
        Direction::Left => (0..cols).map(|col| [index, col]).collect(),
        Direction::Right => (0..cols).rev().map(|col| [index, col]).collect(),
        Direction::Up => (0..rows).map(|row| [row, index]).collect(),
        Direction::Down => (0..rows).rev().map(|row| [row, index]).collect(),
    }
}

fn slide_cells(cells: &mut Array2<Tile>, direction: Direction) -> MoveOutcome {
    let dim = cells.dim();
    let line_count = match direction {
        Direction::Left | Direction::Right => dim.0,
        Direction::Up | Direction::Down => dim.1,
    };

    let mut changed = false;
    let mut merges = 0;
    for index in 0..line_count {
        let indices = line_indices(dim, direction, index);
        let line: Vec<Tile> = indices.iter().map(|&at| cells[at]).collect();
        let (collapsed, line_merges) = collapse_line(&line);
        merges += line_merges;

        for (&at, &tile) in indices.iter().zip(&collapsed) {
            if cells[at] != tile {
                cells[at] = tile;
                changed = true;
            }
        }
    }

    if changed {
        MoveOutcome::Moved { merges }
    } else {
        MoveOutcome::NoChange
    }
}

/// Compacts towards the start, merges equal neighbours once each, re-compacts.
fn collapse_line(line: &[Tile]) -> (Vec<Tile>, u16) {
    let mut packed: Vec<Tile> = line.iter().copied().filter(|&tile| tile != 0).collect();
    let mut merges = 0;

    let mut i = 0;
    while i + 1 < packed.len() {
        if packed[i] == packed[i + 1] {
            packed[i] *= 2;
            packed.remove(i + 1);
            merges += 1;
        }
        i += 1;
    }

    packed.resize(line.len(), 0);
    (packed, merges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn grid(cells: Array2<Tile>) -> MergeGrid {
        MergeGrid::from_cells(cells).unwrap()
    }

    #[test]
    fn collapse_merges_pairs_once() {
        assert_eq!(collapse_line(&[2, 2, 2, 2]), (vec![4, 4, 0, 0], 2));
        assert_eq!(collapse_line(&[4, 4, 8, 0]), (vec![8, 8, 0, 0], 1));
        assert_eq!(collapse_line(&[2, 0, 0, 2]), (vec![4, 0, 0, 0], 1));
        assert_eq!(collapse_line(&[2, 4, 2, 4]), (vec![2, 4, 2, 4], 0));
    }

    #[test]
    fn left_merges_leading_pair() {
        let mut g = grid(array![[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);

        assert_eq!(g.slide(Direction::Left), MoveOutcome::Moved { merges: 1 });
        assert_eq!(g.cells().row(0).to_vec(), [4, 0, 0, 0]);
        assert_eq!(g.score(), 4);
    }

    #[test]
    fn right_merges_from_trailing_edge() {
        let mut g = grid(array![[2, 2, 2, 0], [0, 0, 0, 0]]);

        g.slide(Direction::Right);

        assert_eq!(g.cells().row(0).to_vec(), [0, 0, 2, 4]);
    }

    #[test]
    fn vertical_moves_work_per_column() {
        let mut g = grid(array![[2, 0], [2, 4], [0, 4]]);

        g.slide(Direction::Down);
        assert_eq!(g.cells(), &array![[0, 0], [0, 0], [4, 8]]);

        g.slide(Direction::Up);
        assert_eq!(g.cells(), &array![[4, 8], [0, 0], [0, 0]]);
    }

    #[test]
    fn compacted_wall_move_is_no_change() {
        let cells = array![[2, 4, 0, 0], [8, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]];
        let mut g = grid(cells.clone());

        assert_eq!(g.slide(Direction::Left), MoveOutcome::NoChange);
        assert_eq!(g.cells(), &cells);
        assert!(g.state().is_ready());
    }

    #[test]
    fn play_spawns_only_after_real_move() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut g = grid(array![[2, 0], [0, 0]]);

        assert_eq!(g.play(Direction::Left, &mut rng), MoveOutcome::NoChange);
        assert_eq!(g.empty_count(), 3);

        assert!(g.play(Direction::Right, &mut rng).has_update());
        assert_eq!(g.empty_count(), 2);
        assert!(matches!(g.score(), 4 | 6));
    }

    #[test]
    fn full_grid_without_pairs_is_terminal() {
        let g = grid(array![
            [2, 4, 8, 16],
            [16, 8, 4, 2],
            [2, 4, 8, 16],
            [16, 8, 4, 2]
        ]);

        assert!(g.is_terminal());
        assert!(g.is_game_over());
        assert!(g.legal_moves().is_empty());
    }

    #[test]
    fn full_grid_with_vertical_pair_is_not_terminal() {
        let g = grid(array![
            [2, 4, 8, 16],
            [2, 8, 4, 32],
            [4, 2, 8, 16],
            [16, 8, 4, 2]
        ]);

        assert!(!g.is_terminal());
        assert_eq!(g.legal_moves(), [Direction::Up, Direction::Down]);
    }

    #[test]
    fn finished_grid_rejects_moves() {
        let mut g = grid(array![[2, 4], [4, 2]]);

        assert_eq!(g.slide(Direction::Left), MoveOutcome::NoChange);
        assert_eq!(g.state(), EngineState::Lost);
    }

    #[test]
    fn spawn_reports_none_when_full() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut g = grid(array![[2, 4], [8, 16]]);

        assert_eq!(g.spawn_tile(&mut rng), None);
    }

    #[test]
    fn new_grid_has_two_seed_tiles() {
        let mut rng = SmallRng::seed_from_u64(42);
        let g = MergeGrid::new(MergeConfig::default(), &mut rng);

        assert_eq!(g.empty_count(), 14);
        assert!(g.cells().iter().all(|&t| matches!(t, 0 | 2 | 4)));
        assert_eq!(g.score(), g.cells().iter().sum::<u32>());
    }

    #[test]
    fn from_cells_rejects_non_powers_of_two() {
        assert_eq!(
            MergeGrid::from_cells(array![[3, 0], [0, 0]]),
            Err(GameError::InvalidTile)
        );
        assert_eq!(
            MergeGrid::from_cells(array![[1, 0], [0, 0]]),
            Err(GameError::InvalidTile)
        );
    }

    #[test]
    fn from_cells_rejects_sums_past_the_score_range() {
        assert_eq!(
            MergeGrid::from_cells(array![[1 << 31, 1 << 31]]),
            Err(GameError::InvalidTile)
        );

        let mut g = grid(array![[1 << 31, 0, 1 << 30]]);
        assert_eq!(g.score(), 3 << 30);
        assert!(g.slide(Direction::Left).has_update());
        assert_eq!(g.cells(), &array![[1 << 31, 1 << 30, 0]]);
    }

    #[test]
    fn spawn_stops_before_the_sum_overflows() {
        let mut rng = SmallRng::seed_from_u64(9);
        // 2^31 + 2^30 + ... + 2^2
        let cells = Array2::from_shape_fn((1, 31), |(_, col)| {
            if col < 30 { 1u32 << (31 - col) } else { 0 }
        });
        let mut g = grid(cells);

        assert_eq!(g.score(), u32::MAX - 3);
        assert_eq!(g.spawn_tile(&mut rng), None);
        assert_eq!(g.empty_count(), 1);
    }
}
