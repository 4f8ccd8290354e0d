use alloc::collections::{BTreeSet, VecDeque};
use core::num::Saturating;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::*;

/// Canonical player-visible state of one cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCell {
    Hidden,
    Revealed(u8),
    Flagged,
    /// A mine the player revealed
    Detonated,
}

impl EngineCell {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }
}

impl Default for EngineCell {
    fn default() -> Self {
        Self::Hidden
    }
}

/// Player-visible side of the board, kept apart from the mine layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Board {
    cells: Array2<EngineCell>,
    revealed_count: Saturating<CellCount>,
    flagged_count: Saturating<CellCount>,
    state: EngineState,
    triggered_mine: Option<Coord2>,
}

impl Board {
    fn new(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
            revealed_count: Saturating(0),
            flagged_count: Saturating(0),
            state: Default::default(),
            triggered_mine: None,
        }
    }

    fn reveal_single_cell(&mut self, layout: &MineLayout, coords: Coord2) -> RevealOutcome {
        if self.state.is_finished() {
            return RevealOutcome::NoChange;
        }

        let cell_state = self.cells[coords.to_nd_index()];
        let has_mine = layout[coords];

        match (cell_state, has_mine) {
            (EngineCell::Hidden, true) => {
                self.cells[coords.to_nd_index()] = EngineCell::Detonated;
                self.triggered_mine = Some(coords);
                self.state.finish(false);
                RevealOutcome::HitMine
            }
            (EngineCell::Hidden, false) => {
                let adjacent_mines = layout.adjacent_mine_count(coords);
                self.cells[coords.to_nd_index()] = EngineCell::Revealed(adjacent_mines);
                self.revealed_count += 1;

                if adjacent_mines == 0 {
                    self.flood_fill(layout, coords);
                }

                if self.revealed_count == Saturating(layout.safe_cell_count()) {
                    self.state.finish(true);
                    RevealOutcome::Won
                } else {
                    self.state.mark_started();
                    RevealOutcome::Revealed
                }
            }
            _ => RevealOutcome::NoChange,
        }
    }

    /// Breadth-first expansion through zero cells, stopping at numbers and flags.
    fn flood_fill(&mut self, layout: &MineLayout, origin: Coord2) {
        let mut visited = BTreeSet::from([origin]);
        let mut to_visit: VecDeque<_> = NeighborIter::new(origin, layout.size())
            .filter(|&pos| matches!(self.cells[pos.to_nd_index()], EngineCell::Hidden))
            .collect();

        while let Some(visit_coords) = to_visit.pop_front() {
            if !visited.insert(visit_coords) {
                continue;
            }

            if !matches!(self.cells[visit_coords.to_nd_index()], EngineCell::Hidden) {
                continue;
            }

            let visit_adjacent_mines = layout.adjacent_mine_count(visit_coords);
            self.cells[visit_coords.to_nd_index()] = EngineCell::Revealed(visit_adjacent_mines);
            self.revealed_count += 1;

            if visit_adjacent_mines == 0 {
                to_visit.extend(
                    NeighborIter::new(visit_coords, layout.size())
                        .filter(|&pos| matches!(self.cells[pos.to_nd_index()], EngineCell::Hidden))
                        .filter(|pos| !visited.contains(pos)),
                );
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Minefield {
    config: GameConfig,
    seed: u64,
    policy: FirstMovePolicy,
    /// `None` until the first reveal places the mines
    layout: Option<MineLayout>,
    board: Board,
}

impl Minefield {
    /// Empty board, mines are placed around the first reveal with [`FirstMovePolicy::SafeZone`].
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::with_policy(config, seed, FirstMovePolicy::default())
    }

    pub fn with_policy(config: GameConfig, seed: u64, policy: FirstMovePolicy) -> Self {
        let config = GameConfig::new(config.size, config.mines);
        Self {
            config,
            seed,
            policy,
            layout: None,
            board: Board::new(config.size),
        }
    }

    /// Board with a fixed, already placed layout.
    pub fn from_layout(mine_layout: MineLayout) -> Self {
        let config = mine_layout.game_config();
        Self {
            config,
            seed: 0,
            policy: FirstMovePolicy::Random,
            layout: Some(mine_layout),
            board: Board::new(config.size),
        }
    }

    pub fn state(&self) -> EngineState {
        self.board.state
    }

    pub fn is_finished(&self) -> bool {
        self.board.state.is_finished()
    }

    pub fn is_won(&self) -> bool {
        matches!(self.board.state, EngineState::Won)
    }

    pub fn is_seeded(&self) -> bool {
        self.layout.is_some()
    }

    pub fn layout(&self) -> Option<&MineLayout> {
        self.layout.as_ref()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.layout
            .as_ref()
            .map_or(self.config.mines, MineLayout::mine_count)
    }

    pub fn flagged_count(&self) -> CellCount {
        self.board.flagged_count.0
    }

    pub fn mines_left(&self) -> isize {
        (self.total_mines() as isize) - (self.board.flagged_count.0 as isize)
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<EngineCell> {
        let coords = self.validate_coords(coords)?;
        Ok(self.board.cells[coords.to_nd_index()])
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        matches!(
            self.cell_at(coords),
            Ok(EngineCell::Revealed(_) | EngineCell::Detonated)
        )
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        matches!(self.cell_at(coords), Ok(EngineCell::Flagged))
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.board.triggered_mine
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use EngineCell::*;
        use MarkOutcome::*;

        let coords = self.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(NoChange);
        }

        let board = &mut self.board;
        Ok(match board.cells[coords.to_nd_index()] {
            Hidden => {
                board.cells[coords.to_nd_index()] = Flagged;
                board.flagged_count += 1;
                Changed
            }
            Flagged => {
                board.cells[coords.to_nd_index()] = Hidden;
                board.flagged_count -= 1;
                Changed
            }
            Revealed(_) | Detonated => NoChange,
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;

        if self.is_finished() || self.board.cells[coords.to_nd_index()] != EngineCell::Hidden {
            return Ok(RevealOutcome::NoChange);
        }

        let (config, seed, policy) = (self.config, self.seed, self.policy);
        let layout = self.layout.get_or_insert_with(|| {
            log::debug!("seeding minefield from {:?} with seed {}", coords, seed);
            RandomLayoutGenerator::new(seed, coords, policy).generate(config)
        });
        Ok(self.board.reveal_single_cell(layout, coords))
    }

    /// Reveals every unflagged neighbour of a number whose flags are all placed.
    pub fn chord_reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        if self.is_finished() {
            return Ok(RevealOutcome::NoChange);
        }

        match self.board.cells[coords.to_nd_index()] {
            EngineCell::Revealed(count) if count == self.count_flagged_neighbors(coords) => {
                let Some(layout) = &self.layout else {
                    return Ok(RevealOutcome::NoChange);
                };
                let board = &mut self.board;
                Ok(layout
                    .iter_neighbors(coords)
                    .map(|neighbor| board.reveal_single_cell(layout, neighbor))
                    .fold(RevealOutcome::NoChange, core::ops::BitOr::bitor))
            }
            EngineCell::Revealed(_) | EngineCell::Detonated => Ok(RevealOutcome::NoChange),
            EngineCell::Hidden | EngineCell::Flagged => self.reveal(coords),
        }
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        NeighborIter::new(coords, self.size())
            .filter(|&pos| self.board.cells[pos.to_nd_index()] == EngineCell::Flagged)
            .count() as u8
    }

    fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if in_bounds(coords, self.size()) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}
