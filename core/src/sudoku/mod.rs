//! Sudoku: solved-board generation, puzzle carving and player edits.

use ndarray::{Array2, s};
use serde::{Deserialize, Serialize};

use crate::*;

pub use puzzle::*;
pub use solver::*;

mod puzzle;
mod solver;

/// Side of the board.
pub const SIZE: usize = 9;
/// Side of one box.
pub const BOX: usize = 3;

/// Committed digits, `0` marks an empty cell.
pub type Values = Array2<u8>;

pub(crate) fn check_digit(digit: u8) -> Result<u8> {
    if (1..=9).contains(&digit) {
        Ok(digit)
    } else {
        Err(GameError::InvalidDigit)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// How many of the 81 cells are cleared from the solved board.
    pub const fn cells_to_remove(self) -> usize {
        match self {
            Self::Easy => 40,
            Self::Medium => 50,
            Self::Hard => 60,
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::Easy
    }
}

bitflags::bitflags! {
    /// Pencil marks of one cell.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Notes: u16 {
        const ONE = 1 << 0;
        const TWO = 1 << 1;
        const THREE = 1 << 2;
        const FOUR = 1 << 3;
        const FIVE = 1 << 4;
        const SIX = 1 << 5;
        const SEVEN = 1 << 6;
        const EIGHT = 1 << 7;
        const NINE = 1 << 8;
    }
}

impl Default for Notes {
    fn default() -> Self {
        Notes::empty()
    }
}

impl Notes {
    /// Flag for a digit in `1..=9`; anything else maps to no flag.
    pub fn digit(digit: u8) -> Notes {
        match digit {
            1..=9 => Notes::from_bits_truncate(1 << (digit - 1)),
            _ => Notes::empty(),
        }
    }

    pub fn digits(self) -> impl Iterator<Item = u8> {
        (1..=9).filter(move |&digit| self.contains(Notes::digit(digit)))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: Option<u8>,
    /// Clue from the carved puzzle, never editable
    pub given: bool,
    pub notes: Notes,
    /// Same row, column or box as the selected cell
    pub highlighted: bool,
    /// Value conflicted with the board when it was entered
    pub error: bool,
}

impl Cell {
    pub fn given(value: u8) -> Self {
        Self {
            value: Some(value),
            given: true,
            ..Self::default()
        }
    }
}

/// Returns whether `digit` is absent from the row, column and box of `coords`.
///
/// Coordinates off a 9x9 board are never a valid placement.
pub fn is_valid_placement(values: &Values, coords: Coord2, digit: u8) -> bool {
    if values.dim() != (SIZE, SIZE) || !in_bounds(coords, dims(values)) {
        return false;
    }
    let (row, col) = (usize::from(coords.0), usize::from(coords.1));
    let box_row = row / BOX * BOX;
    let box_col = col / BOX * BOX;

    !values.row(row).iter().any(|&value| value == digit)
        && !values.column(col).iter().any(|&value| value == digit)
        && !values
            .slice(s![box_row..box_row + BOX, box_col..box_col + BOX])
            .iter()
            .any(|&value| value == digit)
}

pub(crate) fn same_unit((a_row, a_col): Coord2, (b_row, b_col): Coord2) -> bool {
    let box_of = |coord: Coord| usize::from(coord) / BOX;
    a_row == b_row
        || a_col == b_col
        || (box_of(a_row) == box_of(b_row) && box_of(a_col) == box_of(b_col))
}
