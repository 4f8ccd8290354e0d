//! Falling-block puzzle (Tetris).

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

pub use engine::*;
pub use source::*;
pub use well::*;

mod engine;
mod source;
mod well;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tetromino {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl Tetromino {
    pub const ALL: [Tetromino; 7] = [
        Tetromino::I,
        Tetromino::J,
        Tetromino::L,
        Tetromino::O,
        Tetromino::S,
        Tetromino::T,
        Tetromino::Z,
    ];

    /// Position in [`Tetromino::ALL`], also the colour index.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Value written into the well when this piece locks; zero stays empty.
    pub const fn cell_value(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_cell_value(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value).checked_sub(1)?).copied()
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::I => "#00f0f0",
            Self::J => "#0000f0",
            Self::L => "#f0a000",
            Self::O => "#f0f000",
            Self::S => "#00f000",
            Self::T => "#a000f0",
            Self::Z => "#f00000",
        }
    }

    /// Orientation the piece spawns in.
    pub fn shape(self) -> Shape {
        // one entry per row, bit `c` set when column `c` is filled
        let (side, rows): (usize, [u8; 4]) = match self {
            Self::I => (4, [0b0000, 0b1111, 0b0000, 0b0000]),
            Self::J => (3, [0b001, 0b111, 0b000, 0]),
            Self::L => (3, [0b100, 0b111, 0b000, 0]),
            Self::O => (2, [0b11, 0b11, 0, 0]),
            Self::S => (3, [0b110, 0b011, 0b000, 0]),
            Self::T => (3, [0b010, 0b111, 0b000, 0]),
            Self::Z => (3, [0b011, 0b110, 0b000, 0]),
        };
        Shape {
            cells: Array2::from_shape_fn((side, side), |(row, col)| (rows[row] >> col) & 1 == 1),
        }
    }
}

/// Occupancy matrix of a piece in one orientation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    cells: Array2<bool>,
}

impl Shape {
    pub fn new(cells: Array2<bool>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &Array2<bool> {
        &self.cells
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// Occupied `(row, col)` offsets within the matrix.
    pub fn occupied(&self) -> SmallVec<[(usize, usize); 4]> {
        self.cells
            .indexed_iter()
            .filter(|&(_, &filled)| filled)
            .map(|(index, _)| index)
            .collect()
    }

    /// Quarter turn clockwise: transpose, then reverse each row.
    pub fn rotated(&self) -> Shape {
        let (rows, cols) = self.cells.dim();
        let mut cells = Array2::from_elem((cols, rows), false);
        for ((row, col), &filled) in self.cells.indexed_iter() {
            cells[[col, rows - 1 - row]] = filled;
        }
        Shape { cells }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellConfig {
    pub rows: Coord,
    pub cols: Coord,
}

impl WellConfig {
    pub fn new(rows: Coord, cols: Coord) -> Self {
        Self {
            rows: rows.max(1),
            cols: cols.max(1),
        }
    }
}

impl Default for WellConfig {
    fn default() -> Self {
        Self { rows: 20, cols: 10 }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    NoChange,
    Moved,
    /// The piece settled; the next one spawned cleanly
    Locked { lines_cleared: u32 },
    /// The piece settled and the next one had no room
    ToppedOut { lines_cleared: u32 },
}

impl StepOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}
