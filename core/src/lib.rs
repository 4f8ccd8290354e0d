//! Game-state engines for four classic puzzles: 2048, Minesweeper, Tetris
//! and Sudoku.
//!
//! Every engine is a plain value owned by its host. Hosts feed it logical
//! operations and read back state; randomness comes from seeded generators
//! so every game can be replayed.

#![no_std]

extern crate alloc;

pub use error::*;
pub use score::*;
pub use state::*;
pub use types::*;

pub mod blocks;
pub mod merge;
pub mod minefield;
pub mod sudoku;

mod error;
mod score;
mod state;
mod types;
