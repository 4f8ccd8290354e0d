use alloc::vec::Vec;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

/// Supplies the pieces that enter the well, one at a time.
pub trait PieceSource {
    fn next_piece(&mut self) -> Tetromino;
}

/// Independent uniform draws over all seven pieces.
#[derive(Clone, Debug)]
pub struct RandomPieces {
    rng: SmallRng,
}

impl RandomPieces {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl PieceSource for RandomPieces {
    fn next_piece(&mut self) -> Tetromino {
        Tetromino::ALL[self.rng.random_range(0..Tetromino::ALL.len())]
    }
}

/// Replays a fixed list of pieces, starting over once exhausted.
#[derive(Clone, Debug, PartialEq)]
pub struct PieceSequence {
    pieces: Vec<Tetromino>,
    cursor: usize,
}

impl PieceSequence {
    /// An empty list falls back to a stream of `O` pieces.
    pub fn new(pieces: impl IntoIterator<Item = Tetromino>) -> Self {
        let mut pieces: Vec<Tetromino> = pieces.into_iter().collect();
        if pieces.is_empty() {
            log::warn!("Empty piece sequence, using O pieces");
            pieces.push(Tetromino::O);
        }
        Self { pieces, cursor: 0 }
    }
}

impl PieceSource for PieceSequence {
    fn next_piece(&mut self) -> Tetromino {
        let piece = self.pieces[self.cursor % self.pieces.len()];
        self.cursor = (self.cursor + 1) % self.pieces.len();
        piece
    }
}

impl<S: PieceSource + ?Sized> PieceSource for &mut S {
    fn next_piece(&mut self) -> Tetromino {
        (**self).next_piece()
    }
}
