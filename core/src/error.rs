use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Tile value must be zero or a power of two of at least 2")]
    InvalidTile,
    #[error("Digit must be between 1 and 9")]
    InvalidDigit,
    #[error("Board has no valid completion")]
    Unsolvable,
}

pub type Result<T> = core::result::Result<T, GameError>;
