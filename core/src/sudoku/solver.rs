use alloc::vec::Vec;
use rand::Rng;
use rand::seq::SliceRandom;
use smallvec::SmallVec;

use super::*;

/// Digits still to try for one empty cell, tried from the back.
type Candidates = SmallVec<[u8; 9]>;

fn shuffled_digits<R: Rng + ?Sized>(rng: &mut R) -> Candidates {
    let mut digits: Candidates = (1..=9).collect();
    digits.shuffle(rng);
    digits
}

fn coords_of((row, col): (usize, usize)) -> Coord2 {
    (row as Coord, col as Coord)
}

/// Whether every filled cell agrees with the rest of the board.
fn is_consistent(values: &Values) -> bool {
    let mut scratch = values.clone();
    values.indexed_iter().all(|(index, &digit)| {
        if digit == 0 {
            return true;
        }
        scratch[index] = 0;
        let valid = is_valid_placement(&scratch, coords_of(index), digit);
        scratch[index] = digit;
        valid
    })
}

/// Completes `values` by randomized depth-first search.
///
/// Empty cells are visited in row-major order, each trying the digits in a
/// fresh random order. The search keeps its own stack of remaining candidates
/// per cell instead of recursing. Returns `None` when the filled cells
/// conflict or no completion exists.
pub fn solve<R: Rng + ?Sized>(values: &Values, rng: &mut R) -> Option<Values> {
    if values.dim() != (SIZE, SIZE) || !is_consistent(values) {
        return None;
    }

    let mut board = values.clone();
    let empty: Vec<[usize; 2]> = board
        .indexed_iter()
        .filter(|&(_, &digit)| digit == 0)
        .map(|((row, col), _)| [row, col])
        .collect();
    if empty.is_empty() {
        return Some(board);
    }

    let mut pending: Vec<Candidates> = Vec::with_capacity(empty.len());
    pending.push(shuffled_digits(rng));

    while !pending.is_empty() {
        let depth = pending.len() - 1;
        let index = empty[depth];
        let coords = coords_of((index[0], index[1]));
        board[index] = 0;

        let candidates = &mut pending[depth];
        let mut placed = false;
        while let Some(digit) = candidates.pop() {
            if is_valid_placement(&board, coords, digit) {
                board[index] = digit;
                placed = true;
                break;
            }
        }

        if !placed {
            pending.pop();
        } else if depth + 1 == empty.len() {
            return Some(board);
        } else {
            pending.push(shuffled_digits(rng));
        }
    }

    None
}

/// A fixed valid grid, used if randomized completion ever fails.
pub(crate) fn pattern_board() -> Values {
    Values::from_shape_fn((SIZE, SIZE), |(row, col)| {
        ((row * BOX + row / BOX + col) % SIZE) as u8 + 1
    })
}

/// Random fully solved board.
///
/// The three diagonal boxes share no row, column or box, so each one is
/// filled with an independent permutation before the search completes the
/// rest.
pub fn generate_solved<R: Rng + ?Sized>(rng: &mut R) -> Values {
    let mut values = Values::zeros((SIZE, SIZE));
    for start in (0..SIZE).step_by(BOX) {
        let digits = shuffled_digits(rng);
        let cells = values.slice_mut(s![start..start + BOX, start..start + BOX]);
        for (cell, digit) in cells.into_iter().zip(digits) {
            *cell = digit;
        }
    }

    solve(&values, rng).unwrap_or_else(|| {
        log::warn!("Seeded diagonal had no completion, fallback to pattern board");
        pattern_board()
    })
}

/// Clears `cells_to_remove` random cells of `solved` and marks the rest given.
pub fn carve_puzzle<R: Rng + ?Sized>(
    solved: &Values,
    cells_to_remove: usize,
    rng: &mut R,
) -> Array2<Cell> {
    let mut filled: Vec<(usize, usize)> = solved
        .indexed_iter()
        .filter(|&(_, &digit)| digit != 0)
        .map(|(index, _)| index)
        .collect();
    let amount = cells_to_remove.min(filled.len());
    let (removed, _) = filled.partial_shuffle(rng, amount);

    let mut values = solved.clone();
    for &index in removed.iter() {
        values[index] = 0;
    }

    log::debug!("carved {} of {} cells", amount, SIZE * SIZE);
    values.mapv(|digit| match digit {
        0 => Cell::default(),
        digit => Cell::given(digit),
    })
}
