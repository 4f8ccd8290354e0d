use ndarray::Array2;

use super::*;

/// Empty well cells hold zero, settled cells hold [`Tetromino::cell_value`].
pub type Well = Array2<u8>;

pub fn empty_well(config: WellConfig) -> Well {
    Array2::zeros((usize::from(config.rows), usize::from(config.cols)))
}

/// Maps a shape offset placed at `(x, y)` to a well index, if it lands inside.
fn translate(well: &Well, x: i32, y: i32, (row, col): (usize, usize)) -> Option<[usize; 2]> {
    let (rows, cols) = well.dim();
    let target_row = usize::try_from(y.checked_add(i32::try_from(row).ok()?)?).ok()?;
    let target_col = usize::try_from(x.checked_add(i32::try_from(col).ok()?)?).ok()?;
    (target_row < rows && target_col < cols).then_some([target_row, target_col])
}

/// Whether every occupied cell of `shape` at column `x`, row `y` is inside the
/// well and over an empty cell.
pub fn is_valid_position(well: &Well, shape: &Shape, x: i32, y: i32) -> bool {
    shape.occupied().into_iter().all(|offset| {
        translate(well, x, y, offset).is_some_and(|index| well[index] == 0)
    })
}

/// Writes the piece into the well. Cells outside the well are dropped.
pub fn merge_piece(well: &mut Well, shape: &Shape, x: i32, y: i32, piece: Tetromino) {
    for offset in shape.occupied() {
        if let Some(index) = translate(well, x, y, offset) {
            well[index] = piece.cell_value();
        }
    }
}

/// Removes every full row, shifting everything above it down, and returns how
/// many rows went. Stacked full rows are all caught since the same row index is
/// checked again after each removal.
pub fn clear_lines(well: &mut Well) -> u32 {
    let (rows, cols) = well.dim();
    if cols == 0 {
        return 0;
    }
    let mut cleared = 0;
    let mut row = rows;

    while row > 0 {
        let current = row - 1;
        if well.row(current).iter().all(|&cell| cell != 0) {
            for above in (1..=current).rev() {
                for col in 0..cols {
                    well[[above, col]] = well[[above - 1, col]];
                }
            }
            well.row_mut(0).fill(0);
            cleared += 1;
        } else {
            row -= 1;
        }
    }

    cleared
}
