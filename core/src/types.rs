use ndarray::Array2;

/// Single coordinate axis used for board rows, columns, and positions.
pub type Coord = u8;

/// Count type used for mine counts and total-cell counts.
pub type CellCount = u16;

/// Two-dimensional coordinates `(row, col)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Shape of a 2D array as `(rows, cols)`, saturated into [`Coord`] range.
pub fn dims<T>(array: &Array2<T>) -> Coord2 {
    let (rows, cols) = array.dim();
    (
        rows.try_into().unwrap_or(Coord::MAX),
        cols.try_into().unwrap_or(Coord::MAX),
    )
}

/// Whether `coords` fall inside a board of the given `size`.
pub const fn in_bounds(coords: Coord2, size: Coord2) -> bool {
    coords.0 < size.0 && coords.1 < size.1
}

/// Moves `coord` by `step - 1`, keeping it below `bound`.
fn offset(coord: Coord, step: u8, bound: Coord) -> Option<Coord> {
    let moved = (u16::from(coord) + u16::from(step)).checked_sub(1)?;
    Coord::try_from(moved).ok().filter(|&moved| moved < bound)
}

/// Iterator over the up-to-8 in-bounds neighbours of a cell, row-major.
#[derive(Debug, Clone)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    /// Next slot of the 3x3 window around `center`
    slot: u8,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            slot: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while self.slot < 9 {
            let (row_step, col_step) = (self.slot / 3, self.slot % 3);
            self.slot += 1;
            if (row_step, col_step) == (1, 1) {
                continue;
            }

            let row = offset(self.center.0, row_step, self.bounds.0);
            let col = offset(self.center.1, col_step, self.bounds.1);
            if let (Some(row), Some(col)) = (row, col) {
                return Some((row, col));
            }
        }
        None
    }
}
