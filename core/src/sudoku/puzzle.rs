use core::num::Saturating;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    NoChange,
    Changed,
    /// Value entered, but it conflicts with the board
    Mistake,
    /// The edit completed the puzzle
    Solved,
}

impl EditOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

/// Seed for re-solving the player's board when it leaves the stored solution.
const HINT_SEED: u64 = 0x5eed;

/// A carved board under play.
///
/// A solution is stored when the puzzle is built. Hints come from it while
/// the player's entries agree with it, and from a fresh solve of their board
/// once they follow a different completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Puzzle {
    cells: Array2<Cell>,
    solution: Values,
    selected: Option<Coord2>,
    mistakes: Saturating<u32>,
    state: EngineState,
}

impl Puzzle {
    pub fn new<R: Rng + ?Sized>(difficulty: Difficulty, rng: &mut R) -> Self {
        let solution = generate_solved(rng);
        let cells = carve_puzzle(&solution, difficulty.cells_to_remove(), rng);
        Self::from_parts(cells, solution)
    }

    /// Builds a puzzle from clue digits, `0` for empty cells.
    pub fn from_givens<R: Rng + ?Sized>(givens: Values, rng: &mut R) -> Result<Self> {
        if givens.dim() != (SIZE, SIZE) {
            return Err(GameError::InvalidBoardShape);
        }
        if givens.iter().any(|&digit| digit > 9) {
            return Err(GameError::InvalidDigit);
        }

        let solution = solve(&givens, rng).ok_or(GameError::Unsolvable)?;
        let cells = givens.mapv(|digit| match digit {
            0 => Cell::default(),
            digit => Cell::given(digit),
        });
        Ok(Self::from_parts(cells, solution))
    }

    fn from_parts(cells: Array2<Cell>, solution: Values) -> Self {
        Self {
            cells,
            solution,
            selected: None,
            mistakes: Saturating(0),
            state: EngineState::default(),
        }
    }

    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<&Cell> {
        let coords = self.validate_coords(coords)?;
        Ok(&self.cells[coords.to_nd_index()])
    }

    /// Current digits, `0` for empty cells.
    pub fn values(&self) -> Values {
        self.cells.mapv(|cell| cell.value.unwrap_or(0))
    }

    pub fn selected(&self) -> Option<Coord2> {
        self.selected
    }

    pub fn mistakes(&self) -> u32 {
        self.mistakes.0
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.value.is_none()).count()
    }

    /// Every cell holds a value and none was flagged as an error.
    pub fn is_complete(&self) -> bool {
        self.cells
            .iter()
            .all(|cell| cell.value.is_some() && !cell.error)
    }

    /// Highlights the row, column and box of `coords`.
    pub fn select(&mut self, coords: Coord2) -> Result<EditOutcome> {
        let coords = self.validate_coords(coords)?;
        if self.state.is_finished() {
            return Ok(EditOutcome::NoChange);
        }

        for ((row, col), cell) in self.cells.indexed_iter_mut() {
            cell.highlighted = same_unit((row as Coord, col as Coord), coords);
        }
        self.selected = Some(coords);
        Ok(EditOutcome::Changed)
    }

    /// Enters a digit. Conflicting digits stay on the board, flagged as errors.
    pub fn set_value(&mut self, coords: Coord2, digit: u8) -> Result<EditOutcome> {
        let coords = self.validate_coords(coords)?;
        let digit = check_digit(digit)?;
        let index = coords.to_nd_index();
        if self.state.is_finished() || self.cells[index].given {
            return Ok(EditOutcome::NoChange);
        }

        let mut values = self.values();
        values[index] = 0;
        let valid = is_valid_placement(&values, coords, digit);

        let cell = &mut self.cells[index];
        cell.value = Some(digit);
        cell.notes = Notes::empty();
        cell.error = !valid;
        self.state.mark_started();

        if !valid {
            self.mistakes += Saturating(1);
            log::trace!("mistake at {:?}, {} so far", coords, self.mistakes);
            return Ok(EditOutcome::Mistake);
        }
        Ok(self.settle())
    }

    /// Flips one pencil mark; the main value is left alone.
    pub fn toggle_note(&mut self, coords: Coord2, digit: u8) -> Result<EditOutcome> {
        let coords = self.validate_coords(coords)?;
        let digit = check_digit(digit)?;
        let cell = &mut self.cells[coords.to_nd_index()];
        if self.state.is_finished() || cell.given {
            return Ok(EditOutcome::NoChange);
        }

        cell.notes.toggle(Notes::digit(digit));
        self.state.mark_started();
        Ok(EditOutcome::Changed)
    }

    pub fn erase(&mut self, coords: Coord2) -> Result<EditOutcome> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];
        if self.state.is_finished() || cell.given {
            return Ok(EditOutcome::NoChange);
        }
        if cell.value.is_none() && cell.notes.is_empty() && !cell.error {
            return Ok(EditOutcome::NoChange);
        }

        cell.value = None;
        cell.notes = Notes::empty();
        cell.error = false;
        Ok(EditOutcome::Changed)
    }

    /// Fills an empty, non-given cell with its solved digit.
    ///
    /// A hint that still conflicts with the board, because the player's
    /// entries admit no completion, is flagged like any other conflict but not
    /// counted as a mistake.
    pub fn hint(&mut self, coords: Coord2) -> Result<EditOutcome> {
        let coords = self.validate_coords(coords)?;
        let index = coords.to_nd_index();
        let cell = &self.cells[index];
        if self.state.is_finished() || cell.given || cell.value.is_some() {
            return Ok(EditOutcome::NoChange);
        }

        let digit = self.hint_digit(index);
        let valid = is_valid_placement(&self.values(), coords, digit);

        let cell = &mut self.cells[index];
        cell.value = Some(digit);
        cell.notes = Notes::empty();
        cell.error = !valid;
        self.state.mark_started();

        if !valid {
            log::debug!("hint {} at {:?} conflicts with the board", digit, coords);
            return Ok(EditOutcome::Changed);
        }
        Ok(self.settle())
    }

    /// Digit at `index` in a completion of the player's error-free entries,
    /// or the stored one when those entries have no completion.
    fn hint_digit(&self, index: [usize; 2]) -> u8 {
        let entries = self
            .cells
            .mapv(|cell| if cell.error { 0 } else { cell.value.unwrap_or(0) });
        let follows_solution = entries
            .iter()
            .zip(&self.solution)
            .all(|(&entry, &solved)| entry == 0 || entry == solved);
        if follows_solution {
            return self.solution[index];
        }

        let mut rng = SmallRng::seed_from_u64(HINT_SEED);
        match solve(&entries, &mut rng) {
            Some(solved) => solved[index],
            None => {
                log::debug!("entries have no completion, hinting the stored solution");
                self.solution[index]
            }
        }
    }

    /// Moves to `Won` once the board is complete.
    fn settle(&mut self) -> EditOutcome {
        if self.is_complete() {
            log::info!("puzzle solved with {} mistakes", self.mistakes);
            self.state.finish(true);
            EditOutcome::Solved
        } else {
            EditOutcome::Changed
        }
    }

    fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if in_bounds(coords, dims(&self.cells)) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(17)
    }

    fn empty_cells(puzzle: &Puzzle) -> alloc::vec::Vec<Coord2> {
        puzzle
            .cells()
            .indexed_iter()
            .filter(|(_, cell)| cell.value.is_none())
            .map(|((row, col), _)| (row as Coord, col as Coord))
            .collect()
    }

    /// Pattern board with every cell given except `holes`.
    fn puzzle_with_holes(holes: &[Coord2]) -> Puzzle {
        let solution = pattern_board();
        let mut cells = solution.mapv(Cell::given);
        for &hole in holes {
            cells[hole.to_nd_index()] = Cell::default();
        }
        Puzzle::from_parts(cells, solution)
    }

    #[test]
    fn new_puzzle_has_difficulty_clues() {
        let puzzle = Puzzle::new(Difficulty::Medium, &mut rng());

        assert_eq!(puzzle.empty_count(), 50);
        assert_eq!(puzzle.cells().iter().filter(|cell| cell.given).count(), 31);
        assert_eq!(puzzle.state(), EngineState::Ready);
        assert!(!puzzle.is_complete());
    }

    #[test]
    fn given_cells_are_immutable() {
        let mut puzzle = puzzle_with_holes(&[(0, 0)]);
        let before = puzzle.clone();

        assert_eq!(puzzle.set_value((1, 1), 1), Ok(EditOutcome::NoChange));
        assert_eq!(puzzle.erase((1, 1)), Ok(EditOutcome::NoChange));
        assert_eq!(puzzle.toggle_note((1, 1), 1), Ok(EditOutcome::NoChange));
        assert_eq!(puzzle.hint((1, 1)), Ok(EditOutcome::NoChange));
        assert_eq!(puzzle, before);
    }

    #[test]
    fn conflicting_digit_is_kept_and_counted() {
        let mut puzzle = puzzle_with_holes(&[(0, 0), (0, 1)]);

        // row 0 already holds a 5
        assert_eq!(puzzle.set_value((0, 0), 5), Ok(EditOutcome::Mistake));
        let cell = puzzle.cell_at((0, 0)).unwrap();
        assert_eq!((cell.value, cell.error), (Some(5), true));
        assert_eq!(puzzle.mistakes(), 1);

        assert_eq!(puzzle.set_value((0, 0), 5), Ok(EditOutcome::Mistake));
        assert_eq!(puzzle.mistakes(), 2);

        assert_eq!(puzzle.erase((0, 0)), Ok(EditOutcome::Changed));
        let cell = puzzle.cell_at((0, 0)).unwrap();
        assert_eq!((cell.value, cell.error), (None, false));
        assert_eq!(puzzle.mistakes(), 2);
        assert_eq!(puzzle.erase((0, 0)), Ok(EditOutcome::NoChange));
    }

    #[test]
    fn replacing_a_value_ignores_the_old_one() {
        let mut puzzle = puzzle_with_holes(&[(0, 0), (0, 1)]);

        assert_eq!(puzzle.set_value((0, 0), 1), Ok(EditOutcome::Changed));
        assert_eq!(puzzle.set_value((0, 0), 1), Ok(EditOutcome::Changed));
        assert_eq!(puzzle.mistakes(), 0);
    }

    #[test]
    fn setting_a_value_clears_notes() {
        let mut puzzle = Puzzle::new(Difficulty::Easy, &mut rng());
        let target = empty_cells(&puzzle)[0];

        puzzle.toggle_note(target, 3).unwrap();
        puzzle.toggle_note(target, 7).unwrap();
        puzzle.toggle_note(target, 3).unwrap();
        assert_eq!(puzzle.cell_at(target).unwrap().notes, Notes::SEVEN);
        assert_eq!(puzzle.cell_at(target).unwrap().value, None);

        let right = puzzle.solution[target.to_nd_index()];
        puzzle.set_value(target, right).unwrap();
        assert!(puzzle.cell_at(target).unwrap().notes.is_empty());
    }

    #[test]
    fn filling_the_solution_wins() {
        let mut puzzle = Puzzle::new(Difficulty::Hard, &mut rng());
        let empty = empty_cells(&puzzle);
        let (last, rest) = empty.split_last().unwrap();

        for &coords in rest {
            let digit = puzzle.solution[coords.to_nd_index()];
            assert_eq!(puzzle.set_value(coords, digit), Ok(EditOutcome::Changed));
        }
        assert_eq!(puzzle.state(), EngineState::Active);

        let digit = puzzle.solution[last.to_nd_index()];
        assert_eq!(puzzle.set_value(*last, digit), Ok(EditOutcome::Solved));
        assert!(puzzle.is_complete());
        assert_eq!(puzzle.state(), EngineState::Won);
        assert_eq!(puzzle.erase(*last), Ok(EditOutcome::NoChange));
        assert_eq!(puzzle.select(*last), Ok(EditOutcome::NoChange));
    }

    #[test]
    fn full_board_with_one_error_is_incomplete() {
        let mut puzzle = puzzle_with_holes(&[(0, 0), (0, 1)]);

        assert_eq!(puzzle.set_value((0, 1), 2), Ok(EditOutcome::Changed));
        assert_eq!(puzzle.set_value((0, 0), 2), Ok(EditOutcome::Mistake));

        assert_eq!(puzzle.empty_count(), 0);
        assert!(!puzzle.is_complete());
        assert_eq!(puzzle.state(), EngineState::Active);

        assert_eq!(puzzle.set_value((0, 0), 1), Ok(EditOutcome::Solved));
        assert_eq!(puzzle.state(), EngineState::Won);
    }

    #[test]
    fn hint_reveals_the_solution() {
        let mut puzzle = Puzzle::new(Difficulty::Easy, &mut rng());
        let target = empty_cells(&puzzle)[0];

        assert_eq!(puzzle.hint(target), Ok(EditOutcome::Changed));
        let cell = puzzle.cell_at(target).unwrap();
        assert_eq!(cell.value, Some(puzzle.solution[target.to_nd_index()]));
        assert!(!cell.error);

        // only empty cells take hints
        assert_eq!(puzzle.hint(target), Ok(EditOutcome::NoChange));
    }

    /// Cells `(r1, c1), (r1, c2), (r2, c1), (r2, c2)` whose digits can be
    /// swapped pairwise and still leave a solved board.
    fn swappable_rectangle(values: &Values) -> Option<[Coord2; 4]> {
        let at = |row: usize, col: usize| values[[row, col]];
        for r1 in 0..SIZE {
            for r2 in r1 + 1..SIZE {
                for c1 in 0..SIZE {
                    for c2 in c1 + 1..SIZE {
                        let same_band = r1 / BOX == r2 / BOX;
                        let same_stack = c1 / BOX == c2 / BOX;
                        if (same_band || same_stack)
                            && at(r1, c1) == at(r2, c2)
                            && at(r1, c2) == at(r2, c1)
                        {
                            let [r1, r2, c1, c2] = [r1, r2, c1, c2].map(|i| i as Coord);
                            return Some([(r1, c1), (r1, c2), (r2, c1), (r2, c2)]);
                        }
                    }
                }
            }
        }
        None
    }

    #[test]
    fn hint_follows_the_players_completion() {
        let (solution, corners) = (0..64)
            .find_map(|seed| {
                let solution = generate_solved(&mut SmallRng::seed_from_u64(seed));
                swappable_rectangle(&solution).map(|corners| (solution, corners))
            })
            .unwrap();
        let mut cells = solution.mapv(Cell::given);
        for corner in corners {
            cells[corner.to_nd_index()] = Cell::default();
        }
        let mut puzzle = Puzzle::from_parts(cells, solution.clone());

        let [a, b, c, d] = corners;
        let swapped = |coords: Coord2| match coords {
            _ if coords == a => solution[b.to_nd_index()],
            _ if coords == b => solution[a.to_nd_index()],
            _ if coords == c => solution[d.to_nd_index()],
            _ => solution[c.to_nd_index()],
        };
        for coords in [a, b, c] {
            assert_eq!(puzzle.set_value(coords, swapped(coords)), Ok(EditOutcome::Changed));
        }

        assert_eq!(puzzle.hint(d), Ok(EditOutcome::Solved));
        assert_eq!(puzzle.cell_at(d).unwrap().value, Some(swapped(d)));
        assert_ne!(swapped(d), solution[d.to_nd_index()]);
        let values = puzzle.values();
        for digit in 1..=9 {
            for i in 0..SIZE {
                assert_eq!(values.row(i).iter().filter(|&&v| v == digit).count(), 1);
                assert_eq!(values.column(i).iter().filter(|&&v| v == digit).count(), 1);
            }
        }
    }

    #[test]
    fn hint_against_a_broken_board_is_flagged() {
        let mut puzzle = puzzle_with_holes(&[(0, 0), (0, 1)]);

        // column 0 already holds a 2 further down
        assert_eq!(puzzle.set_value((0, 0), 2), Ok(EditOutcome::Mistake));
        assert_eq!(puzzle.hint((0, 1)), Ok(EditOutcome::Changed));

        let cell = puzzle.cell_at((0, 1)).unwrap();
        assert_eq!((cell.value, cell.error), (Some(2), true));
        assert_eq!(puzzle.mistakes(), 1);
        assert!(!puzzle.is_complete());
        assert_eq!(puzzle.state(), EngineState::Active);
    }

    #[test]
    fn select_highlights_units() {
        let mut puzzle = Puzzle::new(Difficulty::Easy, &mut rng());

        assert_eq!(puzzle.select((4, 4)), Ok(EditOutcome::Changed));
        assert_eq!(puzzle.selected(), Some((4, 4)));
        assert_eq!(puzzle.cells().iter().filter(|c| c.highlighted).count(), 21);
        assert!(puzzle.cell_at((4, 0)).unwrap().highlighted);
        assert!(puzzle.cell_at((3, 5)).unwrap().highlighted);
        assert!(!puzzle.cell_at((0, 0)).unwrap().highlighted);

        puzzle.select((0, 0)).unwrap();
        assert!(!puzzle.cell_at((3, 5)).unwrap().highlighted);
    }

    #[test]
    fn input_is_validated() {
        let mut puzzle = Puzzle::new(Difficulty::Easy, &mut rng());
        let target = empty_cells(&puzzle)[0];

        assert_eq!(puzzle.set_value((9, 0), 1), Err(GameError::InvalidCoords));
        assert_eq!(puzzle.set_value(target, 0), Err(GameError::InvalidDigit));
        assert_eq!(puzzle.toggle_note(target, 10), Err(GameError::InvalidDigit));
        assert_eq!(puzzle.hint((0, 9)), Err(GameError::InvalidCoords));
        assert_eq!(puzzle.state(), EngineState::Ready);
    }

    #[test]
    fn from_givens_checks_the_board() {
        let mut rng = rng();
        assert_eq!(
            Puzzle::from_givens(Values::zeros((9, 8)), &mut rng),
            Err(GameError::InvalidBoardShape)
        );

        let mut givens = Values::zeros((SIZE, SIZE));
        givens[[0, 0]] = 12;
        assert_eq!(
            Puzzle::from_givens(givens.clone(), &mut rng),
            Err(GameError::InvalidDigit)
        );

        givens[[0, 0]] = 4;
        givens[[1, 1]] = 4;
        assert_eq!(
            Puzzle::from_givens(givens.clone(), &mut rng),
            Err(GameError::Unsolvable)
        );

        givens[[1, 1]] = 0;
        let puzzle = Puzzle::from_givens(givens, &mut rng).unwrap();
        assert_eq!(puzzle.cells().iter().filter(|cell| cell.given).count(), 1);
        assert_eq!(puzzle.solution[[0, 0]], 4);
    }
}
