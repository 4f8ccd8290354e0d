use core::time::Duration;

use super::*;

/// Offsets tried, in order, when a rotation collides in place.
const WALL_KICKS: [i32; 5] = [0, -1, 1, -2, 2];

const BASE_DROP_MS: u64 = 1000;
const DROP_STEP_MS: u64 = 100;
const MIN_DROP_MS: u64 = 100;

const LINES_PER_LEVEL: u32 = 10;
const POINTS_PER_LINE: u32 = 100;

/// The piece currently under player control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePiece {
    pub kind: Tetromino,
    pub shape: Shape,
    /// Column of the shape's left edge
    pub x: i32,
    /// Row of the shape's top edge
    pub y: i32,
}

impl ActivePiece {
    /// Centred horizontally, top row.
    pub fn spawn(kind: Tetromino, well_cols: usize) -> Self {
        let shape = kind.shape();
        let x = (well_cols / 2) as i32 - (shape.width() / 2) as i32;
        Self { kind, shape, x, y: 0 }
    }
}

#[derive(Clone, Debug)]
pub struct FallingBlocks<S: PieceSource = RandomPieces> {
    well: Well,
    current: ActivePiece,
    next: Tetromino,
    score: u32,
    level: u32,
    lines: u32,
    state: EngineState,
    paused: bool,
    source: S,
}

impl FallingBlocks<RandomPieces> {
    pub fn seeded(config: WellConfig, seed: u64) -> Self {
        Self::new(config, RandomPieces::new(seed))
    }
}

impl<S: PieceSource> FallingBlocks<S> {
    pub fn new(config: WellConfig, mut source: S) -> Self {
        let well = empty_well(config);
        let current = ActivePiece::spawn(source.next_piece(), well.ncols());
        let next = source.next_piece();
        let mut state = EngineState::default();
        if !is_valid_position(&well, &current.shape, current.x, current.y) {
            log::warn!("Well too small for {:?}, game over at spawn", current.kind);
            state.finish(false);
        }

        Self {
            well,
            current,
            next,
            score: 0,
            level: 1,
            lines: 0,
            state,
            paused: false,
            source,
        }
    }

    pub fn well(&self) -> &Well {
        &self.well
    }

    pub fn current(&self) -> &ActivePiece {
        &self.current
    }

    pub fn next_piece(&self) -> Tetromino {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_game_over(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Gravity period for the current level.
    pub fn drop_interval(&self) -> Duration {
        let step = u64::from(self.level.saturating_sub(1)) * DROP_STEP_MS;
        Duration::from_millis(BASE_DROP_MS.saturating_sub(step).max(MIN_DROP_MS))
    }

    /// Row the current piece would settle on after a hard drop.
    pub fn ghost_y(&self) -> i32 {
        let mut y = self.current.y;
        while self.fits(&self.current.shape, self.current.x, y + 1) {
            y += 1;
        }
        y
    }

    /// The well with the current piece drawn in, for rendering.
    pub fn composed_well(&self) -> Well {
        let mut well = self.well.clone();
        if !self.is_game_over() {
            let piece = &self.current;
            merge_piece(&mut well, &piece.shape, piece.x, piece.y, piece.kind);
        }
        well
    }

    pub fn move_left(&mut self) -> StepOutcome {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> StepOutcome {
        self.shift(1)
    }

    pub fn rotate(&mut self) -> StepOutcome {
        if !self.accepts_input() {
            return StepOutcome::NoChange;
        }

        let rotated = self.current.shape.rotated();
        let Some(x) = WALL_KICKS
            .iter()
            .map(|&kick| self.current.x + kick)
            .find(|&x| self.fits(&rotated, x, self.current.y))
        else {
            return StepOutcome::NoChange;
        };

        self.state.mark_started();
        self.current.shape = rotated;
        self.current.x = x;
        StepOutcome::Moved
    }

    /// Moves the piece one row down, locking it if it is resting on something.
    pub fn soft_drop(&mut self) -> StepOutcome {
        if !self.accepts_input() {
            return StepOutcome::NoChange;
        }
        self.state.mark_started();

        let piece = &self.current;
        if self.fits(&piece.shape, piece.x, piece.y + 1) {
            self.current.y += 1;
            StepOutcome::Moved
        } else {
            self.lock_piece()
        }
    }

    /// One gravity step; the host calls this every [`Self::drop_interval`].
    pub fn tick(&mut self) -> StepOutcome {
        self.soft_drop()
    }

    pub fn hard_drop(&mut self) -> StepOutcome {
        if !self.accepts_input() {
            return StepOutcome::NoChange;
        }
        self.state.mark_started();

        self.current.y = self.ghost_y();
        self.lock_piece()
    }

    /// Only a started, unfinished game can pause. Returns whether anything changed.
    pub fn pause(&mut self) -> bool {
        if self.paused || self.state != EngineState::Active {
            return false;
        }
        self.paused = true;
        true
    }

    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        if self.paused { self.resume() } else { self.pause() }
    }

    fn accepts_input(&self) -> bool {
        !self.paused && !self.is_game_over()
    }

    fn fits(&self, shape: &Shape, x: i32, y: i32) -> bool {
        is_valid_position(&self.well, shape, x, y)
    }

    fn shift(&mut self, dx: i32) -> StepOutcome {
        if !self.accepts_input() {
            return StepOutcome::NoChange;
        }

        let piece = &self.current;
        if !self.fits(&piece.shape, piece.x + dx, piece.y) {
            return StepOutcome::NoChange;
        }

        self.state.mark_started();
        self.current.x += dx;
        StepOutcome::Moved
    }

    /// Settles the current piece, scores cleared rows and spawns the next one.
    fn lock_piece(&mut self) -> StepOutcome {
        let piece = &self.current;
        merge_piece(&mut self.well, &piece.shape, piece.x, piece.y, piece.kind);

        let lines_cleared = clear_lines(&mut self.well);
        if lines_cleared > 0 {
            // scored at the level in force before this clear
            self.score = self
                .score
                .saturating_add(lines_cleared * POINTS_PER_LINE * self.level);
            self.lines += lines_cleared;
            self.level = self.lines / LINES_PER_LEVEL + 1;
            log::debug!(
                "cleared {} lines, score {} level {}",
                lines_cleared,
                self.score,
                self.level
            );
        }

        self.current = ActivePiece::spawn(self.next, self.well.ncols());
        self.next = self.source.next_piece();

        if self.fits(&self.current.shape, self.current.x, self.current.y) {
            StepOutcome::Locked { lines_cleared }
        } else {
            log::info!("topped out with score {}", self.score);
            self.state.finish(false);
            StepOutcome::ToppedOut { lines_cleared }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(rows: Coord, cols: Coord, pieces: &[Tetromino]) -> FallingBlocks<PieceSequence> {
        FallingBlocks::new(
            WellConfig::new(rows, cols),
            PieceSequence::new(pieces.iter().copied()),
        )
    }

    #[test]
    fn spawns_centred_at_top() {
        let game = game(20, 10, &[Tetromino::T, Tetromino::I]);

        assert_eq!(game.current().kind, Tetromino::T);
        assert_eq!((game.current().x, game.current().y), (4, 0));
        assert_eq!(game.next_piece(), Tetromino::I);
        assert_eq!(game.state(), EngineState::Ready);
        assert_eq!(game.level(), 1);
    }

    #[test]
    fn moves_stop_at_walls() {
        let mut game = game(20, 10, &[Tetromino::O]);
        // O spawns at x = 4 and is two cells wide
        for _ in 0..4 {
            assert_eq!(game.move_left(), StepOutcome::Moved);
        }
        assert_eq!(game.move_left(), StepOutcome::NoChange);
        assert_eq!(game.current().x, 0);
        assert_eq!(game.state(), EngineState::Active);

        for _ in 0..8 {
            game.move_right();
        }
        assert_eq!(game.current().x, 8);
    }

    #[test]
    fn hard_drop_lands_on_floor() {
        let mut game = game(20, 10, &[Tetromino::O]);

        assert_eq!(game.ghost_y(), 18);
        assert_eq!(game.hard_drop(), StepOutcome::Locked { lines_cleared: 0 });
        assert_eq!(game.well()[[19, 4]], Tetromino::O.cell_value());
        assert_eq!(game.well()[[18, 5]], Tetromino::O.cell_value());
        assert_eq!(game.current().y, 0);
    }

    #[test]
    fn soft_drop_locks_when_resting() {
        let mut game = game(4, 4, &[Tetromino::O]);

        assert_eq!(game.soft_drop(), StepOutcome::Moved);
        assert_eq!(game.tick(), StepOutcome::Moved);
        assert_eq!(game.tick(), StepOutcome::Locked { lines_cleared: 0 });
    }

    /// Two O pieces side by side fill the bottom two rows of a 4-wide well.
    fn drop_pair(game: &mut FallingBlocks<PieceSequence>) -> (StepOutcome, StepOutcome) {
        game.move_left();
        let first = game.hard_drop();
        game.move_right();
        (first, game.hard_drop())
    }

    #[test]
    fn clearing_a_line_scores_by_level() {
        let mut game = game(6, 4, &[Tetromino::O]);
        assert_eq!(
            drop_pair(&mut game),
            (
                StepOutcome::Locked { lines_cleared: 0 },
                StepOutcome::Locked { lines_cleared: 2 }
            )
        );

        assert_eq!(game.score(), 200);
        assert_eq!(game.lines(), 2);
        assert_eq!(game.level(), 1);
        assert!(game.well().iter().all(|&cell| cell == 0));
    }

    #[test]
    fn level_rises_every_ten_lines() {
        let mut game = game(6, 4, &[Tetromino::O]);
        for _ in 0..5 {
            drop_pair(&mut game);
        }

        assert_eq!(game.lines(), 10);
        assert_eq!(game.level(), 2);
        assert_eq!(game.score(), 1000);
        assert_eq!(game.drop_interval(), Duration::from_millis(900));

        drop_pair(&mut game);
        // scored at level 2
        assert_eq!(game.score(), 1400);
    }

    #[test]
    fn rotation_kicks_off_the_wall() {
        let mut game = game(20, 10, &[Tetromino::I]);
        game.rotate();
        // vertical I occupies column x + 2
        while game.move_right().has_update() {}
        assert_eq!(game.current().x, 7);

        assert_eq!(game.rotate(), StepOutcome::Moved);
        assert_eq!(game.current().x, 6);
        assert_eq!(game.current().shape.height(), 4);
        assert!(is_valid_position(
            game.well(),
            &game.current().shape,
            game.current().x,
            game.current().y
        ));
    }

    #[test]
    fn blocked_rotation_is_rejected() {
        // 2 rows: vertical I never fits
        let mut game = game(2, 4, &[Tetromino::I]);
        let before = game.current().clone();

        assert_eq!(game.rotate(), StepOutcome::NoChange);
        assert_eq!(game.current(), &before);
    }

    #[test]
    fn tops_out_when_spawn_is_blocked() {
        let mut game = game(3, 3, &[Tetromino::O]);

        assert_eq!(game.hard_drop(), StepOutcome::ToppedOut { lines_cleared: 0 });
        assert!(game.is_game_over());
        assert_eq!(game.state(), EngineState::Lost);
        assert_eq!(game.move_left(), StepOutcome::NoChange);
        assert_eq!(game.tick(), StepOutcome::NoChange);
        assert!(!game.pause());
    }

    #[test]
    fn too_small_well_is_over_at_spawn() {
        let game = game(1, 1, &[Tetromino::T]);
        assert!(game.is_game_over());
    }

    #[test]
    fn paused_game_ignores_input() {
        let mut game = game(20, 10, &[Tetromino::T]);
        assert!(!game.pause());
        game.tick();
        assert!(game.pause());
        assert!(game.is_paused());

        assert_eq!(game.tick(), StepOutcome::NoChange);
        assert_eq!(game.move_left(), StepOutcome::NoChange);
        assert_eq!(game.current().y, 1);

        assert!(game.toggle_pause());
        assert!(!game.is_paused());
        assert_eq!(game.tick(), StepOutcome::Moved);
    }

    #[test]
    fn drop_interval_has_a_floor() {
        let mut game = game(20, 10, &[Tetromino::O]);
        assert_eq!(game.drop_interval(), Duration::from_millis(1000));

        game.level = 15;
        assert_eq!(game.drop_interval(), Duration::from_millis(100));
    }

    #[test]
    fn composed_well_shows_active_piece() {
        let game = game(4, 4, &[Tetromino::O]);
        let composed = game.composed_well();

        assert_eq!(composed[[0, 1]], Tetromino::O.cell_value());
        assert!(game.well().iter().all(|&cell| cell == 0));
    }
}
