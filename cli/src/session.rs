use std::fmt::Write as _;
use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use arcade_core::blocks::{FallingBlocks, StepOutcome, Tetromino, WellConfig};
use arcade_core::merge::{MergeConfig, MergeGrid, MoveOutcome};
use arcade_core::minefield::{EngineCell, GameConfig, Minefield, RevealOutcome};
use arcade_core::sudoku::{self, EditOutcome, Puzzle};
use arcade_core::{EngineState, ToNdIndex};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::command::{Command, HELP};

/// A running game driven by text commands.
pub trait Session {
    /// Key under which scores are stored.
    fn name(&self) -> &'static str;

    /// Applies one command and returns a short status line.
    fn apply(&mut self, command: Command) -> Result<String>;

    fn render(&self) -> String;

    fn state(&self) -> EngineState;

    /// Score worth recording, if the game keeps one.
    fn score(&self) -> Option<u32>;
}

fn unsupported(command: Command, game: &str) -> Result<String> {
    bail!("{:?} does nothing in {}", command, game)
}

pub struct MergeSession {
    grid: MergeGrid,
    rng: SmallRng,
}

impl MergeSession {
    pub fn new(config: MergeConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let grid = MergeGrid::new(config, &mut rng);
        Self { grid, rng }
    }
}

impl Session for MergeSession {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn apply(&mut self, command: Command) -> Result<String> {
        let Command::Slide(direction) = command else {
            return unsupported(command, self.name());
        };
        Ok(match self.grid.play(direction, &mut self.rng) {
            MoveOutcome::NoChange => "Nothing moves that way".to_owned(),
            MoveOutcome::Moved { merges: 0 } => String::new(),
            MoveOutcome::Moved { merges } => format!("{} merges", merges),
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for row in self.grid.cells().rows() {
            for &tile in row {
                match tile {
                    0 => out.push_str("    ."),
                    tile => {
                        let _ = write!(out, "{:>5}", tile);
                    }
                }
            }
            out.push('\n');
        }
        let _ = write!(
            out,
            "score {}  max {}  free {}",
            self.grid.score(),
            self.grid.max_tile(),
            self.grid.empty_count()
        );
        out
    }

    fn state(&self) -> EngineState {
        self.grid.state()
    }

    fn score(&self) -> Option<u32> {
        Some(self.grid.score())
    }
}

pub struct MinesSession {
    field: Minefield,
}

impl MinesSession {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self {
            field: Minefield::new(config, seed),
        }
    }
}

impl Session for MinesSession {
    fn name(&self) -> &'static str {
        "mines"
    }

    fn apply(&mut self, command: Command) -> Result<String> {
        let outcome = match command {
            Command::Reveal(coords) => self.field.reveal(coords)?,
            Command::Chord(coords) => self.field.chord_reveal(coords)?,
            Command::Flag(coords) => {
                let outcome = self.field.toggle_flag(coords)?;
                return Ok(if outcome.has_update() {
                    format!("{} mines left", self.field.mines_left())
                } else {
                    "Cannot flag that cell".to_owned()
                });
            }
            other => return unsupported(other, self.name()),
        };

        Ok(match outcome {
            RevealOutcome::NoChange => "Nothing to reveal".to_owned(),
            RevealOutcome::Revealed => String::new(),
            RevealOutcome::HitMine => "Boom".to_owned(),
            RevealOutcome::Won => "Field cleared".to_owned(),
        })
    }

    fn render(&self) -> String {
        let (rows, cols) = self.field.size();
        let show_mines = self.field.is_finished();
        let mut out = String::from("   ");
        for col in 0..cols {
            let _ = write!(out, "{:>3}", col);
        }
        out.push('\n');

        for row in 0..rows {
            let _ = write!(out, "{:>3}", row);
            for col in 0..cols {
                let coords = (row, col);
                let mine = show_mines
                    && self
                        .field
                        .layout()
                        .is_some_and(|layout| layout.contains_mine(coords));
                let glyph = match self.field.cell_at(coords) {
                    Ok(EngineCell::Detonated) => '*',
                    Ok(EngineCell::Flagged) => 'F',
                    Ok(EngineCell::Hidden) if mine => 'o',
                    Ok(EngineCell::Hidden) | Err(_) => '#',
                    Ok(EngineCell::Revealed(0)) => '.',
                    Ok(EngineCell::Revealed(count)) => char::from(b'0' + count),
                };
                let _ = write!(out, "{:>3}", glyph);
            }
            out.push('\n');
        }
        let _ = write!(out, "{} mines left", self.field.mines_left());
        out
    }

    fn state(&self) -> EngineState {
        self.field.state()
    }

    fn score(&self) -> Option<u32> {
        None
    }
}

pub struct BlocksSession {
    game: FallingBlocks,
}

impl BlocksSession {
    pub fn new(config: WellConfig, seed: u64) -> Self {
        Self {
            game: FallingBlocks::seeded(config, seed),
        }
    }
}

fn piece_letter(value: u8) -> char {
    match Tetromino::from_cell_value(value) {
        Some(Tetromino::I) => 'I',
        Some(Tetromino::J) => 'J',
        Some(Tetromino::L) => 'L',
        Some(Tetromino::O) => 'O',
        Some(Tetromino::S) => 'S',
        Some(Tetromino::T) => 'T',
        Some(Tetromino::Z) => 'Z',
        None => '.',
    }
}

impl Session for BlocksSession {
    fn name(&self) -> &'static str {
        "blocks"
    }

    fn apply(&mut self, command: Command) -> Result<String> {
        let outcome = match command.as_block_move() {
            Command::Left => self.game.move_left(),
            Command::Right => self.game.move_right(),
            Command::Rotate => self.game.rotate(),
            Command::Down => self.game.soft_drop(),
            Command::Tick => self.game.tick(),
            Command::Drop => self.game.hard_drop(),
            Command::Pause => {
                self.game.toggle_pause();
                return Ok(if self.game.is_paused() { "Paused" } else { "Running" }.to_owned());
            }
            other => return unsupported(other, self.name()),
        };

        Ok(match outcome {
            StepOutcome::NoChange if self.game.is_paused() => "Paused, 'pause' to resume".to_owned(),
            StepOutcome::NoChange => "Blocked".to_owned(),
            StepOutcome::Moved | StepOutcome::Locked { lines_cleared: 0 } => String::new(),
            StepOutcome::Locked { lines_cleared } => format!("{} lines", lines_cleared),
            StepOutcome::ToppedOut { .. } => "Topped out".to_owned(),
        })
    }

    fn render(&self) -> String {
        let ghost = self.game.ghost_y();
        let mut out = String::new();
        for row in self.game.composed_well().rows() {
            out.push('|');
            out.extend(row.iter().map(|&value| piece_letter(value)));
            out.push_str("|\n");
        }
        let _ = write!(
            out,
            "score {}  level {}  lines {}  next {:?}  lands on row {}  gravity {} ms",
            self.game.score(),
            self.game.level(),
            self.game.lines(),
            self.game.next_piece(),
            ghost,
            self.game.drop_interval().as_millis()
        );
        out
    }

    fn state(&self) -> EngineState {
        self.game.state()
    }

    fn score(&self) -> Option<u32> {
        Some(self.game.score())
    }
}

pub struct SudokuSession {
    puzzle: Puzzle,
}

impl SudokuSession {
    pub fn new(difficulty: sudoku::Difficulty, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        Self {
            puzzle: Puzzle::new(difficulty, &mut rng),
        }
    }
}

impl Session for SudokuSession {
    fn name(&self) -> &'static str {
        "sudoku"
    }

    fn apply(&mut self, command: Command) -> Result<String> {
        let outcome = match command {
            Command::Select(coords) => self.puzzle.select(coords)?,
            Command::Set(coords, digit) => self.puzzle.set_value(coords, digit)?,
            Command::Note(coords, digit) => self.puzzle.toggle_note(coords, digit)?,
            Command::Erase(coords) => self.puzzle.erase(coords)?,
            Command::Hint(coords) => self.puzzle.hint(coords)?,
            other => return unsupported(other, self.name()),
        };

        Ok(match outcome {
            EditOutcome::NoChange => "Cell cannot change".to_owned(),
            EditOutcome::Changed => String::new(),
            EditOutcome::Mistake => format!("Conflict, {} mistakes", self.puzzle.mistakes()),
            EditOutcome::Solved => "Solved".to_owned(),
        })
    }

    fn render(&self) -> String {
        let mut out = String::new();
        for (row, line) in self.puzzle.cells().rows().into_iter().enumerate() {
            if row % sudoku::BOX == 0 && row > 0 {
                out.push_str("------+-------+------\n");
            }
            for (col, cell) in line.iter().enumerate() {
                if col % sudoku::BOX == 0 && col > 0 {
                    out.push_str("| ");
                }
                match cell.value {
                    Some(digit) => out.push(char::from(b'0' + digit)),
                    None => out.push('.'),
                }
                out.push(if cell.error {
                    '!'
                } else if cell.highlighted {
                    '\''
                } else {
                    ' '
                });
            }
            out.push('\n');
        }
        if let Some(selected) = self.puzzle.selected() {
            let notes = &self.puzzle.cells()[selected.to_nd_index()].notes;
            if !notes.is_empty() {
                let digits: Vec<String> = notes.digits().map(|d| d.to_string()).collect();
                let _ = writeln!(out, "notes at {:?}: {}", selected, digits.join(" "));
            }
        }
        let _ = write!(
            out,
            "{} empty  {} mistakes",
            self.puzzle.empty_count(),
            self.puzzle.mistakes()
        );
        out
    }

    fn state(&self) -> EngineState {
        self.puzzle.state()
    }

    fn score(&self) -> Option<u32> {
        None
    }
}

/// Feeds lines from `input` into the session until it ends or the player quits.
pub fn run<R: BufRead, W: Write>(
    session: &mut dyn Session,
    input: R,
    mut output: W,
) -> Result<EngineState> {
    writeln!(output, "{}", session.render())?;

    for line in input.lines() {
        let line = line?;
        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(output, "{}", err)?;
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => writeln!(output, "{}", HELP)?,
            Command::Show => writeln!(output, "{}", session.render())?,
            command => match session.apply(command) {
                Ok(status) => {
                    log::trace!("{} <- {:?}", session.name(), command);
                    writeln!(output, "{}", session.render())?;
                    if !status.is_empty() {
                        writeln!(output, "{}", status)?;
                    }
                }
                Err(err) => writeln!(output, "{}", err)?,
            },
        }

        if session.state().is_finished() {
            break;
        }
    }

    let state = session.state();
    match state {
        EngineState::Won => writeln!(output, "You win")?,
        EngineState::Lost => writeln!(output, "Game over")?,
        EngineState::Ready | EngineState::Active => writeln!(output, "Bye")?,
    }
    Ok(state)
}
