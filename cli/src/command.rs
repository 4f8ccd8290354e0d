use anyhow::{Context, Result, anyhow, bail};
use arcade_core::Coord2;
use arcade_core::merge::Direction;

/// One line of player input, already split into a logical operation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Help,
    Show,
    // sliding tiles
    Slide(Direction),
    // minefield
    Reveal(Coord2),
    Flag(Coord2),
    Chord(Coord2),
    // falling blocks
    Left,
    Right,
    Rotate,
    Down,
    Drop,
    Tick,
    Pause,
    // sudoku
    Select(Coord2),
    Set(Coord2, u8),
    Note(Coord2, u8),
    Erase(Coord2),
    Hint(Coord2),
}

pub const HELP: &str = "\
common:  show | help | quit
merge:   up | down | left | right  (or w a s d)
mines:   reveal R C | flag R C | chord R C
blocks:  left | right | rotate | down | drop | tick | pause
sudoku:  select R C | set R C D | note R C D | erase R C | hint R C";

fn number<T: std::str::FromStr>(word: Option<&str>, what: &str) -> Result<T> {
    let word = word.ok_or_else(|| anyhow!("Missing {}", what))?;
    word.parse()
        .map_err(|_| anyhow!("Invalid {} '{}'", what, word))
}

fn coords<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<Coord2> {
    Ok((number(words.next(), "row")?, number(words.next(), "column")?))
}

impl Command {
    /// Parses a command; blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "q" | "quit" | "exit" => Self::Quit,
            "h" | "help" | "?" => Self::Help,
            "show" => Self::Show,
            "up" | "w" => Self::Slide(Direction::Up),
            "down" | "s" => Self::Slide(Direction::Down),
            "left" | "a" => Self::Slide(Direction::Left),
            "right" | "d" => Self::Slide(Direction::Right),
            "reveal" | "r" => Self::Reveal(coords(&mut words)?),
            "flag" | "f" => Self::Flag(coords(&mut words)?),
            "chord" | "c" => Self::Chord(coords(&mut words)?),
            "rotate" => Self::Rotate,
            "drop" => Self::Drop,
            "tick" | "t" => Self::Tick,
            "pause" | "p" => Self::Pause,
            "select" => Self::Select(coords(&mut words)?),
            "set" => {
                let at = coords(&mut words)?;
                Self::Set(at, number(words.next(), "digit")?)
            }
            "note" | "n" => {
                let at = coords(&mut words)?;
                Self::Note(at, number(words.next(), "digit")?)
            }
            "erase" | "e" => Self::Erase(coords(&mut words)?),
            "hint" => Self::Hint(coords(&mut words)?),
            other => bail!("Unknown command '{}', try 'help'", other),
        };

        if let Some(extra) = words.next() {
            bail!("Unexpected '{}' after {}", extra, verb);
        }
        Ok(Some(command))
    }

    /// Direction words double as block movement in the falling-block game.
    pub fn as_block_move(self) -> Self {
        match self {
            Self::Slide(Direction::Left) => Self::Left,
            Self::Slide(Direction::Right) => Self::Right,
            Self::Slide(Direction::Down) => Self::Down,
            Self::Slide(Direction::Up) => Self::Rotate,
            other => other,
        }
    }
}

/// Parses `--seed` style values, accepting hex with a `0x` prefix.
pub fn parse_seed(text: &str) -> Result<u64> {
    let parsed = match text.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("Invalid seed '{}'", text))
}
