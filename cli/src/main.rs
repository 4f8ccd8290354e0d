use std::io;
use std::path::PathBuf;

use anyhow::Result;
use arcade_core::blocks::WellConfig;
use arcade_core::merge::MergeConfig;
use arcade_core::{minefield, sudoku};
use clap::{Parser, Subcommand, ValueEnum};

mod command;
mod logging;
mod scores;
mod session;
mod settings;

use scores::ScoreBook;
use session::{BlocksSession, MergeSession, MinesSession, Session, SudokuSession};
use settings::Settings;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Settings file, TOML
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force a seed instead of random, decimal or 0x-prefixed hex
    #[arg(short, long)]
    seed: Option<String>,

    #[command(subcommand)]
    game: Game,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Level {
    Easy,
    Medium,
    Hard,
}

impl From<Level> for minefield::Difficulty {
    fn from(level: Level) -> Self {
        match level {
            Level::Easy => Self::Easy,
            Level::Medium => Self::Medium,
            Level::Hard => Self::Hard,
        }
    }
}

impl From<Level> for sudoku::Difficulty {
    fn from(level: Level) -> Self {
        match level {
            Level::Easy => Self::Easy,
            Level::Medium => Self::Medium,
            Level::Hard => Self::Hard,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Game {
    /// Slide and merge numbered tiles
    Merge {
        #[arg(long)]
        rows: Option<u8>,
        #[arg(long)]
        cols: Option<u8>,
    },
    /// Clear a field without touching a mine
    Mines {
        #[arg(short, long, value_enum)]
        difficulty: Option<Level>,
        /// Use the smaller board sizes
        #[arg(long)]
        compact: bool,
    },
    /// Stack falling pieces into full rows
    Blocks {
        #[arg(long)]
        rows: Option<u8>,
        #[arg(long)]
        cols: Option<u8>,
    },
    /// Fill the 9x9 grid
    Sudoku {
        #[arg(short, long, value_enum)]
        difficulty: Option<Level>,
    },
    /// List best scores
    Scores,
}

fn build_session(game: Game, settings: &Settings, seed: u64) -> Option<Box<dyn Session>> {
    let session: Box<dyn Session> = match game {
        Game::Merge { rows, cols } => {
            let config = MergeConfig::new(
                rows.unwrap_or(settings.merge.rows),
                cols.unwrap_or(settings.merge.cols),
            );
            Box::new(MergeSession::new(config, seed))
        }
        Game::Mines {
            difficulty,
            compact,
        } => {
            let difficulty = difficulty.map_or(settings.mines.difficulty, Into::into);
            let config = if compact || settings.mines.compact {
                difficulty.compact_config()
            } else {
                difficulty.config()
            };
            Box::new(MinesSession::new(config, seed))
        }
        Game::Blocks { rows, cols } => {
            let config = WellConfig::new(
                rows.unwrap_or(settings.blocks.rows),
                cols.unwrap_or(settings.blocks.cols),
            );
            Box::new(BlocksSession::new(config, seed))
        }
        Game::Sudoku { difficulty } => {
            let difficulty = difficulty.map_or(settings.sudoku.difficulty, Into::into);
            Box::new(SudokuSession::new(difficulty, seed))
        }
        Game::Scores => return None,
    };
    Some(session)
}

fn print_scores(book: &ScoreBook) {
    let mut empty = true;
    for (game, entry) in book.iter() {
        empty = false;
        let when = entry
            .set_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:>8}  {:>4} games  {}",
            game,
            entry.best.best(),
            entry.games_played,
            when
        );
    }
    if empty {
        println!("No scores yet");
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose.log_level_filter());

    let settings = Settings::load_or_default(args.config.as_deref())?;
    let score_file = settings.score_file();
    let seed = match &args.seed {
        Some(text) => command::parse_seed(text)?,
        None => rand::random(),
    };
    log::debug!("seed: {:#x}", seed);

    let Some(mut game) = build_session(args.game, &settings, seed) else {
        print_scores(&ScoreBook::load(&score_file)?);
        return Ok(());
    };

    let stdin = io::stdin();
    let state = session::run(game.as_mut(), stdin.lock(), io::stdout().lock())?;
    log::info!("{} ended {:?}", game.name(), state);

    if let Some(score) = game.score() {
        let mut book = ScoreBook::load(&score_file)?;
        if book.record(game.name(), score, chrono::Utc::now()) {
            println!("New best for {}: {}", game.name(), score);
        }
        book.save(&score_file)?;
    }
    Ok(())
}
