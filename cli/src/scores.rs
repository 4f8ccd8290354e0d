use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use arcade_core::HighScore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub best: HighScore,
    pub set_at: Option<DateTime<Utc>>,
    pub games_played: u32,
}

/// Best score per game, persisted as JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreBook {
    games: BTreeMap<String, ScoreEntry>,
}

impl ScoreBook {
    /// A missing file is an empty book.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&text).with_context(|| format!("Corrupt score file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn get(&self, game: &str) -> Option<&ScoreEntry> {
        self.games.get(game)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScoreEntry)> {
        self.games.iter().map(|(game, entry)| (game.as_str(), entry))
    }

    /// Counts a finished game and returns whether it set a new best.
    pub fn record(&mut self, game: &str, score: u32, now: DateTime<Utc>) -> bool {
        let entry = self.games.entry(game.to_owned()).or_default();
        entry.games_played = entry.games_played.saturating_add(1);
        let improved = entry.best.record(score);
        if improved {
            entry.set_at = Some(now);
        }
        improved
    }
}
