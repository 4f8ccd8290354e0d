use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arcade_core::{minefield, sudoku};
use serde::{Deserialize, Serialize};

/// Defaults read from the optional TOML settings file.
///
/// ```toml
/// score_file = "scores.json"
///
/// [merge]
/// rows = 4
/// cols = 4
///
/// [mines]
/// difficulty = "Hard"
/// compact = true
///
/// [sudoku]
/// difficulty = "Medium"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub score_file: Option<PathBuf>,
    pub merge: MergeSettings,
    pub mines: MinesSettings,
    pub blocks: BlocksSettings,
    pub sudoku: SudokuSettings,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeSettings {
    pub rows: u8,
    pub cols: u8,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self { rows: 4, cols: 4 }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinesSettings {
    pub difficulty: minefield::Difficulty,
    pub compact: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlocksSettings {
    pub rows: u8,
    pub cols: u8,
}

impl Default for BlocksSettings {
    fn default() -> Self {
        Self { rows: 20, cols: 10 }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SudokuSettings {
    pub difficulty: sudoku::Difficulty,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid settings in {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Falls back to defaults when no file was given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn score_file(&self) -> PathBuf {
        self.score_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("arcade-scores.json"))
    }
}
