use serde::{Deserialize, Serialize};

/// High-water mark of a score, persisted by the host.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScore {
    best: u32,
}

impl HighScore {
    pub const fn new(best: u32) -> Self {
        Self { best }
    }

    pub const fn best(&self) -> u32 {
        self.best
    }

    /// Raises the mark if `score` beats it, returning whether it moved.
    pub fn record(&mut self, score: u32) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }
}
