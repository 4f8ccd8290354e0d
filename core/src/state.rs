use serde::{Deserialize, Serialize};

/// Lifecycle shared by every engine.
///
/// Valid transitions:
/// - Ready -> Active
/// - Ready -> Won / Lost (decided by the very first move)
/// - Active -> Won / Lost
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Constructed, no move accepted yet
    Ready,
    /// At least one move accepted
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }

    pub(crate) fn mark_started(&mut self) {
        if self.is_ready() {
            *self = Self::Active;
        }
    }

    pub(crate) fn finish(&mut self, won: bool) {
        if self.is_finished() {
            return;
        }
        *self = if won { Self::Won } else { Self::Lost };
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::Ready
    }
}
