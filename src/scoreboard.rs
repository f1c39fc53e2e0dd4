//! Run scoreboard: kills, points and the high score

use serde::{Deserialize, Serialize};

/// Score tracking for one run
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Scoreboard {
    /// Credited kills
    pub score: u64,
    /// Weighted kill points
    pub points: u64,
    /// Best score, seeded from settings
    pub high_score: u64,
    /// A boss has appeared this run
    pub boss_encountered: bool,
    /// High score already beaten this run
    #[serde(default)]
    beaten: bool,
}

impl Scoreboard {
    pub fn new(high_score: u64) -> Self {
        Self {
            high_score,
            ..Self::default()
        }
    }

    /// Record a kill worth `points`. Returns true the first time this run
    /// overtakes the previous best.
    pub fn record_kill(&mut self, points: u64) -> bool {
        self.score += 1;
        self.points += points;
        if self.score <= self.high_score {
            return false;
        }
        self.high_score = self.score;
        !std::mem::replace(&mut self.beaten, true)
    }
}
