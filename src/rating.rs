//! Composite player rating.
//!
//! A fixed linear blend of points-per-game, season points and ownership.
//! The inputs live on very different scales and are not normalised.

use serde::Deserialize;
use tracing::debug;

use crate::types::Player;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Weights of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatingWeights {
    pub ppg: f64,
    pub total_points: f64,
    pub ownership: f64,
}

impl Default for RatingWeights {
    fn default() -> Self {
        Self {
            ppg: 0.5,
            total_points: 0.4,
            ownership: 0.1,
        }
    }
}

// ---------------------------------------------------------------------------
// Rating engine
// ---------------------------------------------------------------------------

pub struct RatingEngine {
    weights: RatingWeights,
}

impl Default for RatingEngine {
    fn default() -> Self {
        Self::new(RatingWeights::default())
    }
}

impl RatingEngine {
    pub fn new(weights: RatingWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &RatingWeights {
        &self.weights
    }

    /// `ppg·w_ppg + total_points·w_points + ownership·w_ownership`
    pub fn score(&self, ppg: f64, total_points: f64, ownership: f64) -> f64 {
        ppg * self.weights.ppg
            + total_points * self.weights.total_points
            + ownership * self.weights.ownership
    }

    /// Rating for a player's current raw stats.
    pub fn rate(&self, player: &Player) -> f64 {
        self.score(player.ppg, f64::from(player.total_points), player.ownership)
    }

    /// Recompute `composite_score` for every player after a stats refresh.
    pub fn refresh(&self, players: &mut [Player]) {
        for player in players.iter_mut() {
            player.composite_score = self.rate(player);
        }
        debug!(players = players.len(), "Composite scores refreshed");
    }
}
