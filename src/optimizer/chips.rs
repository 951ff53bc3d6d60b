//! Chip types and their scoring strategies.
//!
//! Each chip maps to a named [`ScoringStrategy`]. A chip without a strategy
//! (currently `wildcard`) is recognised but cannot be optimised for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{EngineError, Player};

/// Special squad-rebuild modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipType {
    FreeHit,
    Wildcard,
}

impl ChipType {
    pub fn key(&self) -> &'static str {
        match self {
            ChipType::FreeHit => "free_hit",
            ChipType::Wildcard => "wildcard",
        }
    }

    /// Scoring strategy registered for this chip.
    ///
    /// The wildcard score is meant to weigh fixture/team context; it has no
    /// formula yet and is rejected until one is registered here.
    pub fn strategy(&self) -> Result<ScoringStrategy, EngineError> {
        match self {
            ChipType::FreeHit => Ok(ScoringStrategy::Composite),
            ChipType::Wildcard => Err(EngineError::UnknownScoringVariant(self.key().to_string())),
        }
    }
}

impl fmt::Display for ChipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ChipType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "free_hit" | "freehit" => Ok(ChipType::FreeHit),
            "wildcard" => Ok(ChipType::Wildcard),
            _ => Err(EngineError::UnknownScoringVariant(s.to_string())),
        }
    }
}

/// Per-player objective used by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    /// The rating engine's composite score.
    Composite,
}

impl ScoringStrategy {
    pub fn score(&self, player: &Player) -> f64 {
        match self {
            ScoringStrategy::Composite => player.composite_score,
        }
    }
}

// ---------------------------------------------------------------------------
// Captaincy & bench boost
// ---------------------------------------------------------------------------

/// Captain and vice-captain picks.
#[derive(Debug, Clone)]
pub struct Captaincy {
    pub captain: Player,
    pub vice_captain: Player,
}

/// Captain = highest composite score, vice = second highest.
pub fn choose_captains(players: &[Player]) -> Result<Captaincy, EngineError> {
    if players.len() < 2 {
        return Err(EngineError::InvalidParameter {
            name: "players",
            reason: format!("need at least 2 players to pick captains, got {}", players.len()),
        });
    }
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by(|a, b| b.composite_score.total_cmp(&a.composite_score));
    Ok(Captaincy {
        captain: ranked[0].clone(),
        vice_captain: ranked[1].clone(),
    })
}

/// Predicted bench-boost value: composite score of everyone after the
/// first `lineup_size` entries.
pub fn bench_boost_value(squad: &[Player], lineup_size: usize) -> f64 {
    squad.iter().skip(lineup_size).map(|p| p.composite_score).sum()
}
