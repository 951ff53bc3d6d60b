//! Shared types for GAFFER.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that the rating, optimizer,
//! transfer and source modules can depend on them without circular
//! references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Playing position. Numeric ids match the game API's `element_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    /// All positions in squad order (useful for iteration).
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Game API id (1..=4).
    pub fn id(&self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    /// Short three-letter label.
    pub fn short(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::Goalkeeper => write!(f, "Goalkeeper"),
            Position::Defender => write!(f, "Defender"),
            Position::Midfielder => write!(f, "Midfielder"),
            Position::Forward => write!(f, "Forward"),
        }
    }
}

/// One value per position. Deserializes from a TOML table such as
/// `{ goalkeeper = 2, defender = 5, midfielder = 5, forward = 3 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerPosition<T> {
    pub goalkeeper: T,
    pub defender: T,
    pub midfielder: T,
    pub forward: T,
}

impl<T: Copy> PerPosition<T> {
    pub fn get(&self, position: Position) -> T {
        match position {
            Position::Goalkeeper => self.goalkeeper,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
        }
    }

    /// Build a table by evaluating `f` for each position.
    pub fn from_fn(mut f: impl FnMut(Position) -> T) -> Self {
        Self {
            goalkeeper: f(Position::Goalkeeper),
            defender: f(Position::Defender),
            midfielder: f(Position::Midfielder),
            forward: f(Position::Forward),
        }
    }

    /// Iterate `(position, value)` pairs in squad order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, T)> + '_ {
        Position::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A player record from the catalog.
///
/// Treated as an immutable value once built; `composite_score` is derived
/// by [`crate::rating::RatingEngine`] whenever the raw stats are refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub name: String,
    /// Current purchase price (game currency, e.g. 7.5 = £7.5m).
    pub cost: Decimal,
    pub total_points: i32,
    pub position: Position,
    /// Team id (1..=20).
    pub team: u32,
    /// Points per game.
    pub ppg: f64,
    /// Percentage of managers owning this player (0–100).
    pub ownership: f64,
    pub composite_score: f64,
    /// Price the owning manager would get on sale. Only set for owned players.
    #[serde(default)]
    pub sell_cost: Option<Decimal>,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} (team {}) £{:.1}m | pts={} ppg={:.1} own={:.1}% | score={:.2}",
            self.position.short(),
            self.name,
            self.team,
            self.cost,
            self.total_points,
            self.ppg,
            self.ownership,
            self.composite_score,
        )
    }
}

impl Player {
    /// Price the player is worth when leaving an owned squad. Falls back to
    /// the market cost when no sell price is known.
    pub fn sale_value(&self) -> Decimal {
        self.sell_cost.unwrap_or(self.cost)
    }

    /// Helper to build a test player with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: u32, position: Position, team: u32, cost: Decimal, score: f64) -> Self {
        Player {
            id,
            name: format!("Player {id}"),
            cost,
            total_points: 0,
            position,
            team,
            ppg: 0.0,
            ownership: 0.0,
            composite_score: score,
            sell_cost: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Squads
// ---------------------------------------------------------------------------

/// A manager's current squad as reported by the squad source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedSquad {
    /// The 15 owned players, in pick order, with `sell_cost` populated.
    pub players: Vec<Player>,
    /// Spare cash in the bank.
    pub bank: Decimal,
}

impl OwnedSquad {
    /// Budget available for a full rebuild (free hit / wildcard):
    /// everything sold at its sell price plus the bank.
    pub fn rebuild_budget(&self) -> Decimal {
        self.players.iter().map(Player::sale_value).sum::<Decimal>() + self.bank
    }
}

/// An optimizer result: starting eleven plus bench.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Squad {
    /// Starters sorted by position.
    pub starters: Vec<Player>,
    /// Bench sorted by position.
    pub bench: Vec<Player>,
    /// Budget the starters were allowed to spend.
    pub starter_budget: Decimal,
    /// Budget the starters actually spent.
    pub starter_cost: Decimal,
}

impl fmt::Display for Squad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Starting XI (£{:.1}m):", self.starter_cost)?;
        for p in &self.starters {
            writeln!(f, "  {p}")?;
        }
        writeln!(f, "Bench (£{:.1}m):", self.bench_cost())?;
        for p in &self.bench {
            writeln!(f, "  {p}")?;
        }
        write!(
            f,
            "Total: £{:.1}m | composite score {:.2}",
            self.total_cost(),
            self.total_score(),
        )
    }
}

impl Squad {
    /// All 15 players, starters first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.starters.iter().chain(self.bench.iter())
    }

    /// Starters followed by bench as one list.
    pub fn into_players(self) -> Vec<Player> {
        let mut all = self.starters;
        all.extend(self.bench);
        all
    }

    pub fn len(&self) -> usize {
        self.starters.len() + self.bench.len()
    }

    pub fn bench_cost(&self) -> Decimal {
        self.bench.iter().map(|p| p.cost).sum()
    }

    pub fn total_cost(&self) -> Decimal {
        self.players().map(|p| p.cost).sum()
    }

    /// Sum of composite scores over all 15 players.
    pub fn total_score(&self) -> f64 {
        self.players().map(|p| p.composite_score).sum()
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// A legal one-for-one swap suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCandidate {
    pub player_out: Player,
    pub player_in: Player,
}

impl TransferCandidate {
    /// Composite-score improvement of the swap (may be negative).
    pub fn gain(&self) -> f64 {
        self.player_in.composite_score - self.player_out.composite_score
    }
}

impl fmt::Display for TransferCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let gain = self.gain();
        let sign = if gain >= 0.0 { "+" } else { "" };
        write!(
            f,
            "OUT {} (£{:.1}m) -> IN {} (£{:.1}m) [{}{:.2}]",
            self.player_out.name,
            self.player_out.cost,
            self.player_in.name,
            self.player_in.cost,
            sign,
            gain,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures raised by the selection engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Infeasible {stage} selection: {reason}")]
    Infeasible { stage: &'static str, reason: String },

    #[error("No scoring function registered for chip type '{0}'")]
    UnknownScoringVariant(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
