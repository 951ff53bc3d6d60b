//! Data sources.
//!
//! Defines the `PlayerSource` and `SquadSource` traits the engine's callers
//! use to obtain players, and provides implementations for:
//! - the game's public `bootstrap-static` API (all players)
//! - a saved `my-team` response (the manager's squad, sell prices and bank)
//! - the on-disk catalog cache (see `storage`)

pub mod fpl;
pub mod my_team;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use crate::types::{OwnedSquad, Player};

/// Anything that can list the current player catalog.
#[async_trait]
pub trait PlayerSource: Send + Sync {
    /// All players with composite scores filled in.
    async fn fetch_players(&self) -> Result<Vec<Player>>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

/// Anything that can report the manager's current squad.
#[async_trait]
pub trait SquadSource: Send + Sync {
    /// Owned players (with `sell_cost`) and the bank balance.
    async fn fetch_squad(&self) -> Result<OwnedSquad>;

    fn name(&self) -> &str;
}

/// The game API reports money in tenths (`55` = 5.5).
pub(crate) fn tenths(value: i64) -> Decimal {
    Decimal::new(value, 1)
}

/// Accepts `"5.2"`, `5.2` or `null` (as 0.0). The game API sends decimal
/// stats as strings.
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null(Option<()>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) if s.trim().is_empty() => Ok(0.0),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null(_) => Ok(0.0),
    }
}
