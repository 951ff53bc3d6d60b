//! Saved `my-team` snapshot.
//!
//! The authenticated `my-team/{entry}/` endpoint returns the manager's picks
//! with their selling prices and the bank balance. Logging in is out of
//! scope, so the response is read from a file saved by the user.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use super::{tenths, SquadSource};
use crate::types::{OwnedSquad, Player};

const SOURCE_NAME: &str = "my-team";

#[derive(Debug, Deserialize)]
struct MyTeamResponse {
    picks: Vec<Pick>,
    #[serde(default)]
    transfers: Option<TransferState>,
}

#[derive(Debug, Deserialize)]
struct Pick {
    element: u32,
    /// Slot 1..=15; 12..=15 are the bench.
    #[serde(default)]
    position: u32,
    /// Selling price in tenths.
    #[serde(default)]
    selling_price: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TransferState {
    /// Bank balance in tenths.
    #[serde(default)]
    bank: i64,
}

/// Resolve a `my-team` response against the player catalog.
///
/// Picks are returned in slot order with `sell_cost` populated. A response
/// with other than `squad_size` picks is rejected.
pub fn parse_my_team(json: &str, catalog: &[Player], squad_size: usize) -> Result<OwnedSquad> {
    let mut resp: MyTeamResponse =
        serde_json::from_str(json).context("Failed to parse my-team response")?;
    if resp.picks.len() != squad_size {
        anyhow::bail!(
            "my-team response has {} picks, expected a squad of {squad_size}",
            resp.picks.len()
        );
    }
    resp.picks.sort_by_key(|p| p.position);

    let by_id: HashMap<u32, &Player> = catalog.iter().map(|p| (p.id, p)).collect();
    let players = resp
        .picks
        .iter()
        .map(|pick| -> Result<Player> {
            let player = by_id
                .get(&pick.element)
                .with_context(|| format!("Picked player {} not in catalog", pick.element))?;
            let mut owned = (*player).clone();
            owned.sell_cost = Some(pick.selling_price.map(tenths).unwrap_or(player.cost));
            Ok(owned)
        })
        .collect::<Result<Vec<_>>>()?;

    let bank = resp.transfers.map(|t| tenths(t.bank)).unwrap_or(Decimal::ZERO);
    Ok(OwnedSquad { players, bank })
}

/// A `my-team` response saved to disk.
pub struct MyTeamFile {
    path: PathBuf,
    catalog: Vec<Player>,
    squad_size: usize,
}

impl MyTeamFile {
    pub fn new(path: impl Into<PathBuf>, catalog: Vec<Player>, squad_size: usize) -> Self {
        Self {
            path: path.into(),
            catalog,
            squad_size,
        }
    }
}

#[async_trait]
impl SquadSource for MyTeamFile {
    async fn fetch_squad(&self) -> Result<OwnedSquad> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read my-team file {}", self.path.display()))?;
        let squad = parse_my_team(&json, &self.catalog, self.squad_size)?;
        info!(
            path = %self.path.display(),
            players = squad.players.len(),
            bank = %squad.bank,
            "Squad loaded"
        );
        Ok(squad)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}
