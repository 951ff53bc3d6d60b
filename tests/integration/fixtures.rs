//! In-memory player catalog and sources for deterministic testing.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};

use gaffer::sources::{PlayerSource, SquadSource};
use gaffer::types::{OwnedSquad, Player, Position};

/// The club every fixture treats as "team A".
pub const TEAM_A: u32 = 1;

pub fn player(id: u32, position: Position, team: u32, cost: Decimal, score: f64) -> Player {
    Player {
        id,
        name: format!("{} {id}", position.short()),
        cost,
        total_points: (score * 2.0) as i32,
        position,
        team,
        ppg: score / 10.0,
        ownership: 5.0,
        composite_score: score,
        sell_cost: None,
    }
}

/// A league of `teams` clubs. Each club has one regular per roster slot
/// (1 GK, 2 DEF, 2 MID, 1 FWD) with spread-out prices, plus one cheap
/// low-scoring squad filler per position.
pub fn league(teams: u32) -> Vec<Player> {
    let roster = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Defender,
        Position::Midfielder,
        Position::Midfielder,
        Position::Forward,
    ];
    let mut players = Vec::new();
    let mut id = 1;
    for team in 1..=teams {
        for pos in roster {
            let step = (id * 7) % 10;
            let cost = dec!(4.5) + Decimal::from(step) * dec!(0.5);
            let score = (4.5 + f64::from(step) * 0.5) * 8.0 + f64::from(id % 5);
            players.push(player(id, pos, team, cost, score));
            id += 1;
        }
        for pos in Position::ALL {
            players.push(player(id, pos, team, dec!(4.0), 1.0));
            id += 1;
        }
    }
    players
}

/// Source backed by a fixed catalog, with an optional forced failure.
pub struct InMemorySource {
    players: Vec<Player>,
    squad: Option<OwnedSquad>,
    force_error: Arc<Mutex<Option<String>>>,
}

impl InMemorySource {
    pub fn new(players: Vec<Player>) -> Self {
        Self {
            players,
            squad: None,
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_squad(mut self, squad: OwnedSquad) -> Self {
        self.squad = Some(squad);
        self
    }

    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    fn check(&self) -> Result<()> {
        match self.force_error.lock().unwrap().as_ref() {
            Some(err) => Err(anyhow!("{err}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlayerSource for InMemorySource {
    async fn fetch_players(&self) -> Result<Vec<Player>> {
        self.check()?;
        Ok(self.players.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[async_trait]
impl SquadSource for InMemorySource {
    async fn fetch_squad(&self) -> Result<OwnedSquad> {
        self.check()?;
        self.squad.clone().ok_or_else(|| anyhow!("No squad configured"))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gaffer::rules::count_positions;

    #[test]
    fn test_league_shape() {
        let players = league(10);
        assert_eq!(players.len(), 100);
        let counts = count_positions(&players);
        assert_eq!(counts.get(Position::Goalkeeper), 20);
        assert_eq!(counts.get(Position::Defender), 30);
        assert!(players.iter().all(|p| p.cost >= dec!(4.0) && p.cost <= dec!(9.0)));
    }

    #[tokio::test]
    async fn test_forced_error() {
        let source = InMemorySource::new(league(2));
        assert_eq!(source.fetch_players().await.unwrap().len(), 20);
        assert!(source.fetch_squad().await.is_err());

        source.set_error("simulated outage");
        let err = source.fetch_players().await.unwrap_err();
        assert!(err.to_string().contains("outage"));
    }
}
