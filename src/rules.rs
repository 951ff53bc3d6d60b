//! Squad composition rules.
//!
//! Defaults match the game: an eleven plus a four-man bench, at most three
//! players per club, 2 GK / 5 DEF / 5 MID / 3 FWD overall. Every field can be
//! overridden from `config.toml`.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

use crate::types::{PerPosition, Player, Position, Squad};

/// Structural constraints every squad must satisfy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SquadRules {
    pub lineup_size: usize,
    pub bench_size: usize,
    /// Maximum players from a single team across the whole squad.
    pub team_max: usize,
    /// (min, max) per position among the starting eleven.
    pub formation: PerPosition<(usize, usize)>,
    /// Required total per position across the full squad.
    pub positions: PerPosition<usize>,
}

impl Default for SquadRules {
    fn default() -> Self {
        Self {
            lineup_size: 11,
            bench_size: 4,
            team_max: 3,
            formation: PerPosition {
                goalkeeper: (1, 1),
                defender: (3, 5),
                midfielder: (2, 5),
                forward: (1, 3),
            },
            positions: PerPosition {
                goalkeeper: 2,
                defender: 5,
                midfielder: 5,
                forward: 3,
            },
        }
    }
}

/// A broken squad invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SquadViolation {
    #[error("expected {expected} starters, found {found}")]
    LineupSize { expected: usize, found: usize },

    #[error("expected {expected} bench players, found {found}")]
    BenchSize { expected: usize, found: usize },

    #[error("player {0} appears more than once")]
    DuplicatePlayer(u32),

    #[error("{count} starting {position}s outside formation bounds {min}..={max}")]
    Formation {
        position: Position,
        count: usize,
        min: usize,
        max: usize,
    },

    #[error("{count} {position}s in squad, {required} required")]
    PositionTotal {
        position: Position,
        count: usize,
        required: usize,
    },

    #[error("team {team} has {count} players (max {max})")]
    TeamLimit { team: u32, count: usize, max: usize },

    #[error("squad costs {cost:.1} but budget is {budget:.1}")]
    OverBudget { cost: Decimal, budget: Decimal },
}

impl SquadRules {
    pub fn squad_size(&self) -> usize {
        self.lineup_size + self.bench_size
    }

    /// Check every invariant of a finished squad against `budget`.
    /// Returns the first violation found.
    pub fn validate(&self, squad: &Squad, budget: Decimal) -> Result<(), SquadViolation> {
        if squad.starters.len() != self.lineup_size {
            return Err(SquadViolation::LineupSize {
                expected: self.lineup_size,
                found: squad.starters.len(),
            });
        }
        if squad.bench.len() != self.bench_size {
            return Err(SquadViolation::BenchSize {
                expected: self.bench_size,
                found: squad.bench.len(),
            });
        }

        let mut seen = HashSet::new();
        for p in squad.players() {
            if !seen.insert(p.id) {
                return Err(SquadViolation::DuplicatePlayer(p.id));
            }
        }

        let starters = count_positions(&squad.starters);
        for (position, (min, max)) in self.formation.iter() {
            let count = starters.get(position);
            if count < min || count > max {
                return Err(SquadViolation::Formation { position, count, min, max });
            }
        }

        let all: Vec<Player> = squad.players().cloned().collect();
        let totals = count_positions(&all);
        for (position, required) in self.positions.iter() {
            let count = totals.get(position);
            if count != required {
                return Err(SquadViolation::PositionTotal { position, count, required });
            }
        }

        let mut teams: Vec<(u32, usize)> = team_counts(squad.players()).into_iter().collect();
        teams.sort_unstable();
        if let Some(&(team, count)) = teams.iter().find(|(_, c)| *c > self.team_max) {
            return Err(SquadViolation::TeamLimit { team, count, max: self.team_max });
        }

        let cost = squad.total_cost();
        if cost > budget {
            return Err(SquadViolation::OverBudget { cost, budget });
        }

        Ok(())
    }
}

/// Number of players per position.
pub fn count_positions(players: &[Player]) -> PerPosition<usize> {
    PerPosition::from_fn(|pos| players.iter().filter(|p| p.position == pos).count())
}

/// Number of players per team.
pub fn team_counts<'a>(players: impl IntoIterator<Item = &'a Player>) -> HashMap<u32, usize> {
    let mut counts = HashMap::new();
    for p in players {
        *counts.entry(p.team).or_insert(0) += 1;
    }
    counts
}
