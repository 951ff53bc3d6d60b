//! Squad optimizer: starting eleven + bench via two binary programs.
//!
//! 1. Split the budget between starters and bench (`interpolate_budget`).
//! 2. Pick the best legal eleven within the starter budget.
//! 3. Pick the bench from everyone else with what is left, filling the
//!    remaining position quotas exactly and respecting the club cap across
//!    the whole squad.

pub mod chips;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::rules::{count_positions, team_counts, SquadRules};
use crate::solver::{BinaryProgram, BinarySolver, Comparison, HighsSolver, SolveError};
use crate::types::{EngineError, PerPosition, Player, Squad};
use chips::{ChipType, ScoringStrategy};

// ---------------------------------------------------------------------------
// Budget split
// ---------------------------------------------------------------------------

/// Starter share of the budget at `bench_importance = 0`.
pub const MIN_STARTER_MULTIPLIER: f64 = 0.83;
/// Starter share of the budget at `bench_importance = 1`.
pub const MAX_STARTER_MULTIPLIER: f64 = (220.0 / 3.0) / 100.0;

/// Budget the starting eleven may spend.
///
/// Linear in `bench_importance` between the two multipliers. Note that
/// `MAX_STARTER_MULTIPLIER` is smaller than `MIN_STARTER_MULTIPLIER`, so a
/// higher importance gives the starters less. Pinned by tests.
pub fn interpolate_budget(bench_importance: f64, budget: Decimal) -> Result<Decimal, EngineError> {
    if !(0.0..=1.0).contains(&bench_importance) {
        return Err(EngineError::InvalidParameter {
            name: "bench_importance",
            reason: format!("must be between 0 and 1, got {bench_importance}"),
        });
    }
    let multiplier = MIN_STARTER_MULTIPLIER
        + (MAX_STARTER_MULTIPLIER - MIN_STARTER_MULTIPLIER) * bench_importance;
    let multiplier = Decimal::from_f64(multiplier).ok_or_else(|| EngineError::InvalidParameter {
        name: "bench_importance",
        reason: format!("budget multiplier {multiplier} is not representable"),
    })?;
    Ok(budget * multiplier)
}

fn check_budget(budget: Decimal) -> Result<(), EngineError> {
    if budget < Decimal::ZERO {
        return Err(EngineError::InvalidParameter {
            name: "budget",
            reason: format!("must be non-negative, got {budget}"),
        });
    }
    Ok(())
}

/// Money in solver units (tenths), so whole-tenth prices sum exactly.
fn solver_units(amount: Decimal) -> f64 {
    (amount * dec!(10)).to_f64().unwrap_or(f64::MAX)
}

fn map_solve_error(stage: &'static str, err: SolveError, budget: Decimal) -> EngineError {
    match err {
        SolveError::Infeasible => EngineError::Infeasible {
            stage,
            reason: format!("no selection satisfies the constraints within budget {budget:.1}"),
        },
        SolveError::TimeLimit(secs) => {
            EngineError::Solver(format!("{stage} selection hit the {secs}s time limit"))
        }
        SolveError::Backend(msg) => EngineError::Solver(msg),
    }
}

// ---------------------------------------------------------------------------
// Optimizer
// ---------------------------------------------------------------------------

pub struct SquadOptimizer<S = HighsSolver> {
    rules: SquadRules,
    solver: S,
}

impl SquadOptimizer<HighsSolver> {
    pub fn new(rules: SquadRules) -> Self {
        Self::with_solver(rules, HighsSolver::default())
    }
}

impl<S: BinarySolver> SquadOptimizer<S> {
    pub fn with_solver(rules: SquadRules, solver: S) -> Self {
        Self { rules, solver }
    }

    pub fn rules(&self) -> &SquadRules {
        &self.rules
    }

    /// Players still needed per position once `starters` are picked.
    pub fn position_requirements(&self, starters: &[Player]) -> PerPosition<usize> {
        let picked = count_positions(starters);
        PerPosition::from_fn(|pos| self.rules.positions.get(pos).saturating_sub(picked.get(pos)))
    }

    /// Build a full squad for a chip.
    pub fn build_squad(
        &self,
        players: &[Player],
        budget: Decimal,
        bench_importance: f64,
        chip: ChipType,
    ) -> Result<Squad, EngineError> {
        let strategy = chip.strategy()?;
        self.build_squad_with(players, budget, bench_importance, strategy)
    }

    /// Build a full squad maximising `strategy`.
    pub fn build_squad_with(
        &self,
        players: &[Player],
        budget: Decimal,
        bench_importance: f64,
        strategy: ScoringStrategy,
    ) -> Result<Squad, EngineError> {
        check_budget(budget)?;
        let starter_budget = interpolate_budget(bench_importance, budget)?;
        info!(
            pool = players.len(),
            budget = %budget,
            starter_budget = format!("{starter_budget:.2}"),
            bench_importance,
            "Building squad"
        );

        let (starters, starter_cost) = self.select_starters(players, starter_budget, strategy)?;
        let positions_left = self.position_requirements(&starters);
        let bench = self.select_bench(
            players,
            budget - starter_cost,
            &positions_left,
            &starters,
            strategy,
        )?;

        let squad = Squad {
            starters,
            bench,
            starter_budget,
            starter_cost,
        };
        info!(
            cost = %squad.total_cost(),
            score = format!("{:.2}", squad.total_score()),
            "Squad built"
        );
        Ok(squad)
    }

    /// Best `lineup_size` players within `budget`, sorted by position.
    /// Also returns what they cost.
    pub fn select_starters(
        &self,
        players: &[Player],
        budget: Decimal,
        strategy: ScoringStrategy,
    ) -> Result<(Vec<Player>, Decimal), EngineError> {
        check_budget(budget)?;
        let rules = &self.rules;

        if players.len() < rules.lineup_size {
            return Err(EngineError::Infeasible {
                stage: "starter",
                reason: format!(
                    "pool has {} players, lineup needs {}",
                    players.len(),
                    rules.lineup_size
                ),
            });
        }
        let available = count_positions(players);
        for (position, (min, _)) in rules.formation.iter() {
            if available.get(position) < min {
                return Err(EngineError::Infeasible {
                    stage: "starter",
                    reason: format!(
                        "{} {position}s available, formation needs at least {min}",
                        available.get(position)
                    ),
                });
            }
        }

        let mut program = BinaryProgram::new(
            "starting_eleven",
            players.iter().map(|p| strategy.score(p)).collect(),
        );
        program.count(0..players.len(), Comparison::Equal, rules.lineup_size as f64);
        program.add_constraint(
            players.iter().enumerate().map(|(i, p)| (i, solver_units(p.cost))).collect(),
            Comparison::LessOrEqual,
            solver_units(budget),
        );
        for (position, (min, max)) in rules.formation.iter() {
            let vars: Vec<usize> = indices(players, |p| p.position == position);
            program.count(vars.iter().copied(), Comparison::GreaterOrEqual, min as f64);
            program.count(vars, Comparison::LessOrEqual, max as f64);
        }
        for (team, vars) in team_index(players) {
            if vars.len() > rules.team_max {
                debug!(team, players = vars.len(), "Capping team");
                program.count(vars, Comparison::LessOrEqual, rules.team_max as f64);
            }
        }

        let selection = self
            .solver
            .maximize(&program)
            .map_err(|e| map_solve_error("starter", e, budget))?;
        let starters = picked(players, &selection);
        if starters.len() != rules.lineup_size {
            return Err(EngineError::Solver(format!(
                "solver returned {} starters, expected {}",
                starters.len(),
                rules.lineup_size
            )));
        }

        let cost: Decimal = starters.iter().map(|p| p.cost).sum();
        if cost > budget {
            return Err(EngineError::Solver(format!(
                "starters cost {cost}, over the {budget:.2} budget"
            )));
        }
        info!(
            cost = %cost,
            budget = format!("{budget:.2}"),
            score = format!("{:.2}", program.evaluate(&selection)),
            "Starting eleven selected"
        );
        Ok((starters, cost))
    }

    /// Best bench from `players` minus `starters`, matching `positions_left`
    /// exactly and staying within `budget`. Sorted by position.
    pub fn select_bench(
        &self,
        players: &[Player],
        budget: Decimal,
        positions_left: &PerPosition<usize>,
        starters: &[Player],
        strategy: ScoringStrategy,
    ) -> Result<Vec<Player>, EngineError> {
        check_budget(budget)?;
        let rules = &self.rules;

        let needed: usize = positions_left.iter().map(|(_, n)| n).sum();
        if needed != rules.bench_size {
            return Err(EngineError::Infeasible {
                stage: "bench",
                reason: format!(
                    "position quotas leave {needed} places, bench size is {}",
                    rules.bench_size
                ),
            });
        }
        if needed == 0 {
            return Ok(Vec::new());
        }

        let starter_ids: HashSet<u32> = starters.iter().map(|p| p.id).collect();
        let pool: Vec<Player> = players
            .iter()
            .filter(|p| !starter_ids.contains(&p.id))
            .cloned()
            .collect();

        let available = count_positions(&pool);
        for (position, n) in positions_left.iter() {
            if available.get(position) < n {
                return Err(EngineError::Infeasible {
                    stage: "bench",
                    reason: format!(
                        "{} unused {position}s available, bench needs {n}",
                        available.get(position)
                    ),
                });
            }
        }

        let mut program = BinaryProgram::new(
            "bench",
            pool.iter().map(|p| strategy.score(p)).collect(),
        );
        program.count(0..pool.len(), Comparison::Equal, rules.bench_size as f64);
        program.add_constraint(
            pool.iter().enumerate().map(|(i, p)| (i, solver_units(p.cost))).collect(),
            Comparison::LessOrEqual,
            solver_units(budget),
        );
        for (position, n) in positions_left.iter() {
            program.count(
                indices(&pool, |p| p.position == position),
                Comparison::Equal,
                n as f64,
            );
        }
        let taken = team_counts(starters);
        for (team, vars) in team_index(&pool) {
            let room = rules
                .team_max
                .saturating_sub(taken.get(&team).copied().unwrap_or(0));
            if vars.len() > room {
                program.count(vars, Comparison::LessOrEqual, room as f64);
            }
        }

        let selection = self
            .solver
            .maximize(&program)
            .map_err(|e| map_solve_error("bench", e, budget))?;
        let bench = picked(&pool, &selection);
        if bench.len() != rules.bench_size {
            return Err(EngineError::Solver(format!(
                "solver returned {} bench players, expected {}",
                bench.len(),
                rules.bench_size
            )));
        }

        let cost: Decimal = bench.iter().map(|p| p.cost).sum();
        if cost > budget {
            return Err(EngineError::Solver(format!(
                "bench costs {cost}, over the {budget:.2} budget"
            )));
        }
        info!(cost = %cost, budget = format!("{budget:.2}"), "Bench selected");
        Ok(bench)
    }
}

fn indices(players: &[Player], pred: impl Fn(&Player) -> bool) -> Vec<usize> {
    players
        .iter()
        .enumerate()
        .filter(|(_, p)| pred(p))
        .map(|(i, _)| i)
        .collect()
}

/// Variable indices grouped by team, in team order.
fn team_index(players: &[Player]) -> BTreeMap<u32, Vec<usize>> {
    let mut teams: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, p) in players.iter().enumerate() {
        teams.entry(p.team).or_default().push(i);
    }
    teams
}

/// Selected players sorted by position (stable within a position).
fn picked(players: &[Player], selection: &[bool]) -> Vec<Player> {
    let mut chosen: Vec<Player> = players
        .iter()
        .zip(selection)
        .filter(|(_, on)| **on)
        .map(|(p, _)| p.clone())
        .collect();
    chosen.sort_by_key(|p| p.position);
    chosen
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
