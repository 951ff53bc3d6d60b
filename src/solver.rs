//! Binary integer programming.
//!
//! The optimizer describes its selection problems as a [`BinaryProgram`]
//! (one 0/1 variable per candidate, linear constraints, a linear objective
//! to maximise) and hands them to a [`BinarySolver`]. The default backend is
//! `good_lp` driving the HiGHS MIP solver under a wall-clock limit.

use good_lp::solvers::highs::highs;
use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, warn};

/// Tolerance used when checking a returned assignment against the model.
const FEASIBILITY_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    LessOrEqual,
    GreaterOrEqual,
    Equal,
}

/// `Σ coef·x[var] (<=|>=|==) rhs`
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    pub terms: Vec<(usize, f64)>,
    pub comparison: Comparison,
    pub rhs: f64,
}

/// A maximisation problem over binary variables `x[0..n]`.
#[derive(Debug, Clone)]
pub struct BinaryProgram {
    name: String,
    objective: Vec<f64>,
    constraints: Vec<LinearConstraint>,
}

impl BinaryProgram {
    /// One variable per objective coefficient.
    pub fn new(name: impl Into<String>, objective: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            objective,
            constraints: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn add_constraint(
        &mut self,
        terms: Vec<(usize, f64)>,
        comparison: Comparison,
        rhs: f64,
    ) -> &mut Self {
        self.constraints.push(LinearConstraint { terms, comparison, rhs });
        self
    }

    /// Sum of `x[i]` over `vars`.
    pub fn count(
        &mut self,
        vars: impl IntoIterator<Item = usize>,
        comparison: Comparison,
        rhs: f64,
    ) -> &mut Self {
        let terms = vars.into_iter().map(|i| (i, 1.0)).collect();
        self.add_constraint(terms, comparison, rhs)
    }

    /// Objective value of an assignment.
    pub fn evaluate(&self, assignment: &[bool]) -> f64 {
        self.objective
            .iter()
            .zip(assignment)
            .filter(|(_, on)| **on)
            .map(|(c, _)| c)
            .sum()
    }

    /// Whether an assignment satisfies every constraint (with `tolerance`).
    pub fn is_feasible(&self, assignment: &[bool], tolerance: f64) -> bool {
        self.constraints.iter().all(|c| {
            let lhs: f64 = c
                .terms
                .iter()
                .filter(|(i, _)| assignment.get(*i).copied().unwrap_or(false))
                .map(|(_, coef)| coef)
                .sum();
            match c.comparison {
                Comparison::LessOrEqual => lhs <= c.rhs + tolerance,
                Comparison::GreaterOrEqual => lhs >= c.rhs - tolerance,
                Comparison::Equal => (lhs - c.rhs).abs() <= tolerance,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Solver interface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    #[error("no assignment satisfies the constraints")]
    Infeasible,

    #[error("no feasible assignment found within {0}s")]
    TimeLimit(f64),

    #[error("{0}")]
    Backend(String),
}

/// Anything that can maximise a [`BinaryProgram`].
pub trait BinarySolver {
    /// Returns one flag per variable (true = selected).
    fn maximize(&self, program: &BinaryProgram) -> Result<Vec<bool>, SolveError>;
}

/// Solver settings (`[solver]` in `config.toml`).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Wall-clock budget per program, in seconds.
    pub time_limit_secs: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { time_limit_secs: 10.0 }
    }
}

/// `good_lp` + HiGHS backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver {
    config: SolverConfig,
}

impl HighsSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn time_limit_secs(&self) -> f64 {
        self.config.time_limit_secs
    }
}

impl BinarySolver for HighsSolver {
    fn maximize(&self, program: &BinaryProgram) -> Result<Vec<bool>, SolveError> {
        let mut vars = ProblemVariables::new();
        let xs: Vec<Variable> = (0..program.num_variables())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let mut objective = Expression::with_capacity(xs.len());
        for (x, &coef) in xs.iter().zip(program.objective()) {
            objective.add_mul(coef, *x);
        }

        let limit = self.config.time_limit_secs;
        let mut model = vars
            .maximise(objective)
            .using(highs)
            .set_time_limit(limit);
        for c in program.constraints() {
            let mut lhs = Expression::with_capacity(c.terms.len());
            for &(i, coef) in &c.terms {
                let x = xs.get(i).ok_or_else(|| {
                    SolveError::Backend(format!("constraint references unknown variable {i}"))
                })?;
                lhs.add_mul(coef, *x);
            }
            let rhs = c.rhs;
            model.add_constraint(match c.comparison {
                Comparison::LessOrEqual => constraint::leq(lhs, rhs),
                Comparison::GreaterOrEqual => constraint::geq(lhs, rhs),
                Comparison::Equal => constraint::eq(lhs, rhs),
            });
        }

        debug!(
            program = %program.name(),
            variables = xs.len(),
            constraints = program.constraints().len(),
            time_limit_secs = limit,
            "Solving binary program"
        );

        let started = Instant::now();
        let solution = model.solve().map_err(|e| match e {
            ResolutionError::Infeasible => SolveError::Infeasible,
            other => SolveError::Backend(other.to_string()),
        })?;
        let elapsed = started.elapsed().as_secs_f64();

        let assignment: Vec<bool> = xs.iter().map(|&x| solution.value(x) > 0.5).collect();
        let timed_out = elapsed >= limit;
        if !program.is_feasible(&assignment, FEASIBILITY_TOLERANCE) {
            return Err(if timed_out {
                SolveError::TimeLimit(limit)
            } else {
                SolveError::Backend(format!(
                    "solver returned an assignment violating {}",
                    program.name()
                ))
            });
        }
        if timed_out {
            warn!(program = %program.name(), elapsed, "Time limit reached, using best assignment found");
        } else {
            debug!(program = %program.name(), elapsed, "Binary program solved");
        }
        Ok(assignment)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
