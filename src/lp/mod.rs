//! Linear programming boundary.
//!
//! Schedulers describe a minimization problem as a [`LinearProgram`]
//! (bounded variables, linear objective, `<=` / `>=` rows) and hand it to
//! an LP backend selected by [`LinearProgrammingMethod`]:
//!
//! | Method | Backend |
//! |--------|---------|
//! | `Simplex` | `good_lp` + microlp (dense simplex) |
//! | `InteriorPoint` | `good_lp` + clarabel (interior point) |
//!
//! Any non-optimal outcome is reported as an [`LpFailure`].

use std::fmt;
use std::str::FromStr;

use good_lp::solvers::clarabel::clarabel;
use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::SchedulingError;

/// LP solving method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearProgrammingMethod {
    /// Simplex method (exact vertex solutions).
    #[default]
    Simplex,
    /// Interior point method (approximate, tolerance ~1e-8).
    InteriorPoint,
}

impl LinearProgrammingMethod {
    /// Snake-case name of the method.
    pub fn name(self) -> &'static str {
        match self {
            LinearProgrammingMethod::Simplex => "simplex",
            LinearProgrammingMethod::InteriorPoint => "interior_point",
        }
    }
}

impl fmt::Display for LinearProgrammingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinearProgrammingMethod {
    type Err = SchedulingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simplex" | "revised_simplex" => Ok(LinearProgrammingMethod::Simplex),
            "interior_point" => Ok(LinearProgrammingMethod::InteriorPoint),
            other => Err(SchedulingError::UnknownLinearProgrammingMethod(
                other.to_string(),
            )),
        }
    }
}

/// Why an LP produced no optimal solution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpFailure {
    #[error("linear program is infeasible")]
    Infeasible,

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("LP solver failed: {0}")]
    Solver(String),
}

impl From<ResolutionError> for LpFailure {
    fn from(err: ResolutionError) -> Self {
        match err {
            ResolutionError::Infeasible => LpFailure::Infeasible,
            ResolutionError::Unbounded => LpFailure::Unbounded,
            other => LpFailure::Solver(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    terms: Vec<(usize, f64)>,
    upper: f64,
}

/// A minimization problem over bounded continuous variables.
///
/// Every row is stored as `Σ a_i · x_i <= b`; `>=` rows are negated on insert.
#[derive(Debug, Clone, Default)]
pub struct LinearProgram {
    bounds: Vec<(f64, f64)>,
    costs: Vec<f64>,
    rows: Vec<Row>,
}

impl LinearProgram {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with bounds `[lower, upper]` and objective cost.
    ///
    /// Returns the variable index.
    pub fn add_variable(&mut self, lower: f64, upper: f64, cost: f64) -> usize {
        self.bounds.push((lower, upper));
        self.costs.push(cost);
        self.bounds.len() - 1
    }

    /// Adds the row `Σ terms <= upper`.
    pub fn add_le(&mut self, terms: Vec<(usize, f64)>, upper: f64) {
        self.rows.push(Row { terms, upper });
    }

    /// Adds the row `Σ terms >= lower`.
    pub fn add_ge(&mut self, terms: Vec<(usize, f64)>, lower: f64) {
        let terms = terms.into_iter().map(|(i, a)| (i, -a)).collect();
        self.rows.push(Row {
            terms,
            upper: -lower,
        });
    }

    /// Number of variables.
    #[inline]
    pub fn variable_count(&self) -> usize {
        self.bounds.len()
    }

    /// Number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Solves the program, returning one value per variable.
    pub fn minimize(&self, method: LinearProgrammingMethod) -> Result<Vec<f64>, LpFailure> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = self
            .bounds
            .iter()
            .map(|&(lower, upper)| vars.add(variable().min(lower).max(upper)))
            .collect();

        let objective = self
            .costs
            .iter()
            .zip(&handles)
            .filter(|(&cost, _)| cost != 0.0)
            .fold(Expression::from(0.0), |acc, (&cost, &v)| acc + cost * v);

        let constraints: Vec<Constraint> = self
            .rows
            .iter()
            .map(|row| {
                let lhs = row
                    .terms
                    .iter()
                    .fold(Expression::from(0.0), |acc, &(i, a)| acc + a * handles[i]);
                let rhs = row.upper;
                constraint!(lhs <= rhs)
            })
            .collect();

        let problem = vars.minimise(objective);
        match method {
            LinearProgrammingMethod::Simplex => {
                solve_model(problem.using(microlp), constraints, &handles)
            }
            LinearProgrammingMethod::InteriorPoint => {
                solve_model(problem.using(clarabel), constraints, &handles)
            }
        }
    }
}

fn solve_model<M>(
    mut model: M,
    constraints: Vec<Constraint>,
    handles: &[Variable],
) -> Result<Vec<f64>, LpFailure>
where
    M: SolverModel<Error = ResolutionError>,
{
    for c in constraints {
        model.add_constraint(c);
    }
    let solution = model.solve()?;
    Ok(handles.iter().map(|&v| solution.value(v)).collect())
}
