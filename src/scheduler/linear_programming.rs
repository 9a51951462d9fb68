//! LP relaxation of active time scheduling.
//!
//! # Formulation
//!
//! ```text
//! minimize   Σ_t y_t
//! subject to x_{j,t} <= y_t              every job j, covered slot t
//!            Σ_j x_{j,t} <= m · y_t      every slot t
//!            Σ_t x_{j,t} >= p_j          every job j
//!            0 <= x, y <= 1
//! ```
//!
//! `y_t` is how much of slot `t` is open; the decoded schedule opens
//! `[t, t + y_t)` and lays the `x_{j,t}` of that slot out with the
//! wrap-around rule. The optimum is a lower bound on the integral optimum.
//!
//! # Reference
//! Chang, Khuller & Mukherjee (2017), "LP rounding and combinatorial
//! algorithms for minimizing active and busy time", J. Scheduling 20(6)

use tracing::debug;

use super::{check_request, ActiveTimeScheduler};
use crate::error::SchedulingError;
use crate::flow::{FlowMethod, FlowNetworkBuilder};
use crate::lp::{LinearProgram, LinearProgrammingMethod};
use crate::models::{IntervalSupport, JobPool, JobSchedule, Schedule, TimeInterval};
use crate::packing::wrap_around;
use crate::EPS;

/// An optimal solution of the relaxation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FractionalSolution {
    /// `y_t` per slot, `0` for slots no job covers.
    pub openness: Vec<f64>,
    /// `(job index, x_{j,t})` per slot.
    pub allocations: Vec<Vec<(usize, f64)>>,
}

impl FractionalSolution {
    /// Objective value `Σ y_t`.
    pub fn active_time(&self) -> f64 {
        self.openness.iter().sum()
    }

    /// `Σ_{t < slot} y_t`.
    pub fn openness_before(&self, slot: usize) -> f64 {
        self.openness.iter().take(slot).sum()
    }
}

/// Fractional optimum via the LP relaxation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearProgrammingScheduler {
    lp_method: LinearProgrammingMethod,
    flow: FlowNetworkBuilder,
}

impl LinearProgrammingScheduler {
    /// Simplex LP and the default flow method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the LP solving method.
    pub fn with_lp_method(mut self, method: LinearProgrammingMethod) -> Self {
        self.lp_method = method;
        self
    }

    /// Sets the max-flow method of the feasibility pre-check.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.flow = FlowNetworkBuilder::new(method);
        self
    }

    /// The configured LP solving method.
    pub fn lp_method(&self) -> LinearProgrammingMethod {
        self.lp_method
    }

    /// Solves the relaxation.
    ///
    /// Returns `Ok(None)` when the instance is infeasible or the solver
    /// fails to reach an optimum.
    pub fn solve_relaxation(
        &self,
        pool: &JobPool,
        max_concurrency: usize,
    ) -> Result<Option<FractionalSolution>, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Some(FractionalSolution::default()));
        }

        let mut network = self.flow.build(pool, max_concurrency);
        network.open_all();
        if !network.is_feasible() {
            return Ok(None);
        }

        let horizon = pool.horizon();
        let mut lp = LinearProgram::new();
        let slot_vars: Vec<Option<usize>> = (0..horizon)
            .map(|t| network.is_covered(t).then(|| lp.add_variable(0.0, 1.0, 1.0)))
            .collect();

        let mut slot_terms: Vec<Vec<(usize, f64)>> = vec![Vec::new(); horizon];
        let mut job_vars: Vec<(usize, usize, usize)> = Vec::new();
        for (j, job) in pool.jobs().iter().enumerate() {
            let mut demand = Vec::new();
            for t in job.covered_slots() {
                let Some(y) = slot_vars[t] else { continue };
                let x = lp.add_variable(0.0, 1.0, 0.0);
                lp.add_le(vec![(x, 1.0), (y, -1.0)], 0.0);
                slot_terms[t].push((x, 1.0));
                demand.push((x, 1.0));
                job_vars.push((j, t, x));
            }
            lp.add_ge(demand, job.duration());
        }
        for (t, mut terms) in slot_terms.into_iter().enumerate() {
            if let Some(y) = slot_vars[t] {
                terms.push((y, -(max_concurrency as f64)));
                lp.add_le(terms, 0.0);
            }
        }

        let values = match lp.minimize(self.lp_method) {
            Ok(values) => values,
            Err(err) => {
                debug!(
                    scheduler = self.name(),
                    method = %self.lp_method,
                    %err,
                    "LP relaxation not solved"
                );
                return Ok(None);
            }
        };

        let openness = slot_vars
            .iter()
            .map(|var| var.map_or(0.0, |y| snap(values[y])))
            .collect();
        let mut allocations = vec![Vec::new(); horizon];
        for (j, t, x) in job_vars {
            let amount = snap(values[x]);
            if amount > 0.0 {
                allocations[t].push((j, amount));
            }
        }

        let solution = FractionalSolution {
            openness,
            allocations,
        };
        debug!(
            scheduler = self.name(),
            method = %self.lp_method,
            variables = lp.variable_count(),
            rows = lp.row_count(),
            objective = solution.active_time(),
            "LP relaxation solved"
        );
        Ok(Some(solution))
    }
}

impl ActiveTimeScheduler for LinearProgrammingScheduler {
    fn name(&self) -> &'static str {
        "linear_programming"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Single
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        if pool.is_empty() {
            check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
            return Ok(Schedule::empty());
        }
        Ok(match self.solve_relaxation(pool, max_concurrency)? {
            Some(solution) => decode(pool, max_concurrency, &solution),
            None => Schedule::infeasible(),
        })
    }
}

/// Clamps a solver value to `[0, 1]`, snapping values within `EPS` of a bound.
fn snap(value: f64) -> f64 {
    if value <= EPS {
        0.0
    } else if value >= 1.0 - EPS {
        1.0
    } else {
        value
    }
}

/// Lays a fractional solution out as a schedule.
fn decode(pool: &JobPool, max_concurrency: usize, solution: &FractionalSolution) -> Schedule {
    // Solver slack may over-allocate a job; trim each to its duration,
    // earliest slots first.
    let mut remaining: Vec<f64> = pool.jobs().iter().map(|j| j.duration()).collect();
    let mut pieces: Vec<Vec<TimeInterval>> = vec![Vec::new(); pool.size()];
    let mut active = Vec::new();

    for (t, &y) in solution.openness.iter().enumerate() {
        if y <= 0.0 {
            continue;
        }
        let mut slot: Vec<(usize, f64)> = solution.allocations[t]
            .iter()
            .map(|&(j, x)| {
                let amount = x.min(y).min(remaining[j]);
                remaining[j] -= amount;
                (j, amount)
            })
            .collect();

        let load: f64 = slot.iter().map(|&(_, x)| x).sum();
        let capacity = max_concurrency as f64 * y;
        if load > capacity {
            let scale = capacity / load;
            for (_, x) in &mut slot {
                *x *= scale;
            }
        }

        let window = TimeInterval::new(t as f64, t as f64 + y);
        wrap_around(window, slot, &mut pieces);
        active.push(window);
    }

    let job_schedules = pool
        .jobs()
        .iter()
        .zip(pieces)
        .map(|(job, pieces)| JobSchedule::new(job.id(), TimeInterval::merge_time_intervals(pieces)))
        .collect();
    Schedule::feasible(TimeInterval::merge_time_intervals(active), job_schedules)
}
