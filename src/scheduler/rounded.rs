//! Deadline-bucket rounding of the LP relaxation.
//!
//! # Algorithm
//!
//! 1. Solve the relaxation, giving openness `y_t`.
//! 2. For each distinct deadline `d`, ascending, make sure at least
//!    `⌈Y(d)⌉` slots before `d` are open, where `Y(d) = Σ_{t<d} y_t`.
//!    Missing slots are opened latest first.
//! 3. If the opened set is not feasible, repair it deadline by deadline:
//!    while the jobs due by `d` do not fit, open the latest closed slot
//!    before `d`.
//! 4. Close every open slot, earliest first, whose closure keeps the
//!    schedule feasible.
//!
//! Step 2 opens at most `⌈Σ_t y_t⌉` slots; step 4 never adds any.
//!
//! # Reference
//! Chang, Khuller & Mukherjee (2017), "LP rounding and combinatorial
//! algorithms for minimizing active and busy time", J. Scheduling 20(6)

use tracing::{debug, trace};

use super::greedy::close_in_order;
use super::{check_request, ActiveTimeScheduler, FractionalSolution, LinearProgrammingScheduler};
use crate::error::SchedulingError;
use crate::flow::{FlowMethod, FlowNetworkBuilder};
use crate::lp::LinearProgrammingMethod;
use crate::models::{IntervalSupport, JobPool, Schedule};

/// Solver noise tolerated before rounding a bucket up.
const ROUNDING_TOLERANCE: f64 = 1e-6;

/// 2-approximation by rounding the LP relaxation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearProgrammingRoundedScheduler {
    lp: LinearProgrammingScheduler,
    flow: FlowNetworkBuilder,
}

impl LinearProgrammingRoundedScheduler {
    /// Simplex LP and the default flow method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the LP solving method.
    pub fn with_lp_method(mut self, method: LinearProgrammingMethod) -> Self {
        self.lp = self.lp.with_lp_method(method);
        self
    }

    /// Sets the max-flow method for both the pre-check and the rounding.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.lp = self.lp.with_flow_method(method);
        self.flow = FlowNetworkBuilder::new(method);
        self
    }
}

impl ActiveTimeScheduler for LinearProgrammingRoundedScheduler {
    fn name(&self) -> &'static str {
        "linear_programming_rounded"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Single
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let Some(solution) = self.lp.solve_relaxation(pool, max_concurrency)? else {
            return Ok(Schedule::infeasible());
        };

        let mut deadlines: Vec<usize> =
            pool.jobs().iter().map(|j| j.deadline_slot()).collect();
        deadlines.sort_unstable();
        deadlines.dedup();

        let mut network = self.flow.build(pool, max_concurrency);
        let rounded = round_by_deadline(&solution, &deadlines, &network.covered_slots());
        network.set_open_slots(rounded.iter().copied());

        let repaired = !network.is_feasible();
        if repaired {
            let open = repair(&self.flow, pool, max_concurrency, &deadlines, rounded.clone());
            network.set_open_slots(open);
        }
        let open = network.open_slots();
        close_in_order(&mut network, &open);

        debug!(
            scheduler = self.name(),
            fractional = solution.active_time(),
            rounded = rounded.len(),
            repaired,
            open = network.open_count(),
            "LP solution rounded"
        );
        Ok(network.schedule())
    }
}

/// Opens `⌈Y(d)⌉` slots before each deadline `d`, latest first.
fn round_by_deadline(
    solution: &FractionalSolution,
    deadlines: &[usize],
    covered: &[usize],
) -> Vec<usize> {
    let horizon = solution.openness.len();
    let mut is_covered = vec![false; horizon];
    for &t in covered.iter().filter(|&&t| t < horizon) {
        is_covered[t] = true;
    }

    let mut open = vec![false; horizon];
    for &d in deadlines {
        let d = d.min(horizon);
        let required =
            (solution.openness_before(d) - ROUNDING_TOLERANCE).ceil().max(0.0) as usize;
        let mut count = open[..d].iter().filter(|&&o| o).count();
        for t in (0..d).rev() {
            if count >= required {
                break;
            }
            if is_covered[t] && !open[t] {
                open[t] = true;
                count += 1;
            }
        }
    }

    (0..horizon).filter(|&t| open[t]).collect()
}

/// Extends `open` until the jobs due by each deadline fit.
///
/// Deadlines are visited in ascending order. For deadline `d` only the jobs
/// with `deadline_slot <= d` are checked, and missing capacity is added as
/// the latest closed slots before `d`. Returns the open slots, ascending.
fn repair(
    builder: &FlowNetworkBuilder,
    pool: &JobPool,
    max_concurrency: usize,
    deadlines: &[usize],
    mut open: Vec<usize>,
) -> Vec<usize> {
    for &d in deadlines {
        let due: JobPool = pool
            .jobs()
            .iter()
            .filter(|j| j.deadline_slot() <= d)
            .cloned()
            .collect();
        let mut network = builder.build(&due, max_concurrency);
        network.set_open_slots(open.iter().copied());

        let mut closed = (0..network.horizon())
            .rev()
            .filter(|&t| network.is_covered(t) && !network.is_open(t))
            .collect::<Vec<_>>()
            .into_iter();
        while !network.is_feasible() {
            let Some(t) = closed.next() else { break };
            trace!(deadline = d, slot = t, "repair opened slot");
            network.open_slot(t);
            open.push(t);
        }
    }

    open.sort_unstable();
    open
}
