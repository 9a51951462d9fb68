//! Active time schedulers.
//!
//! Every scheduler implements [`ActiveTimeScheduler`]: a pure
//! `process(pool, max_concurrency) -> Schedule` over immutable configuration
//! fixed at construction.
//!
//! | Scheduler | Result | Jobs |
//! |-----------|--------|------|
//! | [`GreedyScheduler`] | minimal feasible set, 2-approx. | multi-interval |
//! | [`GreedyLowestDensityFirstScheduler`] | minimal feasible set | single-interval |
//! | [`MinFeasScheduler`] | minimal feasible set, 3-approx. | multi-interval |
//! | [`GreedyIntervalsScheduler`] | 2-approx., O(n log T) flows | single-interval |
//! | [`LinearProgrammingScheduler`] | fractional optimum | single-interval |
//! | [`LinearProgrammingRoundedScheduler`] | 2-approx. | single-interval |
//! | [`BruteForceScheduler`] | integral optimum | multi-interval |
//! | [`DegreeConstrainedSubgraphScheduler`] | one b-matching | multi-interval |
//!
//! # References
//! - Kumar & Khuller (2018), "Brief announcement: A greedy 2 approximation
//!   for the active time problem"
//! - Chang, Khuller & Mukherjee (2017), "LP rounding and combinatorial
//!   algorithms for minimizing active and busy time"
//! - Chang, Gabow & Khuller (2014), "A model for minimizing active processor time"

mod brute_force;
mod greedy;
mod intervals;
mod linear_programming;
mod matching;
mod rounded;

pub use brute_force::{BruteForceScheduler, MAX_BRUTE_FORCE_HORIZON};
pub use greedy::{
    Chronological, GreedyLowestDensityFirstScheduler, GreedyScheduler, LowestDensityFirst,
    MinFeasScheduler, RandomOrder, SlotOrdering,
};
pub use intervals::GreedyIntervalsScheduler;
pub use linear_programming::{FractionalSolution, LinearProgrammingScheduler};
pub use matching::{DegreeConstrainedSubgraphScheduler, MatchingScheduler};
pub use rounded::LinearProgrammingRoundedScheduler;

use std::fmt::Debug;

use crate::error::SchedulingError;
use crate::models::{IntervalSupport, JobPool, Schedule};
use crate::validation::validate_job_pool;

/// An active time scheduling algorithm.
pub trait ActiveTimeScheduler: Send + Sync + Debug {
    /// Scheduler name (e.g., "greedy", "brute_force").
    fn name(&self) -> &'static str;

    /// Which job pools the scheduler accepts.
    fn interval_support(&self) -> IntervalSupport;

    /// Computes a schedule.
    ///
    /// Infeasible instances yield `Ok(Schedule::infeasible())`; errors are
    /// reserved for invalid requests.
    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError>;
}

/// Rejects invalid requests before any feasibility work.
///
/// Checks, in order: concurrency, pool validity, interval support.
pub(crate) fn check_request(
    scheduler: &'static str,
    support: IntervalSupport,
    pool: &JobPool,
    max_concurrency: usize,
) -> Result<(), SchedulingError> {
    if max_concurrency == 0 {
        return Err(SchedulingError::InvalidConcurrency(max_concurrency));
    }

    validate_job_pool(pool).map_err(SchedulingError::InvalidJobPool)?;

    if !support.accepts(pool.interval_support()) {
        if let Some(job) = pool.jobs().iter().find(|j| !j.is_single_interval()) {
            return Err(SchedulingError::UnsupportedJobPool {
                scheduler,
                job_id: job.id(),
            });
        }
    }

    Ok(())
}
