//! Greedy slot-closing schedulers.
//!
//! # Algorithm
//!
//! 1. Open every slot some job covers; if even that is infeasible, stop.
//! 2. Walk the slots in a *closing order*. Close each slot, and re-open it
//!    when the feasibility flow no longer carries every job.
//! 3. Optionally refine with close-two/open-one swaps (local search).
//! 4. Decode the final flow into job schedules.
//!
//! The result is a minimal feasible set: no single open slot can be closed.
//! Variants differ only in the closing order:
//!
//! | Ordering | Scheduler | Guarantee |
//! |----------|-----------|-----------|
//! | [`Chronological`] | [`GreedyScheduler`] | 2-approx. (Kumar & Khuller) |
//! | [`LowestDensityFirst`] | [`GreedyLowestDensityFirstScheduler`] | 3-approx. |
//! | [`RandomOrder`] | [`MinFeasScheduler`] | 3-approx. (Chang et al.) |
//!
//! # Complexity
//! O(T) max-flow computations on a network with O(n + T) nodes and O(nT)
//! edges per closing order; local search adds O(T³) flows per improvement.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, trace};

use super::{check_request, ActiveTimeScheduler};
use crate::error::SchedulingError;
use crate::flow::{FeasibilityNetwork, FlowMethod, FlowNetworkBuilder};
use crate::models::{IntervalSupport, JobPool, Schedule};

/// The order in which a greedy scheduler tries to close slots.
pub trait SlotOrdering: Send + Sync + Debug {
    /// Name of the scheduler using this ordering.
    fn name(&self) -> &'static str;

    /// Which job pools the ordering can rank.
    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Multi
    }

    /// One or more closing orders over `slots`.
    ///
    /// The scheduler runs each order from a fully open start and keeps the
    /// smallest feasible set, earliest order first on ties.
    fn closing_orders(&self, pool: &JobPool, slots: &[usize]) -> Vec<Vec<usize>>;
}

/// Closes slots from earliest to latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chronological;

impl SlotOrdering for Chronological {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn closing_orders(&self, _pool: &JobPool, slots: &[usize]) -> Vec<Vec<usize>> {
        vec![slots.to_vec()]
    }
}

/// Closes the slots with the smallest weight first.
///
/// The weight of a slot is the summed weight of the jobs that may run in it.
/// A job weighs `1` unless a weight function is given, in which case it
/// weighs `f(density)` with `density = duration / window length`. Ties go to
/// the earlier slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestDensityFirst {
    weight: Option<fn(f64) -> f64>,
}

impl LowestDensityFirst {
    /// Unit job weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Weighs each job by `weight(density)`.
    pub fn with_weight(mut self, weight: fn(f64) -> f64) -> Self {
        self.weight = Some(weight);
        self
    }

    fn slot_weights(&self, pool: &JobPool) -> Vec<f64> {
        let mut weights = vec![0.0; pool.horizon()];
        for job in pool.jobs() {
            let w = match (self.weight, job.density()) {
                (Some(f), Some(density)) => f(density),
                _ => 1.0,
            };
            for t in job.covered_slots() {
                weights[t] += w;
            }
        }
        weights
    }
}

impl SlotOrdering for LowestDensityFirst {
    fn name(&self) -> &'static str {
        "greedy_lowest_density_first"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Single
    }

    fn closing_orders(&self, pool: &JobPool, slots: &[usize]) -> Vec<Vec<usize>> {
        let weights = self.slot_weights(pool);
        let mut order = slots.to_vec();
        order.sort_by(|&a, &b| weights[a].total_cmp(&weights[b]).then(a.cmp(&b)));
        vec![order]
    }
}

/// Closes slots in random orders drawn from a seeded generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomOrder {
    seed: u64,
    attempts: usize,
}

impl RandomOrder {
    /// One random order from `seed`.
    pub fn new(seed: u64) -> Self {
        Self { seed, attempts: 1 }
    }

    /// Replaces the seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of random orders to try (at least 1).
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }
}

impl Default for RandomOrder {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SlotOrdering for RandomOrder {
    fn name(&self) -> &'static str {
        "min_feas"
    }

    fn closing_orders(&self, _pool: &JobPool, slots: &[usize]) -> Vec<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.attempts)
            .map(|_| {
                let mut order = slots.to_vec();
                order.shuffle(&mut rng);
                order
            })
            .collect()
    }
}

/// Greedy minimal-feasible-set scheduler.
///
/// # Example
///
/// ```
/// use active_time_scheduling::models::{Job, JobPool, TimeInterval};
/// use active_time_scheduling::scheduler::{ActiveTimeScheduler, GreedyScheduler};
///
/// let pool = JobPool::new(vec![
///     Job::new(1, 2.0, TimeInterval::new(0.0, 4.0)),
///     Job::new(2, 2.0, TimeInterval::new(0.0, 4.0)),
/// ]);
/// let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
/// assert_eq!(schedule.active_time(), 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler<O: SlotOrdering = Chronological> {
    flow: FlowNetworkBuilder,
    ordering: O,
    local_search: bool,
}

/// Greedy scheduler closing sparsely demanded slots first.
pub type GreedyLowestDensityFirstScheduler = GreedyScheduler<LowestDensityFirst>;

/// Greedy scheduler closing slots in random order (MinFeas).
pub type MinFeasScheduler = GreedyScheduler<RandomOrder>;

impl GreedyScheduler {
    /// Chronological greedy with the default flow method.
    pub fn new() -> Self {
        Self::with_ordering(Chronological)
    }
}

impl<O: SlotOrdering> GreedyScheduler<O> {
    /// Greedy scheduler with the given closing order.
    pub fn with_ordering(ordering: O) -> Self {
        Self {
            flow: FlowNetworkBuilder::default(),
            ordering,
            local_search: false,
        }
    }

    /// Sets the max-flow method.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.flow = FlowNetworkBuilder::new(method);
        self
    }

    /// Enables close-two/open-one local search after the greedy pass.
    pub fn with_local_search(mut self) -> Self {
        self.local_search = true;
        self
    }

    /// The closing order.
    pub fn ordering(&self) -> &O {
        &self.ordering
    }
}

impl<O: SlotOrdering + Default> Default for GreedyScheduler<O> {
    fn default() -> Self {
        Self::with_ordering(O::default())
    }
}

impl<O: SlotOrdering> ActiveTimeScheduler for GreedyScheduler<O> {
    fn name(&self) -> &'static str {
        self.ordering.name()
    }

    fn interval_support(&self) -> IntervalSupport {
        self.ordering.interval_support()
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let mut network = self.flow.build(pool, max_concurrency);
        network.open_all();
        if !network.is_feasible() {
            debug!(scheduler = self.name(), jobs = pool.size(), "full slot set is infeasible");
            return Ok(Schedule::infeasible());
        }

        let covered = network.covered_slots();
        let mut best: Option<Vec<usize>> = None;
        for order in self.ordering.closing_orders(pool, &covered) {
            network.open_all();
            close_in_order(&mut network, &order);
            if self.local_search {
                while swap_close_two_open_one(&mut network, &covered) {}
            }

            let open = network.open_slots();
            if best.as_ref().map_or(true, |b| open.len() < b.len()) {
                best = Some(open);
            }
        }

        network.set_open_slots(best.unwrap_or(covered));
        let schedule = network.schedule();
        debug!(
            scheduler = self.name(),
            jobs = pool.size(),
            max_concurrency,
            active_time = schedule.active_time(),
            "greedy schedule computed"
        );
        Ok(schedule)
    }
}

/// Closes each slot of `order` unless that breaks feasibility.
pub(super) fn close_in_order(network: &mut FeasibilityNetwork<'_>, order: &[usize]) {
    for &t in order {
        if !network.is_open(t) {
            continue;
        }
        network.close_slot(t);
        if network.is_feasible() {
            trace!(slot = t, "closed");
        } else {
            network.open_slot(t);
        }
    }
}

/// Tries one swap closing two open slots and opening one closed slot.
///
/// Returns `true` (leaving the swap applied) on the first feasible swap.
fn swap_close_two_open_one(network: &mut FeasibilityNetwork<'_>, covered: &[usize]) -> bool {
    let open = network.open_slots();
    let closed: Vec<usize> = covered
        .iter()
        .copied()
        .filter(|&t| !network.is_open(t))
        .collect();

    for (i, &a) in open.iter().enumerate() {
        for &b in &open[i + 1..] {
            network.close_slot(a);
            network.close_slot(b);
            for &c in &closed {
                network.open_slot(c);
                if network.is_feasible() {
                    trace!(closed = ?(a, b), opened = c, "local search swap");
                    return true;
                }
                network.close_slot(c);
            }
            network.open_slot(a);
            network.open_slot(b);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, TimeInterval};
    use crate::validation::validate_schedule;

    fn job(id: u64, duration: f64, start: f64, end: f64) -> Job {
        Job::new(id, duration, TimeInterval::new(start, end))
    }

    #[test]
    fn test_chronological_keeps_latest_slots() {
        let pool = JobPool::new(vec![job(1, 3.0, 0.0, 5.0)]);
        let schedule = GreedyScheduler::new().process(&pool, 1).unwrap();
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(2.0, 5.0)][..])
        );
        assert_eq!(
            schedule.job_schedule(1).unwrap().execution_intervals,
            vec![TimeInterval::new(2.0, 5.0)]
        );
    }

    #[test]
    fn test_shared_slots_with_concurrency() {
        // Three unit jobs overlapping only in slot 2
        let pool = JobPool::new(vec![
            job(1, 1.0, 0.0, 3.0),
            job(2, 1.0, 2.0, 5.0),
            job(3, 1.0, 1.0, 4.0),
        ]);
        let schedule = GreedyScheduler::new().process(&pool, 3).unwrap();
        assert_eq!(schedule.active_time(), 1.0);
        assert!(validate_schedule(&pool, 3, &schedule).is_empty());
    }

    #[test]
    fn test_multi_interval_jobs() {
        let pool = JobPool::new(vec![
            Job::with_intervals(
                1,
                2.0,
                vec![TimeInterval::new(0.0, 2.0), TimeInterval::new(6.0, 8.0)],
            ),
            job(2, 2.0, 5.0, 8.0),
        ]);
        let schedule = GreedyScheduler::new().process(&pool, 2).unwrap();
        assert_eq!(schedule.active_time(), 2.0);
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(6.0, 8.0)][..])
        );
        assert!(validate_schedule(&pool, 2, &schedule).is_empty());
    }

    #[test]
    fn test_lowest_density_order() {
        let pool = JobPool::new(vec![job(1, 1.0, 0.0, 4.0), job(2, 1.0, 2.0, 4.0)]);
        let order = LowestDensityFirst::new().closing_orders(&pool, &pool.covered_slots());
        // slots 0, 1 have weight 1; slots 2, 3 have weight 2
        assert_eq!(order, vec![vec![0, 1, 2, 3]]);

        let schedule = GreedyLowestDensityFirstScheduler::default()
            .process(&pool, 2)
            .unwrap();
        assert_eq!(schedule.active_time(), 1.0);
    }

    #[test]
    fn test_density_weight_function() {
        // job 1 density 0.25, job 2 density 1.0; weight = 1 / density
        let pool = JobPool::new(vec![job(1, 1.0, 0.0, 4.0), job(2, 1.0, 3.0, 4.0)]);
        let ordering = LowestDensityFirst::new().with_weight(|d| 1.0 / d);
        let order = ordering.closing_orders(&pool, &pool.covered_slots());
        // slots 0..3 weigh 4, slot 3 weighs 5
        assert_eq!(order, vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_random_order_is_seeded() {
        let pool = JobPool::new(vec![job(1, 1.0, 0.0, 10.0)]);
        let slots = pool.covered_slots();
        let a = RandomOrder::default()
            .with_seed(3)
            .with_attempts(4)
            .closing_orders(&pool, &slots);
        let b = RandomOrder::new(3).with_attempts(4).closing_orders(&pool, &slots);
        assert_eq!(a, b);
        assert_eq!(a.len(), 4);
        for order in &a {
            let mut sorted = order.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, slots);
        }
    }

    #[test]
    fn test_min_feas_is_minimal() {
        let pool = JobPool::new(vec![
            job(1, 2.0, 0.0, 6.0),
            job(2, 1.0, 4.0, 6.0),
            job(3, 2.0, 1.0, 5.0),
        ]);
        let scheduler = MinFeasScheduler::with_ordering(RandomOrder::new(11).with_attempts(5));
        let schedule = scheduler.process(&pool, 2).unwrap();
        assert!(validate_schedule(&pool, 2, &schedule).is_empty());

        // Closing any single active slot must break feasibility.
        let active: Vec<usize> = (0..6)
            .filter(|&t| {
                schedule
                    .active_time_intervals()
                    .unwrap()
                    .iter()
                    .any(|i| i.contains(&TimeInterval::slot(t)))
            })
            .collect();
        let builder = FlowNetworkBuilder::default();
        for &t in &active {
            let rest: Vec<usize> = active.iter().copied().filter(|&s| s != t).collect();
            assert!(!builder.schedule_slots(&pool, 2, &rest).all_jobs_scheduled());
        }
    }

    #[test]
    fn test_local_search_improves_greedy() {
        let pool = JobPool::new(vec![
            job(1, 2.0, 3.0, 8.0),
            job(2, 4.0, 0.0, 6.0),
            job(3, 1.0, 4.0, 5.0),
            job(4, 2.0, 0.0, 6.0),
            job(5, 1.0, 2.0, 3.0),
        ]);
        let plain = GreedyScheduler::new().process(&pool, 2).unwrap();
        assert_eq!(plain.active_time(), 6.0);

        // Greedy keeps slots 2..8; trading 6 and 7 for 0 saves one
        let refined = GreedyScheduler::new()
            .with_local_search()
            .process(&pool, 2)
            .unwrap();
        assert_eq!(refined.active_time(), 5.0);
        assert!(validate_schedule(&pool, 2, &refined).is_empty());
    }
}
