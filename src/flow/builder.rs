//! Time-expanded feasibility network for a job pool.
//!
//! # Layout
//!
//! | Node | Index |
//! |------|-------|
//! | source | `0` |
//! | job `i` | `1 + i` |
//! | slot `t` | `1 + n + t` |
//! | sink | `1 + n + horizon` |
//!
//! A `job → slot` edge exists for every slot the job covers. Closed slots
//! keep their edges at capacity 0, so opening and closing a slot only
//! rewrites capacities.

use tracing::trace;

use super::{EdgeId, FlowMethod, FlowNetwork};
use crate::models::{JobPool, JobSchedule, Schedule, TimeInterval};
use crate::packing::wrap_around;
use crate::EPS;

/// Builds feasibility networks with a fixed max-flow method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowNetworkBuilder {
    method: FlowMethod,
}

impl FlowNetworkBuilder {
    /// Creates a builder using the given flow method.
    pub fn new(method: FlowMethod) -> Self {
        Self { method }
    }

    /// The configured flow method.
    #[inline]
    pub fn method(&self) -> FlowMethod {
        self.method
    }

    /// Builds the network for `pool` with every slot closed.
    pub fn build<'p>(&self, pool: &'p JobPool, max_concurrency: usize) -> FeasibilityNetwork<'p> {
        let n = pool.size();
        let horizon = pool.horizon();
        let source = 0;
        let sink = 1 + n + horizon;
        let mut graph = FlowNetwork::new(sink + 1);

        for (i, job) in pool.jobs().iter().enumerate() {
            graph.add_edge(source, 1 + i, job.duration());
        }
        for t in 0..horizon {
            graph.add_edge(1 + n + t, sink, max_concurrency as f64);
        }

        let mut slot_edges: Vec<Vec<(usize, EdgeId)>> = vec![Vec::new(); horizon];
        for (i, job) in pool.jobs().iter().enumerate() {
            for t in job.covered_slots() {
                let edge = graph.add_edge(1 + i, 1 + n + t, 0.0);
                slot_edges[t].push((i, edge));
            }
        }

        FeasibilityNetwork {
            pool,
            method: self.method,
            graph,
            source,
            sink,
            demand: pool.total_duration(),
            slot_edges,
            open: vec![false; horizon],
        }
    }

    /// Decodes a schedule for a fixed set of active slots.
    ///
    /// Returns [`Schedule::infeasible`] when the slots cannot carry the pool.
    pub fn schedule_slots(
        &self,
        pool: &JobPool,
        max_concurrency: usize,
        slots: &[usize],
    ) -> Schedule {
        if pool.is_empty() {
            return Schedule::empty();
        }
        let mut network = self.build(pool, max_concurrency);
        network.set_open_slots(slots.iter().copied());
        network.schedule()
    }
}

/// A feasibility network whose slots can be opened and closed in place.
#[derive(Debug, Clone)]
pub struct FeasibilityNetwork<'p> {
    pool: &'p JobPool,
    method: FlowMethod,
    graph: FlowNetwork,
    source: usize,
    sink: usize,
    demand: f64,
    slot_edges: Vec<Vec<(usize, EdgeId)>>,
    open: Vec<bool>,
}

impl FeasibilityNetwork<'_> {
    /// Number of slots in the network.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.open.len()
    }

    /// Total duration the flow must carry.
    #[inline]
    pub fn demand(&self) -> f64 {
        self.demand
    }

    /// Whether some job may run in slot `t`.
    pub fn is_covered(&self, t: usize) -> bool {
        self.slot_edges.get(t).is_some_and(|edges| !edges.is_empty())
    }

    /// Slots some job may run in, ascending.
    pub fn covered_slots(&self) -> Vec<usize> {
        (0..self.horizon()).filter(|&t| self.is_covered(t)).collect()
    }

    /// Whether slot `t` is open.
    #[inline]
    pub fn is_open(&self, t: usize) -> bool {
        self.open.get(t).copied().unwrap_or(false)
    }

    /// Opens slot `t`. Slots no job covers stay closed.
    pub fn open_slot(&mut self, t: usize) {
        self.set_slot(t, true);
    }

    /// Closes slot `t`.
    pub fn close_slot(&mut self, t: usize) {
        self.set_slot(t, false);
    }

    fn set_slot(&mut self, t: usize, open: bool) {
        if !self.is_covered(t) || self.open[t] == open {
            return;
        }
        let capacity = if open { 1.0 } else { 0.0 };
        for &(_, edge) in &self.slot_edges[t] {
            self.graph.set_capacity(edge, capacity);
        }
        self.open[t] = open;
    }

    /// Opens exactly the given slots, closing every other one.
    pub fn set_open_slots<I: IntoIterator<Item = usize>>(&mut self, slots: I) {
        for t in 0..self.horizon() {
            self.close_slot(t);
        }
        for t in slots {
            self.open_slot(t);
        }
    }

    /// Opens every covered slot.
    pub fn open_all(&mut self) {
        for t in 0..self.horizon() {
            self.open_slot(t);
        }
    }

    /// Open slots, ascending.
    pub fn open_slots(&self) -> Vec<usize> {
        (0..self.horizon()).filter(|&t| self.open[t]).collect()
    }

    /// Number of open slots.
    pub fn open_count(&self) -> usize {
        self.open.iter().filter(|&&o| o).count()
    }

    /// Runs max-flow on the current open set and returns its value.
    pub fn max_flow(&mut self) -> f64 {
        self.graph.max_flow(self.source, self.sink, self.method)
    }

    /// Whether the current open set can carry every job.
    pub fn is_feasible(&mut self) -> bool {
        let value = self.max_flow();
        trace!(open = self.open_count(), flow = value, demand = self.demand, "feasibility check");
        value >= self.demand - EPS
    }

    /// Slots that carry flow in the last computed flow, ascending.
    pub fn used_slots(&self) -> Vec<usize> {
        (0..self.horizon())
            .filter(|&t| {
                self.slot_edges[t]
                    .iter()
                    .any(|&(_, edge)| self.graph.flow(edge) > EPS)
            })
            .collect()
    }

    /// Decodes the last computed flow into per-job execution intervals.
    ///
    /// Inside each slot, jobs are laid out in pool order with the
    /// wrap-around rule, so fractional flows never exceed the concurrency
    /// bound.
    pub fn job_schedules(&self) -> Vec<JobSchedule> {
        let mut pieces: Vec<Vec<TimeInterval>> = vec![Vec::new(); self.pool.size()];

        for (t, edges) in self.slot_edges.iter().enumerate() {
            let allocations = edges
                .iter()
                .map(|&(job, edge)| (job, self.graph.flow(edge)))
                .filter(|&(_, flow)| flow > EPS);
            wrap_around(TimeInterval::slot(t), allocations, &mut pieces);
        }

        self.pool
            .jobs()
            .iter()
            .zip(pieces)
            .map(|(job, pieces)| {
                JobSchedule::new(job.id(), TimeInterval::merge_time_intervals(pieces))
            })
            .collect()
    }

    /// Checks the current open set and decodes it into a schedule.
    pub fn schedule(&mut self) -> Schedule {
        if !self.is_feasible() {
            return Schedule::infeasible();
        }
        Schedule::feasible(
            TimeInterval::merge_timestamps(self.open_slots()),
            self.job_schedules(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;
    use crate::validation::validate_schedule;

    fn pool() -> JobPool {
        JobPool::new(vec![
            Job::new(1, 2.0, TimeInterval::new(0.0, 4.0)),
            Job::new(2, 2.0, TimeInterval::new(1.0, 3.0)),
        ])
    }

    #[test]
    fn test_network_layout() {
        let pool = pool();
        let network = FlowNetworkBuilder::default().build(&pool, 1);
        assert_eq!(network.horizon(), 4);
        assert_eq!(network.demand(), 4.0);
        assert_eq!(network.covered_slots(), vec![0, 1, 2, 3]);
        assert_eq!(network.open_count(), 0);
    }

    #[test]
    fn test_open_close_slots() {
        let pool = pool();
        let mut network = FlowNetworkBuilder::default().build(&pool, 1);
        network.open_all();
        assert!(network.is_feasible());

        network.close_slot(0);
        assert!(!network.is_feasible());
        assert!(!network.is_open(0));

        network.open_slot(0);
        network.open_slot(17); // outside the horizon: ignored
        assert_eq!(network.open_slots(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_concurrency_two_needs_two_slots() {
        let pool = pool();
        let builder = FlowNetworkBuilder::new(FlowMethod::Dinic);
        let schedule = builder.schedule_slots(&pool, 2, &[1, 2]);
        assert!(schedule.all_jobs_scheduled());
        assert_eq!(schedule.active_time(), 2.0);
        assert!(validate_schedule(&pool, 2, &schedule).is_empty());

        let schedule = builder.schedule_slots(&pool, 2, &[0, 1]);
        assert!(!schedule.all_jobs_scheduled());
    }

    #[test]
    fn test_decode_all_methods() {
        let pool = pool();
        for method in [
            FlowMethod::EdmondsKarp,
            FlowMethod::FordFulkerson,
            FlowMethod::Dinic,
            FlowMethod::PreflowPush,
            FlowMethod::ShortestAugmentingPath,
        ] {
            let mut network = FlowNetworkBuilder::new(method).build(&pool, 1);
            network.open_all();
            let schedule = network.schedule();
            assert!(schedule.all_jobs_scheduled(), "{method:?}");
            assert!(validate_schedule(&pool, 1, &schedule).is_empty(), "{method:?}");
            let job2 = schedule.job_schedule(2).unwrap();
            assert_eq!(job2.execution_intervals, vec![TimeInterval::new(1.0, 3.0)]);
        }
    }

    #[test]
    fn test_fractional_duration() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.5, TimeInterval::new(0.0, 2.0)),
            Job::new(2, 0.5, TimeInterval::new(1.0, 2.0)),
        ]);
        let mut network = FlowNetworkBuilder::default().build(&pool, 1);
        network.open_all();
        let schedule = network.schedule();
        assert!(schedule.all_jobs_scheduled());
        assert!(validate_schedule(&pool, 1, &schedule).is_empty());
        assert_eq!(network.used_slots(), vec![0, 1]);
    }
}
