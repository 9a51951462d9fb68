//! Degree-constrained subgraph scheduler.
//!
//! Jobs and covered slots form a bipartite graph. A job needs degree equal
//! to its duration, a slot admits degree at most `m`, and each job-slot
//! edge is used at most once. One max-flow over the fully open network
//! finds such a subgraph (a generalized b-matching); the slots it touches
//! become the active set.
//!
//! Feasibility is exact. The active time depends on which subgraph the flow
//! method returns and is not minimized.

use tracing::debug;

use super::{check_request, ActiveTimeScheduler};
use crate::error::SchedulingError;
use crate::flow::{FlowMethod, FlowNetworkBuilder};
use crate::models::{IntervalSupport, JobPool, Schedule, TimeInterval};

/// Single b-matching over all covered slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegreeConstrainedSubgraphScheduler {
    flow: FlowNetworkBuilder,
}

/// Alias under the reduction's common name.
pub type MatchingScheduler = DegreeConstrainedSubgraphScheduler;

impl DegreeConstrainedSubgraphScheduler {
    /// One b-matching with the default flow method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the max-flow method.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.flow = FlowNetworkBuilder::new(method);
        self
    }
}

impl ActiveTimeScheduler for DegreeConstrainedSubgraphScheduler {
    fn name(&self) -> &'static str {
        "degree_constrained_subgraph"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Multi
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let mut network = self.flow.build(pool, max_concurrency);
        network.open_all();
        if !network.is_feasible() {
            return Ok(Schedule::infeasible());
        }

        let used = network.used_slots();
        debug!(
            scheduler = self.name(),
            covered = network.open_count(),
            used = used.len(),
            "degree-constrained subgraph found"
        );
        Ok(Schedule::feasible(
            TimeInterval::merge_timestamps(used),
            network.job_schedules(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;
    use crate::validation::validate_schedule;

    #[test]
    fn test_unit_jobs_share_slots() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.0, TimeInterval::new(0.0, 1.0)),
            Job::new(2, 1.0, TimeInterval::new(0.0, 1.0)),
            Job::new(3, 1.0, TimeInterval::new(2.0, 3.0)),
        ]);
        let schedule = MatchingScheduler::new().process(&pool, 2).unwrap();
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(0.0, 1.0), TimeInterval::new(2.0, 3.0)][..])
        );
        assert!(validate_schedule(&pool, 2, &schedule).is_empty());
    }

    #[test]
    fn test_every_flow_method_is_sound() {
        let pool = JobPool::new(vec![
            Job::new(1, 2.0, TimeInterval::new(0.0, 4.0)),
            Job::with_intervals(
                2,
                2.0,
                vec![TimeInterval::new(0.0, 1.0), TimeInterval::new(2.0, 4.0)],
            ),
            Job::new(3, 1.0, TimeInterval::new(1.0, 3.0)),
        ]);
        for method in [
            FlowMethod::EdmondsKarp,
            FlowMethod::FordFulkerson,
            FlowMethod::Dinic,
            FlowMethod::PreflowPush,
            FlowMethod::ShortestAugmentingPath,
        ] {
            let scheduler = DegreeConstrainedSubgraphScheduler::new().with_flow_method(method);
            let schedule = scheduler.process(&pool, 2).unwrap();
            assert!(schedule.all_jobs_scheduled(), "{method:?}");
            assert!(schedule.active_time() >= 3.0 - 1e-9, "{method:?}");
            assert!(validate_schedule(&pool, 2, &schedule).is_empty(), "{method:?}");
        }
    }

    #[test]
    fn test_infeasible_matching() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.0, TimeInterval::new(0.0, 1.0)),
            Job::new(2, 1.0, TimeInterval::new(0.0, 1.0)),
        ]);
        let schedule = DegreeConstrainedSubgraphScheduler::new().process(&pool, 1).unwrap();
        assert!(!schedule.all_jobs_scheduled());
    }
}
