//! Segment-wise greedy scheduler.
//!
//! The release and deadline slots of all jobs cut the horizon into
//! segments. Inside a segment every slot is available to the same jobs, so
//! only *how many* slots a segment keeps open matters, not which. Segments
//! are processed left to right and each keeps the fewest slots that still
//! admit a feasible flow, found by binary search. The kept slots are the
//! trailing part of the segment.
//!
//! # Network
//!
//! `source → job` (duration), `job → segment` (kept slots) for every segment
//! inside the job's window, `segment → sink` (`m · kept`).
//!
//! # Complexity
//! O(K log T) max-flow computations for K ≤ 2n segments.

use tracing::debug;

use super::{check_request, ActiveTimeScheduler};
use crate::error::SchedulingError;
use crate::flow::{EdgeId, FlowMethod, FlowNetwork};
use crate::models::{IntervalSupport, JobPool, JobSchedule, Schedule, TimeInterval};
use crate::packing::wrap_around;
use crate::EPS;

/// Greedy scheduler over release/deadline segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GreedyIntervalsScheduler {
    method: FlowMethod,
}

impl GreedyIntervalsScheduler {
    /// Creates a scheduler using the given flow method.
    pub fn new(method: FlowMethod) -> Self {
        Self { method }
    }

    /// The configured flow method.
    pub fn method(&self) -> FlowMethod {
        self.method
    }
}

impl ActiveTimeScheduler for GreedyIntervalsScheduler {
    fn name(&self) -> &'static str {
        "greedy_intervals"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Single
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let mut network = SegmentNetwork::build(pool, max_concurrency, self.method);
        if !network.is_feasible() {
            return Ok(Schedule::infeasible());
        }

        for k in 0..network.segments.len() {
            let (mut lo, mut hi) = (0, network.segments[k].len());
            while lo < hi {
                let mid = (lo + hi) / 2;
                network.set_kept(k, mid);
                if network.is_feasible() {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            network.set_kept(k, hi);
        }

        // Recompute the flow for the final capacities before decoding.
        if !network.is_feasible() {
            return Ok(Schedule::infeasible());
        }

        let schedule = network.schedule(pool);
        debug!(
            scheduler = self.name(),
            segments = network.segments.len(),
            active_time = schedule.active_time(),
            "segment schedule computed"
        );
        Ok(schedule)
    }
}

#[derive(Debug, Clone)]
struct Segment {
    start: usize,
    end: usize,
    kept: usize,
    sink_edge: EdgeId,
    job_edges: Vec<(usize, EdgeId)>,
}

impl Segment {
    fn len(&self) -> usize {
        self.end - self.start
    }

    /// The open part of the segment.
    fn window(&self) -> TimeInterval {
        TimeInterval::new((self.end - self.kept) as f64, self.end as f64)
    }
}

#[derive(Debug, Clone)]
struct SegmentNetwork {
    graph: FlowNetwork,
    method: FlowMethod,
    sink: usize,
    demand: f64,
    max_concurrency: usize,
    segments: Vec<Segment>,
}

impl SegmentNetwork {
    /// Builds the network with every segment fully open.
    fn build(pool: &JobPool, max_concurrency: usize, method: FlowMethod) -> Self {
        let mut points: Vec<usize> = pool
            .jobs()
            .iter()
            .flat_map(|j| [j.release_slot(), j.deadline_slot()])
            .collect();
        points.sort_unstable();
        points.dedup();
        let bounds: Vec<(usize, usize)> = points
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|(start, end)| end > start)
            .collect();

        let n = pool.size();
        let sink = 1 + n + bounds.len();
        let mut graph = FlowNetwork::new(sink + 1);

        for (i, job) in pool.jobs().iter().enumerate() {
            graph.add_edge(0, 1 + i, job.duration());
        }

        let segments = bounds
            .iter()
            .enumerate()
            .map(|(k, &(start, end))| {
                let node = 1 + n + k;
                let len = end - start;
                let sink_edge = graph.add_edge(node, sink, (max_concurrency * len) as f64);
                let job_edges = pool
                    .jobs()
                    .iter()
                    .enumerate()
                    .filter(|(_, job)| job.release_slot() <= start && end <= job.deadline_slot())
                    .map(|(i, _)| (i, graph.add_edge(1 + i, node, len as f64)))
                    .collect();
                Segment {
                    start,
                    end,
                    kept: len,
                    sink_edge,
                    job_edges,
                }
            })
            .collect();

        Self {
            graph,
            method,
            sink,
            demand: pool.total_duration(),
            max_concurrency,
            segments,
        }
    }

    fn set_kept(&mut self, k: usize, kept: usize) {
        let segment = &mut self.segments[k];
        segment.kept = kept;
        self.graph
            .set_capacity(segment.sink_edge, (self.max_concurrency * kept) as f64);
        for &(_, edge) in &segment.job_edges {
            self.graph.set_capacity(edge, kept as f64);
        }
    }

    fn is_feasible(&mut self) -> bool {
        self.graph.max_flow(0, self.sink, self.method) >= self.demand - EPS
    }

    /// Decodes the last computed flow.
    fn schedule(&self, pool: &JobPool) -> Schedule {
        let mut pieces: Vec<Vec<TimeInterval>> = vec![Vec::new(); pool.size()];
        let mut active = Vec::new();

        for segment in self.segments.iter().filter(|s| s.kept > 0) {
            let window = segment.window();
            let allocations = segment
                .job_edges
                .iter()
                .map(|&(job, edge)| (job, self.graph.flow(edge)))
                .filter(|&(_, flow)| flow > EPS);
            wrap_around(window, allocations, &mut pieces);
            active.push(window);
        }

        let job_schedules = pool
            .jobs()
            .iter()
            .zip(pieces)
            .map(|(job, pieces)| {
                JobSchedule::new(job.id(), TimeInterval::merge_time_intervals(pieces))
            })
            .collect();
        Schedule::feasible(TimeInterval::merge_time_intervals(active), job_schedules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Job;
    use crate::validation::validate_schedule;

    fn job(id: u64, duration: f64, start: f64, end: f64) -> Job {
        Job::new(id, duration, TimeInterval::new(start, end))
    }

    #[test]
    fn test_segments_from_windows() {
        let pool = JobPool::new(vec![job(1, 2.0, 0.0, 6.0), job(2, 2.0, 2.0, 4.0)]);
        let network = SegmentNetwork::build(&pool, 1, FlowMethod::default());
        let bounds: Vec<(usize, usize)> =
            network.segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(bounds, vec![(0, 2), (2, 4), (4, 6)]);
        // job 2 only reaches the middle segment
        assert_eq!(network.segments[1].job_edges.len(), 2);
        assert_eq!(network.segments[0].job_edges.len(), 1);
    }

    #[test]
    fn test_nested_windows_share_segment() {
        let pool = JobPool::new(vec![job(1, 2.0, 0.0, 6.0), job(2, 2.0, 2.0, 4.0)]);
        let schedule = GreedyIntervalsScheduler::default().process(&pool, 2).unwrap();
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(2.0, 4.0)][..])
        );
        assert!(validate_schedule(&pool, 2, &schedule).is_empty());
    }

    #[test]
    fn test_trailing_slots_are_kept() {
        let pool = JobPool::new(vec![job(1, 2.0, 0.0, 6.0), job(2, 2.0, 2.0, 4.0)]);
        let schedule = GreedyIntervalsScheduler::new(FlowMethod::Dinic)
            .process(&pool, 1)
            .unwrap();
        assert_eq!(
            schedule.active_time_intervals(),
            Some(&[TimeInterval::new(2.0, 6.0)][..])
        );
        assert_eq!(
            schedule.job_schedule(1).unwrap().execution_intervals,
            vec![TimeInterval::new(4.0, 6.0)]
        );
        assert!(validate_schedule(&pool, 1, &schedule).is_empty());
    }

    #[test]
    fn test_disjoint_windows() {
        let pool = JobPool::new(vec![job(1, 1.0, 0.0, 3.0), job(2, 1.0, 5.0, 7.0)]);
        let schedule = GreedyIntervalsScheduler::default().process(&pool, 1).unwrap();
        assert_eq!(schedule.active_time(), 2.0);
        assert!(validate_schedule(&pool, 1, &schedule).is_empty());
    }
}
