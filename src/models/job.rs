//! Job and job pool models.
//!
//! A job is a unit of work with a processing duration and one or more
//! availability intervals. Jobs are immutable once built; schedulers only
//! read them.

use serde::{Deserialize, Serialize};

use super::TimeInterval;
use crate::EPS;

/// Which availability shapes a scheduler (or a pool) deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalSupport {
    /// Every job has exactly one availability interval.
    Single,
    /// Jobs may have any number of availability intervals.
    Multi,
}

impl IntervalSupport {
    /// Whether a scheduler with this support accepts a pool with `pool` support.
    pub fn accepts(self, pool: IntervalSupport) -> bool {
        matches!(
            (self, pool),
            (IntervalSupport::Multi, _) | (IntervalSupport::Single, IntervalSupport::Single)
        )
    }
}

/// A job to be scheduled.
///
/// # Time Representation
/// Availability intervals are half-open and kept sorted by start. A job
/// may run in slot `t` iff `[t, t + 1)` lies inside one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: u64,
    duration: f64,
    availability_intervals: Vec<TimeInterval>,
}

impl Job {
    /// Creates a job with a single availability interval.
    pub fn new(id: u64, duration: f64, availability: TimeInterval) -> Self {
        Self {
            id,
            duration,
            availability_intervals: vec![availability],
        }
    }

    /// Creates a job with several availability intervals.
    pub fn with_intervals(id: u64, duration: f64, mut intervals: Vec<TimeInterval>) -> Self {
        intervals.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            id,
            duration,
            availability_intervals: intervals,
        }
    }

    /// Job identifier, unique within a pool.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Processing duration.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Availability intervals, sorted by start.
    #[inline]
    pub fn availability_intervals(&self) -> &[TimeInterval] {
        &self.availability_intervals
    }

    /// Whether the job has exactly one availability interval.
    pub fn is_single_interval(&self) -> bool {
        self.availability_intervals.len() == 1
    }

    /// Earliest availability start. `0.0` for a job without intervals.
    pub fn release_time(&self) -> f64 {
        self.availability_intervals
            .iter()
            .map(|i| i.start)
            .fold(f64::INFINITY, f64::min)
            .min(self.deadline())
    }

    /// Latest availability end. `0.0` for a job without intervals.
    pub fn deadline(&self) -> f64 {
        self.availability_intervals
            .iter()
            .map(|i| i.end)
            .fold(0.0, f64::max)
    }

    /// Total length of the availability intervals.
    pub fn window_length(&self) -> f64 {
        TimeInterval::total_length(&self.availability_intervals)
    }

    /// Fraction of the availability window the job needs.
    ///
    /// Returns `None` for an empty window.
    pub fn density(&self) -> Option<f64> {
        let window = self.window_length();
        (window > EPS).then(|| self.duration / window)
    }

    /// First slot the job may run in.
    pub fn release_slot(&self) -> usize {
        (self.release_time() - EPS).ceil().max(0.0) as usize
    }

    /// Exclusive upper bound on the slots the job may run in.
    pub fn deadline_slot(&self) -> usize {
        (self.deadline() + EPS).floor().max(0.0) as usize
    }

    /// Whether slot `t` lies inside one of the availability intervals.
    pub fn covers_slot(&self, t: usize) -> bool {
        let slot = TimeInterval::slot(t);
        self.availability_intervals.iter().any(|i| i.contains(&slot))
    }

    /// All slots the job may run in, ascending.
    pub fn covered_slots(&self) -> Vec<usize> {
        (self.release_slot()..self.deadline_slot())
            .filter(|&t| self.covers_slot(t))
            .collect()
    }
}

/// An immutable, ordered collection of jobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPool {
    jobs: Vec<Job>,
}

impl JobPool {
    /// Creates a pool from the given jobs.
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// The jobs, in insertion order.
    #[inline]
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Number of jobs.
    #[inline]
    pub fn size(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the pool has no jobs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Finds a job by ID.
    pub fn job(&self, id: u64) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Sum of all job durations (the demand a feasible flow must carry).
    pub fn total_duration(&self) -> f64 {
        self.jobs.iter().map(Job::duration).sum()
    }

    /// Exclusive upper bound of the slots any job may use.
    pub fn horizon(&self) -> usize {
        self.jobs.iter().map(Job::deadline_slot).max().unwrap_or(0)
    }

    /// Slots covered by at least one job, ascending.
    pub fn covered_slots(&self) -> Vec<usize> {
        let mut covered = vec![false; self.horizon()];
        for job in &self.jobs {
            for t in job.covered_slots() {
                covered[t] = true;
            }
        }
        covered
            .into_iter()
            .enumerate()
            .filter_map(|(t, c)| c.then_some(t))
            .collect()
    }

    /// `Single` if every job has exactly one interval, `Multi` otherwise.
    pub fn interval_support(&self) -> IntervalSupport {
        if self.jobs.iter().all(Job::is_single_interval) {
            IntervalSupport::Single
        } else {
            IntervalSupport::Multi
        }
    }
}

impl FromIterator<Job> for JobPool {
    fn from_iter<I: IntoIterator<Item = Job>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_interval_job() {
        let job = Job::new(7, 3.0, TimeInterval::new(1.0, 5.0));
        assert_eq!(job.id(), 7);
        assert_eq!(job.duration(), 3.0);
        assert!(job.is_single_interval());
        assert_eq!(job.release_time(), 1.0);
        assert_eq!(job.deadline(), 5.0);
        assert_eq!(job.release_slot(), 1);
        assert_eq!(job.deadline_slot(), 5);
        assert_eq!(job.covered_slots(), vec![1, 2, 3, 4]);
        assert!((job.density().unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_multi_interval_job_sorted() {
        let job = Job::with_intervals(
            1,
            2.0,
            vec![TimeInterval::new(6.0, 8.0), TimeInterval::new(0.0, 2.0)],
        );
        assert!(!job.is_single_interval());
        assert_eq!(job.availability_intervals()[0].start, 0.0);
        assert_eq!(job.covered_slots(), vec![0, 1, 6, 7]);
        assert!(!job.covers_slot(3));
        assert_eq!(job.window_length(), 4.0);
    }

    #[test]
    fn test_fractional_window_slots() {
        // [0.5, 3.5) only fully contains slots 1 and 2
        let job = Job::new(1, 1.0, TimeInterval::new(0.5, 3.5));
        assert_eq!(job.covered_slots(), vec![1, 2]);
        assert_eq!(job.deadline_slot(), 3);
    }

    #[test]
    fn test_job_pool() {
        let pool: JobPool = vec![
            Job::new(1, 2.0, TimeInterval::new(0.0, 3.0)),
            Job::new(2, 1.0, TimeInterval::new(5.0, 6.0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(pool.size(), 2);
        assert_eq!(pool.total_duration(), 3.0);
        assert_eq!(pool.horizon(), 6);
        assert_eq!(pool.covered_slots(), vec![0, 1, 2, 5]);
        assert_eq!(pool.interval_support(), IntervalSupport::Single);
        assert_eq!(pool.job(2).map(Job::duration), Some(1.0));
        assert!(pool.job(9).is_none());
    }

    #[test]
    fn test_empty_pool() {
        let pool = JobPool::default();
        assert!(pool.is_empty());
        assert_eq!(pool.horizon(), 0);
        assert!(pool.covered_slots().is_empty());
        assert_eq!(pool.interval_support(), IntervalSupport::Single);
    }

    #[test]
    fn test_interval_support_accepts() {
        assert!(IntervalSupport::Multi.accepts(IntervalSupport::Single));
        assert!(IntervalSupport::Multi.accepts(IntervalSupport::Multi));
        assert!(IntervalSupport::Single.accepts(IntervalSupport::Single));
        assert!(!IntervalSupport::Single.accepts(IntervalSupport::Multi));
    }
}
