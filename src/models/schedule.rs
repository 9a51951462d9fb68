//! Schedule (solution) model.
//!
//! A schedule is either infeasible, or a set of active time intervals
//! together with the execution intervals of every job.

use serde::{Deserialize, Serialize};

use super::TimeInterval;

/// Execution intervals assigned to one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSchedule {
    /// ID of the scheduled job in its pool.
    pub job_id: u64,
    /// Disjoint execution intervals, sorted ascending.
    pub execution_intervals: Vec<TimeInterval>,
}

impl JobSchedule {
    /// Creates a job schedule.
    pub fn new(job_id: u64, execution_intervals: Vec<TimeInterval>) -> Self {
        Self {
            job_id,
            execution_intervals,
        }
    }

    /// Total execution time.
    #[inline]
    pub fn execution_time(&self) -> f64 {
        TimeInterval::total_length(&self.execution_intervals)
    }
}

/// The result of one scheduling run.
///
/// When `all_jobs_scheduled` is false both lists are absent; a feasible
/// schedule with no work has empty lists instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    all_jobs_scheduled: bool,
    active_time_intervals: Option<Vec<TimeInterval>>,
    job_schedules: Option<Vec<JobSchedule>>,
}

impl Schedule {
    /// A feasible schedule.
    pub fn feasible(
        active_time_intervals: Vec<TimeInterval>,
        job_schedules: Vec<JobSchedule>,
    ) -> Self {
        Self {
            all_jobs_scheduled: true,
            active_time_intervals: Some(active_time_intervals),
            job_schedules: Some(job_schedules),
        }
    }

    /// A feasible schedule with no work (empty job pool).
    pub fn empty() -> Self {
        Self::feasible(Vec::new(), Vec::new())
    }

    /// The infeasible outcome.
    pub fn infeasible() -> Self {
        Self {
            all_jobs_scheduled: false,
            active_time_intervals: None,
            job_schedules: None,
        }
    }

    /// Whether every job got fully scheduled.
    #[inline]
    pub fn all_jobs_scheduled(&self) -> bool {
        self.all_jobs_scheduled
    }

    /// Active time intervals; `None` when infeasible.
    pub fn active_time_intervals(&self) -> Option<&[TimeInterval]> {
        self.active_time_intervals.as_deref()
    }

    /// Per-job schedules; `None` when infeasible.
    pub fn job_schedules(&self) -> Option<&[JobSchedule]> {
        self.job_schedules.as_deref()
    }

    /// Total active time. `0.0` for an infeasible schedule.
    pub fn active_time(&self) -> f64 {
        self.active_time_intervals
            .as_deref()
            .map(TimeInterval::total_length)
            .unwrap_or(0.0)
    }

    /// Finds the schedule of a given job.
    pub fn job_schedule(&self, job_id: u64) -> Option<&JobSchedule> {
        self.job_schedules
            .as_deref()?
            .iter()
            .find(|s| s.job_id == job_id)
    }
}

/// A soundness violation found in a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related job, if any.
    pub job_id: Option<u64>,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Executed time differs from the job duration.
    DurationMismatch,
    /// Execution outside every availability interval of the job.
    OutsideAvailability,
    /// Execution outside every active interval.
    OutsideActiveTime,
    /// More jobs than `max_concurrency` run at some point.
    ConcurrencyExceeded,
    /// Active intervals are overlapping or out of order.
    UnsortedActiveTime,
    /// A pool job has no schedule, or a schedule names an unknown job.
    MissingJob,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        job_id: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            job_id,
            message: message.into(),
        }
    }
}
