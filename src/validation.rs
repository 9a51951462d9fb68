//! Input validation and schedule soundness checks.
//!
//! Checks structural integrity of a job pool before scheduling. Detects:
//! - Duplicate job IDs
//! - Non-positive or non-finite durations
//! - Jobs without availability intervals
//! - Malformed availability intervals
//! - Availability ending past [`MAX_HORIZON`]
//!
//! Also verifies that a produced schedule is sound: every job runs for its
//! full duration, only inside its availability and inside active time, and
//! never more than `max_concurrency` jobs at once.

use std::collections::{HashMap, HashSet};

use crate::models::{Job, JobPool, Schedule, TimeInterval, Violation, ViolationType};
use crate::EPS;

/// Tolerance for comparing accumulated execution time against durations.
const DURATION_TOLERANCE: f64 = 1e-6;

/// Latest time (in slots) an availability interval may end at.
///
/// The feasibility network holds one node per slot up to the horizon.
pub const MAX_HORIZON: usize = 1 << 20;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two jobs share the same ID.
    DuplicateId,
    /// A job has a duration that is not a positive finite number.
    NonPositiveDuration,
    /// A job has no availability intervals.
    NoAvailability,
    /// An availability interval is non-finite, negative, or has `start > end`.
    InvalidInterval,
    /// An availability interval ends after [`MAX_HORIZON`].
    HorizonTooLarge,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a job pool.
///
/// Checks:
/// 1. No duplicate job IDs
/// 2. Every duration is finite and strictly positive
/// 3. Every job has at least one availability interval
/// 4. Every interval is finite, starts at or after 0, and has `start <= end`
/// 5. No interval ends after [`MAX_HORIZON`]
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_job_pool(pool: &JobPool) -> ValidationResult {
    let mut errors = Vec::new();
    let mut ids = HashSet::new();

    for job in pool.jobs() {
        if !ids.insert(job.id()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate job ID: {}", job.id()),
            ));
        }

        if !(job.duration().is_finite() && job.duration() > 0.0) {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveDuration,
                format!("Job {} has non-positive duration {}", job.id(), job.duration()),
            ));
        }

        if job.availability_intervals().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoAvailability,
                format!("Job {} has no availability intervals", job.id()),
            ));
        }

        for interval in job.availability_intervals() {
            if !interval.is_well_formed() || interval.start < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidInterval,
                    format!(
                        "Job {} has invalid availability interval [{}, {})",
                        job.id(),
                        interval.start,
                        interval.end
                    ),
                ));
            } else if interval.end > MAX_HORIZON as f64 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::HorizonTooLarge,
                    format!(
                        "Job {} is available until {}, past the horizon limit {}",
                        job.id(),
                        interval.end,
                        MAX_HORIZON
                    ),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks a schedule against the pool it was computed for.
///
/// An infeasible schedule carries no claims and yields no violations.
/// Returns every violation found; an empty vector means the schedule is sound.
pub fn validate_schedule(
    pool: &JobPool,
    max_concurrency: usize,
    schedule: &Schedule,
) -> Vec<Violation> {
    let (Some(active), Some(job_schedules)) =
        (schedule.active_time_intervals(), schedule.job_schedules())
    else {
        return Vec::new();
    };

    let mut violations = Vec::new();

    for pair in active.windows(2) {
        if pair[1].start < pair[0].end - EPS {
            violations.push(Violation::new(
                ViolationType::UnsortedActiveTime,
                None,
                format!(
                    "Active interval [{}, {}) does not follow [{}, {})",
                    pair[1].start, pair[1].end, pair[0].start, pair[0].end
                ),
            ));
        }
    }

    let active = TimeInterval::merge_time_intervals(active.to_vec());
    let jobs: HashMap<u64, &Job> = pool.jobs().iter().map(|j| (j.id(), j)).collect();

    for job in pool.jobs() {
        if !job_schedules.iter().any(|s| s.job_id == job.id()) {
            violations.push(Violation::new(
                ViolationType::MissingJob,
                Some(job.id()),
                format!("Job {} has no schedule", job.id()),
            ));
        }
    }

    for job_schedule in job_schedules {
        let Some(job) = jobs.get(&job_schedule.job_id) else {
            violations.push(Violation::new(
                ViolationType::MissingJob,
                Some(job_schedule.job_id),
                format!("Schedule names unknown job {}", job_schedule.job_id),
            ));
            continue;
        };

        let executed = job_schedule.execution_time();
        if (executed - job.duration()).abs() > DURATION_TOLERANCE {
            violations.push(Violation::new(
                ViolationType::DurationMismatch,
                Some(job.id()),
                format!(
                    "Job {} executes for {} instead of {}",
                    job.id(),
                    executed,
                    job.duration()
                ),
            ));
        }

        let availability =
            TimeInterval::merge_time_intervals(job.availability_intervals().to_vec());
        for interval in &job_schedule.execution_intervals {
            if !availability.iter().any(|a| a.contains(interval)) {
                violations.push(Violation::new(
                    ViolationType::OutsideAvailability,
                    Some(job.id()),
                    format!(
                        "Job {} runs in [{}, {}) outside its availability",
                        job.id(),
                        interval.start,
                        interval.end
                    ),
                ));
            }
            if !active.iter().any(|a| a.contains(interval)) {
                violations.push(Violation::new(
                    ViolationType::OutsideActiveTime,
                    Some(job.id()),
                    format!(
                        "Job {} runs in [{}, {}) outside active time",
                        job.id(),
                        interval.start,
                        interval.end
                    ),
                ));
            }
        }
    }

    if let Some((time, peak)) = peak_concurrency(schedule) {
        if peak > max_concurrency {
            violations.push(Violation::new(
                ViolationType::ConcurrencyExceeded,
                None,
                format!("{peak} jobs run at time {time}, limit is {max_concurrency}"),
            ));
        }
    }

    violations
}

/// Largest number of simultaneously executing jobs and a time it occurs.
///
/// Sweep over interval endpoints. Endpoints closer than [`EPS`] are treated
/// as simultaneous, and intervals ending there are released before new ones
/// start.
fn peak_concurrency(schedule: &Schedule) -> Option<(f64, usize)> {
    let mut events: Vec<(f64, i64)> = schedule
        .job_schedules()?
        .iter()
        .flat_map(|s| s.execution_intervals.iter())
        .filter(|i| i.length() > EPS)
        .flat_map(|i| [(i.start, 1), (i.end, -1)])
        .collect();
    events.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut running: i64 = 0;
    let mut peak = (0.0, 0usize);
    let mut i = 0;
    while i < events.len() {
        let time = events[i].0;
        let mut j = i;
        let (mut released, mut started) = (0, 0);
        while j < events.len() && events[j].0 - time <= EPS {
            if events[j].1 < 0 {
                released += 1;
            } else {
                started += 1;
            }
            j += 1;
        }
        running = running - released + started;
        if running as usize > peak.1 {
            peak = (time, running as usize);
        }
        i = j;
    }

    Some(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobSchedule;

    fn sample_pool() -> JobPool {
        JobPool::new(vec![
            Job::new(1, 2.0, TimeInterval::new(0.0, 4.0)),
            Job::new(2, 1.0, TimeInterval::new(1.0, 3.0)),
        ])
    }

    #[test]
    fn test_valid_pool() {
        assert!(validate_job_pool(&sample_pool()).is_ok());
    }

    #[test]
    fn test_duplicate_job_id() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.0, TimeInterval::new(0.0, 2.0)),
            Job::new(1, 1.0, TimeInterval::new(0.0, 2.0)),
        ]);
        let errors = validate_job_pool(&pool).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_non_positive_duration() {
        let pool = JobPool::new(vec![
            Job::new(1, 0.0, TimeInterval::new(0.0, 2.0)),
            Job::new(2, f64::NAN, TimeInterval::new(0.0, 2.0)),
        ]);
        let errors = validate_job_pool(&pool).unwrap_err();
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.kind == ValidationErrorKind::NonPositiveDuration)
                .count(),
            2
        );
    }

    #[test]
    fn test_no_availability() {
        let pool = JobPool::new(vec![Job::with_intervals(1, 1.0, Vec::new())]);
        let errors = validate_job_pool(&pool).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::NoAvailability));
    }

    #[test]
    fn test_invalid_interval() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.0, TimeInterval::new(3.0, 2.0)),
            Job::new(2, 1.0, TimeInterval::new(-1.0, 2.0)),
        ]);
        let errors = validate_job_pool(&pool).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::InvalidInterval));
    }

    #[test]
    fn test_huge_horizon_rejected() {
        let pool = JobPool::new(vec![
            Job::new(1, 1.0, TimeInterval::new(0.0, 1e15)),
            Job::new(2, 1.0, TimeInterval::new(0.0, f64::MAX)),
            Job::new(3, 1.0, TimeInterval::new(0.0, MAX_HORIZON as f64)),
        ]);
        let errors = validate_job_pool(&pool).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::HorizonTooLarge));
    }

    #[test]
    fn test_sound_schedule() {
        let schedule = Schedule::feasible(
            vec![TimeInterval::new(1.0, 3.0)],
            vec![
                JobSchedule::new(1, vec![TimeInterval::new(1.0, 3.0)]),
                JobSchedule::new(2, vec![TimeInterval::new(1.0, 2.0)]),
            ],
        );
        assert!(validate_schedule(&sample_pool(), 2, &schedule).is_empty());
    }

    #[test]
    fn test_concurrency_exceeded() {
        let schedule = Schedule::feasible(
            vec![TimeInterval::new(1.0, 3.0)],
            vec![
                JobSchedule::new(1, vec![TimeInterval::new(1.0, 3.0)]),
                JobSchedule::new(2, vec![TimeInterval::new(1.0, 2.0)]),
            ],
        );
        let violations = validate_schedule(&sample_pool(), 1, &schedule);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].violation_type, ViolationType::ConcurrencyExceeded);
    }

    #[test]
    fn test_back_to_back_is_not_concurrent() {
        let schedule = Schedule::feasible(
            vec![TimeInterval::new(0.0, 3.0)],
            vec![
                JobSchedule::new(1, vec![TimeInterval::new(0.0, 2.0)]),
                JobSchedule::new(2, vec![TimeInterval::new(2.0, 3.0)]),
            ],
        );
        assert!(validate_schedule(&sample_pool(), 1, &schedule).is_empty());
    }

    #[test]
    fn test_outside_windows_and_duration() {
        let schedule = Schedule::feasible(
            vec![TimeInterval::new(0.0, 1.0)],
            vec![
                JobSchedule::new(1, vec![TimeInterval::new(0.0, 1.0)]),
                JobSchedule::new(2, vec![TimeInterval::new(0.0, 1.0)]),
            ],
        );
        let violations = validate_schedule(&sample_pool(), 2, &schedule);
        let kinds: Vec<ViolationType> = violations.iter().map(|v| v.violation_type).collect();
        assert!(kinds.contains(&ViolationType::DurationMismatch)); // job 1 runs 1 of 2
        assert!(kinds.contains(&ViolationType::OutsideAvailability)); // job 2 before 1.0
        assert!(!kinds.contains(&ViolationType::OutsideActiveTime));
    }

    #[test]
    fn test_missing_job_and_unsorted_active() {
        let schedule = Schedule::feasible(
            vec![TimeInterval::new(2.0, 3.0), TimeInterval::new(0.0, 2.0)],
            vec![JobSchedule::new(1, vec![TimeInterval::new(0.0, 2.0)])],
        );
        let kinds: Vec<ViolationType> = validate_schedule(&sample_pool(), 2, &schedule)
            .iter()
            .map(|v| v.violation_type)
            .collect();
        assert!(kinds.contains(&ViolationType::MissingJob));
        assert!(kinds.contains(&ViolationType::UnsortedActiveTime));
    }

    #[test]
    fn test_infeasible_schedule_has_no_violations() {
        assert!(validate_schedule(&sample_pool(), 1, &Schedule::infeasible()).is_empty());
    }
}
