//! Error type for invalid scheduling requests.
//!
//! Infeasible instances are not errors: they yield
//! [`Schedule::infeasible`](crate::models::Schedule::infeasible).

use thiserror::Error;

use crate::validation::ValidationError;

/// A request no scheduler can run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// `max_concurrency` was zero.
    #[error("max_concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),

    /// The pool failed [`validate_job_pool`](crate::validation::validate_job_pool).
    #[error("invalid job pool: {}", format_validation_errors(.0))]
    InvalidJobPool(Vec<ValidationError>),

    /// A single-interval scheduler got a job with several windows.
    #[error("{scheduler} only accepts single-interval jobs, job {job_id} has several")]
    UnsupportedJobPool {
        /// Name of the rejecting scheduler.
        scheduler: &'static str,
        /// First job with more than one window.
        job_id: u64,
    },

    /// The brute-force search would enumerate too many slots.
    #[error("time horizon of {horizon} slots exceeds the brute-force limit of {max}")]
    HorizonTooLarge {
        /// Slots in the pool's horizon.
        horizon: usize,
        /// Largest horizon the search accepts.
        max: usize,
    },

    /// A flow method name did not parse.
    #[error("unknown flow method: {0}")]
    UnknownFlowMethod(String),

    /// An LP method name did not parse.
    #[error("unknown linear programming method: {0}")]
    UnknownLinearProgrammingMethod(String),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
