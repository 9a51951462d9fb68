//! Active time scheduling domain models.
//!
//! Provides the data types for describing a scheduling instance (jobs with
//! availability windows) and its solution (active time plus per-job
//! execution intervals).
//!
//! | Type | Role |
//! |------|------|
//! | `TimeInterval` | Half-open `[start, end)` time range |
//! | `Job` | Duration plus availability intervals |
//! | `JobPool` | Immutable set of jobs |
//! | `JobSchedule` | Execution intervals of one job |
//! | `Schedule` | Feasibility flag, active time, job schedules |

mod interval;
mod job;
mod schedule;

pub use interval::TimeInterval;
pub use job::{IntervalSupport, Job, JobPool};
pub use schedule::{JobSchedule, Schedule, Violation, ViolationType};
