//! Active time scheduling.
//!
//! Jobs with a processing duration and availability windows are placed on a
//! machine that runs at most `m` jobs at once. Time is split into unit
//! slots; the machine pays for every slot it is switched on. Schedulers
//! choose which slots to open and where each job runs, minimizing the total
//! open (active) time.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `TimeInterval`, `Job`, `JobPool`, `Schedule`
//! - **`validation`**: Job pool checks and schedule verification
//! - **`flow`**: Max-flow algorithms and the time-expanded feasibility network
//! - **`lp`**: Linear programs solved through `good_lp`
//! - **`scheduler`**: Greedy, LP, rounding, brute-force and matching schedulers
//!
//! # Example
//!
//! ```
//! use active_time_scheduling::models::{Job, JobPool, TimeInterval};
//! use active_time_scheduling::scheduler::{ActiveTimeScheduler, BruteForceScheduler};
//!
//! let pool = JobPool::new(vec![Job::new(1, 3.0, TimeInterval::new(0.0, 5.0))]);
//! let schedule = BruteForceScheduler::default().process(&pool, 1).unwrap();
//! assert_eq!(schedule.active_time(), 3.0);
//! ```
//!
//! # References
//!
//! - Chang, Gabow & Khuller (2014), "A model for minimizing active processor time"
//! - Chang, Khuller & Mukherjee (2017), "LP rounding and combinatorial
//!   algorithms for minimizing active and busy time"
//! - Kumar & Khuller (2018), "Brief announcement: A greedy 2 approximation
//!   for the active time problem"

pub mod error;
pub mod flow;
pub mod lp;
pub mod models;
mod packing;
pub mod scheduler;
pub mod validation;

pub use error::SchedulingError;

/// Tolerance for floating-point comparisons of times and flows.
pub const EPS: f64 = 1e-7;
