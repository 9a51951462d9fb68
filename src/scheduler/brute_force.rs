//! Exact scheduler by exhaustive search over slot subsets.
//!
//! Subsets of the covered slots are tried in increasing size, starting at
//! the lower bound `max(⌈D / m⌉, max_j ⌈p_j⌉)`; within one size they are
//! tried in lexicographic order of their bit masks. The first feasible
//! subset is optimal.
//!
//! # Complexity
//! O(2^T) max-flow computations in the worst case. Horizons above
//! [`MAX_BRUTE_FORCE_HORIZON`] are rejected.

use tracing::debug;

use super::{check_request, ActiveTimeScheduler};
use crate::error::SchedulingError;
use crate::flow::{FlowMethod, FlowNetworkBuilder};
use crate::models::{IntervalSupport, JobPool, Schedule};
use crate::EPS;

/// Largest horizon (in slots) the brute-force scheduler accepts.
pub const MAX_BRUTE_FORCE_HORIZON: usize = 24;

/// Exact minimum active time, for small instances and as a test oracle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BruteForceScheduler {
    flow: FlowNetworkBuilder,
}

impl BruteForceScheduler {
    /// Exact search with the default flow method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the max-flow method.
    pub fn with_flow_method(mut self, method: FlowMethod) -> Self {
        self.flow = FlowNetworkBuilder::new(method);
        self
    }
}

impl ActiveTimeScheduler for BruteForceScheduler {
    fn name(&self) -> &'static str {
        "brute_force"
    }

    fn interval_support(&self) -> IntervalSupport {
        IntervalSupport::Multi
    }

    fn process(&self, pool: &JobPool, max_concurrency: usize) -> Result<Schedule, SchedulingError> {
        check_request(self.name(), self.interval_support(), pool, max_concurrency)?;
        if pool.is_empty() {
            return Ok(Schedule::empty());
        }

        let horizon = pool.horizon();
        if horizon > MAX_BRUTE_FORCE_HORIZON {
            return Err(SchedulingError::HorizonTooLarge {
                horizon,
                max: MAX_BRUTE_FORCE_HORIZON,
            });
        }

        let mut network = self.flow.build(pool, max_concurrency);
        network.open_all();
        if !network.is_feasible() {
            return Ok(Schedule::infeasible());
        }

        let covered = network.covered_slots();
        let n = covered.len();
        let limit = 1u32 << n;
        let mut tried = 0usize;

        for size in lower_bound(pool, max_concurrency)..=n {
            let mut mask = (1u32 << size) - 1;
            while mask < limit {
                tried += 1;
                network.set_open_slots(
                    (0..n).filter(|&bit| mask & (1 << bit) != 0).map(|bit| covered[bit]),
                );
                if network.is_feasible() {
                    debug!(scheduler = self.name(), size, tried, "optimal slot set found");
                    return Ok(network.schedule());
                }
                mask = next_combination(mask);
            }
        }

        // The full covered set is feasible, so the loop always returns.
        network.open_all();
        Ok(network.schedule())
    }
}

/// `max(⌈D / m⌉, max_j ⌈p_j⌉)`, and at least one slot.
fn lower_bound(pool: &JobPool, max_concurrency: usize) -> usize {
    let load = (pool.total_duration() / max_concurrency as f64 - EPS).ceil();
    let longest = pool
        .jobs()
        .iter()
        .map(|j| (j.duration() - EPS).ceil())
        .fold(0.0, f64::max);
    load.max(longest).max(1.0) as usize
}

/// Next larger mask with the same number of set bits (Gosper's hack).
fn next_combination(mask: u32) -> u32 {
    let lowest = mask & mask.wrapping_neg();
    let ripple = mask + lowest;
    (((ripple ^ mask) >> 2) / lowest) | ripple
}
