//! Time interval model.
//!
//! Defines the half-open real interval used for availability windows,
//! active time and job execution.
//!
//! # Time Model
//! Time is measured in abstract units relative to a scheduling epoch (t=0).
//! The discrete slot `t` is the unit interval `[t, t + 1)`.

use serde::{Deserialize, Serialize};

use crate::EPS;

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end. Invariant `start <= end`
/// (checked by [`crate::validation::validate_job_pool`] for job input).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeInterval {
    /// Interval start (inclusive).
    pub start: f64,
    /// Interval end (exclusive).
    pub end: f64,
}

impl TimeInterval {
    /// Creates a new time interval.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The unit interval covered by slot `t`.
    #[inline]
    pub fn slot(t: usize) -> Self {
        Self::new(t as f64, t as f64 + 1.0)
    }

    /// Length of this interval.
    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Whether a time point falls within this interval.
    #[inline]
    pub fn contains_point(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether `other` lies entirely inside this interval (up to [`EPS`]).
    pub fn contains(&self, other: &Self) -> bool {
        other.start >= self.start - EPS && other.end <= self.end + EPS
    }

    /// Whether two intervals overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the invariant `start <= end` holds and both bounds are finite.
    pub fn is_well_formed(&self) -> bool {
        self.start.is_finite() && self.end.is_finite() && self.start <= self.end
    }

    /// Coalesces integer slots into maximal runs of contiguous slots.
    ///
    /// Slots may be given in any order and may repeat. `{0, 1, 2, 5}`
    /// becomes `[0, 3), [5, 6)`.
    pub fn merge_timestamps<I>(timestamps: I) -> Vec<TimeInterval>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut slots: Vec<usize> = timestamps.into_iter().collect();
        slots.sort_unstable();
        slots.dedup();

        let mut merged = Vec::new();
        let mut iter = slots.into_iter();
        let Some(first) = iter.next() else {
            return merged;
        };

        let (mut run_start, mut run_end) = (first, first + 1);
        for t in iter {
            if t == run_end {
                run_end += 1;
            } else {
                merged.push(TimeInterval::new(run_start as f64, run_end as f64));
                run_start = t;
                run_end = t + 1;
            }
        }
        merged.push(TimeInterval::new(run_start as f64, run_end as f64));

        merged
    }

    /// Sorts intervals and coalesces overlapping or touching ones.
    ///
    /// Empty intervals (length below [`EPS`]) are dropped.
    pub fn merge_time_intervals(mut intervals: Vec<TimeInterval>) -> Vec<TimeInterval> {
        intervals.retain(|i| i.length() > EPS);
        intervals.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start <= last.end + EPS => {
                    last.end = last.end.max(interval.end);
                }
                _ => merged.push(interval),
            }
        }

        merged
    }

    /// Total length of a sequence of intervals.
    pub fn total_length(intervals: &[TimeInterval]) -> f64 {
        intervals.iter().map(TimeInterval::length).sum()
    }
}
