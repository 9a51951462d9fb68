//! Layout of per-slot allocations as concrete execution intervals.
//!
//! McNaughton's wrap-around rule: allocations are laid end to end inside a
//! window of width `w`, wrapping back to the window start whenever the
//! cursor reaches `w`. With every allocation at most `w` and their sum at
//! most `m · w`, no job overlaps itself and no point is covered by more than
//! `m` jobs.
//!
//! # Reference
//! McNaughton (1959), "Scheduling with deadlines and loss functions"

use crate::models::TimeInterval;
use crate::EPS;

/// Appends the pieces of each `(job index, amount)` allocation to `pieces`.
///
/// Allocations larger than the window are clamped to its width.
pub(crate) fn wrap_around<I>(window: TimeInterval, allocations: I, pieces: &mut [Vec<TimeInterval>])
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let width = window.length();
    if width <= EPS {
        return;
    }

    let mut cursor = 0.0;
    for (job, amount) in allocations {
        let amount = amount.min(width);
        if amount <= EPS {
            continue;
        }

        let end = cursor + amount;
        if end <= width + EPS {
            pieces[job].push(TimeInterval::new(
                window.start + cursor,
                window.start + end.min(width),
            ));
            cursor = if end >= width - EPS { 0.0 } else { end };
        } else {
            let rest = end - width;
            pieces[job].push(TimeInterval::new(window.start + cursor, window.end));
            pieces[job].push(TimeInterval::new(window.start, window.start + rest));
            cursor = rest;
        }
    }
}
