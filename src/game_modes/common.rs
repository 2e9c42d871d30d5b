//! Cadence control shared by the tick loop.

use std::time::Duration;

/// How long to sleep after a tick that took `elapsed` out of an `interval` budget.
///
/// - A tick that finished early sleeps for the rest of the budget, never more than
///   one full interval.
/// - A tick that used up (or overran) the budget sleeps half an interval. Missed time
///   is not caught up, so a slow terminal makes the game slower rather than jerky.
pub fn cadence_sleep(interval: Duration, elapsed: Duration) -> Duration {
    match interval.checked_sub(elapsed) {
        Some(remaining) if !remaining.is_zero() => remaining.min(interval),
        _ => interval / 2,
    }
}
