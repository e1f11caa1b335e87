//! Cycle timing: when the next cycle starts and how long to sleep until then.

use chrono::{DateTime, DurationRound, SubsecRound, TimeDelta, Utc};
use std::time::Duration;

/// Target start of the cycle after one that started at `started`.
///
/// With `align_to_minute`, a target that falls inside a minute is pushed to
/// the start of the following minute. Sub-second remainders are dropped first,
/// so a cycle woken just after its aligned target keeps the same cadence.
pub fn next_cycle_start(
    started: DateTime<Utc>,
    interval: Duration,
    align_to_minute: bool,
) -> DateTime<Utc> {
    let target = TimeDelta::from_std(interval)
        .ok()
        .and_then(|d| started.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    if !align_to_minute {
        return target;
    }
    let target = target.trunc_subsecs(0);
    match target.duration_trunc(TimeDelta::minutes(1)) {
        Ok(floor) if floor == target => target,
        Ok(floor) => floor + TimeDelta::minutes(1),
        Err(_) => target,
    }
}

/// Time remaining until `next_start`, never negative.
pub fn sleep_for(next_start: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (next_start - now).to_std().unwrap_or(Duration::ZERO)
}
