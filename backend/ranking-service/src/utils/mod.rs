// Utility functions for ranking-service

use chrono::{DateTime, Duration, Utc};

/// Whole hours elapsed from `from` to `to`, floored and clamped at zero.
pub fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_hours().max(0)
}

/// `now` minus `span`, or the earliest representable instant when the
/// subtraction overflows. `None` spans (out of range) are unbounded too.
pub fn window_start(now: DateTime<Utc>, span: Option<Duration>) -> DateTime<Utc> {
    span.and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Start of a window of `hours` ending at `now`. Negative windows are empty.
pub fn hours_window_start(now: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    window_start(now, Duration::try_hours(hours.max(0)))
}

/// Start of a window of `days` ending at `now`. Negative windows are empty.
pub fn days_window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    window_start(now, Duration::try_days(days.max(0)))
}

/// `exp(-elapsed / time_constant)`; 1.0 at zero elapsed.
pub fn exponential_decay(elapsed: f64, time_constant: f64) -> f64 {
    (-elapsed / time_constant).exp()
}
