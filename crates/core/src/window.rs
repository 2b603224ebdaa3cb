//! Default validity window for a renewal.

use time::{Date, Duration};

use crate::model::Agreement;

/// Period length used when the source window is missing or degenerate.
pub const DEFAULT_DURATION_DAYS: i64 = 365;

/// Suggest `(start, end)` for the renewal of `source`.
///
/// The new period follows the old one, keeps its length, and never starts
/// before `today`.
pub fn suggest_window(source: &Agreement, today: Date) -> (Date, Date) {
    suggest_window_from(source.validity_start, source.validity_end, today)
}

/// [`suggest_window`] over bare dates.
pub fn suggest_window_from(
    validity_start: Option<Date>,
    validity_end: Option<Date>,
    today: Date,
) -> (Date, Date) {
    let default_duration = Duration::days(DEFAULT_DURATION_DAYS);

    let duration = match (validity_start, validity_end) {
        (Some(start), Some(end)) if end - start > Duration::ZERO => end - start,
        _ => default_duration,
    };

    let candidate = match (validity_start, validity_end) {
        (_, Some(end)) => end.next_day().unwrap_or(end),
        (Some(start), None) => start.checked_add(default_duration).unwrap_or(Date::MAX),
        (None, None) => today,
    };

    let start = candidate.max(today);
    let end = start.checked_add(duration).unwrap_or(Date::MAX);
    (start, end)
}
