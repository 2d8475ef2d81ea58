use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

use crate::error::{AppError, AppResult};
use crate::models::dashboard::DurationBreakdown;

const FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";
const FORMAT_FRACTIONAL: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Shift an instant into the past by a whole number of hours. No clamping.
pub fn sub_hours(instant: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    instant - Duration::hours(hours)
}

/// Inclusive range test on both ends. An inverted range (start > end)
/// contains no instants.
pub fn is_between(instant: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start <= instant && instant <= end
}

/// Difference between two RFC 3339 instants (`Z` is read as `+00:00`).
/// The result may be negative; ordering is not validated.
pub fn delta(start: &str, end: &str) -> AppResult<Duration> {
    let start = parse_rfc3339(start)?;
    let end = parse_rfc3339(end)?;
    Ok(end - start)
}

/// Mean of the per-record `start..end` deltas. Accessors report missing
/// fields as `MissingField`; an empty slice is an error, and callers that
/// want a zero default go through `mean_delta_formatted`.
pub fn mean_delta<T>(
    records: &[T],
    start_of: impl Fn(&T) -> AppResult<&str>,
    end_of: impl Fn(&T) -> AppResult<&str>,
) -> AppResult<Duration> {
    if records.is_empty() {
        return Err(AppError::validation("无法对空列表计算平均时长"));
    }

    let mut total = Duration::zero();
    for record in records {
        total = total + delta(start_of(record)?, end_of(record)?)?;
    }

    Ok(total / records.len() as i32)
}

/// `mean_delta` rendered as whole days/hours/minutes; an empty slice
/// yields the zero breakdown instead of an error.
pub fn mean_delta_formatted<T>(
    records: &[T],
    start_of: impl Fn(&T) -> AppResult<&str>,
    end_of: impl Fn(&T) -> AppResult<&str>,
) -> AppResult<DurationBreakdown> {
    if records.is_empty() {
        return Ok(DurationBreakdown::default());
    }

    let mean = mean_delta(records, start_of, end_of)?;
    Ok(format_duration(mean))
}

/// Break a duration into whole days, hours and minutes, truncating the
/// remainder. Negative durations decompose with a negative day count and
/// non-negative hour/minute parts, matching the legacy presentation.
pub fn format_duration(duration: Duration) -> DurationBreakdown {
    let total_seconds = duration.num_seconds();
    let days = total_seconds.div_euclid(86_400);
    let remainder = total_seconds.rem_euclid(86_400);

    DurationBreakdown {
        days,
        hours: remainder / 3_600,
        minutes: remainder % 3_600 / 60,
    }
}

/// Parse one of the two timestamp shapes the upstream API emits:
/// `2023-08-03T12:34:56Z` or `2023-08-03T12:34:56.789Z`. Anything else
/// is an `InvalidDateFormat` error.
pub fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, FORMAT_SECONDS)
        .or_else(|_| NaiveDateTime::parse_from_str(value, FORMAT_FRACTIONAL))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| AppError::invalid_date_format(value))
}

fn parse_rfc3339(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| AppError::invalid_date_format(value))
}
