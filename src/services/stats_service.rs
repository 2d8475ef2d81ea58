use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc};
use tracing::debug;

use crate::error::AppResult;
use crate::models::claim::{ApiUser, Category, Claim};
use crate::models::dashboard::{ActivationStats, CategoryCount, PerformanceStats};
use crate::utils::format::format_percentage;
use crate::utils::time::{is_between, parse_timestamp, sub_hours};

const MONTH_ABBREVS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Count records per calendar month, keyed `Jan..=now's month` in order.
/// Bucketing is by month-of-year position: a record from another year
/// still lands in this year's bucket for its month, and months past the
/// displayed window are dropped. Legacy consumers rely on both behaviors.
pub fn group_by_month<T>(
    records: &[T],
    date_of: impl Fn(&T) -> AppResult<&str>,
    now: DateTime<Utc>,
) -> AppResult<Vec<(&'static str, i64)>> {
    let labels = &MONTH_ABBREVS[..now.month() as usize];
    let mut counts = vec![0i64; labels.len()];
    let mut dropped = 0usize;

    for record in records {
        let instant = parse_timestamp(date_of(record)?)?;
        match counts.get_mut(instant.month0() as usize) {
            Some(slot) => *slot += 1,
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(
            target: "app::stats",
            dropped,
            "records dated past the current month were ignored"
        );
    }

    Ok(labels.iter().copied().zip(counts).collect())
}

/// `group_by_month` with each bucket replaced by the running total of all
/// buckets up to and including it.
pub fn cumulative_by_month<T>(
    records: &[T],
    date_of: impl Fn(&T) -> AppResult<&str>,
    now: DateTime<Utc>,
) -> AppResult<Vec<(&'static str, i64)>> {
    let mut series = group_by_month(records, date_of, now)?;

    let mut running = 0;
    for entry in &mut series {
        running += entry.1;
        entry.1 = running;
    }

    Ok(series)
}

/// Distinct assigned employees across the given claims, as a share of the
/// configured workforce. Claims without an assignee activate no one.
pub fn count_activated_employees(claims: &[Claim], total_employees: i64) -> ActivationStats {
    let distinct: HashSet<i64> = claims.iter().filter_map(|claim| claim.employee).collect();
    let number = distinct.len() as i64;

    ActivationStats {
        number,
        percentage: render_share(number, total_employees),
        total: total_employees,
    }
}

/// Distinct departments across the given users, as a share of the total
/// unit count. A non-positive total short-circuits to a degenerate result
/// mirroring the total itself; the legacy dashboard renders that branch
/// when the upstream department list is empty.
pub fn count_activated_units(users: &[ApiUser], total_units: i64) -> ActivationStats {
    if total_units <= 0 {
        return ActivationStats {
            number: total_units,
            percentage: format!("{total_units}%"),
            total: total_units,
        };
    }

    let distinct: HashSet<i64> = users.iter().filter_map(|user| user.department).collect();
    let number = distinct.len() as i64;

    ActivationStats {
        number,
        percentage: render_share(number, total_units),
        total: total_units,
    }
}

/// The category matched by the most claims, in category order, replacing
/// the leader only on a strictly greater count (first seen wins ties).
/// `None` when either list is empty or no claim matches any category.
pub fn most_occurred_category(claims: &[Claim], categories: &[Category]) -> Option<CategoryCount> {
    if claims.is_empty() || categories.is_empty() {
        return None;
    }

    let mut best: Option<CategoryCount> = None;
    for category in categories {
        let occurrences = claims
            .iter()
            .filter(|claim| claim.category == Some(category.id))
            .count() as i64;

        if occurrences > best.as_ref().map_or(0, |leader| leader.times) {
            best = Some(CategoryCount {
                category: category.clone(),
                times: occurrences,
            });
        }
    }

    best
}

/// Throughput over the trailing window `[now - hours_offset, now]`: closed
/// claims whose close date falls inside it against published claims whose
/// publish date does. With no closed claims at all the window is never
/// computed and the published count is reported raw and unfiltered, an
/// asymmetry the legacy tests encode. A window with zero published
/// matches reports "0%" rather than dividing.
pub fn best_performance_window(
    closed_claims: &[Claim],
    published_claims: &[Claim],
    hours_offset: i64,
    now: DateTime<Utc>,
) -> AppResult<PerformanceStats> {
    if closed_claims.is_empty() {
        return Ok(PerformanceStats {
            counted_closed_claims: 0,
            counted_published_claims: published_claims.len() as i64,
            percentage: "0%".to_string(),
            hours: hours_offset,
        });
    }

    let window_start = sub_hours(now, hours_offset);

    let mut counted_closed = 0i64;
    for claim in closed_claims {
        let closed_at = parse_timestamp(claim.close_date()?)?;
        if is_between(closed_at, window_start, now) {
            counted_closed += 1;
        }
    }

    let mut counted_published = 0i64;
    for claim in published_claims {
        let published_at = parse_timestamp(claim.publish_date()?)?;
        if is_between(published_at, window_start, now) {
            counted_published += 1;
        }
    }

    let percentage = if counted_published == 0 {
        "0%".to_string()
    } else {
        render_share(counted_closed, counted_published)
    };

    Ok(PerformanceStats {
        counted_closed_claims: counted_closed,
        counted_published_claims: counted_published,
        percentage,
        hours: hours_offset,
    })
}

/// The `limit` claims with the highest ids, descending. The sort is
/// stable; equal ids keep their input order.
pub fn last_claims_by_id(claims: &[Claim], limit: usize) -> Vec<Claim> {
    let mut sorted = claims.to_vec();
    sorted.sort_by(|a, b| b.id.cmp(&a.id));
    sorted.truncate(limit);
    sorted
}

fn render_share(number: i64, total: i64) -> String {
    format!(
        "{}%",
        format_percentage(number as f64 / total as f64 * 100.0)
    )
}
