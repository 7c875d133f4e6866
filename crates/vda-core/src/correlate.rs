//! Daily shift/service correlation and time-of-day coverage matching.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::record::{DateRange, ServiceRecord, ShiftRecord};

/// Spans beyond this many days make the daily correlation statistically
/// weak. The threshold is advisory: the engine computes regardless and sets
/// [`CorrelationReport::reliable`]; callers decide whether to display.
pub const MAX_RELIABLE_SPAN_DAYS: i64 = 31;

/// One calendar day's shift/service join.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyJoin {
    pub date: NaiveDate,
    pub shift_count: usize,
    pub service_count: usize,
    /// `service_count / shift_count`; NaN when no shifts that day — never
    /// coerced to zero or infinity.
    pub ratio: f64,
}

/// Correlation output for one date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// One entry per date present in either record set, in date order.
    pub days: Vec<DailyJoin>,
    /// Services whose departure falls inside a same-weekday shift window.
    pub matched_services: usize,
    pub total_services: usize,
    /// `matched / total × 100`; 0 when there are no services at all (a
    /// summary number the caller always expects, unlike the per-day ratio).
    pub coverage_pct: f64,
    pub span_days: i64,
    /// Advisory flag, false when the span exceeds
    /// [`MAX_RELIABLE_SPAN_DAYS`].
    pub reliable: bool,
}

/// Whether `t` falls inside the `[start, end]` time-of-day window.
/// Windows with `end < start` wrap midnight.
fn window_contains(start: NaiveTime, end: NaiveTime, t: NaiveTime) -> bool {
    if end < start {
        t >= start || t <= end
    } else {
        t >= start && t <= end
    }
}

#[allow(clippy::cast_precision_loss)]
fn build_days(shifts: &[&ShiftRecord], services: &[&ServiceRecord]) -> Vec<DailyJoin> {
    let mut by_date: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for shift in shifts {
        by_date.entry(shift.date).or_insert((0, 0)).0 += 1;
    }
    for service in services {
        by_date.entry(service.date).or_insert((0, 0)).1 += 1;
    }

    by_date
        .into_iter()
        .map(|(date, (shift_count, service_count))| {
            let ratio = if shift_count == 0 {
                f64::NAN
            } else {
                service_count as f64 / shift_count as f64
            };
            DailyJoin {
                date,
                shift_count,
                service_count,
                ratio,
            }
        })
        .collect()
}

/// Counts services whose departure time-of-day falls inside the window of
/// any shift on a matching weekday. A service needs only one containing
/// shift; the first match by iteration order wins.
fn count_covered(shifts: &[&ShiftRecord], services: &[&ServiceRecord]) -> usize {
    let mut windows_by_weekday: [Vec<(NaiveTime, NaiveTime)>; 7] = Default::default();
    for shift in shifts {
        let weekday = shift.date.weekday().num_days_from_monday() as usize;
        windows_by_weekday[weekday].push((shift.start_time(), shift.end_time()));
    }

    services
        .iter()
        .filter(|service| {
            let weekday = service.date.weekday().num_days_from_monday() as usize;
            let departure = service.departure_time();
            windows_by_weekday[weekday]
                .iter()
                .any(|(start, end)| window_contains(*start, *end, departure))
        })
        .count()
}

/// Joins shifts and services day by day over `range` and computes the
/// departure-coverage percentage.
///
/// Both inputs are expected to be already filtered to `range`; records
/// outside it are ignored for the daily join. All canonical services carry a
/// valid departure (rows without one were rejected at normalization), so the
/// coverage denominator is simply the service count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn correlate(
    shifts: &[ShiftRecord],
    services: &[ServiceRecord],
    range: &DateRange,
) -> CorrelationReport {
    let in_range_shifts: Vec<&ShiftRecord> =
        shifts.iter().filter(|s| range.contains(s.date)).collect();
    let in_range_services: Vec<&ServiceRecord> =
        services.iter().filter(|s| range.contains(s.date)).collect();

    let days = build_days(&in_range_shifts, &in_range_services);
    let matched_services = count_covered(&in_range_shifts, &in_range_services);
    let total_services = in_range_services.len();
    let coverage_pct = if total_services == 0 {
        0.0
    } else {
        matched_services as f64 / total_services as f64 * 100.0
    };

    let span_days = range.span_days();
    let reliable = span_days <= MAX_RELIABLE_SPAN_DAYS;
    if !reliable {
        tracing::debug!(span_days, "correlation span exceeds reliable window");
    }

    CorrelationReport {
        days,
        matched_services,
        total_services,
        coverage_pct,
        span_days,
        reliable,
    }
}
