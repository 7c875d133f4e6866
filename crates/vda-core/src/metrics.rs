//! Aggregate KPI computation over canonical, already-filtered records.
//!
//! Every function here is a pure fold over its input slice. Means over an
//! empty set are `None` ("no data"), never NaN and never a division panic;
//! per-day means require a span of at least one day.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use thiserror::Error;

use crate::record::{ServiceRecord, ShiftRecord};

/// Canonical week order for distribution tables.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Errors for aggregate computations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    /// Per-day means need a positive span; a zero or negative span is a
    /// caller bug, not a divide-by-zero to paper over.
    #[error("per-day means require a span of at least one day, got {0}")]
    InvalidSpan(i64),
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: f64, count: usize) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(total / count as f64)
    }
}

#[allow(clippy::cast_precision_loss)]
fn per_day(count: usize, span_days: i64) -> f64 {
    count as f64 / span_days as f64
}

/// KPI scalars for a filtered shift set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftKpis {
    pub count: usize,
    pub hours_total: f64,
    /// `None` when the filtered set is empty.
    pub hours_mean: Option<f64>,
    pub per_day_mean: f64,
}

/// Computes shift KPIs over `span_days` calendar days.
pub fn shift_kpis(records: &[ShiftRecord], span_days: i64) -> Result<ShiftKpis, MetricsError> {
    if span_days < 1 {
        return Err(MetricsError::InvalidSpan(span_days));
    }

    let hours_total: f64 = records.iter().map(ShiftRecord::duration_hours).sum();
    Ok(ShiftKpis {
        count: records.len(),
        hours_total,
        hours_mean: mean(hours_total, records.len()),
        per_day_mean: per_day(records.len(), span_days),
    })
}

/// KPI scalars for a filtered service set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceKpis {
    pub count: usize,
    pub km_total: f64,
    /// Mean over the services that carry a distance; `None` when none do.
    pub km_mean: Option<f64>,
    /// How many services carried a usable distance.
    pub with_distance: usize,
    /// `None` when the filtered set is empty.
    pub duration_minutes_mean: Option<f64>,
    pub per_day_mean: f64,
}

/// Computes service KPIs over `span_days` calendar days.
///
/// Absent distances are skipped, not treated as zero: `km_mean` divides by
/// the number of services that actually carried one.
pub fn service_kpis(records: &[ServiceRecord], span_days: i64) -> Result<ServiceKpis, MetricsError> {
    if span_days < 1 {
        return Err(MetricsError::InvalidSpan(span_days));
    }

    let distances: Vec<f64> = records.iter().filter_map(|s| s.distance_km).collect();
    let km_total: f64 = distances.iter().sum();
    let minutes_total: f64 = records.iter().map(ServiceRecord::duration_minutes).sum();

    Ok(ServiceKpis {
        count: records.len(),
        km_total,
        km_mean: mean(km_total, distances.len()),
        with_distance: distances.len(),
        duration_minutes_mean: mean(minutes_total, records.len()),
        per_day_mean: per_day(records.len(), span_days),
    })
}

/// One row of the shift category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryHours {
    pub category: String,
    pub count: usize,
    pub hours: f64,
}

/// Groups shifts by category, summing hours, sorted descending by hours.
#[must_use]
pub fn shift_category_hours(records: &[ShiftRecord]) -> Vec<CategoryHours> {
    let mut by_category: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = by_category.entry(&record.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.duration_hours();
    }

    let mut rows: Vec<CategoryHours> = by_category
        .into_iter()
        .map(|(category, (count, hours))| CategoryHours {
            category: category.to_string(),
            count,
            hours,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.hours
            .total_cmp(&a.hours)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// One row of the service category breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
    pub km: f64,
}

/// Groups services by category, counting and summing km, sorted descending
/// by count.
#[must_use]
pub fn service_category_counts(records: &[ServiceRecord]) -> Vec<CategoryCount> {
    let mut by_category: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = by_category.entry(&record.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.distance_km.unwrap_or(0.0);
    }

    let mut rows: Vec<CategoryCount> = by_category
        .into_iter()
        .map(|(category, (count, km))| CategoryCount {
            category: category.to_string(),
            count,
            km,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// One weekday's entry in the distribution table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    pub weekday: &'static str,
    pub count: usize,
}

/// Counts dates per weekday in canonical week order (Monday..Sunday).
///
/// Always exactly 7 entries; weekdays with no records are zero-filled, never
/// omitted. The counts sum to the number of input dates.
#[must_use]
pub fn weekday_distribution(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<WeekdayCount> {
    let mut counts = [0usize; 7];
    for date in dates {
        counts[date.weekday().num_days_from_monday() as usize] += 1;
    }

    WEEKDAY_NAMES
        .into_iter()
        .zip(counts)
        .map(|(weekday, count)| WeekdayCount { weekday, count })
        .collect()
}

/// Sizes of a predicate split over a record set.
///
/// `matching + rest` always equals the input count: every record lands in
/// exactly one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub matching: usize,
    pub rest: usize,
}

impl Partition {
    /// Total number of records partitioned.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.matching + self.rest
    }
}

/// Splits a record set by a predicate, reporting both partition sizes.
pub fn partition<T>(records: &[T], predicate: impl Fn(&T) -> bool) -> Partition {
    let matching = records.iter().filter(|record| predicate(record)).count();
    Partition {
        matching,
        rest: records.len() - matching,
    }
}
