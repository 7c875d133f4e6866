//! Canonical records, date ranges, and record selection.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use thiserror::Error;

/// A normalized shift record.
///
/// `end >= start` by construction (overnight rollover applied during
/// normalization), so the duration is never negative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftRecord {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub category_raw: String,
    pub category: String,
}

impl ShiftRecord {
    /// Shift length in fractional hours, `>= 0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }

    /// Time of day the shift starts.
    #[must_use]
    pub fn start_time(&self) -> NaiveTime {
        self.start.time()
    }

    /// Time of day the shift ends (possibly past midnight).
    #[must_use]
    pub fn end_time(&self) -> NaiveTime {
        self.end.time()
    }
}

/// A normalized service (dispatch) record.
///
/// Same rollover invariant as [`ShiftRecord`], applied to arrival vs
/// departure. A missing or unparseable distance is `None`, never NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceRecord {
    pub date: NaiveDate,
    pub departure: NaiveDateTime,
    pub arrival: NaiveDateTime,
    pub distance_km: Option<f64>,
    pub vehicle: String,
    pub intervention_raw: String,
    pub category: String,
}

impl ServiceRecord {
    /// Service length in minutes, `>= 0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> f64 {
        (self.arrival - self.departure).num_seconds() as f64 / 60.0
    }

    /// Time of day the vehicle departed.
    #[must_use]
    pub fn departure_time(&self) -> NaiveTime {
        self.departure.time()
    }
}

/// An invalid caller-supplied date range.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// Start date after end date.
    #[error("inverted date range: {start} is after {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
}

/// An inclusive calendar date range.
///
/// `start <= end` is enforced at construction, so [`span_days`](Self::span_days)
/// is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting inverted bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered, inclusive on both ends. Always `>= 1`.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Whether `date` falls inside the range.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// The widest range covered by both datasets: latest first date to earliest
/// last date. `None` when either set is empty or the spans do not intersect.
///
/// This is the default window the original dashboard opens with.
#[must_use]
pub fn default_range(shifts: &[ShiftRecord], services: &[ServiceRecord]) -> Option<DateRange> {
    let shift_min = shifts.iter().map(|s| s.date).min()?;
    let shift_max = shifts.iter().map(|s| s.date).max()?;
    let service_min = services.iter().map(|s| s.date).min()?;
    let service_max = services.iter().map(|s| s.date).max()?;

    DateRange::new(shift_min.max(service_min), shift_max.min(service_max)).ok()
}

/// Optional inclusion filters applied after normalization.
///
/// `None` means "no filtering" for that dimension; an empty set matches
/// nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub categories: Option<BTreeSet<String>>,
    pub vehicles: Option<BTreeSet<String>>,
}

impl Filters {
    /// Builds filters from plain lists, treating empty lists as "no filter".
    #[must_use]
    pub fn from_lists(categories: &[String], vehicles: &[String]) -> Self {
        let to_set = |items: &[String]| {
            if items.is_empty() {
                None
            } else {
                Some(items.iter().cloned().collect())
            }
        };
        Self {
            categories: to_set(categories),
            vehicles: to_set(vehicles),
        }
    }

    fn matches_category(&self, category: &str) -> bool {
        self.categories
            .as_ref()
            .is_none_or(|set| set.contains(category))
    }

    fn matches_vehicle(&self, vehicle: &str) -> bool {
        self.vehicles
            .as_ref()
            .is_none_or(|set| set.contains(vehicle))
    }
}

/// Selects the shifts inside `range` that pass the category filter.
#[must_use]
pub fn select_shifts(
    records: &[ShiftRecord],
    range: &DateRange,
    filters: &Filters,
) -> Vec<ShiftRecord> {
    records
        .iter()
        .filter(|s| range.contains(s.date) && filters.matches_category(&s.category))
        .cloned()
        .collect()
}

/// Selects the services inside `range` that pass the category and vehicle
/// filters.
#[must_use]
pub fn select_services(
    records: &[ServiceRecord],
    range: &DateRange,
    filters: &Filters,
) -> Vec<ServiceRecord> {
    records
        .iter()
        .filter(|s| {
            range.contains(s.date)
                && filters.matches_category(&s.category)
                && filters.matches_vehicle(&s.vehicle)
        })
        .cloned()
        .collect()
}
