//! Raw-row normalization with per-row diagnostics.
//!
//! Rows are processed one at a time: a row that fails to parse is recorded in
//! the batch's [`ValidationReport`] and the batch continues. Partial failure
//! is expected — the source spreadsheets are hand-maintained — so a dirty row
//! must never abort the load. Structural problems (a required column missing
//! from the header entirely) are a different failure class and abort the
//! affected dataset's load with a [`SchemaError`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::CategoryMap;
use crate::cell::CellValue;
use crate::interval::Interval;
use crate::record::{ServiceRecord, ShiftRecord};
use crate::timeparse::{DateOrder, ParseFailure, parse_date, parse_time};

/// A raw row as supplied by the data source: column name → untyped cell.
pub type RawRow = BTreeMap<String, CellValue>;

/// Which of the two datasets a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Shifts,
    Services,
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Shifts => f.write_str("shifts"),
            Self::Services => f.write_str("services"),
        }
    }
}

/// Vehicle label used when the vehicle cell is blank.
pub const UNKNOWN_VEHICLE: &str = "Sconosciuto";

/// Column names for the shifts dataset.
///
/// The date column may point at the same column as the start time: the source
/// sheet stores full start/end datetimes, and the date parser reduces a
/// datetime cell to its date part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftColumns {
    pub date: String,
    pub start: String,
    pub end: String,
    pub category: String,
}

impl Default for ShiftColumns {
    fn default() -> Self {
        Self {
            date: "Inizio".to_string(),
            start: "Inizio".to_string(),
            end: "Fine".to_string(),
            category: "Categoria".to_string(),
        }
    }
}

impl ShiftColumns {
    /// The columns that must exist in the header, deduplicated.
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        let mut columns = vec![
            self.date.as_str(),
            self.start.as_str(),
            self.end.as_str(),
            self.category.as_str(),
        ];
        columns.sort_unstable();
        columns.dedup();
        columns
    }
}

/// Column names for the services dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceColumns {
    pub date: String,
    pub departure: String,
    pub arrival: String,
    pub distance: String,
    pub vehicle: String,
    pub intervention: String,
}

impl Default for ServiceColumns {
    fn default() -> Self {
        Self {
            date: "GG".to_string(),
            departure: "[P]Ore".to_string(),
            arrival: "[A]Ore".to_string(),
            distance: "Km effet.".to_string(),
            vehicle: "Mezzo".to_string(),
            intervention: "Intervento".to_string(),
        }
    }
}

impl ServiceColumns {
    /// The columns that must exist in the header, deduplicated.
    ///
    /// Distance and vehicle are not required: rows without them still
    /// normalize (absent distance, unknown vehicle).
    #[must_use]
    pub fn required(&self) -> Vec<&str> {
        let mut columns = vec![
            self.date.as_str(),
            self.departure.as_str(),
            self.arrival.as_str(),
            self.intervention.as_str(),
        ];
        columns.sort_unstable();
        columns.dedup();
        columns
    }
}

/// A required column is absent from the dataset header.
///
/// This indicates a structural mismatch with the source, not dirty data, and
/// halts the affected dataset's load. Row-level problems are reported through
/// [`RowDiagnostic`] instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{dataset} dataset is missing required column(s): {}", .columns.join(", "))]
pub struct SchemaError {
    pub dataset: DatasetKind,
    pub columns: Vec<String>,
}

/// Verifies that every required column is present in the header.
pub fn check_columns(
    dataset: DatasetKind,
    header: &[String],
    required: &[&str],
) -> Result<(), SchemaError> {
    let missing: Vec<String> = required
        .iter()
        .filter(|column| !header.iter().any(|h| h == *column))
        .map(|column| (*column).to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError {
            dataset,
            columns: missing,
        })
    }
}

/// Why a row was excluded from the canonical set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("missing date")]
    MissingDate,

    #[error("unparseable date: {0}")]
    BadDate(ParseFailure),

    #[error("unparseable start time: {0}")]
    BadStart(ParseFailure),

    #[error("unparseable end time: {0}")]
    BadEnd(ParseFailure),

    /// Start and end times are identical: a zero-hour and a 24-hour reading
    /// are indistinguishable, so the rollover correction cannot be applied.
    #[error("start equals end, overnight rollover is ambiguous")]
    AmbiguousRollover,
}

impl InvalidReason {
    /// Stable key used for per-reason counting.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingDate => "missing_date",
            Self::BadDate(_) => "bad_date",
            Self::BadStart(_) => "bad_start",
            Self::BadEnd(_) => "bad_end",
            Self::AmbiguousRollover => "ambiguous_rollover",
        }
    }
}

/// One rejected row: where it was and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowDiagnostic {
    /// Zero-based index of the row in the source order.
    pub row_index: usize,
    /// The column that caused the rejection.
    pub column: String,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: InvalidReason,
}

fn serialize_reason<S: serde::Serializer>(
    reason: &InvalidReason,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&reason.to_string())
}

/// Accumulated row-level findings for one dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<RowDiagnostic>,
    /// Rejection counts keyed by [`InvalidReason::kind`].
    pub counts: BTreeMap<&'static str, usize>,
}

impl ValidationReport {
    fn record(&mut self, row_index: usize, column: String, reason: InvalidReason) {
        tracing::debug!(row_index, %column, %reason, "row rejected");
        *self.counts.entry(reason.kind()).or_insert(0) += 1;
        self.diagnostics.push(RowDiagnostic {
            row_index,
            column,
            reason,
        });
    }

    /// Total number of rejected rows.
    #[must_use]
    pub fn invalid_rows(&self) -> usize {
        self.diagnostics.len()
    }

    /// Whether every row normalized cleanly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// A normalized batch: the canonical records plus the rows that failed.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub records: Vec<T>,
    pub report: ValidationReport,
}

// Manual impl: the derive would needlessly require `T: Default`.
impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            report: ValidationReport::default(),
        }
    }
}

static MISSING_CELL: CellValue = CellValue::Missing;

fn cell<'a>(row: &'a RawRow, column: &str) -> &'a CellValue {
    row.get(column).unwrap_or(&MISSING_CELL)
}

type RowFailure = (String, InvalidReason);

fn row_date(
    row: &RawRow,
    column: &str,
    order: DateOrder,
) -> Result<chrono::NaiveDate, RowFailure> {
    match parse_date(cell(row, column), order) {
        Ok(date) => Ok(date),
        Err(ParseFailure::Missing) => Err((column.to_string(), InvalidReason::MissingDate)),
        Err(failure) => Err((column.to_string(), InvalidReason::BadDate(failure))),
    }
}

fn shift_from_row(
    row: &RawRow,
    columns: &ShiftColumns,
    categories: &CategoryMap,
    order: DateOrder,
) -> Result<ShiftRecord, RowFailure> {
    let date = row_date(row, &columns.date, order)?;
    let start = parse_time(cell(row, &columns.start))
        .map_err(|f| (columns.start.clone(), InvalidReason::BadStart(f)))?;
    let end = parse_time(cell(row, &columns.end))
        .map_err(|f| (columns.end.clone(), InvalidReason::BadEnd(f)))?;
    if start == end {
        return Err((columns.end.clone(), InvalidReason::AmbiguousRollover));
    }

    let interval = Interval::build(date, start, end);
    let category_raw = cell(row, &columns.category)
        .display_text()
        .unwrap_or_default();
    let category = categories.resolve(&category_raw);

    Ok(ShiftRecord {
        date,
        start: interval.start,
        end: interval.end,
        category_raw,
        category,
    })
}

fn service_from_row(
    row: &RawRow,
    columns: &ServiceColumns,
    categories: &CategoryMap,
    order: DateOrder,
) -> Result<ServiceRecord, RowFailure> {
    let date = row_date(row, &columns.date, order)?;
    let departure = parse_time(cell(row, &columns.departure))
        .map_err(|f| (columns.departure.clone(), InvalidReason::BadStart(f)))?;
    let arrival = parse_time(cell(row, &columns.arrival))
        .map_err(|f| (columns.arrival.clone(), InvalidReason::BadEnd(f)))?;
    if departure == arrival {
        return Err((columns.arrival.clone(), InvalidReason::AmbiguousRollover));
    }

    let interval = Interval::build(date, departure, arrival);

    let distance_km = match cell(row, &columns.distance).as_number() {
        Some(km) if km >= 0.0 => Some(km),
        Some(km) => {
            tracing::warn!(km, "negative distance treated as absent");
            None
        }
        None => None,
    };

    let vehicle = cell(row, &columns.vehicle)
        .display_text()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN_VEHICLE.to_string());

    let intervention_raw = cell(row, &columns.intervention)
        .display_text()
        .unwrap_or_default();
    let category = categories.resolve(&intervention_raw);

    Ok(ServiceRecord {
        date,
        departure: interval.start,
        arrival: interval.end,
        distance_km,
        vehicle,
        intervention_raw,
        category,
    })
}

/// Normalizes a batch of raw shift rows.
///
/// Never aborts: rows that fail land in the report and the rest of the batch
/// is processed.
#[must_use]
pub fn normalize_shifts(
    rows: &[RawRow],
    columns: &ShiftColumns,
    categories: &CategoryMap,
    order: DateOrder,
) -> Normalized<ShiftRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut report = ValidationReport::default();

    for (index, row) in rows.iter().enumerate() {
        match shift_from_row(row, columns, categories, order) {
            Ok(record) => records.push(record),
            Err((column, reason)) => report.record(index, column, reason),
        }
    }

    tracing::debug!(
        accepted = records.len(),
        rejected = report.invalid_rows(),
        "normalized shift batch"
    );
    Normalized { records, report }
}

/// Normalizes a batch of raw service rows.
///
/// Missing distance or vehicle cells do not reject a row; only dates and the
/// departure/arrival pair are load-bearing.
#[must_use]
pub fn normalize_services(
    rows: &[RawRow],
    columns: &ServiceColumns,
    categories: &CategoryMap,
    order: DateOrder,
) -> Normalized<ServiceRecord> {
    let mut records = Vec::with_capacity(rows.len());
    let mut report = ValidationReport::default();

    for (index, row) in rows.iter().enumerate() {
        match service_from_row(row, columns, categories, order) {
            Ok(record) => records.push(record),
            Err((column, reason)) => report.record(index, column, reason),
        }
    }

    tracing::debug!(
        accepted = records.len(),
        rejected = report.invalid_rows(),
        "normalized service batch"
    );
    Normalized { records, report }
}
