//! Core domain logic for shift & dispatch analytics.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: repairing heterogeneous raw timestamp/category cells
//!   into canonical shift and service records, with per-row diagnostics
//! - Metrics: aggregate KPIs over a filtered canonical record set
//! - Correlation: daily shift/service joins and time-of-day coverage
//!
//! Everything is a pure, synchronous transform of in-memory data: no I/O,
//! no caching, no shared state. Loading rows from their source and rendering
//! the computed numbers are the caller's concern.

pub mod category;
pub mod cell;
pub mod correlate;
pub mod interval;
pub mod metrics;
pub mod normalize;
pub mod record;
pub mod timeparse;

pub use category::{CategoryMap, FALLBACK_LABEL, extract_tag};
pub use cell::CellValue;
pub use correlate::{CorrelationReport, DailyJoin, MAX_RELIABLE_SPAN_DAYS, correlate};
pub use interval::Interval;
pub use metrics::{
    CategoryCount, CategoryHours, MetricsError, Partition, ServiceKpis, ShiftKpis, WeekdayCount,
    partition, service_category_counts, service_kpis, shift_category_hours, shift_kpis,
    weekday_distribution,
};
pub use normalize::{
    DatasetKind, InvalidReason, Normalized, RawRow, RowDiagnostic, SchemaError, ServiceColumns,
    ShiftColumns, ValidationReport, check_columns, normalize_services, normalize_shifts,
};
pub use record::{
    DateRange, Filters, RangeError, ServiceRecord, ShiftRecord, default_range, select_services,
    select_shifts,
};
pub use timeparse::{DateOrder, ParseFailure, parse_date, parse_time};
