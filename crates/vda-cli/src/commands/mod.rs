//! CLI subcommands.

pub mod correlate;
pub mod report;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use vda_core::{
    DatasetKind, DateRange, Normalized, ServiceRecord, ShiftRecord, check_columns, default_range,
    normalize_services, normalize_shifts,
};

use crate::cli::{Selection, Sources};
use crate::config::Config;
use crate::loader::{self, LoadError};

/// Both datasets, loaded and normalized.
///
/// Each side fails independently: a structural problem in one CSV must not
/// prevent the other dataset's numbers from rendering.
pub(crate) struct Datasets {
    pub shifts: Result<Normalized<ShiftRecord>, LoadError>,
    pub services: Result<Normalized<ServiceRecord>, LoadError>,
}

pub(crate) fn load_datasets(config: &Config, sources: &Sources) -> Datasets {
    let shifts_path = sources
        .shifts
        .clone()
        .unwrap_or_else(|| config.shifts_csv.clone());
    let services_path = sources
        .services
        .clone()
        .unwrap_or_else(|| config.services_csv.clone());

    Datasets {
        shifts: load_shifts(&shifts_path, config),
        services: load_services(&services_path, config),
    }
}

fn load_shifts(path: &Path, config: &Config) -> Result<Normalized<ShiftRecord>, LoadError> {
    let table = loader::load_table(path)?;
    check_columns(
        DatasetKind::Shifts,
        &table.header,
        &config.shift_columns.required(),
    )?;
    Ok(normalize_shifts(
        &table.rows,
        &config.shift_columns,
        &config.categories,
        config.date_order,
    ))
}

fn load_services(path: &Path, config: &Config) -> Result<Normalized<ServiceRecord>, LoadError> {
    let table = loader::load_table(path)?;
    check_columns(
        DatasetKind::Services,
        &table.header,
        &config.service_columns.required(),
    )?;
    Ok(normalize_services(
        &table.rows,
        &config.service_columns,
        &config.categories,
        config.date_order,
    ))
}

/// Resolves the query range: explicit `--from`/`--to` win, the datasets'
/// common span fills whichever bound is missing.
pub(crate) fn resolve_range(
    selection: &Selection,
    shifts: &[ShiftRecord],
    services: &[ServiceRecord],
) -> Result<DateRange> {
    let fallback = default_range(shifts, services);

    let start = selection.from.or_else(|| fallback.map(|r| r.start)).context(
        "no overlapping records to derive a date range from; pass --from and --to explicitly",
    )?;
    let end = selection.to.or_else(|| fallback.map(|r| r.end)).context(
        "no overlapping records to derive a date range from; pass --from and --to explicitly",
    )?;

    let range = DateRange::new(start, end)?;
    tracing::debug!(start = %range.start, end = %range.end, "resolved date range");
    Ok(range)
}
