//! Report command: KPIs, category breakdowns, and weekday distribution.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use anyhow::{Result, bail};
use serde::Serialize;
use vda_core::{
    CategoryCount, CategoryHours, DateRange, Filters, Partition, ServiceKpis, ShiftKpis,
    WeekdayCount, partition, select_services, select_shifts, service_category_counts,
    service_kpis, shift_category_hours, shift_kpis, weekday_distribution,
};

use super::{Datasets, load_datasets, resolve_range};
use crate::cli::Selection;
use crate::config::Config;

/// Everything the report renders, in both output modes.
#[derive(Debug, Serialize)]
pub struct ReportData {
    pub range: DateRange,
    pub span_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts: Option<ShiftSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ShiftSection {
    pub kpis: ShiftKpis,
    pub categories: Vec<CategoryHours>,
    pub invalid_rows: usize,
    pub invalid_counts: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Serialize)]
pub struct ServiceSection {
    pub kpis: ServiceKpis,
    pub categories: Vec<CategoryCount>,
    pub weekdays: Vec<WeekdayCount>,
    /// Emergency vs other services, per the configured category split.
    pub emergency: Partition,
    pub invalid_rows: usize,
    pub invalid_counts: BTreeMap<&'static str, usize>,
}

/// Runs the report command.
pub fn run(config: &Config, selection: &Selection, json: bool) -> Result<()> {
    let datasets = load_datasets(config, &selection.sources);
    let data = build(config, selection, datasets)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        print!("{}", render(&data));
    }
    Ok(())
}

fn build(config: &Config, selection: &Selection, datasets: Datasets) -> Result<ReportData> {
    let (shifts_norm, shifts_error) = match datasets.shifts {
        Ok(normalized) => (Some(normalized), None),
        Err(error) => (None, Some(error.to_string())),
    };
    let (services_norm, services_error) = match datasets.services {
        Ok(normalized) => (Some(normalized), None),
        Err(error) => (None, Some(error.to_string())),
    };

    if shifts_norm.is_none() && services_norm.is_none() {
        bail!(
            "both datasets failed to load: {}; {}",
            shifts_error.as_deref().unwrap_or("unknown"),
            services_error.as_deref().unwrap_or("unknown"),
        );
    }

    let filters = Filters::from_lists(&selection.categories, &selection.vehicles);
    let shift_records = shifts_norm
        .as_ref()
        .map_or(&[][..], |n| n.records.as_slice());
    let service_records = services_norm
        .as_ref()
        .map_or(&[][..], |n| n.records.as_slice());

    let range = resolve_range(selection, shift_records, service_records)?;
    let span_days = range.span_days();

    let shifts = match &shifts_norm {
        Some(normalized) => {
            let selected = select_shifts(&normalized.records, &range, &filters);
            Some(ShiftSection {
                kpis: shift_kpis(&selected, span_days)?,
                categories: shift_category_hours(&selected),
                invalid_rows: normalized.report.invalid_rows(),
                invalid_counts: normalized.report.counts.clone(),
            })
        }
        None => None,
    };

    let services = match &services_norm {
        Some(normalized) => {
            let selected = select_services(&normalized.records, &range, &filters);
            Some(ServiceSection {
                kpis: service_kpis(&selected, span_days)?,
                categories: service_category_counts(&selected),
                weekdays: weekday_distribution(selected.iter().map(|s| s.date)),
                emergency: partition(&selected, |s| {
                    config.emergency_categories.contains(&s.category)
                }),
                invalid_rows: normalized.report.invalid_rows(),
                invalid_counts: normalized.report.counts.clone(),
            })
        }
        None => None,
    };

    Ok(ReportData {
        range,
        span_days,
        shifts,
        shifts_error,
        services,
        services_error,
    })
}

fn fmt_mean(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn render(data: &ReportData) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "SHIFTS & SERVICES REPORT: {} \u{2192} {} ({} days)",
        data.range.start, data.range.end, data.span_days
    )
    .unwrap();

    writeln!(output).unwrap();
    writeln!(output, "SHIFT KPIS").unwrap();
    writeln!(output, "──────────").unwrap();
    if let Some(section) = &data.shifts {
        writeln!(output, "Shifts:           {}", section.kpis.count).unwrap();
        writeln!(output, "Hours total:      {:.1}", section.kpis.hours_total).unwrap();
        writeln!(
            output,
            "Hours per shift:  {}",
            fmt_mean(section.kpis.hours_mean)
        )
        .unwrap();
        writeln!(
            output,
            "Shifts per day:   {:.2}",
            section.kpis.per_day_mean
        )
        .unwrap();

        if !section.categories.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "HOURS BY CATEGORY").unwrap();
            for row in &section.categories {
                writeln!(
                    output,
                    "  {:<28}{:>8.1}h  ({})",
                    row.category, row.hours, row.count
                )
                .unwrap();
            }
        }
    } else if let Some(error) = &data.shifts_error {
        writeln!(output, "dataset unavailable: {error}").unwrap();
    }

    writeln!(output).unwrap();
    writeln!(output, "SERVICE KPIS").unwrap();
    writeln!(output, "────────────").unwrap();
    if let Some(section) = &data.services {
        writeln!(output, "Services:         {}", section.kpis.count).unwrap();
        writeln!(output, "Km total:         {:.1}", section.kpis.km_total).unwrap();
        writeln!(
            output,
            "Km per service:   {}  ({} with distance)",
            fmt_mean(section.kpis.km_mean),
            section.kpis.with_distance
        )
        .unwrap();
        writeln!(
            output,
            "Minutes per run:  {}",
            fmt_mean(section.kpis.duration_minutes_mean)
        )
        .unwrap();
        writeln!(
            output,
            "Services per day: {:.2}",
            section.kpis.per_day_mean
        )
        .unwrap();
        writeln!(
            output,
            "Emergency split:  {} emergency / {} other",
            section.emergency.matching, section.emergency.rest
        )
        .unwrap();

        if !section.categories.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "SERVICES BY CATEGORY").unwrap();
            for row in &section.categories {
                writeln!(
                    output,
                    "  {:<28}{:>5}  ({:.1} km)",
                    row.category, row.count, row.km
                )
                .unwrap();
            }
        }

        writeln!(output).unwrap();
        writeln!(output, "SERVICES BY WEEKDAY").unwrap();
        for row in &section.weekdays {
            writeln!(output, "  {:<11}{:>5}", row.weekday, row.count).unwrap();
        }
    } else if let Some(error) = &data.services_error {
        writeln!(output, "dataset unavailable: {error}").unwrap();
    }

    let shift_invalid = data.shifts.as_ref().map_or(0, |s| s.invalid_rows);
    let service_invalid = data.services.as_ref().map_or(0, |s| s.invalid_rows);
    if shift_invalid > 0 || service_invalid > 0 {
        writeln!(output).unwrap();
        writeln!(output, "DATA QUALITY").unwrap();
        if shift_invalid > 0 {
            writeln!(output, "  shifts: {shift_invalid} rows rejected").unwrap();
        }
        if service_invalid > 0 {
            writeln!(output, "  services: {service_invalid} rows rejected").unwrap();
        }
        writeln!(output, "  Hint: run 'vda validate' for details.").unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use vda_core::{Normalized, ServiceRecord, ShiftRecord};

    use crate::cli::{Selection, Sources};

    fn selection() -> Selection {
        Selection {
            from: None,
            to: None,
            categories: vec![],
            vehicles: vec![],
            sources: Sources {
                shifts: None,
                services: None,
            },
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn shift(d: NaiveDate) -> ShiftRecord {
        let start = d.and_hms_opt(8, 0, 0).unwrap();
        ShiftRecord {
            date: d,
            start,
            end: start + chrono::Duration::hours(6),
            category_raw: "[TS]".to_string(),
            category: "Soccorso ECHO".to_string(),
        }
    }

    fn service(d: NaiveDate) -> ServiceRecord {
        let departure = d.and_hms_opt(9, 0, 0).unwrap();
        ServiceRecord {
            date: d,
            departure,
            arrival: departure + chrono::Duration::minutes(45),
            distance_km: Some(12.0),
            vehicle: "ECHO 1".to_string(),
            intervention_raw: "[TS]".to_string(),
            category: "Soccorso ECHO".to_string(),
        }
    }

    fn datasets(shifts: Vec<ShiftRecord>, services: Vec<ServiceRecord>) -> Datasets {
        Datasets {
            shifts: Ok(Normalized {
                records: shifts,
                report: vda_core::ValidationReport::default(),
            }),
            services: Ok(Normalized {
                records: services,
                report: vda_core::ValidationReport::default(),
            }),
        }
    }

    #[test]
    fn report_builds_with_derived_range() {
        let config = Config::default();
        let data = build(
            &config,
            &selection(),
            datasets(
                vec![shift(date(2024, 1, 1)), shift(date(2024, 1, 5))],
                vec![service(date(2024, 1, 2)), service(date(2024, 1, 9))],
            ),
        )
        .unwrap();

        // Common span: latest first date to earliest last date.
        assert_eq!(data.range.start, date(2024, 1, 2));
        assert_eq!(data.range.end, date(2024, 1, 5));

        let shifts = data.shifts.unwrap();
        assert_eq!(shifts.kpis.count, 1); // only the Jan 5 shift is inside
        let services = data.services.unwrap();
        assert_eq!(services.kpis.count, 1); // the Jan 9 service is outside
        assert_eq!(services.emergency.matching, 1);
    }

    #[test]
    fn one_failed_dataset_still_reports_the_other() {
        let config = Config::default();
        let mut selection = selection();
        selection.from = Some(date(2024, 1, 1));
        selection.to = Some(date(2024, 1, 31));

        let datasets = Datasets {
            shifts: Err(crate::loader::LoadError::Schema(vda_core::SchemaError {
                dataset: vda_core::DatasetKind::Shifts,
                columns: vec!["Inizio".to_string()],
            })),
            services: Ok(Normalized {
                records: vec![service(date(2024, 1, 5))],
                report: vda_core::ValidationReport::default(),
            }),
        };

        let data = build(&config, &selection, datasets).unwrap();
        assert!(data.shifts.is_none());
        assert!(data.shifts_error.is_some());
        assert_eq!(data.services.unwrap().kpis.count, 1);
    }

    #[test]
    fn both_failed_datasets_is_fatal() {
        let config = Config::default();
        let io_error = |path: &str| crate::loader::LoadError::Io {
            path: path.into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };

        let datasets = Datasets {
            shifts: Err(io_error("turni.csv")),
            services: Err(io_error("servizi.csv")),
        };

        assert!(build(&config, &selection(), datasets).is_err());
    }

    #[test]
    fn inverted_explicit_range_is_rejected() {
        let config = Config::default();
        let mut selection = selection();
        selection.from = Some(date(2024, 2, 1));
        selection.to = Some(date(2024, 1, 1));

        let result = build(
            &config,
            &selection,
            datasets(vec![shift(date(2024, 1, 15))], vec![service(date(2024, 1, 15))]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn render_includes_all_sections() {
        let config = Config::default();
        let data = build(
            &config,
            &selection(),
            datasets(vec![shift(date(2024, 1, 1))], vec![service(date(2024, 1, 1))]),
        )
        .unwrap();

        let text = render(&data);
        assert!(text.contains("SHIFT KPIS"));
        assert!(text.contains("SERVICE KPIS"));
        assert!(text.contains("SERVICES BY WEEKDAY"));
        assert!(text.contains("Monday"));
        assert!(text.contains("Soccorso ECHO"));
    }

    #[test]
    fn empty_selection_renders_no_data_means() {
        let config = Config::default();
        let mut selection = selection();
        selection.from = Some(date(2025, 1, 1));
        selection.to = Some(date(2025, 1, 31));

        let data = build(
            &config,
            &selection,
            datasets(vec![shift(date(2024, 1, 1))], vec![service(date(2024, 1, 1))]),
        )
        .unwrap();

        let shifts = data.shifts.as_ref().unwrap();
        assert_eq!(shifts.kpis.count, 0);
        assert_eq!(shifts.kpis.hours_mean, None);

        let text = render(&data);
        assert!(text.contains("n/a"));
    }
}
