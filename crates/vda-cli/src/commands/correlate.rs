//! Correlate command: daily shift/service joins and departure coverage.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use vda_core::{CorrelationReport, Filters, MAX_RELIABLE_SPAN_DAYS, select_services, select_shifts};

use super::{load_datasets, resolve_range};
use crate::cli::Selection;
use crate::config::Config;

/// Runs the correlate command.
///
/// The 31-day threshold is enforced here, not in the engine: long spans are
/// skipped with a note unless `--force` is given, in which case the report
/// is computed and marked unreliable.
pub fn run(config: &Config, selection: &Selection, force: bool, json: bool) -> Result<()> {
    let datasets = load_datasets(config, &selection.sources);
    let shifts = datasets.shifts.context("shifts dataset failed to load")?;
    let services = datasets
        .services
        .context("services dataset failed to load")?;

    let range = resolve_range(selection, &shifts.records, &services.records)?;
    let span_days = range.span_days();
    if span_days > MAX_RELIABLE_SPAN_DAYS && !force {
        println!(
            "span of {span_days} days exceeds the {MAX_RELIABLE_SPAN_DAYS}-day reliable window; \
             narrow the range or pass --force"
        );
        return Ok(());
    }

    let filters = Filters::from_lists(&selection.categories, &selection.vehicles);
    let selected_shifts = select_shifts(&shifts.records, &range, &filters);
    let selected_services = select_services(&services.records, &range, &filters);

    let report = vda_core::correlate(&selected_shifts, &selected_services, &range);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render(&report, &range));
    }
    Ok(())
}

fn render(report: &CorrelationReport, range: &vda_core::DateRange) -> String {
    let mut output = String::new();

    writeln!(
        output,
        "DAILY SHIFTS / SERVICES: {} \u{2192} {} ({} days)",
        range.start, range.end, report.span_days
    )
    .unwrap();

    if !report.reliable {
        writeln!(
            output,
            "Note: span exceeds {MAX_RELIABLE_SPAN_DAYS} days; daily correlation is \
             statistically unreliable."
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    if report.days.is_empty() {
        writeln!(output, "No records in range.").unwrap();
        return output;
    }

    writeln!(output, "  date        shifts  services  ratio").unwrap();
    for day in &report.days {
        let ratio = if day.ratio.is_nan() {
            "   n/a".to_string()
        } else {
            format!("{:>6.2}", day.ratio)
        };
        writeln!(
            output,
            "  {}  {:>6}  {:>8}  {ratio}",
            day.date, day.shift_count, day.service_count
        )
        .unwrap();
    }

    writeln!(output).unwrap();
    writeln!(
        output,
        "Coverage: {}/{} departures fall inside a same-weekday shift window ({:.1}%)",
        report.matched_services, report.total_services, report.coverage_pct
    )
    .unwrap();

    output
}
