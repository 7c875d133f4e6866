//! Validate command: surfaces rows rejected during normalization.

use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;
use vda_core::ValidationReport;

use super::{Datasets, load_datasets};
use crate::cli::Sources;
use crate::config::Config;

#[derive(Debug, Serialize)]
struct DatasetFindings {
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    valid_rows: usize,
    invalid_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<ValidationReport>,
}

#[derive(Debug, Serialize)]
struct Findings {
    shifts: DatasetFindings,
    services: DatasetFindings,
}

/// Runs the validate command.
pub fn run(config: &Config, sources: &Sources, json: bool) -> Result<()> {
    let datasets = load_datasets(config, sources);
    let findings = build(datasets);

    if json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        print!("{}", render(&findings));
    }
    Ok(())
}

fn build(datasets: Datasets) -> Findings {
    let shifts = match datasets.shifts {
        Ok(normalized) => DatasetFindings {
            error: None,
            valid_rows: normalized.records.len(),
            invalid_rows: normalized.report.invalid_rows(),
            report: Some(normalized.report),
        },
        Err(error) => DatasetFindings {
            error: Some(error.to_string()),
            valid_rows: 0,
            invalid_rows: 0,
            report: None,
        },
    };
    let services = match datasets.services {
        Ok(normalized) => DatasetFindings {
            error: None,
            valid_rows: normalized.records.len(),
            invalid_rows: normalized.report.invalid_rows(),
            report: Some(normalized.report),
        },
        Err(error) => DatasetFindings {
            error: Some(error.to_string()),
            valid_rows: 0,
            invalid_rows: 0,
            report: None,
        },
    };

    Findings { shifts, services }
}

fn render_section(output: &mut String, title: &str, findings: &DatasetFindings) {
    if let Some(error) = &findings.error {
        writeln!(output, "{title}: failed to load: {error}").unwrap();
        return;
    }

    if findings.invalid_rows == 0 {
        writeln!(output, "{title}: clean ({} valid rows)", findings.valid_rows).unwrap();
        return;
    }

    writeln!(
        output,
        "{title}: {} invalid rows ({} valid)",
        findings.invalid_rows, findings.valid_rows
    )
    .unwrap();
    if let Some(report) = &findings.report {
        for diagnostic in &report.diagnostics {
            writeln!(
                output,
                "  row {:<5} {:<12} {}",
                diagnostic.row_index, diagnostic.column, diagnostic.reason
            )
            .unwrap();
        }
    }
}

fn render(findings: &Findings) -> String {
    let mut output = String::new();
    render_section(&mut output, "SHIFTS", &findings.shifts);
    render_section(&mut output, "SERVICES", &findings.services);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use vda_core::{
        CategoryMap, CellValue, DateOrder, Normalized, RawRow, ShiftColumns, normalize_shifts,
    };

    fn bad_batch() -> Normalized<vda_core::ShiftRecord> {
        let row: RawRow = [
            ("Inizio".to_string(), CellValue::Text("garbage".to_string())),
            ("Fine".to_string(), CellValue::Text("14:00".to_string())),
        ]
        .into_iter()
        .collect();
        normalize_shifts(
            &[row],
            &ShiftColumns::default(),
            &CategoryMap::default(),
            DateOrder::DayFirst,
        )
    }

    #[test]
    fn diagnostics_are_rendered_per_row() {
        let datasets = Datasets {
            shifts: Ok(bad_batch()),
            services: Ok(Normalized::default()),
        };

        let findings = build(datasets);
        assert_eq!(findings.shifts.invalid_rows, 1);

        let text = render(&findings);
        assert!(text.contains("SHIFTS: 1 invalid rows (0 valid)"));
        assert!(text.contains("row 0"));
        assert!(text.contains("Inizio"));
        assert!(text.contains("SERVICES: clean (0 valid rows)"));
    }

    #[test]
    fn load_failure_is_reported_not_fatal() {
        let datasets = Datasets {
            shifts: Err(crate::loader::LoadError::Io {
                path: "turni.csv".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            services: Ok(Normalized::default()),
        };

        let findings = build(datasets);
        let text = render(&findings);
        assert!(text.contains("SHIFTS: failed to load"));
        assert!(text.contains("SERVICES: clean"));
    }
}
