//! Date and time-of-day normalization for raw spreadsheet cells.
//!
//! The source spreadsheets are hand-maintained and mix formats freely: ISO
//! dates next to `dd/mm/yyyy`, `HH:MM` times next to bare hours ("8") and
//! decimal hours ("8.5", "8,5"), and full datetimes in columns that should
//! hold a time of day. Everything here parses into a canonical
//! [`chrono::NaiveDate`] / [`chrono::NaiveTime`] or returns a
//! [`ParseFailure`] value. Parsing is pure: the same input always yields the
//! same result.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::CellValue;

/// A failed parse of a date or time-of-day cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// The cell was empty.
    #[error("cell is empty")]
    Missing,

    /// The cell content matched none of the accepted patterns.
    #[error("unrecognized value {value:?}")]
    Unrecognized { value: String },

    /// The cell parsed but described an impossible time of day.
    #[error("value {value:?} is out of range for a time of day")]
    OutOfRange { value: String },
}

/// Preferred reading of ambiguous numeric dates such as `03/04/2024`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    /// Day before month (the source organization's locale).
    #[default]
    DayFirst,
    /// Month before day.
    MonthFirst,
}

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];
// The two-digit-year form must come first: %Y accepts a bare "24" as the
// literal year 24, so it would shadow %y.
const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%y", "%d/%m/%Y", "%d-%m-%Y"];
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];
const MONTH_FIRST_DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%m-%d-%Y"];
const MONTH_FIRST_DATETIME_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

fn try_date_formats(text: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn try_datetime_formats(text: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Parses a calendar date from a raw cell.
///
/// ISO forms are tried first, then the preferred numeric order, then the
/// other order as a repair step (a "month" of 13 is unambiguously a day).
/// Full datetime strings are accepted and reduced to their date part.
/// Unparseable input is a failure, never a fabricated date.
pub fn parse_date(cell: &CellValue, order: DateOrder) -> Result<NaiveDate, ParseFailure> {
    let text = match cell {
        CellValue::Missing => return Err(ParseFailure::Missing),
        CellValue::Number(n) => {
            return Err(ParseFailure::Unrecognized {
                value: n.to_string(),
            });
        }
        CellValue::Text(s) => s.trim(),
    };

    let (preferred, fallback, preferred_dt, fallback_dt) = match order {
        DateOrder::DayFirst => (
            DAY_FIRST_DATE_FORMATS,
            MONTH_FIRST_DATE_FORMATS,
            DAY_FIRST_DATETIME_FORMATS,
            MONTH_FIRST_DATETIME_FORMATS,
        ),
        DateOrder::MonthFirst => (
            MONTH_FIRST_DATE_FORMATS,
            DAY_FIRST_DATE_FORMATS,
            MONTH_FIRST_DATETIME_FORMATS,
            DAY_FIRST_DATETIME_FORMATS,
        ),
    };

    try_date_formats(text, ISO_DATE_FORMATS)
        .or_else(|| try_datetime_formats(text, ISO_DATETIME_FORMATS).map(|dt| dt.date()))
        .or_else(|| try_date_formats(text, preferred))
        .or_else(|| try_datetime_formats(text, preferred_dt).map(|dt| dt.date()))
        .or_else(|| try_date_formats(text, fallback))
        .or_else(|| try_datetime_formats(text, fallback_dt).map(|dt| dt.date()))
        .ok_or_else(|| ParseFailure::Unrecognized {
            value: text.to_string(),
        })
}

/// Parses a time of day from a raw cell.
///
/// Accepted forms, in order:
/// - `HH:MM` and `HH:MM:SS`
/// - full datetime strings (time part taken)
/// - bare hour integers: `"8"` → 08:00
/// - decimal hours with dot or comma: `"8.5"` / `"8,5"` → 08:30, where the
///   fractional part is minutes as a fraction of an hour
///
/// Numeric cells follow the decimal-hour rule. Anything else is a failure.
pub fn parse_time(cell: &CellValue) -> Result<NaiveTime, ParseFailure> {
    let text = match cell {
        CellValue::Missing => return Err(ParseFailure::Missing),
        CellValue::Number(n) => return decimal_hours_to_time(*n, &n.to_string()),
        CellValue::Text(s) => s.trim(),
    };

    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(text, fmt) {
            return Ok(time);
        }
    }

    let datetime = try_datetime_formats(text, ISO_DATETIME_FORMATS)
        .or_else(|| try_datetime_formats(text, DAY_FIRST_DATETIME_FORMATS))
        .or_else(|| try_datetime_formats(text, MONTH_FIRST_DATETIME_FORMATS));
    if let Some(dt) = datetime {
        return Ok(dt.time());
    }

    if let Ok(value) = text.replace(',', ".").parse::<f64>() {
        return decimal_hours_to_time(value, text);
    }

    Err(ParseFailure::Unrecognized {
        value: text.to_string(),
    })
}

/// Converts decimal hours to a time of day.
///
/// The fractional part is minutes as a fraction of an hour:
/// `minutes = round(frac * 60)`, carrying a rounded 60 into the next hour.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn decimal_hours_to_time(value: f64, original: &str) -> Result<NaiveTime, ParseFailure> {
    if !value.is_finite() || value < 0.0 {
        return Err(ParseFailure::OutOfRange {
            value: original.to_string(),
        });
    }

    let mut hour = value.trunc() as u32;
    let mut minute = (value.fract() * 60.0).round() as u32;
    if minute == 60 {
        hour += 1;
        minute = 0;
    }

    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| ParseFailure::OutOfRange {
        value: original.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // ========== Date Parsing ==========

    #[test]
    fn iso_dates_parse_regardless_of_order() {
        for order in [DateOrder::DayFirst, DateOrder::MonthFirst] {
            assert_eq!(
                parse_date(&text("2024-01-12"), order).unwrap(),
                date(2024, 1, 12)
            );
        }
    }

    #[test]
    fn ambiguous_dates_follow_configured_order() {
        let cell = text("03/04/2024");
        assert_eq!(
            parse_date(&cell, DateOrder::DayFirst).unwrap(),
            date(2024, 4, 3)
        );
        assert_eq!(
            parse_date(&cell, DateOrder::MonthFirst).unwrap(),
            date(2024, 3, 4)
        );
    }

    #[test]
    fn impossible_preferred_order_falls_back() {
        // A "month" of 13 only makes sense day-first.
        assert_eq!(
            parse_date(&text("13/01/2024"), DateOrder::MonthFirst).unwrap(),
            date(2024, 1, 13)
        );
    }

    #[test]
    fn datetime_cells_reduce_to_date() {
        assert_eq!(
            parse_date(&text("2024-01-12 08:30:00"), DateOrder::DayFirst).unwrap(),
            date(2024, 1, 12)
        );
        assert_eq!(
            parse_date(&text("12/01/2024 08:30"), DateOrder::DayFirst).unwrap(),
            date(2024, 1, 12)
        );
    }

    #[test]
    fn two_digit_years_parse() {
        assert_eq!(
            parse_date(&text("12/01/24"), DateOrder::DayFirst).unwrap(),
            date(2024, 1, 12)
        );
    }

    #[test]
    fn unparseable_date_is_a_failure() {
        let err = parse_date(&text("soon"), DateOrder::DayFirst).unwrap_err();
        assert_eq!(
            err,
            ParseFailure::Unrecognized {
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn missing_date_cell_is_distinct() {
        assert_eq!(
            parse_date(&CellValue::Missing, DateOrder::DayFirst),
            Err(ParseFailure::Missing)
        );
    }

    #[test]
    fn numeric_date_cell_is_rejected() {
        assert!(parse_date(&CellValue::Number(45_000.0), DateOrder::DayFirst).is_err());
    }

    // ========== Time Parsing ==========

    #[test]
    fn hh_mm_round_trips() {
        assert_eq!(parse_time(&text("08:30")).unwrap(), time(8, 30));
        assert_eq!(parse_time(&text("23:59")).unwrap(), time(23, 59));
        assert_eq!(parse_time(&text("00:00")).unwrap(), time(0, 0));
    }

    #[test]
    fn seconds_are_accepted() {
        assert_eq!(
            parse_time(&text("08:30:45")).unwrap(),
            NaiveTime::from_hms_opt(8, 30, 45).unwrap()
        );
    }

    #[test]
    fn bare_hours_parse() {
        assert_eq!(parse_time(&text("8")).unwrap(), time(8, 0));
        assert_eq!(parse_time(&text("0")).unwrap(), time(0, 0));
        assert_eq!(parse_time(&text("23")).unwrap(), time(23, 0));
    }

    #[test]
    fn decimal_hours_are_minutes_as_fraction() {
        // 0.5 hours is 30 minutes, not 50.
        assert_eq!(parse_time(&text("8.5")).unwrap(), time(8, 30));
        assert_eq!(parse_time(&text("8,5")).unwrap(), time(8, 30));
        assert_eq!(parse_time(&text("8.25")).unwrap(), time(8, 15));
        assert_eq!(parse_time(&CellValue::Number(8.5)).unwrap(), time(8, 30));
    }

    #[test]
    fn rounded_minutes_carry_into_next_hour() {
        // round(0.999 * 60) = 60, which carries.
        assert_eq!(parse_time(&text("7.999")).unwrap(), time(8, 0));
    }

    #[test]
    fn datetime_cells_reduce_to_time() {
        assert_eq!(
            parse_time(&text("2024-01-12 08:30:00")).unwrap(),
            time(8, 30)
        );
        assert_eq!(parse_time(&text("12/01/2024 22:15")).unwrap(), time(22, 15));
    }

    #[test]
    fn out_of_range_hours_fail() {
        assert!(matches!(
            parse_time(&text("25")),
            Err(ParseFailure::OutOfRange { .. })
        ));
        assert!(matches!(
            parse_time(&CellValue::Number(-1.0)),
            Err(ParseFailure::OutOfRange { .. })
        ));
        // 23.999 carries to hour 24.
        assert!(matches!(
            parse_time(&text("23.999")),
            Err(ParseFailure::OutOfRange { .. })
        ));
    }

    #[test]
    fn unparseable_time_is_a_failure() {
        assert_eq!(
            parse_time(&text("bad")),
            Err(ParseFailure::Unrecognized {
                value: "bad".to_string()
            })
        );
        assert_eq!(parse_time(&CellValue::Missing), Err(ParseFailure::Missing));
    }

    #[test]
    fn parsing_is_deterministic() {
        let cell = text("8.5");
        assert_eq!(parse_time(&cell), parse_time(&cell));
    }
}
