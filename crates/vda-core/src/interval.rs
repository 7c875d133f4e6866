//! Interval construction with overnight rollover correction.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// A concrete start/end instant pair.
///
/// Built from a calendar date plus two times-of-day. When the end time-of-day
/// numerically precedes the start, the span crosses midnight and the end is
/// advanced by exactly one calendar day, so `end >= start` always holds and
/// the duration stays below 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    /// Anchors `start` and `end` times-of-day to `date`, applying rollover.
    ///
    /// Both shifts and services use this; parse failures in either time are
    /// propagated by the normalizer before an interval is ever built.
    #[must_use]
    pub fn build(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        let start_dt = date.and_time(start);
        let mut end_dt = date.and_time(end);
        if end < start {
            end_dt += Duration::days(1);
        }
        Self {
            start: start_dt,
            end: end_dt,
        }
    }

    /// Interval length in minutes, always `>= 0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 60.0
    }

    /// Interval length in fractional hours, always `>= 0`.
    #[must_use]
    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn same_day_interval() {
        let interval = Interval::build(date(2024, 1, 1), time(8, 0), time(14, 30));
        assert_eq!(interval.start, date(2024, 1, 1).and_time(time(8, 0)));
        assert_eq!(interval.end, date(2024, 1, 1).and_time(time(14, 30)));
        assert!((interval.duration_hours() - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn overnight_shift_rolls_over() {
        // Shift on 2024-01-01 from 23:00 to a raw end of "01:00".
        let interval = Interval::build(date(2024, 1, 1), time(23, 0), time(1, 0));
        assert_eq!(interval.end, date(2024, 1, 2).and_time(time(1, 0)));
        assert!((interval.duration_hours() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rollover_duration_stays_under_24_hours() {
        let cases = [
            (time(23, 59), time(0, 0)),
            (time(12, 0), time(11, 59)),
            (time(0, 1), time(0, 0)),
        ];
        for (start, end) in cases {
            let interval = Interval::build(date(2024, 6, 15), start, end);
            let hours = interval.duration_hours();
            assert!(
                (0.0..24.0).contains(&hours),
                "duration {hours} out of [0, 24) for {start}..{end}"
            );
        }
    }

    #[test]
    fn equal_times_yield_zero_duration() {
        let interval = Interval::build(date(2024, 1, 1), time(8, 0), time(8, 0));
        assert!(interval.duration_minutes().abs() < f64::EPSILON);
    }

    #[test]
    fn minutes_match_hours() {
        let interval = Interval::build(date(2024, 1, 1), time(9, 15), time(10, 0));
        assert!((interval.duration_minutes() - 45.0).abs() < f64::EPSILON);
        assert!((interval.duration_hours() - 0.75).abs() < f64::EPSILON);
    }
}
