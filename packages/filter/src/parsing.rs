//! Parsers for the textual clock-time and calendar-date filter formats.
//!
//! Clock times encode to `HHMM` integers and dates to epoch seconds at
//! midnight UTC, the same integer conventions the marker table stores.

use chrono::{NaiveDate, NaiveTime};

use crate::{FilterError, YearWindow};

/// Separator between the two sides of a textual range.
const RANGE_SEPARATOR: &str = " - ";

/// An inclusive range over the `HHMM`-encoded time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    /// Inclusive lower bound.
    pub lower_bound: i32,
    /// Inclusive upper bound.
    pub upper_bound: i32,
}

/// An inclusive range over the midnight-epoch date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// Inclusive lower bound (epoch seconds).
    pub lower_bound: i64,
    /// Inclusive upper bound (epoch seconds).
    pub upper_bound: i64,
}

/// Parses a clock time of the form `"HH:MM"` into its `HHMM` integer
/// encoding (`"14:30"` → `1430`).
///
/// # Errors
///
/// Returns [`FilterError::InvalidClockTime`] if the input does not contain
/// exactly one `:`, a component is not numeric, or the hour/minute is out
/// of range.
pub fn parse_clock_time(value: &str) -> Result<i32, FilterError> {
    let invalid = |message: &str| FilterError::InvalidClockTime {
        value: value.to_string(),
        message: message.to_string(),
    };

    let (hour_str, minute_str) = value
        .trim()
        .split_once(':')
        .ok_or_else(|| invalid("expected HH:MM"))?;
    if minute_str.contains(':') {
        return Err(invalid("expected exactly one ':'"));
    }

    let hour: i32 = hour_str
        .parse()
        .map_err(|_| invalid("hour is not numeric"))?;
    let minute: i32 = minute_str
        .parse()
        .map_err(|_| invalid("minute is not numeric"))?;

    if !(0..24).contains(&hour) {
        return Err(invalid("hour out of range"));
    }
    if !(0..60).contains(&minute) {
        return Err(invalid("minute out of range"));
    }

    Ok(hour * 100 + minute)
}

/// Parses a calendar date of the form `"DD/MM/YYYY"` into epoch seconds at
/// midnight UTC, resolving the year through the given [`YearWindow`].
///
/// # Errors
///
/// Returns [`FilterError::InvalidDate`] if the input does not split into
/// three numeric components or names an impossible date.
pub fn parse_date(value: &str, window: YearWindow) -> Result<i64, FilterError> {
    let invalid = |message: &str| FilterError::InvalidDate {
        value: value.to_string(),
        message: message.to_string(),
    };

    let parts: Vec<&str> = value.trim().split('/').collect();
    let [day_str, month_str, year_str] = parts.as_slice() else {
        return Err(invalid("expected DD/MM/YYYY"));
    };

    let day: u32 = day_str.parse().map_err(|_| invalid("day is not numeric"))?;
    let month: u32 = month_str
        .parse()
        .map_err(|_| invalid("month is not numeric"))?;
    let literal_year: i32 = year_str
        .parse()
        .map_err(|_| invalid("year is not numeric"))?;

    let year = window.resolve_year(month, literal_year);
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid("no such date"))?;

    Ok(date.and_time(NaiveTime::MIN).and_utc().timestamp())
}

/// Parses a textual clock-time range `"HH:MM - HH:MM"` into an inclusive
/// [`TimeRange`]. The left side becomes the lower bound, the right side the
/// upper bound.
///
/// # Errors
///
/// Returns [`FilterError::InvalidRange`] if the separator is missing or
/// repeated, or [`FilterError::InvalidClockTime`] if either side is
/// malformed.
pub fn parse_time_range(value: &str) -> Result<TimeRange, FilterError> {
    let (start, end) = split_range(value)?;
    Ok(TimeRange {
        lower_bound: parse_clock_time(start)?,
        upper_bound: parse_clock_time(end)?,
    })
}

/// Parses a textual calendar-date range `"DD/MM/YYYY - DD/MM/YYYY"` into an
/// inclusive [`DateRange`], resolving years through the given
/// [`YearWindow`].
///
/// # Errors
///
/// Returns [`FilterError::InvalidRange`] if the separator is missing or
/// repeated, or [`FilterError::InvalidDate`] if either side is malformed.
pub fn parse_date_range(value: &str, window: YearWindow) -> Result<DateRange, FilterError> {
    let (start, end) = split_range(value)?;
    Ok(DateRange {
        lower_bound: parse_date(start, window)?,
        upper_bound: parse_date(end, window)?,
    })
}

/// Splits a textual range on the single `" - "` separator.
fn split_range(value: &str) -> Result<(&str, &str), FilterError> {
    let mut sides = value.split(RANGE_SEPARATOR);
    let (Some(start), Some(end), None) = (sides.next(), sides.next(), sides.next()) else {
        return Err(FilterError::InvalidRange {
            value: value.to_string(),
        });
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midnight_epoch(year: i32, month: u32, day: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp()
    }

    #[test]
    fn encodes_clock_time_as_hhmm() {
        assert_eq!(parse_clock_time("14:30").unwrap(), 1430);
        assert_eq!(parse_clock_time("00:05").unwrap(), 5);
    }

    #[test]
    fn rejects_malformed_clock_time() {
        assert!(parse_clock_time("1430").is_err());
        assert!(parse_clock_time("14:30:00").is_err());
        assert!(parse_clock_time("aa:30").is_err());
        assert!(parse_clock_time("25:00").is_err());
        assert!(parse_clock_time("14:75").is_err());
    }

    #[test]
    fn parses_time_range_bounds() {
        let range = parse_time_range("09:00 - 17:45").unwrap();
        assert_eq!(range.lower_bound, 900);
        assert_eq!(range.upper_bound, 1745);
    }

    #[test]
    fn rejects_time_range_without_separator() {
        assert!(matches!(
            parse_time_range("09:00 17:45"),
            Err(FilterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn rejects_time_range_with_extra_separator() {
        assert!(matches!(
            parse_time_range("09:00 - 12:00 - 17:45"),
            Err(FilterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn parses_literal_date() {
        let epoch = parse_date("15/08/2021", YearWindow::Literal).unwrap();
        assert_eq!(epoch, midnight_epoch(2021, 8, 15));
    }

    #[test]
    fn dataset_window_overrides_late_months_to_2021() {
        let range = parse_date_range("01/06/2099 - 15/06/2099", YearWindow::Dataset2021).unwrap();
        assert_eq!(range.lower_bound, midnight_epoch(2021, 6, 1));
        assert_eq!(range.upper_bound, midnight_epoch(2021, 6, 15));
    }

    #[test]
    fn dataset_window_overrides_early_months_to_2022() {
        let range = parse_date_range("01/02/1999 - 28/02/1999", YearWindow::Dataset2021).unwrap();
        assert_eq!(range.lower_bound, midnight_epoch(2022, 2, 1));
        assert_eq!(range.upper_bound, midnight_epoch(2022, 2, 28));
    }

    #[test]
    fn literal_window_honors_year_token() {
        let range = parse_date_range("01/06/2019 - 15/06/2019", YearWindow::Literal).unwrap();
        assert_eq!(range.lower_bound, midnight_epoch(2019, 6, 1));
        assert_eq!(range.upper_bound, midnight_epoch(2019, 6, 15));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(parse_date("2021-06-01", YearWindow::Literal).is_err());
        assert!(parse_date("01/06", YearWindow::Literal).is_err());
        assert!(parse_date("aa/06/2021", YearWindow::Literal).is_err());
        assert!(parse_date("31/02/2021", YearWindow::Literal).is_err());
    }
}
