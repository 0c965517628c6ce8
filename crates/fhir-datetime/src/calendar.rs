//! Thin glue over chrono: calendar tables, range checks, and ISO 8601 parsing.
//!
//! chrono does the actual calendar work. This module decides which FHIR
//! layout a string uses, hands the string to chrono with that layout, and
//! translates chrono's failures into [`FhirDateTimeError`] values.

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{FhirDateTimeError, Result};
use crate::precision::Precision;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Days per month in a common year; index 0 is unused.
static DAYS_IN_MONTH: [u32; 13] = [0, 31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` of `year`, or `None` if `month` is not 1..=12.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    match month {
        2 if is_leap_year(year) => Some(29),
        1..=12 => DAYS_IN_MONTH.get(month as usize).copied(),
        _ => None,
    }
}

// ── Range checks ────────────────────────────────────────────────────────────

pub(crate) fn check_year(year: i32) -> Result<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(out_of_range(format!(
            "year {year} is not in {MIN_YEAR}..={MAX_YEAR}"
        )))
    }
}

pub(crate) fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(out_of_range(format!("month {month} is not in 1..=12")))
    }
}

pub(crate) fn check_day(year: i32, month: u32, day: u32) -> Result<()> {
    let max = days_in_month(year, month)
        .ok_or_else(|| out_of_range(format!("month {month} is not in 1..=12")))?;
    if (1..=max).contains(&day) {
        Ok(())
    } else {
        Err(out_of_range(format!(
            "day {day} is not in 1..={max} for {year:04}-{month:02}"
        )))
    }
}

pub(crate) fn check_bounded(name: &str, value: u32, max: u32) -> Result<()> {
    if value <= max {
        Ok(())
    } else {
        Err(out_of_range(format!("{name} {value} is not in 0..={max}")))
    }
}

/// Reject chrono's leap-second encoding (`:59` plus a second's worth of nanoseconds).
pub(crate) fn check_leap_second(value: &impl Timelike) -> Result<()> {
    let second = value.second() + value.nanosecond() / 1_000_000_000;
    check_bounded("second", second, 59)
}

/// Build the chrono date once every field has passed its range check.
pub(crate) fn date_from_parts(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| out_of_range(format!("{year:04}-{month:02}-{day:02} is not a date")))
}

pub(crate) fn time_from_parts(
    hour: u32,
    minute: u32,
    second: u32,
    microsecond: u32,
) -> Result<NaiveTime> {
    NaiveTime::from_hms_micro_opt(hour, minute, second, microsecond).ok_or_else(|| {
        out_of_range(format!(
            "{hour:02}:{minute:02}:{second:02}.{microsecond:06} is not a time of day"
        ))
    })
}

fn out_of_range(message: String) -> FhirDateTimeError {
    FhirDateTimeError::OutOfRange(message)
}

// ── ISO 8601 parsing ────────────────────────────────────────────────────────

/// A string parsed by chrono, with the precision implied by its layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParsedIso {
    pub value: NaiveDateTime,
    pub offset: Option<FixedOffset>,
    pub precision: Precision,
}

/// Parse `YYYY`, `YYYY-MM`, `YYYY-MM-DD` or `YYYY-MM-DDThh:mm[:ss[.f]][Z|±hh:mm]`.
pub(crate) fn parse_iso(input: &str) -> Result<ParsedIso> {
    let (date_part, time_part) = match input.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (input, None),
    };

    let date_precision = date_layout_precision(date_part)
        .ok_or_else(|| parse_error(input, "expected YYYY, YYYY-MM or YYYY-MM-DD"))?;

    let Some(time_part) = time_part else {
        let date = parse_partial_date(input, date_part, date_precision)?;
        check_year(chrono::Datelike::year(&date))?;
        return Ok(ParsedIso {
            value: date.and_time(NaiveTime::MIN),
            offset: None,
            precision: date_precision,
        });
    };

    if date_precision != Precision::Day {
        return Err(parse_error(input, "a time of day requires a full date"));
    }

    let (clock, zone) = split_zone(time_part);
    let (precision, clock_layout) = clock_layout(clock)
        .ok_or_else(|| parse_error(input, "expected hh:mm, hh:mm:ss or hh:mm:ss.f"))?;

    let parsed = match zone {
        None => {
            let layout = format!("%Y-%m-%dT{clock_layout}");
            let value = NaiveDateTime::parse_from_str(input, &layout)
                .map_err(|e| parse_error(input, &e.to_string()))?;
            ParsedIso {
                value,
                offset: None,
                precision,
            }
        }
        Some(zone) => {
            let zone = if zone == "Z" { "+00:00" } else { zone };
            let normalized = format!("{date_part}T{clock}{zone}");
            let layout = format!("%Y-%m-%dT{clock_layout}%:z");
            let value = DateTime::parse_from_str(&normalized, &layout)
                .map_err(|e| parse_error(input, &e.to_string()))?;
            ParsedIso {
                value: value.naive_local(),
                offset: Some(*value.offset()),
                precision,
            }
        }
    };
    check_year(chrono::Datelike::year(&parsed.value))?;
    check_leap_second(&parsed.value)?;
    Ok(parsed)
}

/// Precision of a date part, judged by its shape alone; chrono checks the digits.
fn date_layout_precision(date_part: &str) -> Option<Precision> {
    let widths: Vec<usize> = date_part.split('-').map(str::len).collect();
    let digits_only = date_part
        .split('-')
        .all(|p| p.bytes().all(|b| b.is_ascii_digit()));
    if !digits_only {
        return None;
    }
    match widths.as_slice() {
        [4] => Some(Precision::Year),
        [4, 2] => Some(Precision::Month),
        [4, 2, 2] => Some(Precision::Day),
        _ => None,
    }
}

/// chrono needs a full date, so coarser layouts are completed with January / the 1st.
fn parse_partial_date(input: &str, date_part: &str, precision: Precision) -> Result<NaiveDate> {
    let layout = match precision {
        Precision::Year => "%Y",
        Precision::Month => "%Y-%m",
        _ => "%Y-%m-%d",
    };
    let mut parsed = Parsed::new();
    parse(&mut parsed, date_part, StrftimeItems::new(layout))
        .map_err(|e| parse_error(input, &e.to_string()))?;
    if precision < Precision::Month {
        parsed
            .set_month(1)
            .map_err(|e| parse_error(input, &e.to_string()))?;
    }
    if precision < Precision::Day {
        parsed
            .set_day(1)
            .map_err(|e| parse_error(input, &e.to_string()))?;
    }
    parsed
        .to_naive_date()
        .map_err(|e| parse_error(input, &e.to_string()))
}

/// Split `hh:mm:ss-06:00` into the clock and the zone designator.
fn split_zone(time_part: &str) -> (&str, Option<&str>) {
    if let Some(clock) = time_part.strip_suffix('Z') {
        return (clock, Some("Z"));
    }
    match time_part.rfind(['+', '-']) {
        Some(pos) => (&time_part[..pos], Some(&time_part[pos..])),
        None => (time_part, None),
    }
}

fn clock_layout(clock: &str) -> Option<(Precision, &'static str)> {
    let bytes = clock.as_bytes();
    match bytes.len() {
        5 => Some((Precision::HourMinute, "%H:%M")),
        8 => Some((Precision::Second, "%H:%M:%S")),
        n if n > 9 && bytes.get(8) == Some(&b'.') => Some((Precision::Microsecond, "%H:%M:%S%.f")),
        _ => None,
    }
}

fn parse_error(input: &str, reason: &str) -> FhirDateTimeError {
    FhirDateTimeError::Parse(format!("'{input}': {reason}"))
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2020, 2), Some(29));
        assert_eq!(days_in_month(2021, 2), Some(28));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2021, 4), Some(30));
        assert_eq!(days_in_month(2021, 13), None);
        assert_eq!(days_in_month(2021, 0), None);
    }

    #[test]
    fn test_check_day_reports_bound() {
        let err = check_day(2030, 2, 30).unwrap_err();
        assert!(err.to_string().contains("1..=28"), "got: {err}");
        assert!(check_day(2020, 2, 29).is_ok());
    }

    #[test]
    fn test_check_year_bounds() {
        assert!(check_year(1).is_ok());
        assert!(check_year(9999).is_ok());
        assert!(check_year(0).is_err());
        assert!(check_year(19999).is_err());
    }

    #[test]
    fn test_parse_year_only() {
        let parsed = parse_iso("2011").unwrap();
        assert_eq!(parsed.precision, Precision::Year);
        assert_eq!(parsed.value.year(), 2011);
        assert_eq!(parsed.value.month(), 1);
        assert_eq!(parsed.offset, None);
    }

    #[test]
    fn test_parse_year_month() {
        let parsed = parse_iso("2011-09").unwrap();
        assert_eq!(parsed.precision, Precision::Month);
        assert_eq!(parsed.value.month(), 9);
        assert_eq!(parsed.value.day(), 1);
    }

    #[test]
    fn test_parse_minute_precision_without_zone() {
        let parsed = parse_iso("2011-09-12T12:14").unwrap();
        assert_eq!(parsed.precision, Precision::HourMinute);
        assert_eq!(parsed.value.hour(), 12);
        assert_eq!(parsed.value.minute(), 14);
        assert_eq!(parsed.offset, None);
    }

    #[test]
    fn test_parse_negative_offset() {
        let parsed = parse_iso("2011-09-12T12:14:31-06:00").unwrap();
        assert_eq!(parsed.precision, Precision::Second);
        assert_eq!(parsed.value.second(), 31);
        assert_eq!(parsed.offset, FixedOffset::west_opt(6 * 3600));
    }

    #[test]
    fn test_parse_zulu_and_fraction() {
        let parsed = parse_iso("2020-01-06T12:30:08.209495Z").unwrap();
        assert_eq!(parsed.precision, Precision::Microsecond);
        assert_eq!(parsed.value.nanosecond(), 209_495_000);
        assert_eq!(parsed.offset, FixedOffset::east_opt(0));
    }

    #[test]
    fn test_parse_rejects_malformed_strings() {
        for input in [
            "2011-09-1212:14",
            "2020*02*13",
            "20",
            "2011-9",
            "2011-09T12:00",
            "2011-09-12T12",
            "2011-09-12T",
            "",
        ] {
            let err = parse_iso(input).unwrap_err();
            assert!(
                matches!(err, FhirDateTimeError::Parse(_)),
                "{input}: got {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert!(parse_iso("2030-02-30").is_err());
        assert!(parse_iso("2030-13").is_err());
        assert!(parse_iso("2030-02-28T24:00").is_err());
    }

    #[test]
    fn test_parse_rejects_leap_seconds() {
        for input in [
            "2030-02-28T23:59:60",
            "2016-12-31T23:59:60Z",
            "2016-12-31T23:59:60.500000+00:00",
        ] {
            let err = parse_iso(input).unwrap_err();
            assert!(matches!(err, FhirDateTimeError::OutOfRange(_)), "{input}: {err:?}");
        }
        assert_eq!(parse_iso("2030-02-28T23:59:59").unwrap().value.second(), 59);
    }

    #[test]
    fn test_parse_rejects_year_zero() {
        let err = parse_iso("0000").unwrap_err();
        assert!(matches!(err, FhirDateTimeError::OutOfRange(_)), "got {err:?}");
    }
}
