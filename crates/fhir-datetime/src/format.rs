//! FHIR string rendering.

use std::fmt::{self, Write};

use chrono::{Datelike, FixedOffset, NaiveDateTime, Timelike};

use crate::precision::{micros_of, Precision};

/// How a zero UTC offset is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtcStyle {
    /// `+00:00`, the ISO 8601 extended form.
    #[default]
    Offset,
    /// `Z`, the designator most FHIR servers emit.
    Zulu,
}

/// Options for `to_string_with` on the value types.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    /// Rendering of a zero offset.
    pub utc: UtcStyle,
}

/// A value paired with its precision and rendering options; `Display`
/// writes the FHIR string.
pub(crate) struct Rendered<'a> {
    value: NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: Precision,
    options: &'a FormatOptions,
}

pub(crate) fn rendered(
    value: NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: Precision,
    options: &FormatOptions,
) -> Rendered<'_> {
    Rendered {
        value,
        offset,
        precision,
        options,
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fhir(f, &self.value, self.offset, self.precision, self.options)
    }
}

/// Write the fields of `value` that `precision` declares, then the offset.
fn write_fhir(
    out: &mut impl Write,
    value: &NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: Precision,
    options: &FormatOptions,
) -> fmt::Result {
    write!(out, "{:04}", value.year())?;
    if precision >= Precision::Month {
        write!(out, "-{:02}", value.month())?;
    }
    if precision >= Precision::Day {
        write!(out, "-{:02}", value.day())?;
    }
    if !precision.has_time() {
        return Ok(());
    }

    write!(out, "T{:02}:{:02}", value.hour(), value.minute())?;
    if precision >= Precision::Second {
        write!(out, ":{:02}", value.second())?;
    }
    if precision >= Precision::Microsecond {
        write!(out, ".{:06}", micros_of(value))?;
    }
    if let Some(offset) = offset {
        write_offset(out, offset, options.utc)?;
    }
    Ok(())
}

/// `±hh:mm`, with `:ss` appended for offsets that are not whole minutes.
fn write_offset(out: &mut impl Write, offset: FixedOffset, utc: UtcStyle) -> fmt::Result {
    let total = offset.local_minus_utc();
    if total == 0 && utc == UtcStyle::Zulu {
        return out.write_char('Z');
    }
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.unsigned_abs();
    let (hours, minutes, seconds) = (abs / 3600, (abs % 3600) / 60, abs % 60);
    write!(out, "{sign}{hours:02}:{minutes:02}")?;
    if seconds != 0 {
        write!(out, ":{seconds:02}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn render(precision: Precision, offset: Option<FixedOffset>, utc: UtcStyle) -> String {
        let value = NaiveDate::from_ymd_opt(2020, 5, 4)
            .and_then(|d| d.and_hms_micro_opt(7, 8, 9, 10))
            .unwrap();
        rendered(value, offset, precision, &FormatOptions { utc }).to_string()
    }

    #[test]
    fn test_render_each_precision() {
        let utc = UtcStyle::Offset;
        assert_eq!(render(Precision::Year, None, utc), "2020");
        assert_eq!(render(Precision::Month, None, utc), "2020-05");
        assert_eq!(render(Precision::Day, None, utc), "2020-05-04");
        assert_eq!(render(Precision::HourMinute, None, utc), "2020-05-04T07:08");
        assert_eq!(render(Precision::Second, None, utc), "2020-05-04T07:08:09");
        assert_eq!(
            render(Precision::Microsecond, None, utc),
            "2020-05-04T07:08:09.000010"
        );
    }

    #[test]
    fn test_render_offsets() {
        let minus_six = FixedOffset::west_opt(6 * 3600);
        let utc = FixedOffset::east_opt(0);
        let odd = FixedOffset::east_opt(5 * 3600 + 30 * 60 + 15);
        assert_eq!(
            render(Precision::HourMinute, minus_six, UtcStyle::Offset),
            "2020-05-04T07:08-06:00"
        );
        assert_eq!(
            render(Precision::Second, utc, UtcStyle::Offset),
            "2020-05-04T07:08:09+00:00"
        );
        assert_eq!(render(Precision::Second, utc, UtcStyle::Zulu), "2020-05-04T07:08:09Z");
        assert_eq!(
            render(Precision::HourMinute, odd, UtcStyle::Zulu),
            "2020-05-04T07:08+05:30:15"
        );
    }
}
