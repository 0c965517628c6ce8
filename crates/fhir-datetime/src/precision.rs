//! Declared precision and the ordered field list shared by both value types.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{FhirDateTimeError, Result};

/// The finest field a value was constructed with.
///
/// Levels form a strict chain; a value at a given level carries every field
/// of the levels below it. Hour and minute are a single level because FHIR
/// never allows one without the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precision {
    /// `YYYY`
    Year,
    /// `YYYY-MM`
    Month,
    /// `YYYY-MM-DD`
    Day,
    /// `YYYY-MM-DDThh:mm`
    HourMinute,
    /// `YYYY-MM-DDThh:mm:ss`
    Second,
    /// `YYYY-MM-DDThh:mm:ss.ffffff`
    Microsecond,
}

impl Precision {
    /// How many leading entries of [`Field::ALL`] are meaningful at this precision.
    pub fn field_count(self) -> usize {
        match self {
            Precision::Year => 1,
            Precision::Month => 2,
            Precision::Day => 3,
            Precision::HourMinute => 5,
            Precision::Second => 6,
            Precision::Microsecond => 7,
        }
    }

    /// Whether values at this precision carry a time of day.
    pub fn has_time(self) -> bool {
        self >= Precision::HourMinute
    }

    /// Whether `field` is specified at this precision.
    pub fn includes(self, field: Field) -> bool {
        field.index() < self.field_count()
    }
}

/// Calendar fields in comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Microsecond,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hour,
        Field::Minute,
        Field::Second,
        Field::Microsecond,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Read this field from a chrono value.
    ///
    /// Leap-second nanoseconds are clamped so the microsecond never exceeds 999_999.
    pub(crate) fn read(self, value: &NaiveDateTime) -> i64 {
        match self {
            Field::Year => i64::from(value.year()),
            Field::Month => i64::from(value.month()),
            Field::Day => i64::from(value.day()),
            Field::Hour => i64::from(value.hour()),
            Field::Minute => i64::from(value.minute()),
            Field::Second => i64::from(value.second()),
            Field::Microsecond => i64::from(micros_of(value)),
        }
    }
}

pub(crate) fn micros_of<T: Timelike>(value: &T) -> u32 {
    (value.nanosecond() / 1_000).min(999_999)
}

/// Positional access over the first `len` fields of `value`.
///
/// Fields below `precision` read as `None`; second and microsecond read as
/// `Some(0)` once the value has a time of day.
pub(crate) fn field_at(
    value: &NaiveDateTime,
    precision: Precision,
    index: usize,
    len: usize,
) -> Result<Option<u32>> {
    let field = Field::ALL
        .get(index)
        .copied()
        .filter(|_| index < len)
        .ok_or(FhirDateTimeError::IndexOutOfRange { index, len })?;

    let defaults_to_zero = matches!(field, Field::Second | Field::Microsecond);
    if precision.includes(field) || (defaults_to_zero && precision.has_time()) {
        Ok(u32::try_from(field.read(value)).ok())
    } else {
        Ok(None)
    }
}
