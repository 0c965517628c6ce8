//! FHIR `dateTime`: a partial date, optionally refined to a time of day
//! with an optional UTC offset.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, IsoWeek, NaiveDate, NaiveDateTime, TimeZone, Timelike,
    Weekday,
};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;
use crate::compare::{Comparand, Operand};
use crate::date::PartialDate;
use crate::error::{FhirDateTimeError, Result};
use crate::fields::{DateTimeFields, Validated};
use crate::format::{rendered, FormatOptions};
use crate::precision::{field_at, micros_of, Precision};
use crate::sort::SortKey;

/// A FHIR `dateTime` of any precision from year to microsecond.
///
/// Fields below the declared precision are never exposed: `month()` of a
/// year-only value is `None`, not 1. The exceptions are `second()` and
/// `microsecond()`, which read as 0 once a time of day is present.
///
/// Comparison truncates at the coarser operand's precision and normalises
/// to UTC when both operands carry a time and an offset. See
/// [`crate::compare`] for the full rules.
///
/// # Examples
///
/// ```
/// use chrono::FixedOffset;
/// use fhir_datetime::{DateTimeFields, PartialDateTime};
///
/// let precise = PartialDateTime::new(DateTimeFields {
///     year: 2021,
///     month: Some(4),
///     day: Some(21),
///     hour: Some(1),
///     minute: Some(32),
///     second: Some(44),
///     offset: FixedOffset::east_opt(0),
///     ..Default::default()
/// })
/// .unwrap();
/// let year = PartialDateTime::from_year(2021).unwrap();
///
/// assert!(year == precise);
/// assert!(precise == year);
/// assert_eq!(precise.to_string(), "2021-04-21T01:32:44+00:00");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PartialDateTime {
    /// Wall-clock reading; unspecified fields are stored at their minimum.
    value: NaiveDateTime,
    offset: Option<FixedOffset>,
    fold: bool,
    precision: Precision,
}

impl PartialDateTime {
    /// Number of positions reachable through [`PartialDateTime::get`].
    pub const FIELD_COUNT: usize = 7;

    pub fn new(fields: DateTimeFields) -> Result<Self> {
        fields.validate().map(Self::from_validated)
    }

    pub fn from_year(year: i32) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            ..Default::default()
        })
    }

    pub fn from_ym(year: i32, month: u32) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            month: Some(month),
            ..Default::default()
        })
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            month: Some(month),
            day: Some(day),
            ..Default::default()
        })
    }

    pub fn from_ymd_hm(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            ..Default::default()
        })
    }

    pub fn from_ymd_hms(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    ) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            ..Default::default()
        })
    }

    pub fn from_ymd_hms_micro(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        microsecond: u32,
    ) -> Result<Self> {
        Self::new(DateTimeFields {
            year,
            month: Some(month),
            day: Some(day),
            hour: Some(hour),
            minute: Some(minute),
            second: Some(second),
            microsecond: Some(microsecond),
            ..Default::default()
        })
    }

    /// Build from a chrono value or another partial value.
    ///
    /// Full-precision chrono datetimes are copied field for field, offset
    /// included, and are treated as fully specified (microsecond
    /// precision). Chrono dates become full-date values. Time-only values,
    /// strings and other non-date inputs fail with
    /// [`FhirDateTimeError::InvalidType`].
    pub fn from_native<C: Comparand + ?Sized>(value: &C) -> Result<Self> {
        let operand = value.operand()?;
        calendar::check_year(operand.value().year())?;
        calendar::check_leap_second(&operand.value())?;
        Ok(Self {
            value: operand.value(),
            offset: operand.offset(),
            fold: false,
            precision: operand.precision(),
        })
    }

    /// Parse a FHIR `dateTime` string.
    ///
    /// Accepts `YYYY`, `YYYY-MM`, `YYYY-MM-DD` and
    /// `YYYY-MM-DDThh:mm[:ss[.f]][Z|±hh:mm]`. The precision is taken from
    /// the fields the string contains.
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = calendar::parse_iso(s)?;
        tracing::trace!(input = s, precision = ?parsed.precision, "parsed FHIR dateTime");
        Ok(Self {
            value: parsed.value,
            offset: parsed.offset,
            fold: false,
            precision: parsed.precision,
        })
    }

    fn from_validated(v: Validated) -> Self {
        Self {
            value: v.value,
            offset: v.offset,
            fold: v.fold,
            precision: v.precision,
        }
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn year(&self) -> i32 {
        self.value.year()
    }

    pub fn month(&self) -> Option<u32> {
        (self.precision >= Precision::Month).then(|| self.value.month())
    }

    pub fn day(&self) -> Option<u32> {
        (self.precision >= Precision::Day).then(|| self.value.day())
    }

    pub fn hour(&self) -> Option<u32> {
        self.precision.has_time().then(|| self.value.hour())
    }

    pub fn minute(&self) -> Option<u32> {
        self.precision.has_time().then(|| self.value.minute())
    }

    /// Seconds, 0 when unspecified.
    pub fn second(&self) -> u32 {
        self.value.second()
    }

    /// Microseconds, 0 when unspecified.
    pub fn microsecond(&self) -> u32 {
        micros_of(&self.value)
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub fn fold(&self) -> bool {
        self.fold
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The fields this value was declared with.
    pub fn fields(&self) -> DateTimeFields {
        DateTimeFields {
            year: self.year(),
            month: self.month(),
            day: self.day(),
            hour: self.hour(),
            minute: self.minute(),
            second: (self.precision >= Precision::Second).then(|| self.second()),
            microsecond: (self.precision >= Precision::Microsecond).then(|| self.microsecond()),
            offset: self.offset,
            fold: self.fold,
        }
    }

    /// A copy with some fields overridden, validated from scratch.
    ///
    /// ```
    /// use fhir_datetime::{PartialDateTime, Precision};
    ///
    /// let dt = PartialDateTime::from_ymd_hm(2020, 1, 6, 12, 30).unwrap();
    /// let finer = dt.replace(|f| f.second = Some(8)).unwrap();
    /// assert_eq!(finer.precision(), Precision::Second);
    /// assert!(dt.replace(|f| f.minute = None).is_err());
    /// ```
    pub fn replace(&self, edit: impl FnOnce(&mut DateTimeFields)) -> Result<Self> {
        let mut fields = self.fields();
        edit(&mut fields);
        Self::new(fields)
    }

    /// Positional access to `[year, month, day, hour, minute, second, microsecond]`.
    pub fn get(&self, index: usize) -> Result<Option<u32>> {
        field_at(&self.value, self.precision, index, Self::FIELD_COUNT)
    }

    // ── Conversions ────────────────────────────────────────────────────

    /// The date portion, at no more than full-date precision.
    pub fn date(&self) -> PartialDate {
        PartialDate::from_parts(self.value.date(), self.precision.min(Precision::Day))
    }

    /// The chrono wall-clock value, unspecified fields defaulted to 1 or 0.
    pub fn to_naive_datetime(&self) -> NaiveDateTime {
        self.value
    }

    pub fn to_naive_date(&self) -> NaiveDate {
        self.value.date()
    }

    /// The chrono instant, when this value carries an offset.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset?;
        offset.from_local_datetime(&self.value).single()
    }

    pub fn weekday(&self) -> Option<Weekday> {
        (self.precision >= Precision::Day).then(|| self.value.weekday())
    }

    pub fn iso_week(&self) -> Option<IsoWeek> {
        (self.precision >= Precision::Day).then(|| self.value.iso_week())
    }

    /// Key for stable sorting; see [`SortKey`].
    pub fn sort_key(&self) -> SortKey {
        Operand::new(self.value, self.offset, self.precision).sort_key()
    }

    pub fn to_string_with(&self, options: &FormatOptions) -> String {
        rendered(self.value, self.offset, self.precision, options).to_string()
    }
}

impl fmt::Display for PartialDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = FormatOptions::default();
        write!(
            f,
            "{}",
            rendered(self.value, self.offset, self.precision, &options)
        )
    }
}

impl FromStr for PartialDateTime {
    type Err = FhirDateTimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<PartialDate> for PartialDateTime {
    fn from(date: PartialDate) -> Self {
        Self {
            value: date.to_naive_date().and_time(chrono::NaiveTime::MIN),
            offset: None,
            fold: false,
            precision: date.precision(),
        }
    }
}

impl TryFrom<NaiveDateTime> for PartialDateTime {
    type Error = FhirDateTimeError;

    fn try_from(value: NaiveDateTime) -> Result<Self> {
        Self::from_native(&value)
    }
}

impl<Tz: TimeZone> TryFrom<DateTime<Tz>> for PartialDateTime {
    type Error = FhirDateTimeError;

    fn try_from(value: DateTime<Tz>) -> Result<Self> {
        Self::from_native(&value)
    }
}

impl Serialize for PartialDateTime {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDateTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PartialDateTime::parse(&s).map_err(de::Error::custom)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
