//! FHIR `date`: a year, optionally refined to a month and a day.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, IsoWeek, NaiveDate, NaiveTime, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::calendar;
use crate::compare::{Comparand, Operand};
use crate::error::{FhirDateTimeError, Result};
use crate::fields::{DateFields, Validated};
use crate::format::{rendered, FormatOptions};
use crate::precision::{field_at, Precision};
use crate::sort::SortKey;

/// A FHIR `date` of year, year-month or full-date precision.
///
/// Comparison truncates at the coarser operand, so `2021` equals `2021-04`.
/// That makes `==` intransitive across precisions; the type deliberately
/// does not implement `Eq` or `Hash`.
///
/// # Examples
///
/// ```
/// use fhir_datetime::{PartialDate, Precision};
///
/// let d = PartialDate::from_ym(2021, 4).unwrap();
/// assert_eq!(d.precision(), Precision::Month);
/// assert_eq!(d.day(), None);
/// assert_eq!(d.to_string(), "2021-04");
/// assert!(d == PartialDate::from_year(2021).unwrap());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PartialDate {
    /// Unspecified month/day are stored as 1.
    value: NaiveDate,
    precision: Precision,
}

impl PartialDate {
    /// Number of positions reachable through [`PartialDate::get`].
    pub const FIELD_COUNT: usize = 3;

    pub fn new(fields: DateFields) -> Result<Self> {
        fields.validate().map(Self::from_validated)
    }

    pub fn from_year(year: i32) -> Result<Self> {
        Self::new(DateFields {
            year,
            ..Default::default()
        })
    }

    pub fn from_ym(year: i32, month: u32) -> Result<Self> {
        Self::new(DateFields {
            year,
            month: Some(month),
            day: None,
        })
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        Self::new(DateFields {
            year,
            month: Some(month),
            day: Some(day),
        })
    }

    /// Build from a date-shaped value such as a [`NaiveDate`].
    ///
    /// The result has the precision of the source (full-date for chrono
    /// dates). Values that carry a time of day are rejected with
    /// [`FhirDateTimeError::InvalidType`], as is anything that is not a date.
    pub fn from_native<C: Comparand + ?Sized>(value: &C) -> Result<Self> {
        let operand = value.operand()?;
        if operand.precision().has_time() {
            return Err(FhirDateTimeError::InvalidType(
                "expected a date, found a value with a time of day".to_string(),
            ));
        }
        let date = operand.value().date();
        calendar::check_year(date.year())?;
        Ok(Self {
            value: date,
            precision: operand.precision(),
        })
    }

    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self> {
        let parsed = calendar::parse_iso(s)?;
        if parsed.precision.has_time() {
            return Err(FhirDateTimeError::Parse(format!(
                "'{s}': a FHIR date has no time of day"
            )));
        }
        tracing::trace!(input = s, precision = ?parsed.precision, "parsed FHIR date");
        Ok(Self {
            value: parsed.value.date(),
            precision: parsed.precision,
        })
    }

    fn from_validated(v: Validated) -> Self {
        Self::from_parts(v.value.date(), v.precision)
    }

    /// `value` must already be validated and `precision` at most [`Precision::Day`].
    pub(crate) fn from_parts(value: NaiveDate, precision: Precision) -> Self {
        Self { value, precision }
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

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The fields this value was declared with.
    pub fn fields(&self) -> DateFields {
        DateFields {
            year: self.year(),
            month: self.month(),
            day: self.day(),
        }
    }

    /// A copy with some fields overridden, validated from scratch.
    ///
    /// ```
    /// use fhir_datetime::PartialDate;
    ///
    /// let d = PartialDate::from_ym(2021, 4).unwrap();
    /// let refined = d.replace(|f| f.day = Some(12)).unwrap();
    /// assert_eq!(refined.to_string(), "2021-04-12");
    /// assert!(d.replace(|f| f.month = None).is_ok());
    /// assert!(d.replace(|f| f.day = Some(31)).is_err());
    /// ```
    pub fn replace(&self, edit: impl FnOnce(&mut DateFields)) -> Result<Self> {
        let mut fields = self.fields();
        edit(&mut fields);
        Self::new(fields)
    }

    /// Positional access to `[year, month, day]`.
    pub fn get(&self, index: usize) -> Result<Option<u32>> {
        field_at(
            &self.value.and_time(NaiveTime::MIN),
            self.precision,
            index,
            Self::FIELD_COUNT,
        )
    }

    // ── Conversions ────────────────────────────────────────────────────

    /// The chrono date, with an unspecified month or day taken as 1.
    pub fn to_naive_date(&self) -> NaiveDate {
        self.value
    }

    /// Day of the week, known only at full-date precision.
    pub fn weekday(&self) -> Option<Weekday> {
        (self.precision >= Precision::Day).then(|| self.value.weekday())
    }

    /// ISO 8601 week, known only at full-date precision.
    pub fn iso_week(&self) -> Option<IsoWeek> {
        (self.precision >= Precision::Day).then(|| self.value.iso_week())
    }

    pub fn sort_key(&self) -> SortKey {
        Operand::new(self.value.and_time(NaiveTime::MIN), None, self.precision).sort_key()
    }

    pub fn to_string_with(&self, options: &FormatOptions) -> String {
        rendered(self.value.and_time(NaiveTime::MIN), None, self.precision, options).to_string()
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = FormatOptions::default();
        write!(
            f,
            "{}",
            rendered(self.value.and_time(NaiveTime::MIN), None, self.precision, &options)
        )
    }
}

impl FromStr for PartialDate {
    type Err = FhirDateTimeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<NaiveDate> for PartialDate {
    type Error = FhirDateTimeError;

    fn try_from(value: NaiveDate) -> Result<Self> {
        Self::from_native(&value)
    }
}

impl From<PartialDate> for NaiveDate {
    fn from(value: PartialDate) -> Self {
        value.to_naive_date()
    }
}

impl Serialize for PartialDate {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PartialDate {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PartialDate::parse(&s).map_err(de::Error::custom)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
