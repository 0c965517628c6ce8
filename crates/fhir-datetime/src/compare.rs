//! Precision-aware comparison of FHIR date and dateTime values.
//!
//! # Rules
//!
//! Both operands are first normalised into an [`Operand`]: a wall-clock
//! value with unspecified fields at their minimum, an optional offset, and a
//! precision. Full-precision chrono datetimes have [`Precision::Microsecond`],
//! chrono dates [`Precision::Day`].
//!
//! 1. Only the fields up to the coarser of the two precisions are compared,
//!    in the order year, month, day, hour, minute, second, microsecond. If
//!    they all match, the operands are equal, whatever finer fields the
//!    more precise operand carries. `2021` equals `2021-04-21T01:32:44Z`.
//! 2. When both operands have a time of day and both carry an offset, they
//!    are compared in UTC. When both have a time and neither has an offset,
//!    wall-clock fields are compared. A time with an offset against a time
//!    without one is [`FhirDateTimeError::Incomparable`].
//! 3. When either operand has no time of day, wall-clock fields are compared.
//!
//! The operand set is closed: partial values, chrono dates and datetimes.
//! Anything else (`str`, `NaiveTime`, JSON values) is rejected with
//! [`FhirDateTimeError::InvalidType`] instead of being coerced.
//!
//! # Operators
//!
//! `==` is `true` only for a successful comparison that yields `Equal`;
//! incomparable operands are simply unequal. `<`, `<=`, `>`, `>=` go
//! through `partial_cmp`, which returns `None` for incomparable operands.
//! Use [`Comparand::try_cmp`] and friends to see the error.

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone};
use serde_json::Value;

use crate::date::PartialDate;
use crate::datetime::PartialDateTime;
use crate::error::{FhirDateTimeError, Result};
use crate::precision::{Field, Precision};
use crate::sort::SortKey;

/// One side of a comparison, normalised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    value: NaiveDateTime,
    offset: Option<FixedOffset>,
    precision: Precision,
}

impl Operand {
    pub fn new(value: NaiveDateTime, offset: Option<FixedOffset>, precision: Precision) -> Self {
        Self {
            value,
            offset,
            precision,
        }
    }

    /// Wall-clock reading, unspecified fields at their minimum.
    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    pub fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// The value shifted to UTC when it carries an offset.
    fn utc(&self) -> NaiveDateTime {
        match self.offset {
            Some(offset) => self.value - offset,
            None => self.value,
        }
    }

    pub fn sort_key(&self) -> SortKey {
        SortKey::new(
            self.value,
            self.utc(),
            self.precision.has_time(),
            self.offset.is_some(),
        )
    }
}

/// A value that can take part in a precision-aware comparison.
///
/// Implemented for the partial types and chrono's date and datetime types.
/// It is also implemented, always failing, for inputs that look date-like
/// but must not be coerced, so the rejection is reported rather than
/// silently ordered.
pub trait Comparand {
    /// Normalise for comparison, or explain why this value cannot be compared.
    fn operand(&self) -> Result<Operand>;

    /// Three-way comparison; see the module docs for the rules.
    fn try_cmp<O: Comparand + ?Sized>(&self, other: &O) -> Result<Ordering> {
        compare(self, other)
    }

    /// Truncating equality. Never fails: incomparable operands are unequal.
    fn equals<O: Comparand + ?Sized>(&self, other: &O) -> bool {
        matches!(compare(self, other), Ok(Ordering::Equal))
    }

    fn try_lt<O: Comparand + ?Sized>(&self, other: &O) -> Result<bool> {
        compare(self, other).map(Ordering::is_lt)
    }

    fn try_le<O: Comparand + ?Sized>(&self, other: &O) -> Result<bool> {
        compare(self, other).map(Ordering::is_le)
    }

    fn try_gt<O: Comparand + ?Sized>(&self, other: &O) -> Result<bool> {
        compare(self, other).map(Ordering::is_gt)
    }

    fn try_ge<O: Comparand + ?Sized>(&self, other: &O) -> Result<bool> {
        compare(self, other).map(Ordering::is_ge)
    }
}

/// Compare any two comparands.
///
/// # Errors
///
/// [`FhirDateTimeError::InvalidType`] if either side is outside the closed
/// operand set, [`FhirDateTimeError::Incomparable`] if one side has an
/// offset and the other does not while both carry a time of day.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use chrono::NaiveDate;
/// use fhir_datetime::{compare, PartialDateTime};
///
/// let year = PartialDateTime::from_year(2022).unwrap();
/// let day = NaiveDate::from_ymd_opt(2021, 4, 21).unwrap();
/// assert_eq!(compare(&year, &day).unwrap(), Ordering::Greater);
/// assert!(compare(&year, "2022").is_err());
/// ```
pub fn compare<A, B>(a: &A, b: &B) -> Result<Ordering>
where
    A: Comparand + ?Sized,
    B: Comparand + ?Sized,
{
    compare_operands(&a.operand()?, &b.operand()?)
}

/// The comparison itself, once both sides are normalised.
pub fn compare_operands(a: &Operand, b: &Operand) -> Result<Ordering> {
    let common = a.precision.min(b.precision);

    let (left, right) = if a.precision.has_time() && b.precision.has_time() {
        match (a.offset, b.offset) {
            (Some(_), Some(_)) => (a.utc(), b.utc()),
            (None, None) => (a.value, b.value),
            _ => {
                tracing::debug!(left = ?a, right = ?b, "naive and aware times are not ordered");
                return Err(FhirDateTimeError::Incomparable(
                    "cannot compare a time with a UTC offset to a time without one".to_string(),
                ));
            }
        }
    } else {
        (a.value, b.value)
    };

    let ordering = Field::ALL[..common.field_count()]
        .iter()
        .map(|field| field.read(&left).cmp(&field.read(&right)))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal);
    Ok(ordering)
}

// ── Comparand implementations ───────────────────────────────────────────────

impl Comparand for PartialDateTime {
    fn operand(&self) -> Result<Operand> {
        Ok(Operand::new(
            self.to_naive_datetime(),
            self.offset(),
            self.precision(),
        ))
    }
}

impl Comparand for PartialDate {
    fn operand(&self) -> Result<Operand> {
        Ok(Operand::new(
            self.to_naive_date().and_time(NaiveTime::MIN),
            None,
            self.precision(),
        ))
    }
}

impl Comparand for NaiveDate {
    fn operand(&self) -> Result<Operand> {
        Ok(Operand::new(self.and_time(NaiveTime::MIN), None, Precision::Day))
    }
}

impl Comparand for NaiveDateTime {
    fn operand(&self) -> Result<Operand> {
        Ok(Operand::new(*self, None, Precision::Microsecond))
    }
}

impl<Tz: TimeZone> Comparand for DateTime<Tz> {
    fn operand(&self) -> Result<Operand> {
        Ok(Operand::new(
            self.naive_local(),
            Some(self.offset().fix()),
            Precision::Microsecond,
        ))
    }
}

impl Comparand for NaiveTime {
    fn operand(&self) -> Result<Operand> {
        Err(FhirDateTimeError::InvalidType(format!(
            "time of day {self} has no date"
        )))
    }
}

impl Comparand for str {
    fn operand(&self) -> Result<Operand> {
        Err(FhirDateTimeError::InvalidType(format!(
            "string '{self}' is not parsed implicitly"
        )))
    }
}

impl Comparand for String {
    fn operand(&self) -> Result<Operand> {
        self.as_str().operand()
    }
}

impl Comparand for Value {
    fn operand(&self) -> Result<Operand> {
        let kind = match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        };
        Err(FhirDateTimeError::InvalidType(format!(
            "JSON {kind} is not a date or dateTime"
        )))
    }
}

impl<T: Comparand + ?Sized> Comparand for &T {
    fn operand(&self) -> Result<Operand> {
        (**self).operand()
    }
}

// ── Operators ───────────────────────────────────────────────────────────────

macro_rules! impl_comparison_ops {
    ($(impl[$($generics:tt)*] $lhs:ty => $rhs:ty;)*) => {
        $(
            impl<$($generics)*> PartialEq<$rhs> for $lhs {
                fn eq(&self, other: &$rhs) -> bool {
                    self.equals(other)
                }
            }

            impl<$($generics)*> PartialOrd<$rhs> for $lhs {
                fn partial_cmp(&self, other: &$rhs) -> Option<Ordering> {
                    compare(self, other).ok()
                }
            }
        )*
    };
}

impl_comparison_ops! {
    impl[] PartialDateTime => PartialDateTime;
    impl[] PartialDateTime => PartialDate;
    impl[] PartialDateTime => NaiveDate;
    impl[] PartialDateTime => NaiveDateTime;
    impl[Tz: TimeZone] PartialDateTime => DateTime<Tz>;

    impl[] PartialDate => PartialDate;
    impl[] PartialDate => PartialDateTime;
    impl[] PartialDate => NaiveDate;
    impl[] PartialDate => NaiveDateTime;
    impl[Tz: TimeZone] PartialDate => DateTime<Tz>;

    impl[] NaiveDate => PartialDateTime;
    impl[] NaiveDate => PartialDate;
    impl[] NaiveDateTime => PartialDateTime;
    impl[] NaiveDateTime => PartialDate;
    impl[Tz: TimeZone] DateTime<Tz> => PartialDateTime;
    impl[Tz: TimeZone] DateTime<Tz> => PartialDate;
}

// ── Tests ───────────────────────────────────────────────────────────────────
