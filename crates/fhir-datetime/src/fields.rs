//! Explicit-field construction and the field-dependency state machine.
//!
//! A value is built by climbing the precision chain
//! `Year → Month → Day → HourMinute → Second → Microsecond` one level at a
//! time. Each level may only be entered from the level directly below it,
//! so a field supplied without its parent is rejected before any range
//! check runs.

use chrono::{FixedOffset, NaiveDateTime, NaiveTime};

use crate::calendar;
use crate::error::{FhirDateTimeError, Result};
use crate::precision::Precision;

/// Fields of a FHIR `date`. `None` means "not specified".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateFields {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// Fields of a FHIR `dateTime`. `None` means "not specified".
///
/// `second` and `microsecond` read back as zero when omitted, but omitting
/// them keeps the declared precision coarser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateTimeFields {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
    pub microsecond: Option<u32>,
    pub offset: Option<FixedOffset>,
    /// Picks the later of two repeated wall-clock readings; only meaningful without an offset.
    pub fold: bool,
}

impl From<DateFields> for DateTimeFields {
    fn from(fields: DateFields) -> Self {
        DateTimeFields {
            year: fields.year,
            month: fields.month,
            day: fields.day,
            ..Default::default()
        }
    }
}

/// The outcome of a successful validation: the chrono value with every
/// unspecified field at its minimum, plus the declared precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Validated {
    pub value: NaiveDateTime,
    pub offset: Option<FixedOffset>,
    pub fold: bool,
    pub precision: Precision,
}

impl DateFields {
    pub(crate) fn validate(&self) -> Result<Validated> {
        DateTimeFields::from(*self).validate()
    }
}

impl DateTimeFields {
    /// Run the presence chain, then the range checks, then the chrono round-trip.
    pub(crate) fn validate(&self) -> Result<Validated> {
        let precision = self.declared_precision().inspect_err(|e| {
            tracing::debug!(fields = ?self, error = %e, "rejected field combination");
        })?;
        self.check_ranges(precision).inspect_err(|e| {
            tracing::debug!(fields = ?self, error = %e, "rejected field value");
        })?;

        let date = calendar::date_from_parts(
            self.year,
            self.month.unwrap_or(1),
            self.day.unwrap_or(1),
        )?;
        let time = match (self.hour, self.minute) {
            (Some(hour), Some(minute)) => calendar::time_from_parts(
                hour,
                minute,
                self.second.unwrap_or(0),
                self.microsecond.unwrap_or(0),
            )?,
            _ => NaiveTime::MIN,
        };

        Ok(Validated {
            value: date.and_time(time),
            offset: self.offset,
            fold: self.fold,
            precision,
        })
    }

    /// Walk the chain and return the highest level reached.
    fn declared_precision(&self) -> Result<Precision> {
        let mut reached = Precision::Year;

        if self.month.is_some() {
            reached = Precision::Month;
        }
        if self.day.is_some() {
            require(reached, Precision::Month, "day requires month")?;
            reached = Precision::Day;
        }
        match (self.hour.is_some(), self.minute.is_some()) {
            (true, true) => {
                require(reached, Precision::Day, "a time of day requires year, month and day")?;
                reached = Precision::HourMinute;
            }
            (true, false) => return Err(missing("hour requires minute")),
            (false, true) => return Err(missing("minute requires hour")),
            (false, false) => {}
        }
        if self.second.is_some() {
            require(reached, Precision::HourMinute, "second requires hour and minute")?;
            reached = Precision::Second;
        }
        if self.microsecond.is_some() {
            require(reached, Precision::Second, "microsecond requires second")?;
            reached = Precision::Microsecond;
        }
        if self.offset.is_some() && !reached.has_time() {
            return Err(missing("a timezone offset requires hour and minute"));
        }

        Ok(reached)
    }

    fn check_ranges(&self, precision: Precision) -> Result<()> {
        calendar::check_year(self.year)?;
        if let Some(month) = self.month {
            calendar::check_month(month)?;
            if let Some(day) = self.day {
                calendar::check_day(self.year, month, day)?;
            }
        }
        if precision.has_time() {
            calendar::check_bounded("hour", self.hour.unwrap_or(0), 23)?;
            calendar::check_bounded("minute", self.minute.unwrap_or(0), 59)?;
            calendar::check_bounded("second", self.second.unwrap_or(0), 59)?;
            calendar::check_bounded("microsecond", self.microsecond.unwrap_or(0), 999_999)?;
        }
        Ok(())
    }
}

fn require(reached: Precision, needed: Precision, message: &str) -> Result<()> {
    if reached >= needed {
        Ok(())
    } else {
        Err(missing(message))
    }
}

fn missing(message: &str) -> FhirDateTimeError {
    FhirDateTimeError::MissingField(message.to_string())
}
