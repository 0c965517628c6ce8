//! # fhir-datetime
//!
//! Partial-precision date and dateTime values for FHIR.
//!
//! FHIR's `date` and `dateTime` primitives may stop at the year, the month,
//! the day, or carry a full time of day with an optional UTC offset. This
//! crate models those values, enforces FHIR's field-dependency rules at
//! construction, and compares them against each other and against chrono's
//! full-precision types by truncating at the coarser operand's precision.
//!
//! ## Modules
//!
//! - [`date`] — [`PartialDate`]: year, optional month, optional day
//! - [`datetime`] — [`PartialDateTime`]: a partial date plus optional time and offset
//! - [`fields`] — explicit-field inputs and the dependency state machine
//! - [`compare`] — the precision-aware comparator and the [`Comparand`] operand set
//! - [`sort`] — stable sort keys, including dotted-path keys over JSON documents
//! - [`precision`] — the declared-precision chain and field indexing
//! - [`format`] — FHIR string rendering options
//! - [`calendar`] — days-in-month table and ISO 8601 parsing over chrono
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use fhir_datetime::{PartialDateTime, Precision};
//!
//! let leap = PartialDateTime::parse("2020-02-29T19:00:02-10:00").unwrap();
//! let utc = PartialDateTime::parse("2020-03-01T05:00:02Z").unwrap();
//! assert!(leap == utc);
//!
//! let year = PartialDateTime::parse("2020").unwrap();
//! assert_eq!(year.precision(), Precision::Year);
//! assert!(year == leap);
//! ```

pub mod calendar;
pub mod compare;
pub mod date;
pub mod datetime;
pub mod error;
pub mod fields;
pub mod format;
pub mod precision;
pub mod sort;

pub use calendar::{days_in_month, is_leap_year, MAX_YEAR, MIN_YEAR};
pub use compare::{compare, compare_operands, Comparand, Operand};
pub use date::PartialDate;
pub use datetime::PartialDateTime;
pub use error::{ErrorKind, FhirDateTimeError, Result};
pub use fields::{DateFields, DateTimeFields};
pub use format::{FormatOptions, UtcStyle};
pub use precision::{Field, Precision};
pub use sort::{sort_by_comparand, sort_by_path, sort_key, SortKey};
