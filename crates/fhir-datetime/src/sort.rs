//! Sort keys for lists of FHIR dates, and of JSON resources that contain them.
//!
//! The comparator reads wall-clock fields whenever one side has no time of
//! day, and UTC only when both sides carry a time and an offset. A key
//! therefore holds both readings: the wall-clock date and the UTC-normalised
//! lower-bound instant. Keys order by the date first, which agrees with the
//! comparator for every pair involving a date-only or naive value.
//!
//! Two aware times whose wall-clock dates fall on either side of midnight
//! can disagree with their UTC order. The list helpers [`sort_by_path`] and
//! [`sort_by_comparand`] see the whole list and order by the instant alone
//! when it holds no date-only values, and they reject a list mixing times
//! with and without an offset, as the comparator does.
//!
//! Values the comparator calls equal at the same precision get equal keys,
//! so a stable sort keeps them in input order.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::compare::Comparand;
use crate::datetime::PartialDateTime;
use crate::error::{FhirDateTimeError, Result};

/// Which reading of a value the comparator will use against other values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reading {
    /// No time of day.
    Date,
    /// A time of day without an offset.
    WallClock,
    /// A time of day with an offset.
    Utc,
}

#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    date: NaiveDate,
    instant: NaiveDateTime,
    reading: Reading,
}

impl SortKey {
    pub(crate) fn new(
        wall_clock: NaiveDateTime,
        instant: NaiveDateTime,
        has_time: bool,
        aware: bool,
    ) -> Self {
        let reading = match (has_time, aware) {
            (false, _) => Reading::Date,
            (true, false) => Reading::WallClock,
            (true, true) => Reading::Utc,
        };
        Self {
            date: wall_clock.date(),
            instant,
            reading,
        }
    }

    /// Key for any comparand.
    pub fn of<C: Comparand + ?Sized>(value: &C) -> Result<Self> {
        value.operand().map(|operand| operand.sort_key())
    }

    /// The wall-clock date, unspecified month and day at 1.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The earliest instant the value stands for, in UTC when it has an offset.
    pub fn instant(&self) -> NaiveDateTime {
        self.instant
    }

    fn rank(&self, by_date: bool) -> (Option<NaiveDate>, NaiveDateTime) {
        (by_date.then_some(self.date), self.instant)
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank(true).cmp(&other.rank(true))
    }
}

impl Hash for SortKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank(true).hash(state);
    }
}

/// Decide how a whole list is ordered, or why it cannot be.
///
/// Returns whether the wall-clock date must lead the key.
fn order_by_date(keys: &[SortKey]) -> Result<bool> {
    let has = |reading| keys.iter().any(|key| key.reading == reading);
    if has(Reading::Utc) && has(Reading::WallClock) {
        tracing::debug!(len = keys.len(), "list mixes naive and aware times");
        return Err(FhirDateTimeError::Incomparable(
            "cannot sort times with a UTC offset together with times without one".to_string(),
        ));
    }
    Ok(has(Reading::Date))
}

/// A key function over JSON documents.
///
/// With `None` the document itself must be a FHIR date or dateTime string.
/// With `Some("period.start")` the key is taken from the nested field;
/// numeric segments index into arrays (`"identifier.0.period.start"`).
///
/// # Examples
///
/// ```
/// use fhir_datetime::sort_key;
/// use serde_json::json;
///
/// let key = sort_key(Some("period.start"));
/// let early = json!({"period": {"start": "2021"}});
/// let late = json!({"period": {"start": "2021-04-12"}});
/// assert!(key(&early).unwrap() < key(&late).unwrap());
/// assert!(key(&json!({"period": {}})).is_err());
/// ```
pub fn sort_key<'a>(path: Option<&'a str>) -> impl Fn(&Value) -> Result<SortKey> + 'a {
    move |item: &Value| {
        let leaf = match path {
            Some(path) => project(item, path)?,
            None => item,
        };
        match leaf {
            Value::String(s) => Ok(PartialDateTime::parse(s)?.sort_key()),
            other => SortKey::of(other),
        }
    }
}

/// Stable-sort JSON documents by the date at `path`.
///
/// Every key is computed before anything moves, so a document without a
/// usable date, or a list mixing naive and aware times, leaves the input
/// untouched and reports the error.
pub fn sort_by_path(items: Vec<Value>, path: Option<&str>) -> Result<Vec<Value>> {
    let key = sort_key(path);
    let keys = items.iter().map(&key).collect::<Result<Vec<_>>>()?;
    let by_date = order_by_date(&keys)?;

    let mut keyed: Vec<(SortKey, Value)> = keys.into_iter().zip(items).collect();
    keyed.sort_by_key(|(key, _)| key.rank(by_date));
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Stable-sort typed records by a date-like field they hold.
///
/// ```
/// use fhir_datetime::{sort_by_comparand, PartialDateTime};
///
/// struct Period { start: PartialDateTime }
/// struct CarePlan { period: Period }
///
/// let plan = |s: &str| CarePlan { period: Period { start: s.parse().unwrap() } };
/// let mut plans = vec![plan("2021-04"), plan("2021"), plan("2021-04-12")];
/// sort_by_comparand(&mut plans, |p| &p.period.start).unwrap();
///
/// let order: Vec<String> = plans.iter().map(|p| p.period.start.to_string()).collect();
/// assert_eq!(order, ["2021", "2021-04", "2021-04-12"]);
/// ```
pub fn sort_by_comparand<T, C, F>(items: &mut [T], key: F) -> Result<()>
where
    C: Comparand + ?Sized,
    F: Fn(&T) -> &C,
{
    let keys = items
        .iter()
        .map(|item| SortKey::of(key(item)))
        .collect::<Result<Vec<_>>>()?;
    let by_date = order_by_date(&keys)?;
    items.sort_by_cached_key(|item| SortKey::of(key(item)).ok().map(|k| k.rank(by_date)));
    Ok(())
}

fn project<'v>(item: &'v Value, path: &str) -> Result<&'v Value> {
    path.split('.').try_fold(item, |node, segment| {
        let next = match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        next.ok_or_else(|| {
            FhirDateTimeError::InvalidType(format!("no value at '{segment}' of path '{path}'"))
        })
    })
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn parse_all(items: &[&str]) -> Vec<PartialDateTime> {
        items.iter().map(|s| s.parse().unwrap()).collect()
    }

    fn render(items: &[PartialDateTime]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_sort_top_level_values() {
        let mut values = parse_all(&["2021-04", "2021", "2021-04-12"]);
        values.sort_by_key(PartialDateTime::sort_key);
        assert_eq!(render(&values), ["2021", "2021-04", "2021-04-12"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let mut values = parse_all(&["2021-01", "2021", "2021-01-01", "2020"]);
        values.sort_by_key(PartialDateTime::sort_key);
        assert_eq!(render(&values), ["2020", "2021-01", "2021", "2021-01-01"]);
    }

    #[test]
    fn test_sort_key_reads_wall_date_against_date_only_values() {
        let mut values = parse_all(&["2021", "2020-12-31T23:00-10:00"]);
        assert_eq!(compare(&values[1], &values[0]).unwrap(), Ordering::Less);
        values.sort_by_key(PartialDateTime::sort_key);
        assert_eq!(render(&values), ["2020-12-31T23:00-10:00", "2021"]);

        let mut values = parse_all(&["2021", "2020-12-31T23:00-10:00"]);
        sort_by_comparand(&mut values, |v| v).unwrap();
        assert_eq!(render(&values), ["2020-12-31T23:00-10:00", "2021"]);
    }

    #[test]
    fn test_sort_by_comparand_orders_aware_times_in_utc() {
        // 09:00 UTC on the 2nd, then 05:00 UTC on the 2nd.
        let mut values = parse_all(&["2020-01-01T23:00-10:00", "2020-01-02T05:00Z"]);
        assert_eq!(compare(&values[1], &values[0]).unwrap(), Ordering::Less);
        sort_by_comparand(&mut values, |v| v).unwrap();
        assert_eq!(
            render(&values),
            ["2020-01-02T05:00+00:00", "2020-01-01T23:00-10:00"]
        );
    }

    #[test]
    fn test_equal_aware_times_keep_input_order() {
        let mut values = parse_all(&["2020-03-01T05:00:02Z", "2020-02-29T19:00:02-10:00"]);
        sort_by_comparand(&mut values, |v| v).unwrap();
        assert_eq!(
            render(&values),
            ["2020-03-01T05:00:02+00:00", "2020-02-29T19:00:02-10:00"]
        );
    }

    #[test]
    fn test_mixed_naive_and_aware_times_are_rejected() {
        let mut values = parse_all(&["2020-01-01T10:00+05:00", "2020-01-01T06:00"]);
        assert_eq!(
            compare(&values[0], &values[1]).unwrap_err().kind(),
            ErrorKind::Type
        );
        let err = sort_by_comparand(&mut values, |v| v).unwrap_err();
        assert!(matches!(err, FhirDateTimeError::Incomparable(_)));
        assert_eq!(render(&values), ["2020-01-01T10:00+05:00", "2020-01-01T06:00"]);

        let documents = vec![json!("2020-01-01T10:00+05:00"), json!("2020-01-01T06:00")];
        let err = sort_by_path(documents, None).unwrap_err();
        assert!(matches!(err, FhirDateTimeError::Incomparable(_)));
    }

    #[test]
    fn test_date_only_values_sort_with_either_kind_of_time() {
        let mut naive = parse_all(&["2021-01-02T00:00", "2021", "2020-12-31"]);
        sort_by_comparand(&mut naive, |v| v).unwrap();
        assert_eq!(render(&naive), ["2020-12-31", "2021", "2021-01-02T00:00"]);

        let mut aware = parse_all(&["2021-01-02T00:00Z", "2021", "2020-12-31"]);
        sort_by_comparand(&mut aware, |v| v).unwrap();
        assert_eq!(render(&aware), ["2020-12-31", "2021", "2021-01-02T00:00+00:00"]);
    }

    #[test]
    fn test_sort_by_path_on_embedded_documents() {
        let plans = vec![
            json!({"period": {"start": "2021-04", "end": null}}),
            json!({"period": {"start": "2021", "end": null}}),
            json!({"period": {"start": "2021-04-12", "end": null}}),
        ];
        let sorted = sort_by_path(plans, Some("period.start")).unwrap();
        let starts: Vec<&str> = sorted
            .iter()
            .map(|p| p["period"]["start"].as_str().unwrap())
            .collect();
        assert_eq!(starts, ["2021", "2021-04", "2021-04-12"]);
    }

    #[test]
    fn test_sort_by_path_without_path() {
        let values = vec![json!("2022"), json!("2021-06-01")];
        let sorted = sort_by_path(values, None).unwrap();
        assert_eq!(sorted, vec![json!("2021-06-01"), json!("2022")]);
    }

    #[test]
    fn test_sort_by_path_indexes_arrays() {
        let key = sort_key(Some("period.1"));
        let doc = json!({"period": ["1999", "2001-02"]});
        assert_eq!(
            key(&doc).unwrap(),
            PartialDateTime::parse("2001-02").unwrap().sort_key()
        );
    }

    #[test]
    fn test_sort_by_path_reports_missing_and_non_string_fields() {
        let missing = vec![json!({"period": {"start": "2021"}}), json!({"period": {}})];
        let err = sort_by_path(missing, Some("period.start")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let numeric = vec![json!({"period": {"start": 2021}})];
        let err = sort_by_path(numeric, Some("period.start")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let malformed = vec![json!({"period": {"start": "2021-13"}})];
        let err = sort_by_path(malformed, Some("period.start")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn test_sort_by_comparand_over_chrono_values() {
        use chrono::NaiveDate;

        struct Visit {
            on: NaiveDate,
        }
        let visit = |y, m, d| Visit {
            on: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        };
        let mut visits = vec![visit(2021, 5, 1), visit(2020, 1, 1), visit(2021, 1, 1)];
        sort_by_comparand(&mut visits, |v| &v.on).unwrap();
        let years: Vec<String> = visits.iter().map(|v| v.on.to_string()).collect();
        assert_eq!(years, ["2020-01-01", "2021-01-01", "2021-05-01"]);
    }

    #[test]
    fn test_sort_by_comparand_rejects_foreign_keys_without_moving() {
        let mut labels = vec!["b".to_string(), "a".to_string()];
        let err = sort_by_comparand(&mut labels, |s| s.as_str()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
        assert_eq!(labels, ["b", "a"]);
    }
}
