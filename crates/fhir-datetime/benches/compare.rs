use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};
use fhir_datetime::{compare, sort_by_path, PartialDate, PartialDateTime};
use serde_json::{json, Value};

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    group.bench_function("year", |b| {
        b.iter(|| PartialDateTime::parse(black_box("2021")))
    });

    group.bench_function("date", |b| {
        b.iter(|| PartialDate::parse(black_box("2021-04-12")))
    });

    group.bench_function("datetime_with_offset", |b| {
        b.iter(|| PartialDateTime::parse(black_box("2020-02-29T19:00:02.123456-10:00")))
    });

    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");

    let year = PartialDateTime::parse("2020").unwrap();
    let aware = PartialDateTime::parse("2020-02-29T19:00:02-10:00").unwrap();
    let utc = PartialDateTime::parse("2020-03-01T05:00:02Z").unwrap();
    let native = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();

    group.bench_function("truncated_to_year", |b| {
        b.iter(|| compare(black_box(&year), black_box(&aware)))
    });

    group.bench_function("aware_in_utc", |b| {
        b.iter(|| compare(black_box(&aware), black_box(&utc)))
    });

    group.bench_function("against_chrono", |b| {
        b.iter(|| compare(black_box(&aware), black_box(&native)))
    });

    group.finish();
}

fn bench_sort(c: &mut Criterion) {
    let documents: Vec<Value> = (0..1_000)
        .map(|i| {
            let start = match i % 3 {
                0 => format!("{}", 1900 + i % 120),
                1 => format!("{}-{:02}", 1900 + i % 120, 1 + i % 12),
                _ => format!("{}-{:02}-{:02}", 1900 + i % 120, 1 + i % 12, 1 + i % 28),
            };
            json!({"period": {"start": start}})
        })
        .collect();

    c.bench_function("sort_by_path/1000", |b| {
        b.iter(|| sort_by_path(black_box(documents.clone()), Some("period.start")))
    });
}

criterion_group!(benches, bench_parse, bench_compare, bench_sort);
criterion_main!(benches);
