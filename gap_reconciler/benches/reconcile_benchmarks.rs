use chrono::{Duration, NaiveDate, NaiveDateTime};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gap_reconciler::{CountryMatrix, GapPolicy, Reconciler};
use std::collections::BTreeMap;

/// One month of quarter-hour data for a handful of sources, with holes.
fn sample_matrix() -> CountryMatrix {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let steps = 96 * 31;

    let mut columns = BTreeMap::new();
    for (k, origin) in ["Solar", "Wind Onshore", "Fossil Gas", "Nuclear"].iter().enumerate() {
        let points: Vec<(NaiveDateTime, Option<f32>)> = (0..steps)
            .filter(|i| !(i % 500 < 3 || (1200 + k * 10..1400 + k * 10).contains(i)))
            .map(|i| {
                let hour = (i / 4 % 24) as f32;
                (start + Duration::minutes(15 * i as i64), Some(100.0 + hour * (k + 1) as f32))
            })
            .collect();
        columns.insert(origin.to_string(), points);
    }
    CountryMatrix::from_columns("CH", columns)
}

fn benchmark_reconcile(c: &mut Criterion) {
    let matrix = sample_matrix();
    let reconciler = Reconciler::new(GapPolicy::default());

    c.bench_function("reconcile_one_month", |b| {
        b.iter(|| {
            let mut matrix = matrix.clone();
            black_box(reconciler.reconcile_country(&mut matrix));
        });
    });
}

fn benchmark_detect_only(c: &mut Criterion) {
    let matrix = sample_matrix();
    let reconciler = Reconciler::new(GapPolicy::ignoring());

    c.bench_function("detect_one_month", |b| {
        b.iter(|| {
            let mut matrix = matrix.clone();
            black_box(reconciler.reconcile_country(&mut matrix));
        });
    });
}

criterion_group!(benches, benchmark_reconcile, benchmark_detect_only);
criterion_main!(benches);
