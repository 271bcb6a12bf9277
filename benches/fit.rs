use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dosefit::fit::logistic4;
use dosefit::prelude::*;

fn synthetic_series(n_points: usize) -> BatchSeries {
    let truth = LogisticParams::new(95.0, 5.0, 10.0, 1.2);
    let mut series = BatchSeries::new("bench", None, Some(truth.c), Some(truth.d));
    for i in 0..n_points {
        let conc = 0.1 * 3.0_f64.powi(i as i32);
        series.add_point(conc, logistic4(conc, &truth));
    }
    series
}

fn bench_fit(c: &mut Criterion) {
    let options = FitOptions::default();

    let five = synthetic_series(5);
    c.bench_function("fit_5_points", |b| {
        b.iter(|| fit_series(black_box(&five), &options))
    });

    let ten = synthetic_series(10);
    c.bench_function("fit_10_points", |b| {
        b.iter(|| fit_series(black_box(&ten), &options))
    });
}

criterion_group!(benches, bench_fit);
criterion_main!(benches);
