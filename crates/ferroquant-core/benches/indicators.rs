//! Benchmarks for the indicator and moving average engines.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ferroquant_core::{
    compute_indicators, compute_moving_averages, Bar, BarSeries, IndicatorOptions,
    MovingAverageOptions, Symbol, TradingDate,
};

fn create_series(size: usize) -> BarSeries {
    let start = TradingDate::parse("2015-01-01")
        .expect("date")
        .into_inner();
    let bars = (0..size)
        .map(|i| {
            let trend = i as f64 * 0.05;
            let noise = (i as f64 * 0.3).sin() * 3.0;
            let price = 100.0 + trend + noise;
            let date = start
                .checked_add(time::Duration::days(i as i64))
                .expect("in range");
            Bar::new(
                TradingDate::from_date(date),
                price,
                price + 2.0,
                price - 2.0,
                price,
                Some(1_000.0),
            )
            .expect("bar")
        })
        .collect();
    BarSeries::new(Symbol::parse("sh.600000").expect("symbol"), bars).expect("series")
}

fn bench_indicators(c: &mut Criterion) {
    let options = IndicatorOptions::default();
    let mut group = c.benchmark_group("Indicators");

    for size in [250, 1_000, 5_000] {
        let series = create_series(size);
        group.bench_with_input(BenchmarkId::new("all_eight", size), &series, |b, series| {
            b.iter(|| compute_indicators(black_box(series), black_box(&options)))
        });
    }

    group.finish();
}

fn bench_moving_averages(c: &mut Criterion) {
    let options = MovingAverageOptions::default();
    let mut group = c.benchmark_group("MovingAverages");

    for size in [250, 1_000, 5_000] {
        let series = create_series(size);
        group.bench_with_input(BenchmarkId::new("default_periods", size), &series, |b, series| {
            b.iter(|| compute_moving_averages(black_box(series), black_box(&options)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_moving_averages);
criterion_main!(benches);
