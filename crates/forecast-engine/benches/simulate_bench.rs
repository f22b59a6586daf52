use criterion::{black_box, criterion_group, criterion_main, Criterion};
use forecast_engine::*;

fn ten_year_subscription() -> SimulationParameters {
    SimulationParameters {
        horizon_months: Some(f64::from(MAX_HORIZON_MONTHS)),
        growth_model: Some(GrowthInput::compound(1_000.0, 0.08)),
        monetization_model: Some(MonetizationInput::subscription(12.0, 0.05, 40.0)),
        ..SimulationParameters::quick_start()
    }
}

fn bench_simulate(c: &mut Criterion) {
    let quick = SimulationParameters::quick_start();
    c.bench_function("simulate quick start (12 months)", |b| {
        b.iter(|| black_box(simulate(black_box(&quick))))
    });

    let long = ten_year_subscription();
    c.bench_function("simulate subscription (120 months)", |b| {
        b.iter(|| black_box(simulate(black_box(&long))))
    });
}

criterion_group!(benches, bench_simulate);
criterion_main!(benches);
