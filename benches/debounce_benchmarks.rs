use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gpio_watch::watch::evaluate;
use gpio_watch::{EdgeMode, LineValue, WatchedLine};
use std::time::Duration;

/// Benchmark one evaluation per edge mode on an alternating input
fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    for edge in [
        EdgeMode::Rising,
        EdgeMode::Falling,
        EdgeMode::Both,
        EdgeMode::Switch,
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(edge), &edge, |b, &edge| {
            let mut line = WatchedLine::new(4, edge, LineValue::Low);
            let mut tick = 0u64;
            b.iter(|| {
                tick += 1;
                let value = if tick % 2 == 0 {
                    LineValue::Low
                } else {
                    LineValue::High
                };
                evaluate(
                    black_box(&mut line),
                    black_box(value),
                    Duration::from_millis(tick * 700),
                )
            })
        });
    }

    group.finish();
}

/// Benchmark a burst of switch bounces, most of which land in the window
fn bench_switch_bounce_storm(c: &mut Criterion) {
    let readings: Vec<(Duration, LineValue)> = (0..1_000u64)
        .map(|i| {
            let value = if i % 2 == 0 {
                LineValue::High
            } else {
                LineValue::Low
            };
            (Duration::from_millis(i * 3), value)
        })
        .collect();

    c.bench_function("switch_bounce_storm", |b| {
        b.iter(|| {
            let mut line = WatchedLine::new(4, EdgeMode::Switch, LineValue::Low);
            readings
                .iter()
                .filter(|(now, value)| evaluate(&mut line, *value, *now).is_some())
                .count()
        })
    });
}

criterion_group!(benches, bench_evaluate, bench_switch_bounce_storm);
criterion_main!(benches);
