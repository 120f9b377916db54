//     ______     ______   ______     __         __
//    /\  ___\   /\__  _\ /\  __ \   /\ \       /\ \
//    \ \___  \  \/_/\ \/ \ \  __ \  \ \ \____  \ \ \____
//     \/\_____\    \ \_\  \ \_\ \_\  \ \_____\  \ \_____\
//      \/_____/     \/_/   \/_/\/_/   \/_____/   \/_____/
//
// Author: Colin MacRitchie / Ripple Group
// Benchmarks for observer registry dispatch and config validation
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use std::time::Duration;
use tokio_stall::{
    MonitorConfig, MonitorMetrics, NullObserver, ObserverRegistry, StallEvent, StallObserver,
};

// Mock observer for benchmarking
struct NoOpObserver;

impl StallObserver for NoOpObserver {
    fn on_stall(&self, _event: &StallEvent) {
        // Minimal work to measure overhead
        black_box(42);
    }
}

fn registry() -> ObserverRegistry {
    ObserverRegistry::new(Arc::new(NullObserver), Arc::new(MonitorMetrics::default()))
}

fn bench_dispatch(c: &mut Criterion) {
    let event = StallEvent {
        elapsed: Duration::from_millis(3500),
    };

    let mut group = c.benchmark_group("registry_dispatch");

    group.bench_function("reporter_only", |b| {
        let registry = registry();
        b.iter(|| {
            registry.dispatch(black_box(&event));
        });
    });

    group.bench_function("one_observer", |b| {
        let registry = registry();
        registry.subscribe(Arc::new(NoOpObserver));
        b.iter(|| {
            registry.dispatch(black_box(&event));
        });
    });

    group.bench_function("eight_observers", |b| {
        let registry = registry();
        for _ in 0..8 {
            registry.subscribe(Arc::new(NoOpObserver));
        }
        b.iter(|| {
            registry.dispatch(black_box(&event));
        });
    });

    group.finish();
}

fn bench_config_validate(c: &mut Criterion) {
    let config = MonitorConfig::default();

    c.bench_function("config_validate", |b| {
        b.iter(|| black_box(&config).validate().is_ok());
    });
}

criterion_group!(benches, bench_dispatch, bench_config_validate);
criterion_main!(benches);
