use contesa::scenario::Scenario;
use contesa::settings::Settings;
use contesa::store::{MemoryStore, StoreConfig};
use contesa::strategy::Strategy;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const NUM_THREADS: usize = 8;
const INCREMENTS_PER_THREAD: u64 = 2_000;

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_counter");
    group.sample_size(20);

    let store = MemoryStore::connect(StoreConfig::default()).unwrap();
    let settings = Settings::new(NUM_THREADS, INCREMENTS_PER_THREAD);

    for strategy in Strategy::ALL {
        group.bench_function(
            BenchmarkId::new(
                strategy.name(),
                format!("{}threads x {}incr", NUM_THREADS, INCREMENTS_PER_THREAD),
            ),
            |b| {
                b.iter(|| {
                    let scenario = Scenario::new(strategy, &settings);
                    scenario.reset(&store, &settings).unwrap();
                    black_box(scenario.run(&store, &settings).unwrap().observed_value)
                })
            },
        );
    }

    group.finish();
}

fn bench_atomic_batching(c: &mut Criterion) {
    let mut group = c.benchmark_group("atomic_batching");
    group.sample_size(20);

    let store = MemoryStore::connect(StoreConfig::default()).unwrap();

    for batch in [1u64, 10, 100, 1_000] {
        let settings = Settings::new(NUM_THREADS, INCREMENTS_PER_THREAD).with_batch_size(batch);
        group.bench_with_input(BenchmarkId::new("batch", batch), &settings, |b, settings| {
            b.iter(|| {
                let scenario = Scenario::new(Strategy::Atomic, settings);
                scenario.reset(&store, settings).unwrap();
                black_box(scenario.run(&store, settings).unwrap().observed_value)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_atomic_batching);
criterion_main!(benches);
