//! Single-battle throughput on the built-in sample armies.
//!
//! Run with: `cargo bench --bench simulator`

use battlecast::combat::{simulate_battle, Rng, SimulationConfig, TraceMode};
use battlecast::data::sample_scenario;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

fn bench_simulator(c: &mut Criterion) {
    let (attacker, defender) = sample_scenario()
        .build_armies()
        .expect("sample scenario is valid");

    let mut group = c.benchmark_group("simulator");
    group.sample_size(100);
    group.throughput(Throughput::Elements(1));

    for (label, max_turns, trace_mode) in [
        ("battle_5_turns", 5u32, TraceMode::Off),
        ("battle_100_turns", 100, TraceMode::Off),
        ("battle_100_turns_traced", 100, TraceMode::Events),
    ] {
        let config = SimulationConfig {
            max_turns,
            trace_mode,
            ..SimulationConfig::default()
        };
        group.bench_function(label, |b| {
            b.iter_batched(
                || (attacker.clone(), defender.clone()),
                |(a, d)| black_box(simulate_battle(a, d, config, Rng::new(7))),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simulator);
criterion_main!(benches);
