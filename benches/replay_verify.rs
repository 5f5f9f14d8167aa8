//! Criterion benchmarks for trace handling.
//!
//! Benchmarks:
//!   - parsing a multi-agent trace from text
//!   - verifying a recorded gem game by replay
//!
//! Run with: cargo bench --bench replay_verify

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rust_arcade::games::gems::GemGameBuilder;
use rust_arcade::{
    ActionRecord, Arcade, ControllerSpec, DriverConfig, HarnessConfig, RandomAgent, ReplayVerifier, WarmupConfig,
};

fn recorded_game(players: usize) -> ActionRecord {
    let arcade = Arcade::new(
        HarnessConfig::new()
            .with_warmup(WarmupConfig::disabled())
            .with_driver(DriverConfig::default().with_max_ticks(200)),
    )
    .expect("default config is valid");
    let controllers = (0..players)
        .map(|i| ControllerSpec::native(RandomAgent::new(i as u64)))
        .collect();
    let game = GemGameBuilder::new().player_count(players).size(12, 12).gems(20).build(42);
    let report = arcade.run_game(game, 42, controllers).expect("game runs");
    report.record().cloned().expect("run was recorded")
}

// ---------------------------------------------------------------------------
// Benchmark: text parsing
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let text = recorded_game(4).to_text();

    c.bench_function("trace_parse_4p", |b| {
        b.iter(|| black_box(ActionRecord::parse(black_box(&text))));
    });
}

// ---------------------------------------------------------------------------
// Benchmark: replay verification
// ---------------------------------------------------------------------------

fn bench_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_verify");
    let verifier = ReplayVerifier::new();

    for players in [1, 4] {
        let record = recorded_game(players);
        group.bench_function(format!("gems_{players}p"), |b| {
            b.iter(|| {
                black_box(verifier.verify(
                    |seed| GemGameBuilder::new().player_count(players).size(12, 12).gems(20).build(seed),
                    &record,
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_verify);
criterion_main!(benches);
