use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use twin_match_core::{DeckGenerator, RandomDeckGenerator, RoundEngine, RoundRules, grid_size};

const BAND_LEVELS: [u32; 5] = [1, 12, 27, 38, 200];

fn deck_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("deck_generation");
    for level in BAND_LEVELS {
        let grid = grid_size(level);
        let label = format!("L{level}_{}x{}", grid.rows, grid.cols);
        group.bench_with_input(BenchmarkId::from_parameter(label), &level, |b, &level| {
            let mut generator = RandomDeckGenerator::new(0x5eed);
            b.iter(|| black_box(generator.generate(black_box(level))));
        });
    }
    group.finish();
}

fn round_solve(c: &mut Criterion) {
    let mut generator = RandomDeckGenerator::new(0x5eed);
    let Ok(deck) = generator.generate(200) else {
        return;
    };
    let pairs = (deck.total_pairs() as u16).max(1);

    c.bench_function("round_solve_L200", |b| {
        b.iter(|| {
            let mut engine = RoundEngine::new(200, deck.clone(), RoundRules::default());
            let mut now = 0;
            engine.start(now);
            for pair in 0..pairs {
                engine.flip(2 * pair, now);
                engine.flip(2 * pair + 1, now);
                now += 1000;
                black_box(engine.advance(now));
            }
            black_box(engine.is_complete())
        });
    });
}

criterion_group!(benches, deck_generation, round_solve);
criterion_main!(benches);
