//! Benchmarks for per-tick work
//!
//! Tests the cost of what every tick repeats for an open event:
//! - EventBoard construction from the event's races
//! - Derived time calculation for one race
//! - Duel pairing over a full start list
//!
//! Platform: Cross-platform (synthetic fixtures, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use firingline::RaceMode;
use firingline::board::EventBoard;
use firingline::test_utils::busy_event;
use firingline::timing::RaceTimes;
use firingline::timing::pairing::pair_duels;
use std::hint::black_box;

fn bench_board_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("board_build");

    for (mode, count) in [(RaceMode::Sprint, 60), (RaceMode::Pursuit, 60), (RaceMode::Individual, 120)] {
        let (event, races) = busy_event(mode, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new(mode.as_str(), count), &races, |b, races| {
            b.iter(|| black_box(EventBoard::build(black_box(&event), black_box(races), 900_000)))
        });
    }

    group.finish();
}

fn bench_race_times(c: &mut Criterion) {
    let (_, races) = busy_event(RaceMode::Individual, 11);
    let finished = races.iter().find(|race| race.is_finished()).unwrap_or(&races[0]);

    c.bench_function("race_times_individual", |b| b.iter(|| black_box(RaceTimes::of(black_box(finished)))));
}

fn bench_pairing(c: &mut Criterion) {
    let (_, mut races) = busy_event(RaceMode::Sprint, 100);
    for pair in races.chunks_mut(2) {
        if let [a, b] = pair {
            a.opponent_id = Some(b.competitor_id);
            b.opponent_id = Some(a.competitor_id);
        }
    }

    c.bench_function("pair_duels_100", |b| b.iter(|| black_box(pair_duels(black_box(&races)).len())));
}

criterion_group!(benches, bench_board_build, bench_race_times, bench_pairing);
criterion_main!(benches);
