//! Compare projection run times on one worker vs all cores.
//!
//! Run with: `cargo bench --bench projector`
//! Or quick comparison: `cargo run --bin benchmark_parallel_speedup` (see src/bin)

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use playoff_odds::data::brackets::BracketConfig;
use playoff_odds::parallel::WorkerPool;
use playoff_odds::projector::monte_carlo::{project, ProjectionInput, ProjectionOptions};
use playoff_odds::season::series::ForcedOutcomeMap;
use playoff_odds::season::UnplayedMatch;

/// Single round-robin of `teams` teams with every series still to play.
fn league(teams: usize) -> (Vec<String>, Vec<UnplayedMatch>) {
    let names: Vec<String> = (0..teams).map(|i| format!("Team {i:02}")).collect();
    let start = NaiveDate::from_ymd_opt(2025, 8, 1).expect("valid date");
    let mut fixtures = Vec::new();
    for a in 0..teams {
        for b in (a + 1)..teams {
            fixtures.push(UnplayedMatch {
                team_a: names[a].clone(),
                team_b: names[b].clone(),
                date: start + Days::new(fixtures.len() as u64 / 4),
                best_of: if (a + b) % 2 == 0 { 3 } else { 5 },
            });
        }
    }
    (names, fixtures)
}

fn bench_projection_workers(c: &mut Criterion) {
    let (teams, unplayed) = league(10);
    let wins = HashMap::new();
    let diff = HashMap::new();
    let forced = ForcedOutcomeMap::new();
    let brackets = BracketConfig::default();
    let input = ProjectionInput {
        teams: &teams,
        current_wins: &wins,
        current_diff: &diff,
        unplayed: &unplayed,
        forced: &forced,
        brackets: &brackets,
        trials: 5_000,
    };

    let mut group = c.benchmark_group("projector");
    group.sample_size(20);
    group.measurement_time(std::time::Duration::from_secs(10));

    let single = ProjectionOptions {
        pool: WorkerPool::with_workers(1),
        ..ProjectionOptions::seeded(42)
    };
    group.bench_function("one_worker", |b| {
        b.iter(|| black_box(project(&input, &single)));
    });

    let all_cores = ProjectionOptions::seeded(42);
    group.bench_function("all_cores", |b| {
        b.iter(|| black_box(project(&input, &all_cores)));
    });

    group.finish();
}

criterion_group!(benches, bench_projection_workers);
criterion_main!(benches);
