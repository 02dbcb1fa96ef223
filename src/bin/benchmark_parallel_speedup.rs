//! Run one projection on a single worker and once on all cores, then print timings and speedup.
//!
//! Usage: cargo run --release --bin benchmark_parallel_speedup [trials]

use std::collections::HashMap;
use std::env;
use std::time::Instant;

use chrono::{Days, NaiveDate};
use playoff_odds::data::brackets::BracketConfig;
use playoff_odds::parallel::WorkerPool;
use playoff_odds::projector::monte_carlo::{project, ProjectionInput, ProjectionOptions};
use playoff_odds::season::series::ForcedOutcomeMap;
use playoff_odds::season::UnplayedMatch;

/// Double round-robin of `teams` teams, all still to play.
fn league(teams: usize) -> (Vec<String>, Vec<UnplayedMatch>) {
    let names: Vec<String> = (0..teams).map(|i| format!("Team {i:02}")).collect();
    let start = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap_or(NaiveDate::MIN);
    let mut fixtures = Vec::new();
    for leg in 0..2u64 {
        for a in 0..teams {
            for b in (a + 1)..teams {
                let day = leg * 30 + (fixtures.len() as u64 % 30);
                fixtures.push(UnplayedMatch {
                    team_a: names[a].clone(),
                    team_b: names[b].clone(),
                    date: start + Days::new(day),
                    best_of: 3,
                });
            }
        }
    }
    (names, fixtures)
}

fn main() {
    let trials = env::args()
        .nth(1)
        .and_then(|raw| raw.parse::<u32>().ok())
        .unwrap_or(50_000);
    let seed = 12345u64;
    let (teams, unplayed) = league(12);
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
        trials,
    };

    println!(
        "Projection: {} teams, {} unplayed series x {} trials",
        teams.len(),
        unplayed.len(),
        trials
    );
    println!();

    let single = ProjectionOptions {
        seed: Some(seed),
        pool: WorkerPool::with_workers(1),
        cancel: None,
    };
    let t0 = Instant::now();
    let result_single = match project(&input, &single) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("projection failed: {err}");
            return;
        }
    };
    let elapsed_single = t0.elapsed();
    let single_ms = elapsed_single.as_secs_f64() * 1000.0;
    println!(
        "1 worker:    {:.2} ms  ({:.1} trials/s)",
        single_ms,
        f64::from(trials) / elapsed_single.as_secs_f64()
    );

    let t0 = Instant::now();
    let result_all = match project(&input, &ProjectionOptions::seeded(seed)) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("projection failed: {err}");
            return;
        }
    };
    let elapsed_all = t0.elapsed();
    let all_ms = elapsed_all.as_secs_f64() * 1000.0;
    println!(
        "All cores:   {:.2} ms  ({:.1} trials/s)",
        all_ms,
        f64::from(trials) / elapsed_all.as_secs_f64()
    );

    println!();
    println!("Speedup:     {:.2}x faster (all cores vs one worker)", single_ms / all_ms);

    assert_eq!(result_single, result_all, "worker count changed the result");
    println!("(Results match for a fixed seed)");
}
