use std::collections::HashMap;

use chrono::NaiveDate;
use playoff_odds::data::brackets::{Bracket, BracketConfig};
use playoff_odds::data::matches::Match;
use playoff_odds::error::ProjectionError;
use playoff_odds::parallel::WorkerPool;
use playoff_odds::projector::monte_carlo::{project, ProjectionInput, ProjectionOptions};
use playoff_odds::projector::table::SimulationResult;
use playoff_odds::projector::{run_scenario, ProjectionScenario};
use playoff_odds::season::series::{ForcedOutcomeMap, MatchKey, SeriesOutcome, Side};
use playoff_odds::season::standings::{build_standings, current_state};
use playoff_odds::season::weeks::Cutoff;
use playoff_odds::season::UnplayedMatch;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 8, day).expect("valid date")
}

fn names(teams: &[&str]) -> Vec<String> {
    teams.iter().map(|team| team.to_string()).collect()
}

fn played(a: &str, b: &str, day: u32, score_a: u32, score_b: u32) -> Match {
    Match {
        team_a: a.to_string(),
        team_b: b.to_string(),
        date: date(day),
        best_of: 3,
        winner: Some(if score_a > score_b { Side::A } else { Side::B }),
        score_a,
        score_b,
        is_regular_season: true,
    }
}

fn fixture(a: &str, b: &str, day: u32, best_of: u32) -> UnplayedMatch {
    UnplayedMatch {
        team_a: a.to_string(),
        team_b: b.to_string(),
        date: date(day),
        best_of,
    }
}

fn brackets(bands: &[(&str, u32, Option<u32>)]) -> BracketConfig {
    BracketConfig {
        brackets: bands
            .iter()
            .map(|(name, start, end)| Bracket::new(*name, *start, *end))
            .collect(),
    }
}

fn code(raw: &str) -> SeriesOutcome {
    raw.parse().expect("valid outcome code")
}

/// Projection from played results plus a fixture list, seeded.
fn run(
    teams: &[String],
    history: &[Match],
    unplayed: &[UnplayedMatch],
    forced: &ForcedOutcomeMap,
    config: &BracketConfig,
    trials: u32,
    options: &ProjectionOptions,
) -> Result<SimulationResult, ProjectionError> {
    let state = current_state(&build_standings(teams, history));
    let input = ProjectionInput {
        teams,
        current_wins: &state.wins,
        current_diff: &state.differential,
        unplayed,
        forced,
        brackets: config,
        trials,
    };
    project(&input, options)
}

fn league() -> (Vec<String>, Vec<Match>, Vec<UnplayedMatch>) {
    let teams = names(&["A", "B", "C", "D", "E"]);
    let history = vec![
        played("A", "B", 1, 2, 1),
        played("C", "D", 1, 0, 2),
        played("E", "A", 2, 2, 0),
        played("B", "C", 2, 2, 1),
    ];
    let unplayed = vec![
        fixture("A", "C", 8, 3),
        fixture("B", "D", 8, 1),
        fixture("D", "E", 9, 2),
        fixture("C", "E", 9, 5),
        fixture("A", "D", 10, 7),
    ];
    (teams, history, unplayed)
}

#[test]
fn every_trial_credits_exactly_one_bracket_per_team() {
    let (teams, history, unplayed) = league();
    let config = brackets(&[("Top 2", 1, Some(2)), ("Mid", 3, Some(4)), ("Out", 5, None)]);
    let result = run(
        &teams,
        &history,
        &unplayed,
        &ForcedOutcomeMap::new(),
        &config,
        3_001,
        &ProjectionOptions::seeded(17),
    )
    .expect("projection");

    assert_eq!(result.rows.len(), teams.len());
    for row in &result.rows {
        assert_eq!(row.counts.iter().sum::<u32>(), 3_001, "coverage for {}", row.team);
        let total: f64 = row.percentages.iter().sum();
        assert!((total - 100.0).abs() <= 0.1, "{} sums to {total}", row.team);
    }
    for column in 0..config.brackets.len() {
        let slots: u32 = result.rows.iter().map(|row| row.counts[column]).sum();
        let width = match column {
            0 | 1 => 2,
            _ => 1,
        };
        assert_eq!(slots, 3_001 * width);
    }
}

#[test]
fn fully_forced_season_has_no_variance() {
    let teams = names(&["A", "B", "C"]);
    let unplayed = vec![
        fixture("A", "B", 1, 3),
        fixture("B", "C", 2, 3),
        fixture("A", "C", 3, 3),
    ];
    let mut forced = ForcedOutcomeMap::new();
    forced.force(MatchKey::new("A", "B", date(1)), code("A20"));
    forced.force(MatchKey::new("B", "C", date(2)), code("A21"));
    forced.force(MatchKey::new("A", "C", date(3)), code("A21"));
    let config = brackets(&[("First", 1, Some(1)), ("Second", 2, Some(2)), ("Third", 3, None)]);

    let result = run(
        &teams,
        &[],
        &unplayed,
        &forced,
        &config,
        2_000,
        &ProjectionOptions::default(),
    )
    .expect("projection");

    assert_eq!(result.percentage("A", "First"), Some(100.0));
    assert_eq!(result.percentage("B", "Second"), Some(100.0));
    assert_eq!(result.percentage("C", "Third"), Some(100.0));
    for row in &result.rows {
        assert_eq!(row.counts.iter().filter(|&&count| count > 0).count(), 1);
    }
    assert_eq!(result.position_percentage("A", 1), Some(100.0));
    assert_eq!(
        result.row("C").map(|row| row.positions.counts.clone()),
        Some(vec![0, 0, 2_000])
    );
}

#[test]
fn finishing_positions_fill_every_place_every_trial() {
    let (teams, history, unplayed) = league();
    let config = brackets(&[("Top 2", 1, Some(2)), ("Mid", 3, Some(4)), ("Out", 5, None)]);
    let result = run(
        &teams,
        &history,
        &unplayed,
        &ForcedOutcomeMap::new(),
        &config,
        2_500,
        &ProjectionOptions::seeded(3),
    )
    .expect("projection");

    for row in &result.rows {
        let places = &row.positions.counts;
        assert_eq!(places.len(), teams.len());
        assert_eq!(places.iter().sum::<u32>(), 2_500, "positions of {}", row.team);
        assert_eq!(places[0] + places[1], row.counts[0], "{} top two", row.team);
        assert_eq!(places[4], row.counts[2], "{} last place", row.team);
    }
    for place in 0..teams.len() {
        let filled: u32 = result.rows.iter().map(|row| row.positions.counts[place]).sum();
        assert_eq!(filled, 2_500, "place {}", place + 1);
    }
}

#[test]
fn single_forced_series_credits_the_forced_winner() {
    let teams = names(&["A", "B"]);
    let unplayed = vec![fixture("A", "B", 1, 3)];
    let mut forced = ForcedOutcomeMap::new();
    forced.force(MatchKey::new("A", "B", date(1)), code("A20"));
    let config = brackets(&[("Top1", 1, Some(1)), ("Rest", 2, None)]);

    let result = run(&teams, &[], &unplayed, &forced, &config, 500, &ProjectionOptions::default())
        .expect("projection");
    assert_eq!(result.percentage("A", "Top1"), Some(100.0));
    assert_eq!(result.percentage("B", "Top1"), Some(0.0));
}

#[test]
fn no_unplayed_matches_gives_identical_tables_for_any_trial_count() {
    let teams = names(&["A", "B", "C"]);
    let history = vec![
        played("A", "B", 1, 2, 0),
        played("A", "C", 2, 2, 1),
        played("B", "C", 3, 2, 1),
    ];
    let config = brackets(&[("Top1", 1, Some(1)), ("Rest", 2, None)]);
    let forced = ForcedOutcomeMap::new();

    let small = run(&teams, &history, &[], &forced, &config, 100, &ProjectionOptions::default())
        .expect("projection");
    let large = run(&teams, &history, &[], &forced, &config, 7_777, &ProjectionOptions::default())
        .expect("projection");

    for team in ["A", "B", "C"] {
        let left = small.row(team).map(|row| row.percentages.clone());
        let right = large.row(team).map(|row| row.percentages.clone());
        assert_eq!(left, right, "percentages for {team}");
    }
    assert_eq!(small.percentage("A", "Top1"), Some(100.0));
    assert_eq!(small.percentage("C", "Rest"), Some(100.0));
}

#[test]
fn widening_a_bracket_never_lowers_its_probability() {
    let (teams, history, unplayed) = league();
    let forced = ForcedOutcomeMap::new();
    let narrow = brackets(&[("Top", 1, Some(1)), ("Rest", 2, Some(5))]);
    let wide = brackets(&[("Top", 1, Some(2)), ("Rest", 3, Some(5))]);

    let options = ProjectionOptions::seeded(99);
    let narrow_result = run(&teams, &history, &unplayed, &forced, &narrow, 4_000, &options)
        .expect("projection");
    let wide_result = run(&teams, &history, &unplayed, &forced, &wide, 4_000, &options)
        .expect("projection");

    for team in &teams {
        let before = narrow_result.row(team).expect("row").counts[0];
        let after = wide_result.row(team).expect("row").counts[0];
        assert!(after >= before, "{team}: {before} -> {after}");
    }
}

#[test]
fn three_team_scenario_matches_hand_analysis() {
    let teams = names(&["A", "B", "C"]);
    let history = vec![played("A", "B", 1, 2, 1)];
    let state = current_state(&build_standings(&teams, &history));
    assert_eq!(state.wins.get("A"), Some(&1));
    assert_eq!(state.differential.get("A"), Some(&1));
    assert_eq!(state.wins.get("B"), Some(&0));
    assert_eq!(state.differential.get("B"), Some(&-1));
    assert_eq!(state.wins.get("C"), Some(&0));
    assert_eq!(state.differential.get("C"), Some(&0));

    let unplayed = vec![fixture("A", "C", 5, 3)];
    let config = brackets(&[("Top1", 1, Some(1)), ("Rest", 2, Some(3))]);
    let result = run(
        &teams,
        &history,
        &unplayed,
        &ForcedOutcomeMap::new(),
        &config,
        10_000,
        &ProjectionOptions::seeded(2025),
    )
    .expect("projection");

    // A tops the table exactly when it wins the series: half of the four outcomes.
    let a_top = result.percentage("A", "Top1").expect("cell");
    assert!((a_top - 50.0).abs() < 3.0, "A top share {a_top}");
    assert_eq!(result.percentage("B", "Top1"), Some(0.0));
    let c_top = result.percentage("C", "Top1").expect("cell");
    assert!((a_top + c_top - 100.0).abs() < 0.01);
}

#[test]
fn fixed_seed_is_reproducible_across_worker_counts() {
    let (teams, history, unplayed) = league();
    let config = BracketConfig::default();
    let forced = ForcedOutcomeMap::new();

    let reference = run(
        &teams,
        &history,
        &unplayed,
        &forced,
        &config,
        6_000,
        &ProjectionOptions {
            pool: WorkerPool::with_workers(1),
            ..ProjectionOptions::seeded(7)
        },
    )
    .expect("projection");
    for workers in [0, 2, 3, 8] {
        let again = run(
            &teams,
            &history,
            &unplayed,
            &forced,
            &config,
            6_000,
            &ProjectionOptions {
                pool: WorkerPool::with_workers(workers),
                ..ProjectionOptions::seeded(7)
            },
        )
        .expect("projection");
        assert_eq!(again, reference, "workers = {workers}");
    }

    let other_seed = run(
        &teams,
        &history,
        &unplayed,
        &forced,
        &config,
        6_000,
        &ProjectionOptions::seeded(8),
    )
    .expect("projection");
    assert_ne!(other_seed.rows, reference.rows);
}

#[test]
fn unseeded_runs_report_the_seed_they_used() {
    let (teams, history, unplayed) = league();
    let config = BracketConfig::default();
    let forced = ForcedOutcomeMap::new();
    let first = run(&teams, &history, &unplayed, &forced, &config, 2_000, &ProjectionOptions::default())
        .expect("projection");
    let replay = run(
        &teams,
        &history,
        &unplayed,
        &forced,
        &config,
        2_000,
        &ProjectionOptions::seeded(first.seed),
    )
    .expect("projection");
    assert_eq!(replay, first);
}

#[test]
fn structural_errors_are_typed() {
    let teams = names(&["A", "B"]);
    let config = brackets(&[("Top1", 1, Some(1)), ("Rest", 2, None)]);
    let forced = ForcedOutcomeMap::new();
    let options = ProjectionOptions::seeded(1);

    assert_eq!(
        run(&[], &[], &[], &forced, &config, 10, &options),
        Err(ProjectionError::NoTeams)
    );
    assert_eq!(
        run(&teams, &[], &[], &forced, &config, 0, &options),
        Err(ProjectionError::ZeroTrials)
    );
    assert_eq!(
        run(&teams, &[], &[fixture("A", "Z", 1, 3)], &forced, &config, 10, &options),
        Err(ProjectionError::UnknownTeam("Z".to_string()))
    );

    let mut stray = ForcedOutcomeMap::new();
    stray.force(MatchKey::new("A", "Z", date(1)), code("A20"));
    assert!(matches!(
        run(&teams, &[], &[fixture("A", "B", 1, 3)], &stray, &config, 10, &options),
        Err(ProjectionError::UnknownForcedMatch(_))
    ));

    let mut wrong_length = ForcedOutcomeMap::new();
    wrong_length.force(MatchKey::new("A", "B", date(1)), code("A30"));
    assert!(matches!(
        run(&teams, &[], &[fixture("A", "B", 1, 3)], &wrong_length, &config, 10, &options),
        Err(ProjectionError::InvalidForcedOutcome { best_of: 3, .. })
    ));

    let uncovered = brackets(&[("Top1", 1, Some(1))]);
    assert!(matches!(
        run(&teams, &[], &[], &forced, &uncovered, 10, &options),
        Err(ProjectionError::MalformedBrackets(_))
    ));
}

#[test]
fn brackets_past_the_last_team_score_zero() {
    let teams = names(&["A", "B"]);
    let config = brackets(&[("Top1", 1, Some(1)), ("Second", 2, Some(2)), ("Ghost", 3, None)]);
    let result = run(
        &teams,
        &[played("A", "B", 1, 2, 0)],
        &[],
        &ForcedOutcomeMap::new(),
        &config,
        50,
        &ProjectionOptions::default(),
    )
    .expect("projection");
    assert!(result.rows.iter().all(|row| row.percentages[2] == 0.0));
}

#[test]
fn scenario_rewinds_to_cutoff_week_and_orders_rows_by_standings() {
    let matches = vec![
        played("A", "B", 1, 2, 0),
        played("C", "D", 2, 2, 1),
        played("A", "C", 20, 0, 2),
        played("B", "D", 21, 2, 1),
        Match {
            winner: None,
            score_a: 0,
            score_b: 0,
            ..played("A", "D", 28, 0, 0)
        },
    ];
    let forced = ForcedOutcomeMap::new();
    let config = brackets(&[("Top 2", 1, Some(2)), ("Rest", 3, None)]);
    let scenario = ProjectionScenario {
        cutoff: Cutoff::Week(0),
        trials: 1_000,
        seed: Some(4),
        ..ProjectionScenario::new(&matches, &forced, &config)
    };
    let report = run_scenario(&scenario, &ProjectionOptions::default()).expect("report");

    assert_eq!(report.weeks.len(), 3);
    assert_eq!(report.unplayed.len(), 3);
    let standings_order: Vec<&str> = report.standings.iter().map(|row| row.team.as_str()).collect();
    let result_order: Vec<&str> = report.result.rows.iter().map(|row| row.team.as_str()).collect();
    assert_eq!(standings_order, result_order);
    assert_eq!(standings_order[0], "A");

    let latest = run_scenario(
        &ProjectionScenario {
            cutoff: Cutoff::Latest,
            ..scenario
        },
        &ProjectionOptions::default(),
    )
    .expect("report");
    assert_eq!(latest.unplayed.len(), 1);
}

#[test]
fn scenario_without_regular_season_fails_fast() {
    let matches = vec![Match {
        is_regular_season: false,
        ..played("A", "B", 1, 2, 0)
    }];
    let forced = ForcedOutcomeMap::new();
    let config = BracketConfig::default();
    let scenario = ProjectionScenario::new(&matches, &forced, &config);
    assert!(matches!(
        run_scenario(&scenario, &ProjectionOptions::default()),
        Err(ProjectionError::NoRegularSeasonData)
    ));
}

#[test]
fn unknown_teams_in_current_state_are_rejected() {
    let teams = names(&["A", "B"]);
    let wins: HashMap<String, u32> = [("Q".to_string(), 3)].into_iter().collect();
    let diff = HashMap::new();
    let forced = ForcedOutcomeMap::new();
    let config = BracketConfig::default();
    let input = ProjectionInput {
        teams: &teams,
        current_wins: &wins,
        current_diff: &diff,
        unplayed: &[],
        forced: &forced,
        brackets: &config,
        trials: 10,
    };
    assert_eq!(
        project(&input, &ProjectionOptions::seeded(1)),
        Err(ProjectionError::UnknownTeam("Q".to_string()))
    );
}
