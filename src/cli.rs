use std::fmt::Write as _;
use std::fs;

use crate::config::AppConfig;
use crate::data::brackets::BracketStore;
use crate::data::matches::{load_matches, Match};
use crate::parallel::WorkerPool;
use crate::projector::export_csv::to_csv_string;
use crate::projector::monte_carlo::ProjectionOptions;
use crate::projector::{run_scenario, ProjectionScenario};
use crate::season::series::{enumerate_outcomes, ForcedOutcomeMap};
use crate::season::weeks::Cutoff;
use crate::season::Season;
use crate::server;

const USAGE: &str = "usage: playoff_odds <serve|standings|weeks|outcomes|project|brackets>";

/// Flags that take a value; their value is never a positional argument.
const VALUE_FLAGS: [&str; 3] = ["--cutoff-week", "--tournament", "--forced"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Standings,
    Weeks,
    Outcomes,
    Project,
    Brackets,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("standings") => Some(Command::Standings),
        Some("weeks") => Some(Command::Weeks),
        Some("outcomes") => Some(Command::Outcomes),
        Some("project") => Some(Command::Project),
        Some("brackets") => Some(Command::Brackets),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = AppConfig::from_env();
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(&config),
        Some(Command::Standings) => handle_standings(args, &config),
        Some(Command::Weeks) => handle_weeks(args, &config),
        Some(Command::Outcomes) => handle_outcomes(args),
        Some(Command::Project) => handle_project(args, &config),
        Some(Command::Brackets) => handle_brackets(args, &config),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    match server::run_server(config) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_standings(args: &[String], config: &AppConfig) -> i32 {
    let positional = positional_args(args);
    let Some(path) = positional.first() else {
        eprintln!("usage: playoff_odds standings <matches.json> [--cutoff-week N] [--table]");
        return 2;
    };
    let Ok(cutoff) = parse_cutoff_flag(args) else {
        return 2;
    };
    let Some(season) = load_season(path) else {
        return 1;
    };
    let split = match season.split(cutoff, config.week_gap_days) {
        Ok(split) => split,
        Err(err) => {
            eprintln!("standings failed: {err}");
            return 1;
        }
    };
    let rows = season.standings(&split.played);

    if has_flag(args, "--table") {
        println!("rank\tteam\tmatch\tgame\tdiff");
        for (idx, row) in rows.iter().enumerate() {
            println!(
                "{}\t{}\t{}\t{}\t{:+}",
                idx + 1,
                row.team,
                row.match_record(),
                row.game_record(),
                row.game_differential
            );
        }
        return 0;
    }
    print_json(&rows, "standings")
}

fn handle_weeks(args: &[String], config: &AppConfig) -> i32 {
    let positional = positional_args(args);
    let Some(path) = positional.first() else {
        eprintln!("usage: playoff_odds weeks <matches.json> [gap_days]");
        return 2;
    };
    let gap_days = parse_u32_arg(
        positional.get(1).copied(),
        "gap_days",
        config.week_gap_days.max(0) as u32,
    );
    let Some(season) = load_season(path) else {
        return 1;
    };
    let weeks = season.weeks(i64::from(gap_days));
    for week in &weeks {
        tracing::debug!(week = week.index, dates = week.dates().len(), "{}", week.label());
    }
    print_json(&weeks, "weeks")
}

fn handle_outcomes(args: &[String]) -> i32 {
    let (Some(team_a), Some(team_b), Some(raw_best_of)) = (args.get(2), args.get(3), args.get(4))
    else {
        eprintln!("usage: playoff_odds outcomes <team_a> <team_b> <best_of>");
        return 2;
    };
    let Ok(best_of) = raw_best_of.parse::<u32>() else {
        eprintln!("invalid best_of '{raw_best_of}'");
        return 2;
    };
    print_json(&enumerate_outcomes(team_a, team_b, best_of), "outcomes")
}

fn handle_project(args: &[String], config: &AppConfig) -> i32 {
    let positional = positional_args(args);
    let Some(path) = positional.first() else {
        eprintln!(
            "usage: playoff_odds project <matches.json> [trials] [seed] [--tournament NAME] \
             [--forced FILE] [--cutoff-week N] [--csv]"
        );
        return 2;
    };
    let trials = parse_u32_arg(positional.get(1).copied(), "trials", config.default_trials);
    let seed = parse_optional_u64_arg(positional.get(2).copied(), "seed");
    let Ok(cutoff) = parse_cutoff_flag(args) else {
        return 2;
    };

    let matches: Vec<Match> = match load_matches(path) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("failed to load matches: {err}");
            return 1;
        }
    };
    let forced = match flag_value(args, "--forced") {
        Some(forced_path) => match load_forced(forced_path) {
            Ok(forced) => forced,
            Err(err) => {
                eprintln!("failed to load forced outcomes: {err}");
                return 1;
            }
        },
        None => ForcedOutcomeMap::new(),
    };
    let tournament = flag_value(args, "--tournament").map(String::as_str).unwrap_or("default");
    let brackets = match BracketStore::new(config.brackets_dir()).load(tournament) {
        Ok(brackets) => brackets,
        Err(err) => {
            eprintln!("failed to load brackets: {err}");
            return 1;
        }
    };

    let scenario = ProjectionScenario {
        cutoff,
        week_gap_days: config.week_gap_days,
        trials,
        seed,
        ..ProjectionScenario::new(&matches, &forced, &brackets)
    };
    let options = ProjectionOptions {
        pool: WorkerPool::with_workers(config.workers),
        ..ProjectionOptions::default()
    };
    let report = match run_scenario(&scenario, &options) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("projection failed: {err}");
            return 1;
        }
    };

    if has_flag(args, "--csv") {
        return match to_csv_string(&report.result) {
            Ok(csv) => {
                print!("{csv}");
                0
            }
            Err(err) => {
                eprintln!("failed to export csv: {err}");
                1
            }
        };
    }
    print_json(&report, "projection")
}

fn handle_brackets(args: &[String], config: &AppConfig) -> i32 {
    let positional = positional_args(args);
    let Some(tournament) = positional.first() else {
        eprintln!("usage: playoff_odds brackets <tournament> [--init]");
        return 2;
    };
    let store = BracketStore::new(config.brackets_dir());
    let brackets = match store.load(tournament) {
        Ok(brackets) => brackets,
        Err(err) => {
            eprintln!("failed to load brackets: {err}");
            return 1;
        }
    };
    if has_flag(args, "--init") {
        match store.save(tournament, &brackets) {
            Ok(path) => eprintln!("bracket config written: {}", path.display()),
            Err(err) => {
                eprintln!("failed to save brackets: {err}");
                return 1;
            }
        }
    }
    print_json(&brackets, "brackets")
}

fn load_season(path: &str) -> Option<Season> {
    let matches = match load_matches(path) {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("failed to load matches: {err}");
            return None;
        }
    };
    match Season::from_matches(&matches) {
        Ok(season) => Some(season),
        Err(err) => {
            eprintln!("{err}");
            None
        }
    }
}

fn load_forced(path: &str) -> Result<ForcedOutcomeMap, String> {
    let raw = fs::read_to_string(path).map_err(|err| format!("{path}: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("{path}: {err}"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T, what: &str) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize {what}: {err}");
            1
        }
    }
}

/// Arguments after the command name that are neither flags nor flag values.
fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(2) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            positional.push(arg.as_str());
        }
    }
    positional
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
}

/// `--cutoff-week N`: week index, negative for pre-season, absent for latest.
fn parse_cutoff_flag(args: &[String]) -> Result<Cutoff, ()> {
    if !has_flag(args, "--cutoff-week") {
        return Ok(Cutoff::Latest);
    }
    match flag_value(args, "--cutoff-week").map(|raw| raw.parse::<i64>()) {
        Some(Ok(index)) => Ok(Cutoff::from_week_index(Some(index))),
        _ => {
            eprintln!("--cutoff-week expects a week index (negative for pre-season)");
            Err(())
        }
    }
}

fn parse_u32_arg(raw: Option<&str>, name: &str, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .unwrap_or_else(|| {
            if let Some(value) = raw {
                eprintln!("invalid {name} '{value}', defaulting to {default}");
            }
            default
        })
}

fn parse_optional_u64_arg(raw: Option<&str>, name: &str) -> Option<u64> {
    let value = raw?;
    match value.parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            let mut msg = String::new();
            let _ = write!(&mut msg, "invalid {name} '{value}', drawing a random seed");
            eprintln!("{msg}");
            None
        }
    }
}
