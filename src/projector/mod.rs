pub mod cache;
pub mod export_csv;
pub mod monte_carlo;
pub mod table;

use serde::Serialize;

use crate::data::brackets::BracketConfig;
use crate::data::matches::Match;
use crate::error::ProjectionError;
use crate::projector::monte_carlo::{project_with_progress, ProjectionInput, ProjectionOptions};
use crate::projector::table::SimulationResult;
use crate::season::series::ForcedOutcomeMap;
use crate::season::standings::{current_state, StandingsRow};
use crate::season::weeks::{Cutoff, WeekBlock, DEFAULT_WEEK_GAP_DAYS};
use crate::season::{Season, UnplayedMatch};

pub const DEFAULT_TRIALS: u32 = 10_000;

/// One analyst request: the raw season plus every knob that shapes the projection.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionScenario<'a> {
    pub matches: &'a [Match],
    pub cutoff: Cutoff,
    pub week_gap_days: i64,
    pub forced: &'a ForcedOutcomeMap,
    pub brackets: &'a BracketConfig,
    pub trials: u32,
    /// `None` draws a fresh seed; the one used is reported in the result.
    pub seed: Option<u64>,
}

impl<'a> ProjectionScenario<'a> {
    pub fn new(
        matches: &'a [Match],
        forced: &'a ForcedOutcomeMap,
        brackets: &'a BracketConfig,
    ) -> Self {
        Self {
            matches,
            cutoff: Cutoff::Latest,
            week_gap_days: DEFAULT_WEEK_GAP_DAYS,
            forced,
            brackets,
            trials: DEFAULT_TRIALS,
            seed: None,
        }
    }
}

/// Everything a caller shows for a run: current standings, the weeks the cutoff was chosen
/// from, the series left to play, and the probability table in standings order.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub teams: Vec<String>,
    pub weeks: Vec<WeekBlock>,
    pub standings: Vec<StandingsRow>,
    pub unplayed: Vec<UnplayedMatch>,
    pub result: SimulationResult,
}

pub fn run_scenario(
    scenario: &ProjectionScenario<'_>,
    options: &ProjectionOptions,
) -> Result<ScenarioReport, ProjectionError> {
    run_scenario_with_progress(scenario, options, |_, _| {})
}

pub fn run_scenario_with_progress<F>(
    scenario: &ProjectionScenario<'_>,
    options: &ProjectionOptions,
    on_progress: F,
) -> Result<ScenarioReport, ProjectionError>
where
    F: FnMut(u32, u32),
{
    let season = Season::from_matches(scenario.matches)?;
    let weeks = season.weeks(scenario.week_gap_days);
    let split = season.split(scenario.cutoff, scenario.week_gap_days)?;
    let standings = season.standings(&split.played);
    let state = current_state(&standings);

    let input = ProjectionInput {
        teams: season.teams(),
        current_wins: &state.wins,
        current_diff: &state.differential,
        unplayed: &split.unplayed,
        forced: scenario.forced,
        brackets: scenario.brackets,
        trials: scenario.trials,
    };
    let options = ProjectionOptions {
        seed: scenario.seed.or(options.seed),
        ..options.clone()
    };
    let result = project_with_progress(&input, &options, on_progress)?;
    let result = result.ordered_by_standings(&standings)?;

    tracing::info!(
        teams = season.teams().len(),
        played = split.played.len(),
        unplayed = split.unplayed.len(),
        trials = result.trials,
        seed = result.seed,
        "projection complete"
    );

    Ok(ScenarioReport {
        teams: season.teams().to_vec(),
        weeks,
        standings,
        unplayed: split.unplayed,
        result,
    })
}
