use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::data::brackets::{BracketConfig, BracketConfigError, BracketStore, BracketStoreError};
use crate::data::matches::Match;
use crate::error::ProjectionError;
use crate::parallel::WorkerPool;
use crate::projector::cache::{scenario_fingerprint, ProjectionCache, ScenarioKey};
use crate::projector::export_csv::{to_csv_string, ExportError};
use crate::projector::monte_carlo::ProjectionOptions;
use crate::projector::{run_scenario, ProjectionScenario, ScenarioReport};
use crate::season::series::{enumerate_outcomes, is_supported_series_length, ForcedOutcomeMap, OutcomeOption};
use crate::season::standings::StandingsRow;
use crate::season::weeks::{Cutoff, WeekBlock};
use crate::season::Season;

/// Shared state for every request: configuration plus the projection cache.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub config: AppConfig,
    cache: Arc<Mutex<ProjectionCache>>,
}

impl ServerContext {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            cache: Arc::new(Mutex::new(ProjectionCache::default())),
        }
    }

    fn bracket_store(&self) -> BracketStore {
        BracketStore::new(self.config.brackets_dir())
    }

    fn cached(&self, key: &ScenarioKey) -> Option<ScenarioReport> {
        let guard = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        guard.get(key).cloned()
    }

    fn remember(&self, key: ScenarioKey, report: ScenarioReport) {
        let mut guard = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(key, report);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub errors: Vec<ValidationIssue>,
}

#[derive(Debug)]
pub enum ApiError {
    /// Request body is not valid JSON for the endpoint.
    Parse(serde_json::Error),
    Validation(ValidationErrorResponse),
    /// Well-formed request the engine cannot project.
    Projection(ProjectionError),
    Brackets(BracketStoreError),
    Export(ExportError),
    Serialize(serde_json::Error),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Invalid request body: {err}"),
            Self::Validation(_) => write!(f, "invalid request"),
            Self::Projection(err) => write!(f, "{err}"),
            Self::Brackets(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Serialize(err) => write!(f, "failed to serialize response: {err}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ProjectionError> for ApiError {
    fn from(err: ProjectionError) -> Self {
        Self::Projection(err)
    }
}

impl From<BracketStoreError> for ApiError {
    fn from(err: BracketStoreError) -> Self {
        Self::Brackets(err)
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        Self::Export(err)
    }
}

impl ApiError {
    /// Caller mistakes map to 400; everything else is a server fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Parse(_) | Self::Validation(_) => true,
            Self::Projection(err) => !matches!(
                err,
                ProjectionError::Cancelled | ProjectionError::WorkerPool(_)
            ),
            Self::Brackets(_) | Self::Export(_) | Self::Serialize(_) => false,
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(ApiError::Serialize)
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(ApiError::Parse)
}

fn invalid(field: &'static str, message: String) -> ApiError {
    ApiError::Validation(ValidationErrorResponse {
        status: "error",
        message: "Validation failed",
        errors: vec![ValidationIssue {
            field,
            messages: vec![message],
        }],
    })
}

pub fn health_payload() -> Result<String, ApiError> {
    to_json(&serde_json::json!({
        "status": "ok",
        "service": "playoff-odds-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StandingsRequest {
    pub matches: Vec<Match>,
    /// Week index; negative for pre-season, absent for the latest state.
    pub cutoff_week: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingsResponse {
    pub status: &'static str,
    pub cutoff: Cutoff,
    pub played: usize,
    pub unplayed: usize,
    pub standings: Vec<StandingsRow>,
}

pub fn standings_payload(body: &str, ctx: &ServerContext) -> Result<String, ApiError> {
    let request: StandingsRequest = parse_body(body)?;
    let cutoff = Cutoff::from_week_index(request.cutoff_week);
    let season = Season::from_matches(&request.matches)?;
    let split = season.split(cutoff, ctx.config.week_gap_days)?;
    to_json(&StandingsResponse {
        status: "ok",
        cutoff,
        played: split.played.len(),
        unplayed: split.unplayed.len(),
        standings: season.standings(&split.played),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeeksRequest {
    pub matches: Vec<Match>,
    pub gap_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub index: usize,
    pub label: String,
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub dates: Vec<NaiveDate>,
}

impl From<&WeekBlock> for WeekSummary {
    fn from(block: &WeekBlock) -> Self {
        Self {
            index: block.index,
            label: block.label(),
            first: block.first(),
            last: block.last(),
            dates: block.dates().to_vec(),
        }
    }
}

pub fn weeks_payload(body: &str, ctx: &ServerContext) -> Result<String, ApiError> {
    let request: WeeksRequest = parse_body(body)?;
    let gap_days = request.gap_days.unwrap_or(ctx.config.week_gap_days);
    if gap_days < 0 {
        return Err(invalid("gap_days", "must not be negative".to_string()));
    }
    let season = Season::from_matches(&request.matches)?;
    let weeks: Vec<WeekSummary> = season.weeks(gap_days).iter().map(WeekSummary::from).collect();
    to_json(&serde_json::json!({
        "status": "ok",
        "gap_days": gap_days,
        "weeks": weeks,
    }))
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutcomesRequest {
    pub team_a: String,
    pub team_b: String,
    pub best_of: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomesResponse {
    pub status: &'static str,
    pub best_of: u32,
    /// False when the series length uses the unscored win/loss fallback.
    pub supported: bool,
    pub outcomes: Vec<OutcomeOption>,
}

pub fn outcomes_payload(body: &str) -> Result<String, ApiError> {
    let request: OutcomesRequest = parse_body(body)?;
    if request.best_of == 0 {
        return Err(invalid("best_of", "must be at least 1".to_string()));
    }
    to_json(&OutcomesResponse {
        status: "ok",
        best_of: request.best_of,
        supported: is_supported_series_length(request.best_of),
        outcomes: enumerate_outcomes(&request.team_a, &request.team_b, request.best_of),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRequest {
    pub matches: Vec<Match>,
    /// Loads the tournament's saved brackets when `brackets` is absent.
    pub tournament: Option<String>,
    pub brackets: Option<BracketConfig>,
    #[serde(default)]
    pub forced: ForcedOutcomeMap,
    pub cutoff_week: Option<i64>,
    pub trials: Option<u32>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub format: ProjectFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub cached: bool,
    #[serde(flatten)]
    pub report: ScenarioReport,
}

/// Response body of `POST /api/project`, JSON or CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectPayload {
    Json(String),
    Csv(String),
}

pub fn project_payload(body: &str, ctx: &ServerContext) -> Result<ProjectPayload, ApiError> {
    let request: ProjectRequest = parse_body(body)?;
    let trials = request.trials.unwrap_or(ctx.config.default_trials);
    if !(1..=ctx.config.max_trials).contains(&trials) {
        return Err(invalid(
            "trials",
            format!("must be between 1 and {}", ctx.config.max_trials),
        ));
    }
    let brackets = match (&request.brackets, &request.tournament) {
        (Some(brackets), _) => brackets.clone(),
        (None, Some(tournament)) => ctx.bracket_store().load(tournament)?,
        (None, None) => BracketConfig::default(),
    };

    let scenario = ProjectionScenario {
        cutoff: Cutoff::from_week_index(request.cutoff_week),
        week_gap_days: ctx.config.week_gap_days,
        trials,
        seed: request.seed,
        ..ProjectionScenario::new(&request.matches, &request.forced, &brackets)
    };
    let fingerprint = scenario_fingerprint(&scenario);
    let cached = fingerprint.as_ref().and_then(|key| ctx.cached(key));
    let was_cached = cached.is_some();
    let report = match cached {
        Some(report) => {
            tracing::debug!(seed = report.result.seed, "projection served from cache");
            report
        }
        None => {
            let options = ProjectionOptions {
                pool: WorkerPool::with_workers(ctx.config.workers),
                ..ProjectionOptions::default()
            };
            let report = run_scenario(&scenario, &options)?;
            if let Some(key) = fingerprint {
                ctx.remember(key, report.clone());
            }
            report
        }
    };

    match request.format {
        ProjectFormat::Csv => Ok(ProjectPayload::Csv(to_csv_string(&report.result)?)),
        ProjectFormat::Json => to_json(&ProjectResponse {
            status: "ok",
            engine: "monte_carlo",
            cached: was_cached,
            report,
        })
        .map(ProjectPayload::Json),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BracketsResponse {
    pub status: &'static str,
    pub tournament: String,
    #[serde(flatten)]
    pub config: BracketConfig,
}

pub fn brackets_get_payload(tournament: &str, ctx: &ServerContext) -> Result<String, ApiError> {
    let config = ctx.bracket_store().load(tournament)?;
    to_json(&BracketsResponse {
        status: "ok",
        tournament: tournament.to_string(),
        config,
    })
}

pub fn brackets_put_payload(
    tournament: &str,
    body: &str,
    ctx: &ServerContext,
) -> Result<String, ApiError> {
    let config: BracketConfig = parse_body(body)?;
    // Coverage depends on the season's team count, so only structure is checked here.
    if let Err(err) = config.validate(0) {
        return Err(bracket_issue(err));
    }
    ctx.bracket_store().save(tournament, &config)?;
    to_json(&BracketsResponse {
        status: "ok",
        tournament: tournament.to_string(),
        config,
    })
}

fn bracket_issue(err: BracketConfigError) -> ApiError {
    invalid("brackets", err.to_string())
}
