use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::data::brackets::{BracketConfig, BracketConfigError};
use crate::error::ProjectionError;
use crate::parallel::{trial_batches, BuiltPool, TrialBatch, WorkerPool};
use crate::projector::table::SimulationResult;
use crate::season::rng::Rng;
use crate::season::series::{
    decisive_outcomes, is_supported_series_length, ForcedOutcomeMap, SeriesOutcome, Side,
};
use crate::season::UnplayedMatch;

/// Number of progress reports [project_with_progress] emits over a full run.
const PROGRESS_STEPS: usize = 16;

/// Everything one projection needs. The base state is read-only: every trial restarts from it.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionInput<'a> {
    pub teams: &'a [String],
    /// Match wins so far. Teams missing from the map start at 0.
    pub current_wins: &'a HashMap<String, u32>,
    /// Game differential so far. Teams missing from the map start at 0.
    pub current_diff: &'a HashMap<String, i32>,
    pub unplayed: &'a [UnplayedMatch],
    pub forced: &'a ForcedOutcomeMap,
    pub brackets: &'a BracketConfig,
    pub trials: u32,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectionOptions {
    /// Fixed seed for a reproducible run. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub pool: WorkerPool,
    /// Checked between trials; when set the run stops with [ProjectionError::Cancelled].
    pub cancel: Option<Arc<AtomicBool>>,
}

impl ProjectionOptions {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Standings change caused by one series result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    Nothing,
    Win {
        winner: usize,
        loser: usize,
        margin: i32,
    },
}

#[derive(Debug, Clone)]
enum MatchPlan {
    Fixed(Effect),
    /// Drawn uniformly each trial.
    Uniform(Vec<Effect>),
}

/// Input resolved to team indices, checked once before any trial runs.
#[derive(Debug)]
struct PreparedSeason {
    base_wins: Vec<u32>,
    base_diff: Vec<i32>,
    plans: Vec<MatchPlan>,
    /// Bracket column for each final position (0-based).
    bracket_by_position: Vec<usize>,
    bracket_count: usize,
}

fn effect_of(outcome: SeriesOutcome, team_a: usize, team_b: usize) -> Effect {
    match outcome {
        SeriesOutcome::Random | SeriesOutcome::Draw => Effect::Nothing,
        SeriesOutcome::Win { winner, score } => {
            let (winner, loser) = match winner {
                Side::A => (team_a, team_b),
                Side::B => (team_b, team_a),
            };
            Effect::Win {
                winner,
                loser,
                margin: score.margin(),
            }
        }
    }
}

fn prepare(input: &ProjectionInput<'_>) -> Result<PreparedSeason, ProjectionError> {
    if input.teams.is_empty() {
        return Err(ProjectionError::NoTeams);
    }
    if input.trials == 0 {
        return Err(ProjectionError::ZeroTrials);
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(input.teams.len());
    for (idx, team) in input.teams.iter().enumerate() {
        if index.insert(team.as_str(), idx).is_some() {
            return Err(ProjectionError::DuplicateTeam(team.clone()));
        }
    }
    let lookup = |team: &str| {
        index
            .get(team)
            .copied()
            .ok_or_else(|| ProjectionError::UnknownTeam(team.to_string()))
    };

    let mut base_wins = vec![0u32; input.teams.len()];
    for (team, &wins) in input.current_wins {
        base_wins[lookup(team)?] = wins;
    }
    let mut base_diff = vec![0i32; input.teams.len()];
    for (team, &diff) in input.current_diff {
        base_diff[lookup(team)?] = diff;
    }

    input.brackets.validate(input.teams.len())?;
    let bracket_by_position = (1..=input.teams.len() as u32)
        .map(|rank| {
            input
                .brackets
                .bracket_for_rank(rank)
                .ok_or(BracketConfigError::Uncovered {
                    last: rank - 1,
                    team_count: input.teams.len() as u32,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let unplayed_keys: HashSet<_> = input.unplayed.iter().map(UnplayedMatch::key).collect();
    if let Some((key, _)) = input
        .forced
        .sorted_entries()
        .into_iter()
        .find(|(key, _)| !unplayed_keys.contains(*key))
    {
        return Err(ProjectionError::UnknownForcedMatch(key.clone()));
    }

    let mut plans = Vec::with_capacity(input.unplayed.len());
    for m in input.unplayed {
        let team_a = lookup(&m.team_a)?;
        let team_b = lookup(&m.team_b)?;
        if !is_supported_series_length(m.best_of) {
            tracing::warn!(
                best_of = m.best_of,
                team_a = %m.team_a,
                team_b = %m.team_b,
                "unsupported series length, using unscored win/loss outcomes"
            );
        }
        let outcomes = decisive_outcomes(m.best_of);
        let plan = match input.forced.get(&m.key()) {
            SeriesOutcome::Random => MatchPlan::Uniform(
                outcomes
                    .into_iter()
                    .map(|outcome| effect_of(outcome, team_a, team_b))
                    .collect(),
            ),
            forced if outcomes.contains(&forced) => {
                MatchPlan::Fixed(effect_of(forced, team_a, team_b))
            }
            forced => {
                return Err(ProjectionError::InvalidForcedOutcome {
                    key: m.key(),
                    outcome: forced,
                    best_of: m.best_of,
                })
            }
        };
        plans.push(plan);
    }

    Ok(PreparedSeason {
        base_wins,
        base_diff,
        plans,
        bracket_by_position,
        bracket_count: input.brackets.brackets.len(),
    })
}

impl PreparedSeason {
    fn team_count(&self) -> usize {
        self.base_wins.len()
    }

    /// Offset of the `team × position` section in a tally vector.
    fn position_offset(&self) -> usize {
        self.team_count() * self.bracket_count
    }

    /// Length of one tally vector: `team × bracket` counts followed by `team × position`.
    fn tally_width(&self) -> usize {
        self.position_offset() + self.team_count() * self.team_count()
    }

    /// Play out `batch.trials` seasons on the batch's own stream. Returns the batch tally.
    fn play_batch(
        &self,
        batch: TrialBatch,
        seed: u64,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<u32>, ProjectionError> {
        let teams = self.team_count();
        let mut rng = Rng::for_stream(seed, batch.stream);
        let positions = self.position_offset();
        let mut counts = vec![0u32; self.tally_width()];
        let mut wins = self.base_wins.clone();
        let mut diff = self.base_diff.clone();
        let mut tiebreak = vec![0.0f64; teams];
        let mut order: Vec<usize> = (0..teams).collect();

        for _ in 0..batch.trials {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(ProjectionError::Cancelled);
            }
            wins.copy_from_slice(&self.base_wins);
            diff.copy_from_slice(&self.base_diff);

            for plan in &self.plans {
                let effect = match plan {
                    MatchPlan::Fixed(effect) => *effect,
                    MatchPlan::Uniform(effects) => effects[rng.next_below(effects.len())],
                };
                if let Effect::Win {
                    winner,
                    loser,
                    margin,
                } = effect
                {
                    wins[winner] += 1;
                    diff[winner] += margin;
                    diff[loser] -= margin;
                }
            }

            for value in tiebreak.iter_mut() {
                *value = rng.next_f64();
            }
            order.sort_unstable_by(|&left, &right| {
                wins[right]
                    .cmp(&wins[left])
                    .then_with(|| diff[right].cmp(&diff[left]))
                    .then_with(|| tiebreak[right].total_cmp(&tiebreak[left]))
            });

            for (position, &team) in order.iter().enumerate() {
                counts[team * self.bracket_count + self.bracket_by_position[position]] += 1;
                counts[positions + team * teams + position] += 1;
            }
        }
        Ok(counts)
    }

    fn play_batches(
        &self,
        batches: &[TrialBatch],
        seed: u64,
        pool: &BuiltPool,
        cancel: Option<&AtomicBool>,
    ) -> Result<Vec<u32>, ProjectionError> {
        let width = self.tally_width();
        pool.install(|| {
            batches
                .par_iter()
                .map(|batch| self.play_batch(*batch, seed, cancel))
                .try_reduce(|| vec![0u32; width], |mut total, local| {
                    for (sum, count) in total.iter_mut().zip(local) {
                        *sum += count;
                    }
                    Ok(total)
                })
        })
    }
}

/// Estimate how often each team finishes in each bracket.
///
/// Trials are split into a fixed set of random streams played out in parallel, so a fixed
/// seed gives the same table for any worker count.
pub fn project(
    input: &ProjectionInput<'_>,
    options: &ProjectionOptions,
) -> Result<SimulationResult, ProjectionError> {
    project_with_progress(input, options, |_, _| {})
}

/// Like [project] but plays the streams in groups and reports `(trials_done, trials_total)`
/// after each group. The worker pool is built once and shared by every group.
pub fn project_with_progress<F>(
    input: &ProjectionInput<'_>,
    options: &ProjectionOptions,
    mut on_progress: F,
) -> Result<SimulationResult, ProjectionError>
where
    F: FnMut(u32, u32),
{
    let prepared = prepare(input)?;
    let seed = options.seed.unwrap_or_else(Rng::entropy_seed);
    tracing::debug!(
        teams = input.teams.len(),
        unplayed = input.unplayed.len(),
        forced = input.forced.len(),
        trials = input.trials,
        seed,
        "starting projection"
    );

    let pool = options.pool.build()?;
    let cancel = options.cancel.as_deref();
    let batches = trial_batches(input.trials as usize);
    let group_size = batches.len().div_ceil(PROGRESS_STEPS).max(1);
    let mut counts = vec![0u32; prepared.tally_width()];
    let mut done = 0u32;
    on_progress(0, input.trials);
    for group in batches.chunks(group_size) {
        let group_counts = prepared.play_batches(group, seed, &pool, cancel)?;
        for (sum, count) in counts.iter_mut().zip(group_counts) {
            *sum += count;
        }
        done += group.iter().map(|batch| batch.trials as u32).sum::<u32>();
        on_progress(done, input.trials);
    }

    let (bracket_counts, position_counts) = counts.split_at(prepared.position_offset());
    Ok(SimulationResult::from_counts(
        input.teams,
        input.brackets.names(),
        input.trials,
        seed,
        bracket_counts,
        position_counts,
    ))
}
