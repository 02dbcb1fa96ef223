use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;
use crate::season::standings::StandingsRow;

/// Bracket-membership probabilities: one row per team, one column per bracket. Each row also
/// carries the team's finishing-position distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Bracket names in declared order; column order of every row.
    pub brackets: Vec<String>,
    pub trials: u32,
    /// Seed the run used, so unseeded runs can be replayed.
    pub seed: u64,
    pub rows: Vec<ProbabilityRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityRow {
    pub team: String,
    /// Trials in which the team finished in each bracket. Sums to `trials`.
    pub counts: Vec<u32>,
    /// `counts` as percentages rounded to 2 decimals.
    pub percentages: Vec<f64>,
    pub positions: PositionDistribution,
}

/// How often a team finished in each position; index 0 is first place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionDistribution {
    /// Sums to `trials`, as does every position column across teams.
    pub counts: Vec<u32>,
    pub percentages: Vec<f64>,
}

fn percentages_of(counts: &[u32], trials: u32) -> Vec<f64> {
    counts
        .iter()
        .map(|&count| round_percentage(count, trials))
        .collect()
}

/// `count / trials` as a percentage rounded to 2 decimals.
pub fn round_percentage(count: u32, trials: u32) -> f64 {
    if trials == 0 {
        return 0.0;
    }
    let percent = f64::from(count) / f64::from(trials) * 100.0;
    (percent * 100.0).round() / 100.0
}

impl SimulationResult {
    /// Build rows from flattened `team × bracket` and `team × position` tallies, both in
    /// `teams` order.
    pub(crate) fn from_counts(
        teams: &[String],
        brackets: Vec<String>,
        trials: u32,
        seed: u64,
        bracket_counts: &[u32],
        position_counts: &[u32],
    ) -> Self {
        let width = brackets.len();
        let places = teams.len();
        let rows = teams
            .iter()
            .enumerate()
            .map(|(idx, team)| {
                let team_counts = bracket_counts[idx * width..(idx + 1) * width].to_vec();
                let place_counts = position_counts[idx * places..(idx + 1) * places].to_vec();
                ProbabilityRow {
                    team: team.clone(),
                    percentages: percentages_of(&team_counts, trials),
                    counts: team_counts,
                    positions: PositionDistribution {
                        percentages: percentages_of(&place_counts, trials),
                        counts: place_counts,
                    },
                }
            })
            .collect();
        Self {
            brackets,
            trials,
            seed,
            rows,
        }
    }

    pub fn row(&self, team: &str) -> Option<&ProbabilityRow> {
        self.rows.iter().find(|row| row.team == team)
    }

    pub fn percentage(&self, team: &str, bracket: &str) -> Option<f64> {
        let column = self.brackets.iter().position(|name| name == bracket)?;
        self.row(team).map(|row| row.percentages[column])
    }

    /// Share of trials in which `team` finished at `position` (1-indexed).
    pub fn position_percentage(&self, team: &str, position: usize) -> Option<f64> {
        let row = self.row(team)?;
        row.positions
            .percentages
            .get(position.checked_sub(1)?)
            .copied()
    }

    /// Rows re-sorted to follow `standings`. Both must cover exactly the same teams.
    pub fn ordered_by_standings(
        &self,
        standings: &[StandingsRow],
    ) -> Result<SimulationResult, ProjectionError> {
        let by_team: HashMap<&str, &ProbabilityRow> =
            self.rows.iter().map(|row| (row.team.as_str(), row)).collect();
        if let Some(extra) = self
            .rows
            .iter()
            .find(|row| !standings.iter().any(|standing| standing.team == row.team))
        {
            return Err(ProjectionError::StandingsAlignmentMismatch(extra.team.clone()));
        }
        let rows = standings
            .iter()
            .map(|standing| {
                by_team
                    .get(standing.team.as_str())
                    .map(|row| (*row).clone())
                    .ok_or_else(|| ProjectionError::StandingsAlignmentMismatch(standing.team.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimulationResult {
            rows,
            ..self.clone()
        })
    }
}
