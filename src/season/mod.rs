//! Season state: regular-season matches split into played and unplayed at a cutoff.

pub mod rng;
pub mod series;
pub mod standings;
pub mod weeks;

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::matches::Match;
use crate::error::ProjectionError;
use crate::season::series::MatchKey;
use crate::season::standings::{build_standings, StandingsRow};
use crate::season::weeks::{partition_weeks, Cutoff, WeekBlock};

/// A series still to be decided, as the projector sees it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnplayedMatch {
    pub team_a: String,
    pub team_b: String,
    pub date: NaiveDate,
    pub best_of: u32,
}

impl UnplayedMatch {
    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.team_a.clone(), self.team_b.clone(), self.date)
    }
}

impl From<&Match> for UnplayedMatch {
    fn from(m: &Match) -> Self {
        Self {
            team_a: m.team_a.clone(),
            team_b: m.team_b.clone(),
            date: m.date,
            best_of: m.best_of,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SeasonSplit {
    pub played: Vec<Match>,
    pub unplayed: Vec<UnplayedMatch>,
}

/// The regular season of one tournament.
#[derive(Debug, Clone)]
pub struct Season {
    matches: Vec<Match>,
    teams: Vec<String>,
}

impl Season {
    /// Keep regular-season matches only. Fails when there are none.
    pub fn from_matches(matches: &[Match]) -> Result<Self, ProjectionError> {
        let regular: Vec<Match> = matches
            .iter()
            .filter(|m| m.is_regular_season)
            .cloned()
            .collect();
        if regular.is_empty() {
            return Err(ProjectionError::NoRegularSeasonData);
        }
        let teams: BTreeSet<String> = regular
            .iter()
            .flat_map(|m| [m.team_a.clone(), m.team_b.clone()])
            .collect();
        Ok(Self {
            matches: regular,
            teams: teams.into_iter().collect(),
        })
    }

    /// Team names in sorted order.
    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn weeks(&self, max_gap_days: i64) -> Vec<WeekBlock> {
        let dates: Vec<NaiveDate> = self.matches.iter().map(|m| m.date).collect();
        partition_weeks(&dates, max_gap_days)
    }

    /// A match is played when it has a winner and falls on or before the cutoff. Everything
    /// else, including decided matches after the cutoff, is left to the projector.
    pub fn split(&self, cutoff: Cutoff, max_gap_days: i64) -> Result<SeasonSplit, ProjectionError> {
        let last_played = cutoff.last_played_date(&self.weeks(max_gap_days))?;
        let mut split = SeasonSplit::default();
        for m in &self.matches {
            let in_window = last_played.map_or(true, |last| m.date <= last);
            if m.is_decided() && in_window {
                split.played.push(m.clone());
            } else {
                split.unplayed.push(UnplayedMatch::from(m));
            }
        }
        Ok(split)
    }

    pub fn standings(&self, played: &[Match]) -> Vec<StandingsRow> {
        build_standings(&self.teams, played)
    }
}
