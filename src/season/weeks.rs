//! Group match dates into "weeks" so a cutoff can be picked per week rather than per match.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Default maximum gap, in days, between consecutive dates of one block.
pub const DEFAULT_WEEK_GAP_DAYS: i64 = 3;

/// A run of match dates. Only [partition_weeks] builds blocks, so `dates` is sorted and
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBlock {
    /// 0-based block index; displayed as week `index + 1`.
    pub index: usize,
    dates: Vec<NaiveDate>,
}

impl WeekBlock {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn label(&self) -> String {
        format!("Week {} ({} to {})", self.index + 1, self.first(), self.last())
    }
}

/// Greedy grouping: a date joins the current block when it is at most `max_gap_days` after
/// the block's last date. Input is sorted and deduplicated first.
pub fn partition_weeks(dates: &[NaiveDate], max_gap_days: i64) -> Vec<WeekBlock> {
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut blocks: Vec<WeekBlock> = Vec::new();
    for date in sorted {
        let extends_current = blocks
            .last()
            .is_some_and(|block| (date - block.last()).num_days() <= max_gap_days);
        if extends_current {
            if let Some(block) = blocks.last_mut() {
                block.dates.push(date);
                continue;
            }
        }
        let index = blocks.len();
        blocks.push(WeekBlock {
            index,
            dates: vec![date],
        });
    }
    blocks
}

/// How much of the season counts as already played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cutoff {
    /// Nothing counts as played.
    PreSeason,
    /// Weeks `0..=index` count as played.
    Week(usize),
    /// Every decided match counts as played.
    #[default]
    Latest,
}

impl Cutoff {
    /// `-1` is pre-season (as in the week slider), `None` is the latest state.
    pub fn from_week_index(index: Option<i64>) -> Self {
        match index {
            None => Self::Latest,
            Some(value) if value < 0 => Self::PreSeason,
            Some(value) => Self::Week(value as usize),
        }
    }

    /// Last date that counts as played. `Ok(None)` means no date limit.
    pub fn last_played_date(self, weeks: &[WeekBlock]) -> Result<Option<NaiveDate>, CutoffError> {
        match self {
            Self::Latest => Ok(None),
            Self::PreSeason => Ok(Some(NaiveDate::MIN)),
            Self::Week(index) => weeks
                .get(index)
                .map(|block| Some(block.last()))
                .ok_or(CutoffError {
                    index,
                    available: weeks.len(),
                }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cutoff week {index} is out of range: season has {available} week(s)")]
pub struct CutoffError {
    pub index: usize,
    pub available: usize,
}
