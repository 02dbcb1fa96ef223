//! Series outcomes for a best-of-N match and the analyst's forced ("what-if") overrides.
//!
//! Outcomes travel as compact codes at the edges (`"A21"`, `"B30"`, `"DRAW"`, `"random"`,
//! `"A1"` for an unscored win) and as [SeriesOutcome] everywhere else.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which listed side of a match: `A` is `team_a`, `B` is `team_b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn code(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesScore {
    /// Exact game score of the series.
    Games { won: u8, lost: u8 },
    /// Winner known, score not modelled. Counts as a one-game margin.
    Unscored,
}

impl SeriesScore {
    pub fn margin(self) -> i32 {
        match self {
            Self::Games { won, lost } => i32::from(won) - i32::from(lost),
            Self::Unscored => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SeriesOutcome {
    /// Let the projector draw uniformly among the real outcomes.
    Random,
    Win { winner: Side, score: SeriesScore },
    /// Even split of a best-of-2; no match win is awarded.
    Draw,
}

impl SeriesOutcome {
    pub fn code(&self) -> String {
        match self {
            Self::Random => "random".to_string(),
            Self::Draw => "DRAW".to_string(),
            Self::Win {
                winner,
                score: SeriesScore::Games { won, lost },
            } => format!("{}{won}{lost}", winner.code()),
            Self::Win {
                winner,
                score: SeriesScore::Unscored,
            } => format!("{}1", winner.code()),
        }
    }

    fn games(winner: Side, won: u8, lost: u8) -> Self {
        Self::Win {
            winner,
            score: SeriesScore::Games { won, lost },
        }
    }
}

impl fmt::Display for SeriesOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised series outcome code '{0}'")]
pub struct OutcomeCodeError(pub String);

impl FromStr for SeriesOutcome {
    type Err = OutcomeCodeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let code = raw.trim();
        if code.eq_ignore_ascii_case("random") || code.is_empty() {
            return Ok(Self::Random);
        }
        if code.eq_ignore_ascii_case("draw") {
            return Ok(Self::Draw);
        }
        let mut chars = code.chars();
        let winner = match chars.next() {
            Some('A') => Side::A,
            Some('B') => Side::B,
            _ => return Err(OutcomeCodeError(raw.to_string())),
        };
        let digits: Vec<u8> = chars
            .map(|ch| ch.to_digit(10).map(|d| d as u8))
            .collect::<Option<_>>()
            .ok_or_else(|| OutcomeCodeError(raw.to_string()))?;
        match digits.as_slice() {
            [1] => Ok(Self::Win {
                winner,
                score: SeriesScore::Unscored,
            }),
            [won, lost] if won > lost => Ok(Self::games(winner, *won, *lost)),
            _ => Err(OutcomeCodeError(raw.to_string())),
        }
    }
}

impl TryFrom<String> for SeriesOutcome {
    type Error = OutcomeCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeriesOutcome> for String {
    fn from(value: SeriesOutcome) -> Self {
        value.code()
    }
}

/// Series lengths with exact score enumeration. Anything else uses the unscored fallback.
pub const SUPPORTED_SERIES_LENGTHS: [u32; 4] = [1, 2, 3, 5];

pub fn is_supported_series_length(best_of: u32) -> bool {
    SUPPORTED_SERIES_LENGTHS.contains(&best_of)
}

/// One selectable outcome: a display label plus the outcome it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeOption {
    pub label: String,
    pub outcome: SeriesOutcome,
}

impl OutcomeOption {
    fn new(label: String, outcome: SeriesOutcome) -> Self {
        Self { label, outcome }
    }
}

/// Every outcome of a `best_of` series between `team_a` and `team_b`, led by `Random`.
/// The order is fixed per series length so forced codes stay meaningful across callers.
pub fn enumerate_outcomes(team_a: &str, team_b: &str, best_of: u32) -> Vec<OutcomeOption> {
    let mut options = vec![OutcomeOption::new("Random".to_string(), SeriesOutcome::Random)];
    let win = |team: &str, side: Side, won: u8, lost: u8| {
        OutcomeOption::new(
            format!("{team} {won}–{lost}"),
            SeriesOutcome::games(side, won, lost),
        )
    };
    match best_of {
        1 => {
            options.push(win(team_a, Side::A, 1, 0));
            options.push(win(team_b, Side::B, 1, 0));
        }
        2 => {
            options.push(win(team_a, Side::A, 2, 0));
            options.push(OutcomeOption::new("Draw 1–1".to_string(), SeriesOutcome::Draw));
            options.push(win(team_b, Side::B, 2, 0));
        }
        3 => {
            options.push(win(team_a, Side::A, 2, 0));
            options.push(win(team_a, Side::A, 2, 1));
            options.push(win(team_b, Side::B, 2, 1));
            options.push(win(team_b, Side::B, 2, 0));
        }
        5 => {
            options.push(win(team_a, Side::A, 3, 0));
            options.push(win(team_a, Side::A, 3, 1));
            options.push(win(team_a, Side::A, 3, 2));
            options.push(win(team_b, Side::B, 3, 2));
            options.push(win(team_b, Side::B, 3, 1));
            options.push(win(team_b, Side::B, 3, 0));
        }
        _ => {
            for (team, side) in [(team_a, Side::A), (team_b, Side::B)] {
                options.push(OutcomeOption::new(
                    format!("{team} Win"),
                    SeriesOutcome::Win {
                        winner: side,
                        score: SeriesScore::Unscored,
                    },
                ));
            }
        }
    }
    options
}

/// The outcomes a random draw chooses between: [enumerate_outcomes] without `Random`.
pub fn decisive_outcomes(best_of: u32) -> Vec<SeriesOutcome> {
    enumerate_outcomes("", "", best_of)
        .into_iter()
        .map(|option| option.outcome)
        .filter(|outcome| *outcome != SeriesOutcome::Random)
        .collect()
}

/// Identity of a scheduled series within one season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchKey {
    pub team_a: String,
    pub team_b: String,
    pub date: NaiveDate,
}

impl MatchKey {
    pub fn new(team_a: impl Into<String>, team_b: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            team_a: team_a.into(),
            team_b: team_b.into(),
            date,
        }
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} vs {} ({})", self.team_a, self.team_b, self.date)
    }
}

/// Wire form of one override: the match key fields plus an `outcome` code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcedOutcomeEntry {
    #[serde(flatten)]
    pub key: MatchKey,
    pub outcome: SeriesOutcome,
}

/// Sparse analyst overrides. Missing entries mean [SeriesOutcome::Random].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ForcedOutcomeEntry>", into = "Vec<ForcedOutcomeEntry>")]
pub struct ForcedOutcomeMap {
    entries: HashMap<MatchKey, SeriesOutcome>,
}

impl ForcedOutcomeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Setting `Random` clears any previous override for the match.
    pub fn force(&mut self, key: MatchKey, outcome: SeriesOutcome) {
        if outcome == SeriesOutcome::Random {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, outcome);
        }
    }

    pub fn get(&self, key: &MatchKey) -> SeriesOutcome {
        self.entries
            .get(key)
            .copied()
            .unwrap_or(SeriesOutcome::Random)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MatchKey, &SeriesOutcome)> {
        self.entries.iter()
    }

    /// Entries in key order, for hashing and stable output.
    pub fn sorted_entries(&self) -> Vec<(&MatchKey, &SeriesOutcome)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by(|left, right| left.0.cmp(right.0));
        entries
    }
}

impl From<Vec<ForcedOutcomeEntry>> for ForcedOutcomeMap {
    fn from(list: Vec<ForcedOutcomeEntry>) -> Self {
        let mut map = ForcedOutcomeMap::new();
        for entry in list {
            map.force(entry.key, entry.outcome);
        }
        map
    }
}

impl From<ForcedOutcomeMap> for Vec<ForcedOutcomeEntry> {
    fn from(map: ForcedOutcomeMap) -> Self {
        let mut list: Vec<ForcedOutcomeEntry> = map
            .entries
            .into_iter()
            .map(|(key, outcome)| ForcedOutcomeEntry { key, outcome })
            .collect();
        list.sort_by(|left, right| left.key.cmp(&right.key));
        list
    }
}
