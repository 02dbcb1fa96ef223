//! Match records supplied by the data-acquisition side. Accepts the original archive's
//! camelCase field names and `"1"`/`"2"` winner markers as well as snake_case.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::season::series::{MatchKey, Side};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    #[serde(alias = "teamA")]
    pub team_a: String,
    #[serde(alias = "teamB")]
    pub team_b: String,
    pub date: NaiveDate,
    #[serde(alias = "bestof", alias = "bestOf", default = "default_best_of")]
    pub best_of: u32,
    /// `None` means the series has not been decided.
    #[serde(default, deserialize_with = "deserialize_winner")]
    pub winner: Option<Side>,
    #[serde(alias = "scoreA", default)]
    pub score_a: u32,
    #[serde(alias = "scoreB", default)]
    pub score_b: u32,
    #[serde(alias = "isRegularSeason", default)]
    pub is_regular_season: bool,
}

fn default_best_of() -> u32 {
    3
}

impl Match {
    pub fn key(&self) -> MatchKey {
        MatchKey::new(self.team_a.clone(), self.team_b.clone(), self.date)
    }

    pub fn is_decided(&self) -> bool {
        self.winner.is_some()
    }

    /// Winner and loser names, if decided.
    pub fn result(&self) -> Option<(&str, &str)> {
        match self.winner? {
            Side::A => Some((&self.team_a, &self.team_b)),
            Side::B => Some((&self.team_b, &self.team_a)),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWinner {
    Text(String),
    Number(u8),
}

fn deserialize_winner<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawWinner>::deserialize(deserializer)?;
    let marker = match raw {
        None => return Ok(None),
        Some(RawWinner::Number(value)) => value.to_string(),
        Some(RawWinner::Text(value)) => value.trim().to_string(),
    };
    match marker.as_str() {
        "" | "0" => Ok(None),
        "1" | "A" | "a" => Ok(Some(Side::A)),
        "2" | "B" | "b" => Ok(Some(Side::B)),
        other => Err(serde::de::Error::custom(format!(
            "winner must be \"1\", \"2\" or empty, got '{other}'"
        ))),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatchLoadError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse match records: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MatchFile {
    Bare(Vec<Match>),
    Wrapped { matches: Vec<Match> },
}

/// Parse match records from JSON: either a bare array or `{"matches": [...]}`.
pub fn parse_matches(raw: &str) -> Result<Vec<Match>, MatchLoadError> {
    let file: MatchFile = serde_json::from_str(raw)?;
    Ok(match file {
        MatchFile::Bare(matches) => matches,
        MatchFile::Wrapped { matches } => matches,
    })
}

pub fn load_matches(path: impl AsRef<Path>) -> Result<Vec<Match>, MatchLoadError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| MatchLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let matches = parse_matches(&raw)?;
    tracing::debug!(count = matches.len(), path = %path.display(), "loaded match records");
    Ok(matches)
}
