//! Bracket configuration: named, contiguous rank bands used for probability reporting.
//! Persisted per tournament as `{"brackets": [{"name", "start", "end"}]}`; `end: null` runs
//! through last place.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bracket {
    pub name: String,
    pub start: u32,
    #[serde(default)]
    pub end: Option<u32>,
}

impl Bracket {
    pub fn new(name: impl Into<String>, start: u32, end: Option<u32>) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, rank: u32) -> bool {
        rank >= self.start && self.end.map_or(true, |end| rank <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BracketConfig {
    pub brackets: Vec<Bracket>,
}

impl Default for BracketConfig {
    /// Top two, a mid-table playoff band, everyone else.
    fn default() -> Self {
        Self {
            brackets: vec![
                Bracket::new("Top 2", 1, Some(2)),
                Bracket::new("Playoffs 3-6", 3, Some(6)),
                Bracket::new("Unqualified", 7, None),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BracketConfigError {
    #[error("bracket config has no brackets")]
    Empty,
    #[error("bracket '{name}': start rank must be at least 1")]
    ZeroStart { name: String },
    #[error("bracket '{name}': end rank {end} is before start rank {start}")]
    Inverted { name: String, start: u32, end: u32 },
    #[error("bracket name '{name}' is used more than once")]
    DuplicateName { name: String },
    #[error("first bracket '{name}' starts at rank {start}, expected 1")]
    FirstNotAtTop { name: String, start: u32 },
    #[error("open-ended bracket '{name}' must be the last bracket")]
    OpenNotLast { name: String },
    #[error("bracket '{name}' starts at rank {start}, expected {expected} (gap or overlap)")]
    NotContiguous {
        name: String,
        start: u32,
        expected: u32,
    },
    #[error("brackets end at rank {last}, leaving ranks up to {team_count} uncovered")]
    Uncovered { last: u32, team_count: u32 },
}

impl BracketConfig {
    pub fn names(&self) -> Vec<String> {
        self.brackets.iter().map(|bracket| bracket.name.clone()).collect()
    }

    /// First bracket in declared order that contains `rank` (1-indexed).
    pub fn bracket_for_rank(&self, rank: u32) -> Option<usize> {
        self.brackets.iter().position(|bracket| bracket.contains(rank))
    }

    /// Check that the brackets are contiguous, non-overlapping and cover `1..=team_count`.
    /// Brackets lying entirely past the last team are allowed.
    pub fn validate(&self, team_count: usize) -> Result<(), BracketConfigError> {
        let first = self.brackets.first().ok_or(BracketConfigError::Empty)?;
        if first.start != 1 {
            return Err(BracketConfigError::FirstNotAtTop {
                name: first.name.clone(),
                start: first.start,
            });
        }

        let mut names = HashSet::new();
        let mut expected_start = 1u32;
        let mut covered_through: Option<u32> = Some(0);
        for (idx, bracket) in self.brackets.iter().enumerate() {
            if !names.insert(bracket.name.as_str()) {
                return Err(BracketConfigError::DuplicateName {
                    name: bracket.name.clone(),
                });
            }
            if bracket.start == 0 {
                return Err(BracketConfigError::ZeroStart {
                    name: bracket.name.clone(),
                });
            }
            if bracket.start != expected_start {
                return Err(BracketConfigError::NotContiguous {
                    name: bracket.name.clone(),
                    start: bracket.start,
                    expected: expected_start,
                });
            }
            match bracket.end {
                Some(end) if end < bracket.start => {
                    return Err(BracketConfigError::Inverted {
                        name: bracket.name.clone(),
                        start: bracket.start,
                        end,
                    });
                }
                Some(end) => {
                    expected_start = end.saturating_add(1);
                    covered_through = Some(end);
                }
                None if idx + 1 != self.brackets.len() => {
                    return Err(BracketConfigError::OpenNotLast {
                        name: bracket.name.clone(),
                    });
                }
                None => covered_through = None,
            }
        }

        let team_count = team_count as u32;
        match covered_through {
            Some(last) if last < team_count => Err(BracketConfigError::Uncovered { last, team_count }),
            _ => Ok(()),
        }
    }
}

/// Filesystem-safe file stem for a tournament display name: lowercase ASCII alphanumerics
/// joined by single underscores.
pub fn tournament_slug(tournament: &str) -> String {
    let lowered: String = tournament
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let slug = lowered.split_whitespace().collect::<Vec<_>>().join("_");
    if slug.is_empty() {
        "tournament".to_string()
    } else {
        slug
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BracketStoreError {
    #[error("unable to access '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse bracket config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory of per-tournament bracket configs.
#[derive(Debug, Clone)]
pub struct BracketStore {
    dir: PathBuf,
}

impl BracketStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, tournament: &str) -> PathBuf {
        self.dir.join(format!("{}.json", tournament_slug(tournament)))
    }

    /// Saved config for `tournament`, or [BracketConfig::default] when none exists yet.
    pub fn load(&self, tournament: &str) -> Result<BracketConfig, BracketStoreError> {
        let path = self.path_for(tournament);
        if !path.exists() {
            tracing::debug!(tournament, "no saved brackets, using defaults");
            return Ok(BracketConfig::default());
        }
        let raw = fs::read_to_string(&path).map_err(|source| io_error(&path, source))?;
        serde_json::from_str(&raw).map_err(|source| BracketStoreError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, tournament: &str, config: &BracketConfig) -> Result<PathBuf, BracketStoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| io_error(&self.dir, source))?;
        let path = self.path_for(tournament);
        let payload = serde_json::to_string_pretty(config).map_err(|source| BracketStoreError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(&path, payload).map_err(|source| io_error(&path, source))?;
        tracing::info!(tournament, path = %path.display(), "saved bracket config");
        Ok(path)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BracketStoreError {
    BracketStoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
