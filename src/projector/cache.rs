//! Memoized scenario reports for the HTTP API. Only seeded runs are cached: an unseeded run
//! must draw a fresh seed every time.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

use crate::projector::{ProjectionScenario, ScenarioReport};
use crate::season::weeks::Cutoff;

pub const DEFAULT_CACHE_CAPACITY: usize = 32;

/// Identity of a seeded scenario. The hash covers every input; the remaining fields are
/// compared on lookup too, so two scenarios that share a hash never share a report.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScenarioKey {
    hash: u64,
    seed: u64,
    trials: u32,
    cutoff: Cutoff,
    /// Sorted, deduplicated names from both sides of every match.
    teams: Vec<String>,
    forced: usize,
    brackets: usize,
}

/// Key for everything that determines a seeded report. `None` for unseeded runs.
pub fn scenario_fingerprint(scenario: &ProjectionScenario<'_>) -> Option<ScenarioKey> {
    let seed = scenario.seed?;
    let mut hasher = DefaultHasher::new();
    scenario.matches.hash(&mut hasher);
    scenario.cutoff.hash(&mut hasher);
    scenario.week_gap_days.hash(&mut hasher);
    scenario.forced.sorted_entries().hash(&mut hasher);
    scenario.brackets.hash(&mut hasher);
    scenario.trials.hash(&mut hasher);
    seed.hash(&mut hasher);

    let mut teams: Vec<String> = scenario
        .matches
        .iter()
        .flat_map(|m| [m.team_a.clone(), m.team_b.clone()])
        .collect();
    teams.sort_unstable();
    teams.dedup();

    Some(ScenarioKey {
        hash: hasher.finish(),
        seed,
        trials: scenario.trials,
        cutoff: scenario.cutoff,
        teams,
        forced: scenario.forced.len(),
        brackets: scenario.brackets.brackets.len(),
    })
}

/// Bounded cache; the oldest entry is evicted first.
#[derive(Debug)]
pub struct ProjectionCache {
    capacity: usize,
    entries: HashMap<ScenarioKey, ScenarioReport>,
    order: VecDeque<ScenarioKey>,
}

impl Default for ProjectionCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ProjectionCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&self, key: &ScenarioKey) -> Option<&ScenarioReport> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: ScenarioKey, report: ScenarioReport) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, report);
            return;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, report);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
