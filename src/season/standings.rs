use std::collections::HashMap;

use serde::Serialize;

use crate::data::matches::Match;
use crate::season::series::Side;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingsRow {
    pub team: String,
    pub match_wins: u32,
    pub match_losses: u32,
    pub game_wins: u32,
    pub game_losses: u32,
    pub game_differential: i32,
}

impl StandingsRow {
    fn empty(team: &str) -> Self {
        Self {
            team: team.to_string(),
            match_wins: 0,
            match_losses: 0,
            game_wins: 0,
            game_losses: 0,
            game_differential: 0,
        }
    }

    /// `"W-L"` display form used by tables.
    pub fn match_record(&self) -> String {
        format!("{}-{}", self.match_wins, self.match_losses)
    }

    pub fn game_record(&self) -> String {
        format!("{}-{}", self.game_wins, self.game_losses)
    }
}

/// Fold decided matches into one row per team, ranked by match wins then game differential.
///
/// Matches involving a team outside `teams` are ignored. Teams without matches still get a
/// row. Remaining ties keep the order of `teams`, so the result does not depend on the order
/// of `played`.
pub fn build_standings(teams: &[String], played: &[Match]) -> Vec<StandingsRow> {
    let position: HashMap<&str, usize> = teams
        .iter()
        .enumerate()
        .map(|(idx, team)| (team.as_str(), idx))
        .collect();
    let mut series_played = vec![0u32; teams.len()];
    let mut rows: Vec<StandingsRow> = teams.iter().map(|team| StandingsRow::empty(team)).collect();

    for m in played {
        let (Some(&a), Some(&b)) = (position.get(m.team_a.as_str()), position.get(m.team_b.as_str()))
        else {
            continue;
        };
        series_played[a] += 1;
        series_played[b] += 1;
        rows[a].game_wins += m.score_a;
        rows[a].game_losses += m.score_b;
        rows[b].game_wins += m.score_b;
        rows[b].game_losses += m.score_a;
        match m.winner {
            Some(Side::A) => rows[a].match_wins += 1,
            Some(Side::B) => rows[b].match_wins += 1,
            None => {}
        }
    }

    for (row, played_count) in rows.iter_mut().zip(series_played) {
        row.match_losses = played_count - row.match_wins;
        row.game_differential = row.game_wins as i32 - row.game_losses as i32;
    }

    rows.sort_by(|left, right| {
        right
            .match_wins
            .cmp(&left.match_wins)
            .then_with(|| right.game_differential.cmp(&left.game_differential))
    });
    rows
}

/// Base state for a projection: match wins and game differential per team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentState {
    pub wins: HashMap<String, u32>,
    pub differential: HashMap<String, i32>,
}

pub fn current_state(rows: &[StandingsRow]) -> CurrentState {
    CurrentState {
        wins: rows
            .iter()
            .map(|row| (row.team.clone(), row.match_wins))
            .collect(),
        differential: rows
            .iter()
            .map(|row| (row.team.clone(), row.game_differential))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn decided(a: &str, b: &str, day: u32, score_a: u32, score_b: u32) -> Match {
        Match {
            team_a: a.to_string(),
            team_b: b.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 8, day).expect("valid date"),
            best_of: 3,
            winner: Some(if score_a > score_b { Side::A } else { Side::B }),
            score_a,
            score_b,
            is_regular_season: true,
        }
    }

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn ranks_by_wins_then_differential() {
        let played = vec![
            decided("A", "B", 1, 2, 1),
            decided("C", "B", 2, 2, 0),
            decided("C", "A", 3, 0, 2),
        ];
        let rows = build_standings(&teams(&["A", "B", "C"]), &played);
        let order: Vec<&str> = rows.iter().map(|row| row.team.as_str()).collect();
        assert_eq!(order, ["A", "C", "B"]);
        assert_eq!(rows[0].match_record(), "2-0");
        assert_eq!(rows[0].game_record(), "4-1");
        assert_eq!(rows[0].game_differential, 3);
        assert_eq!(rows[2].match_record(), "0-2");
        assert_eq!(rows[2].game_differential, -3);
    }

    #[test]
    fn team_without_matches_gets_zero_row() {
        let rows = build_standings(&teams(&["A", "B", "Idle"]), &[decided("A", "B", 1, 2, 0)]);
        let idle = rows.iter().find(|row| row.team == "Idle").expect("idle team present");
        assert_eq!(idle, &StandingsRow::empty("Idle"));
    }

    #[test]
    fn matches_with_unknown_teams_are_ignored() {
        let rows = build_standings(&teams(&["A", "B"]), &[decided("A", "Guest", 1, 2, 0)]);
        assert!(rows.iter().all(|row| row.match_wins == 0 && row.game_wins == 0));
    }

    #[test]
    fn full_ties_keep_team_order() {
        let rows = build_standings(&teams(&["Zeta", "Alpha"]), &[]);
        assert_eq!(rows[0].team, "Zeta");
        assert_eq!(rows[1].team, "Alpha");
    }

    #[test]
    fn current_state_mirrors_rows() {
        let rows = build_standings(&teams(&["A", "B"]), &[decided("A", "B", 1, 2, 1)]);
        let state = current_state(&rows);
        assert_eq!(state.wins["A"], 1);
        assert_eq!(state.wins["B"], 0);
        assert_eq!(state.differential["A"], 1);
        assert_eq!(state.differential["B"], -1);
    }
}
