use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lifecycle::LifecycleState;

pub type PlayerId = i64;
pub type TournamentId = i64;
pub type RuleSetId = i64;
pub type StoreId = i64;

/// A single player's outcome of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
}

/// Reported result of a two-player match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "winner", rename_all = "snake_case")]
pub enum MatchResult {
    Winner(PlayerId),
    Draw,
}

impl MatchResult {
    pub fn outcome_for(&self, player_id: PlayerId) -> Outcome {
        match self {
            MatchResult::Draw => Outcome::Draw,
            MatchResult::Winner(winner) if *winner == player_id => Outcome::Win,
            MatchResult::Winner(_) => Outcome::Loss,
        }
    }
}

/// One table of a round. `player2 == None` is a bye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub round_number: u32,
    pub table: u32,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub result: Option<MatchResult>,
    pub reported_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn pairing(round_number: u32, table: u32, player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            round_number,
            table,
            player1,
            player2: Some(player2),
            result: None,
            reported_at: None,
        }
    }

    pub fn bye(round_number: u32, table: u32, player: PlayerId) -> Self {
        Self {
            round_number,
            table,
            player1: player,
            player2: None,
            result: None,
            reported_at: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.player2.is_none()
    }

    pub fn is_reported(&self) -> bool {
        self.result.is_some()
    }

    /// Byes need no report; everything else needs a result.
    pub fn is_settled(&self) -> bool {
        self.is_bye() || self.is_reported()
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.player1 == player_id || self.player2 == Some(player_id)
    }

    pub fn participants(&self) -> impl Iterator<Item = PlayerId> + '_ {
        std::iter::once(self.player1).chain(self.player2)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub number: u32,
    pub matches: Vec<Match>,
    pub finalized: bool,
    pub started_at: DateTime<Utc>,
}

impl Round {
    pub fn new(number: u32, matches: Vec<Match>, started_at: DateTime<Utc>) -> Self {
        Self {
            number,
            matches,
            finalized: false,
            started_at,
        }
    }

    pub fn match_at(&self, table: u32) -> Option<&Match> {
        self.matches.iter().find(|m| m.table == table)
    }

    pub fn match_at_mut(&mut self, table: u32) -> Option<&mut Match> {
        self.matches.iter_mut().find(|m| m.table == table)
    }

    pub fn unreported_tables(&self) -> Vec<u32> {
        self.matches
            .iter()
            .filter(|m| !m.is_settled())
            .map(|m| m.table)
            .collect()
    }

    pub fn bye_player(&self) -> Option<PlayerId> {
        self.matches.iter().find(|m| m.is_bye()).map(|m| m.player1)
    }
}

/// Descriptive attributes fixed when a tournament is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentDetails {
    pub name: String,
    pub location: String,
    pub store_id: StoreId,
    pub starts_at: DateTime<Utc>,
    pub capacity: u32,
    pub total_rounds: u32,
    pub round_time_limit_minutes: u32,
    pub entry_fee: f64,
    pub prize: String,
    pub format: String,
}

/// Persisted status column, derived from [`LifecycleState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Open,
    InProgress,
    Finished,
    Cancelled,
}

impl TournamentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TournamentStatus::Open => "open",
            TournamentStatus::InProgress => "in_progress",
            TournamentStatus::Finished => "finished",
            TournamentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TournamentStatus::Open),
            "in_progress" => Some(TournamentStatus::InProgress),
            "finished" => Some(TournamentStatus::Finished),
            "cancelled" => Some(TournamentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tournament aggregate: owns its roster, rounds and matches.
///
/// State changes go through the operations in [`crate::lifecycle::controller`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub details: TournamentDetails,
    pub ruleset_id: RuleSetId,
    pub state: LifecycleState,
    pub players: Vec<PlayerId>,
    pub rounds: Vec<Round>,
}

impl Tournament {
    pub fn new(id: TournamentId, details: TournamentDetails, ruleset_id: RuleSetId) -> Self {
        Self {
            id,
            details,
            ruleset_id,
            state: LifecycleState::Open,
            players: Vec::new(),
            rounds: Vec::new(),
        }
    }

    pub fn status(&self) -> TournamentStatus {
        self.state.status()
    }

    pub fn current_round(&self) -> u32 {
        self.state.current_round()
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|r| r.number == number)
    }

    pub fn latest_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn finalized_matches(&self) -> impl Iterator<Item = &Match> + '_ {
        self.rounds
            .iter()
            .filter(|r| r.finalized)
            .flat_map(|r| r.matches.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_for_each_side() {
        let result = MatchResult::Winner(4);
        assert_eq!(result.outcome_for(4), Outcome::Win);
        assert_eq!(result.outcome_for(9), Outcome::Loss);
        assert_eq!(MatchResult::Draw.outcome_for(4), Outcome::Draw);
    }

    #[test]
    fn test_byes_are_settled_without_a_report() {
        let round = Round::new(
            1,
            vec![Match::pairing(1, 1, 1, 2), Match::bye(1, 2, 3)],
            Utc::now(),
        );

        assert_eq!(round.unreported_tables(), vec![1]);
        assert_eq!(round.bye_player(), Some(3));
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            TournamentStatus::Open,
            TournamentStatus::InProgress,
            TournamentStatus::Finished,
            TournamentStatus::Cancelled,
        ] {
            assert_eq!(TournamentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TournamentStatus::parse("paused"), None);
    }
}
