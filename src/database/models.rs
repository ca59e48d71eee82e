use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::domain::{
    Match, MatchResult, PlayerId, PointTable, RuleSetId, ScoreRuleSet, TournamentDetails,
    TournamentId, TournamentStatus,
};
use crate::errors::{EngineError, load_context};

#[derive(Debug, Clone)]
pub struct RuleSetRow {
    pub id: RuleSetId,
    pub tcg_id: i64,
    pub name: String,
    pub version: u32,
    pub points: PointTable,
}

impl RuleSetRow {
    pub fn into_ruleset(self) -> Result<ScoreRuleSet> {
        let id = self.id;
        ScoreRuleSet::new(self.id, self.tcg_id, self.name, self.version, self.points)
            .with_context(|| load_context("ruleset", id))
    }
}

#[derive(Debug, Clone)]
pub struct TournamentRow {
    pub id: TournamentId,
    pub details: TournamentDetails,
    pub ruleset_id: RuleSetId,
    pub status: String,
    pub current_round: u32,
}

impl TournamentRow {
    pub fn status(&self) -> Result<TournamentStatus> {
        TournamentStatus::parse(&self.status).ok_or_else(|| {
            EngineError::DataIntegrityViolation(format!(
                "tournament {} has unknown status '{}'",
                self.id, self.status
            ))
            .into()
        })
    }
}

#[derive(Debug, Clone)]
pub struct RoundRow {
    pub number: u32,
    pub finalized: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MatchRow {
    pub round_number: u32,
    pub table: u32,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub result_kind: Option<String>,
    pub winner: Option<PlayerId>,
    pub reported_at: Option<DateTime<Utc>>,
}

impl MatchRow {
    pub fn into_match(self) -> Result<Match> {
        let result = match (self.result_kind.as_deref(), self.winner) {
            (None, _) => None,
            (Some(RESULT_DRAW), _) => Some(MatchResult::Draw),
            (Some(RESULT_WIN), Some(winner)) => Some(MatchResult::Winner(winner)),
            (Some(kind), winner) => {
                return Err(EngineError::DataIntegrityViolation(format!(
                    "round {} table {} has result '{}' with winner {:?}",
                    self.round_number, self.table, kind, winner
                ))
                .into());
            }
        };

        Ok(Match {
            round_number: self.round_number,
            table: self.table,
            player1: self.player1,
            player2: self.player2,
            result,
            reported_at: self.reported_at,
        })
    }
}

pub const RESULT_WIN: &str = "win";
pub const RESULT_DRAW: &str = "draw";

/// `(result_kind, winner)` columns for a match result
pub fn result_columns(result: Option<MatchResult>) -> (Option<&'static str>, Option<PlayerId>) {
    match result {
        None => (None, None),
        Some(MatchResult::Draw) => (Some(RESULT_DRAW), None),
        Some(MatchResult::Winner(winner)) => (Some(RESULT_WIN), Some(winner)),
    }
}
