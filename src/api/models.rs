use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Match, MatchResult, PlayerId, PointTable, RuleSetId, Round, ScoreRuleSet, StoreId, Tournament,
    TournamentDetails,
};
use crate::errors::EngineError;
use crate::lifecycle::{LifecycleState, RoundAdvance};
use crate::ranking::RankingEntry;
use crate::standings::Standing;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsPayload {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
    #[serde(default)]
    pub opponent_on_win: f64,
    #[serde(default)]
    pub opponent_on_loss: f64,
    #[serde(default)]
    pub opponent_on_draw: f64,
}

impl From<PointsPayload> for PointTable {
    fn from(p: PointsPayload) -> Self {
        PointTable {
            win: p.win,
            loss: p.loss,
            draw: p.draw,
            opponent_on_win: p.opponent_on_win,
            opponent_on_loss: p.opponent_on_loss,
            opponent_on_draw: p.opponent_on_draw,
        }
    }
}

impl From<&PointTable> for PointsPayload {
    fn from(p: &PointTable) -> Self {
        PointsPayload {
            win: p.win,
            loss: p.loss,
            draw: p.draw,
            opponent_on_win: p.opponent_on_win,
            opponent_on_loss: p.opponent_on_loss,
            opponent_on_draw: p.opponent_on_draw,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRuleSetRequest {
    pub tcg_id: i64,
    pub name: String,
    pub points: PointsPayload,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSetView {
    pub id: RuleSetId,
    pub tcg_id: i64,
    pub name: String,
    pub version: u32,
    pub points: PointsPayload,
}

impl From<&ScoreRuleSet> for RuleSetView {
    fn from(r: &ScoreRuleSet) -> Self {
        RuleSetView {
            id: r.id(),
            tcg_id: r.tcg_id(),
            name: r.name().to_string(),
            version: r.version(),
            points: r.points().into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTournamentRequest {
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub store_id: StoreId,
    pub starts_at: DateTime<Utc>,
    pub capacity: u32,
    pub total_rounds: Option<u32>,
    #[serde(default)]
    pub round_time_limit_minutes: u32,
    #[serde(default)]
    pub entry_fee: f64,
    #[serde(default)]
    pub prize: String,
    #[serde(default)]
    pub format: String,
    pub ruleset_id: RuleSetId,
}

impl CreateTournamentRequest {
    pub fn into_details(self, default_rounds: u32) -> (TournamentDetails, RuleSetId) {
        let details = TournamentDetails {
            name: self.name,
            location: self.location,
            store_id: self.store_id,
            starts_at: self.starts_at,
            capacity: self.capacity,
            total_rounds: self.total_rounds.unwrap_or(default_rounds),
            round_time_limit_minutes: self.round_time_limit_minutes,
            entry_fee: self.entry_fee,
            prize: self.prize,
            format: self.format,
        };
        (details, self.ruleset_id)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPlayerRequest {
    pub player_id: PlayerId,
}

/// Either `{"winner": <player id>}` or `{"draw": true}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRequest {
    pub winner: Option<PlayerId>,
    #[serde(default)]
    pub draw: bool,
}

impl ResultRequest {
    pub fn into_result(self) -> Result<MatchResult, EngineError> {
        match (self.winner, self.draw) {
            (Some(winner), false) => Ok(MatchResult::Winner(winner)),
            (None, true) => Ok(MatchResult::Draw),
            _ => Err(EngineError::InvalidResult(
                "give either a winner or a draw".into(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RankingParams {
    pub store: Option<StoreId>,
    pub window: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub round: u32,
    pub table: u32,
    pub player1: PlayerId,
    pub player2: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    pub draw: bool,
    pub reported_at: Option<DateTime<Utc>>,
}

impl From<&Match> for MatchView {
    fn from(m: &Match) -> Self {
        MatchView {
            round: m.round_number,
            table: m.table,
            player1: m.player1,
            player2: m.player2,
            winner: match m.result {
                Some(MatchResult::Winner(id)) => Some(id),
                _ => None,
            },
            draw: m.result == Some(MatchResult::Draw),
            reported_at: m.reported_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundView {
    pub number: u32,
    pub finalized: bool,
    pub started_at: DateTime<Utc>,
    pub matches: Vec<MatchView>,
}

impl From<&Round> for RoundView {
    fn from(r: &Round) -> Self {
        RoundView {
            number: r.number,
            finalized: r.finalized,
            started_at: r.started_at,
            matches: r.matches.iter().map(MatchView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    pub id: i64,
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
    pub ruleset_id: RuleSetId,
    pub status: String,
    pub current_round: u32,
    pub round_closed: bool,
    pub players: Vec<PlayerId>,
    pub rounds: Vec<RoundView>,
}

impl From<&Tournament> for TournamentView {
    fn from(t: &Tournament) -> Self {
        let d = &t.details;
        TournamentView {
            id: t.id,
            name: d.name.clone(),
            location: d.location.clone(),
            store_id: d.store_id,
            starts_at: d.starts_at,
            capacity: d.capacity,
            total_rounds: d.total_rounds,
            round_time_limit_minutes: d.round_time_limit_minutes,
            entry_fee: d.entry_fee,
            prize: d.prize.clone(),
            format: d.format.clone(),
            ruleset_id: t.ruleset_id,
            status: t.status().to_string(),
            current_round: t.current_round(),
            round_closed: matches!(
                t.state,
                LifecycleState::InProgress {
                    round_closed: true,
                    ..
                }
            ),
            players: t.players.clone(),
            rounds: t.rounds.iter().map(RoundView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingView {
    pub rank: u32,
    pub player_id: PlayerId,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub win_rate: f64,
    pub opponent_win_rate: f64,
}

impl From<&Standing> for StandingView {
    fn from(s: &Standing) -> Self {
        StandingView {
            rank: s.rank,
            player_id: s.player_id,
            points: s.points,
            wins: s.wins,
            losses: s.losses,
            draws: s.draws,
            byes: s.byes,
            win_rate: s.win_rate(),
            opponent_win_rate: s.opponent_win_rate,
        }
    }
}

pub fn standing_views(standings: &[Standing]) -> Vec<StandingView> {
    standings.iter().map(StandingView::from).collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_standings: Option<Vec<StandingView>>,
}

impl From<&RoundAdvance> for AdvanceResponse {
    fn from(advance: &RoundAdvance) -> Self {
        match advance {
            RoundAdvance::Next { round } => AdvanceResponse {
                status: "in_progress".into(),
                next_round: Some(*round),
                final_standings: None,
            },
            RoundAdvance::Finished { standings } => AdvanceResponse {
                status: "finished".into(),
                next_round: None,
                final_standings: Some(standing_views(standings)),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingView {
    pub rank: u32,
    pub player_id: PlayerId,
    pub points: f64,
    pub tournaments_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_rate: f64,
}

impl From<&RankingEntry> for RankingView {
    fn from(e: &RankingEntry) -> Self {
        RankingView {
            rank: e.rank,
            player_id: e.player_id,
            points: e.points,
            tournaments_played: e.tournaments_played,
            wins: e.wins,
            losses: e.losses,
            draws: e.draws,
            win_rate: e.win_rate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub scope: String,
    pub window: String,
    pub items: Vec<RankingView>,
}
