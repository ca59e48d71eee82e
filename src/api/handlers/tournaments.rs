use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{error_response, AppState};
use crate::api::models::{
    standing_views, AdvanceResponse, CreateTournamentRequest, MatchView, RegisterPlayerRequest,
    ResultRequest, RoundView, TournamentView,
};
use crate::domain::{PlayerId, TournamentId};

pub async fn create_tournament(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTournamentRequest>,
) -> impl IntoResponse {
    let (details, ruleset_id) = body.into_details(state.config.engine.default_rounds);

    match state.tournaments.create_tournament(details, ruleset_id) {
        Ok(t) => (StatusCode::CREATED, Json(TournamentView::from(&t))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.tournament(id) {
        Ok(t) => Json(TournamentView::from(&t)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn register_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
    Json(body): Json<RegisterPlayerRequest>,
) -> impl IntoResponse {
    match state.tournaments.register(id, body.player_id) {
        Ok(t) => (StatusCode::CREATED, Json(TournamentView::from(&t))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn unregister_player(
    State(state): State<Arc<AppState>>,
    Path((id, player_id)): Path<(TournamentId, PlayerId)>,
) -> impl IntoResponse {
    match state.tournaments.unregister(id, player_id) {
        Ok(t) => Json(TournamentView::from(&t)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn start_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.start(id) {
        Ok(round) => Json(RoundView::from(&round)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn cancel_tournament(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.cancel(id) {
        Ok(t) => Json(TournamentView::from(&t)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn record_result(
    State(state): State<Arc<AppState>>,
    Path((id, round, table)): Path<(TournamentId, u32, u32)>,
    Json(body): Json<ResultRequest>,
) -> impl IntoResponse {
    let result = match body.into_result() {
        Ok(result) => result,
        Err(e) => return error_response(e.into()),
    };

    match state.tournaments.record_result(id, round, table, result) {
        Ok(m) => Json(MatchView::from(&m)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn correct_result(
    State(state): State<Arc<AppState>>,
    Path((id, round, table)): Path<(TournamentId, u32, u32)>,
    Json(body): Json<ResultRequest>,
) -> impl IntoResponse {
    let result = match body.into_result() {
        Ok(result) => result,
        Err(e) => return error_response(e.into()),
    };

    match state.tournaments.correct_result(id, round, table, result) {
        Ok(m) => Json(MatchView::from(&m)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn close_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.close_round(id) {
        Ok(standings) => Json(standing_views(&standings)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn advance_round(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.advance_round(id) {
        Ok(advance) => Json(AdvanceResponse::from(&advance)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn get_standings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TournamentId>,
) -> impl IntoResponse {
    match state.tournaments.standings(id) {
        Ok(standings) => Json(standing_views(&standings)).into_response(),
        Err(e) => error_response(e),
    }
}
