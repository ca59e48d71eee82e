use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{error_response, AppState};
use crate::api::models::{CreateRuleSetRequest, PointsPayload, RuleSetView};
use crate::domain::RuleSetId;

pub async fn create_ruleset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRuleSetRequest>,
) -> impl IntoResponse {
    match state
        .tournaments
        .create_ruleset(body.tcg_id, &body.name, body.points.into())
    {
        Ok(ruleset) => (StatusCode::CREATED, Json(RuleSetView::from(&ruleset))).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn list_rulesets(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.tournaments.list_rulesets() {
        Ok(rulesets) => {
            Json(rulesets.iter().map(RuleSetView::from).collect::<Vec<_>>()).into_response()
        }
        Err(e) => error_response(e),
    }
}

pub async fn get_ruleset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RuleSetId>,
) -> impl IntoResponse {
    match state.tournaments.ruleset(id) {
        Ok(ruleset) => Json(RuleSetView::from(&ruleset)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_ruleset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RuleSetId>,
    Json(points): Json<PointsPayload>,
) -> impl IntoResponse {
    match state.tournaments.update_ruleset(id, points.into()) {
        Ok(ruleset) => Json(RuleSetView::from(&ruleset)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn revise_ruleset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<RuleSetId>,
    Json(points): Json<PointsPayload>,
) -> impl IntoResponse {
    match state.tournaments.revise_ruleset(id, points.into()) {
        Ok(ruleset) => (StatusCode::CREATED, Json(RuleSetView::from(&ruleset))).into_response(),
        Err(e) => error_response(e),
    }
}
