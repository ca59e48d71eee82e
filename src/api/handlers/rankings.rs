use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{error_response, AppState};
use crate::api::models::{RankingParams, RankingResponse, RankingView};
use crate::ranking::{RankingScope, RankingWindow};

pub async fn get_rankings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RankingParams>,
) -> impl IntoResponse {
    let window = match params.window.as_deref().unwrap_or("all").parse::<RankingWindow>() {
        Ok(window) => window,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    let scope = params
        .store
        .map(RankingScope::Store)
        .unwrap_or(RankingScope::Global);

    match state.rankings.rankings(scope, window) {
        Ok(entries) => Json(RankingResponse {
            scope: scope.to_string(),
            window: window.to_string(),
            items: entries.iter().map(RankingView::from).collect(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}
