use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;

use crate::config::AppConfig;
use crate::database::DbPool;
use crate::errors::EngineError;
use crate::ranking::RankingCache;
use crate::services::{RankingService, TournamentService};

pub mod rankings;
pub mod rulesets;
pub mod tournaments;

pub struct AppState {
    pub tournaments: TournamentService,
    pub rankings: RankingService,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let cache = Arc::new(RankingCache::new());
        Self {
            tournaments: TournamentService::new(pool.clone(), config.clone(), Arc::clone(&cache)),
            rankings: RankingService::new(pool, cache),
            config,
        }
    }
}

fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DataIntegrityViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        e if e.is_conflict() => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// Maps engine errors to their status code; anything else is a 500.
pub fn error_response(err: anyhow::Error) -> Response {
    let status = err
        .downcast_ref::<EngineError>()
        .map(status_for)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!("Request failed: {:#}", err);
    }
    (status, format!("{:#}", err)).into_response()
}
