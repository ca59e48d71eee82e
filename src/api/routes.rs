use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::api::handlers::{
    rankings::get_rankings,
    rulesets::{create_ruleset, get_ruleset, list_rulesets, revise_ruleset, update_ruleset},
    tournaments::{
        advance_round, cancel_tournament, close_round, correct_result, create_tournament,
        get_standings, get_tournament, record_result, register_player, start_tournament,
        unregister_player,
    },
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/rulesets", post(create_ruleset).get(list_rulesets))
        .route("/api/rulesets/:id", get(get_ruleset).put(update_ruleset))
        .route("/api/rulesets/:id/revisions", post(revise_ruleset))
        .route("/api/tournaments", post(create_tournament))
        .route("/api/tournaments/:id", get(get_tournament))
        .route("/api/tournaments/:id/players", post(register_player))
        .route(
            "/api/tournaments/:id/players/:player_id",
            delete(unregister_player),
        )
        .route("/api/tournaments/:id/start", post(start_tournament))
        .route("/api/tournaments/:id/cancel", post(cancel_tournament))
        .route(
            "/api/tournaments/:id/rounds/:round/tables/:table/result",
            post(record_result).put(correct_result),
        )
        .route("/api/tournaments/:id/rounds/close", post(close_round))
        .route("/api/tournaments/:id/rounds/advance", post(advance_round))
        .route("/api/tournaments/:id/standings", get(get_standings))
        .route("/api/rankings", get(get_rankings))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::database::{create_memory_pool, get_connection, setup::ensure_schema};

    fn app() -> Router {
        let pool = create_memory_pool().unwrap();
        ensure_schema(&mut get_connection(&pool).unwrap()).unwrap();
        create_router(Arc::new(AppState::new(pool, AppConfig::default())))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn ruleset(app: &Router) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/api/rulesets",
            Some(json!({"tcgId": 1, "name": "Standard", "points": {"win": 3, "loss": 0, "draw": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    async fn tournament(app: &Router, ruleset_id: i64, rounds: u32) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/api/tournaments",
            Some(json!({
                "name": "Friday Cup",
                "storeId": 5,
                "startsAt": "2026-04-10T18:00:00Z",
                "capacity": 8,
                "totalRounds": rounds,
                "rulesetId": ruleset_id
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "open");
        body["id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_one_round_tournament_over_http() {
        let app = app();
        let ruleset_id = ruleset(&app).await;
        let id = tournament(&app, ruleset_id, 1).await;

        for player in [11, 12, 13] {
            let (status, _) = send(
                &app,
                "POST",
                &format!("/api/tournaments/{}/players", id),
                Some(json!({"playerId": player})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, round) = send(&app, "POST", &format!("/api/tournaments/{}/start", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(round["matches"][1]["player1"], 13);
        assert_eq!(round["matches"][1]["player2"], Value::Null);

        let (status, _) = send(&app, "POST", &format!("/api/tournaments/{}/rounds/close", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let result_uri = format!("/api/tournaments/{}/rounds/1/tables/1/result", id);
        let (status, _) = send(&app, "POST", &result_uri, Some(json!({"winner": 12}))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "POST", &result_uri, Some(json!({"winner": 11}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, m) = send(&app, "PUT", &result_uri, Some(json!({"draw": true}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(m["draw"], true);

        let (status, standings) =
            send(&app, "POST", &format!("/api/tournaments/{}/rounds/close", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(standings[0]["playerId"], 13);
        assert_eq!(standings[0]["points"], 3.0);

        let (status, advance) =
            send(&app, "POST", &format!("/api/tournaments/{}/rounds/advance", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(advance["status"], "finished");

        let (status, rankings) = send(&app, "GET", "/api/rankings?store=5&window=2026-04", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rankings["items"].as_array().unwrap().len(), 3);
        assert_eq!(rankings["items"][0]["playerId"], 13);
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/tournaments/77", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            "/api/rulesets",
            Some(json!({"tcgId": 1, "name": "Bad", "points": {"win": -1, "loss": 0, "draw": 1}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let ruleset_id = ruleset(&app).await;
        let id = tournament(&app, ruleset_id, 3).await;
        let (status, _) = send(&app, "POST", &format!("/api/tournaments/{}/start", id), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(
            &app,
            "POST",
            &format!("/api/tournaments/{}/rounds/1/tables/1/result", id),
            Some(json!({"winner": 1, "draw": true})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "GET", "/api/rankings?window=last-week", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
