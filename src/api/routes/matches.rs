use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::engine::SimulationEngine;
use crate::models::{MatchRecord, MatchResult, MatchSummary, Team};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commentary_provider: Option<&'static str>,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        commentary_provider: state.commentary.provider_name(),
    })
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub team1: Team,
    pub team2: Team,
    #[serde(default)]
    pub save: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub result: MatchResult,
}

pub async fn simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let mut engine = SimulationEngine::new(
        request.team1.with_generated_ids(),
        request.team2.with_generated_ids(),
    )?
    .with_commentary(state.commentary.clone());

    if let Some(seed) = request.seed {
        engine = engine.with_seed(seed);
    }

    let result = engine.simulate_match_with_commentary().await;
    info!("Simulated {}", result.scoreline());

    if !request.save {
        return Ok(Json(SimulateResponse { id: None, result }));
    }

    // The match log is appended with blocking file I/O
    let store = state.store.clone();
    let (record, result) = tokio::task::spawn_blocking(move || {
        store.save(&result).map(|record| (record, result))
    })
    .await
    .map_err(|e| ApiError::Internal(format!("save task failed: {}", e)))??;

    Ok(Json(SimulateResponse {
        id: Some(record.id),
        result,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub matches: Vec<MatchSummary>,
    pub pagination: PaginationMeta,
}

pub async fn list_matches(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MatchListResponse>, ApiError> {
    let pagination = Pagination::new(params.page, params.page_size);
    let records = state.store.list()?;
    let meta = PaginationMeta::new(&pagination, records.len() as u32);

    let matches = pagination
        .apply(records)
        .iter()
        .map(MatchSummary::from)
        .collect();

    Ok(Json(MatchListResponse {
        matches,
        pagination: meta,
    }))
}

pub async fn get_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchRecord>, ApiError> {
    Ok(Json(state.store.get(&id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::build_router;
    use crate::commentary::backend::MockBackend;
    use crate::commentary::CommentaryGenerator;
    use crate::config::AppConfig;
    use crate::storage::{MatchStore, StorageConfig};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn setup_test_state(dir: &std::path::Path, commentary: CommentaryGenerator) -> AppState {
        AppState {
            store: Arc::new(MatchStore::new(StorageConfig::new(dir.to_path_buf()))),
            commentary,
            config: Arc::new(AppConfig::default()),
        }
    }

    fn roster(name: &str) -> Value {
        json!({
            "name": name,
            "players": [
                {"name": format!("{} PG", name), "position": "PG", "points_per_game": 18.0},
                {"name": format!("{} SG", name), "position": "SG"},
                {"name": format!("{} SF", name)},
                {"name": format!("{} PF", name), "position": "power forward"},
                {"name": format!("{} C", name), "position": "C", "rebounds_per_game": 11.0}
            ]
        })
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn post_json(app: axum::Router, uri: &str, body: &Value) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), CommentaryGenerator::default()));

        let (status, body) = get_json(app, "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body.get("commentary_provider").is_none());
    }

    #[tokio::test]
    async fn test_simulate_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let state = setup_test_state(dir.path(), CommentaryGenerator::default());
        let app = build_router(state.clone());

        let (status, body) = post_json(
            app,
            "/api/matches",
            &json!({"team1": roster("Harbor"), "team2": roster("Aces"), "seed": 9}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("id").is_none());

        let result = &body["result"];
        let team1 = result["team1_score"].as_u64().unwrap();
        let team2 = result["team2_score"].as_u64().unwrap();
        assert_ne!(team1, team2);
        assert!(result["quarters"].as_array().unwrap().len() >= 4);
        assert_eq!(result["highlights"]["source"], "template");

        assert!(state.store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simulate_save_then_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), CommentaryGenerator::default()));

        let (status, body) = post_json(
            app.clone(),
            "/api/matches",
            &json!({"team1": roster("Harbor"), "team2": roster("Aces"), "save": true}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["id"].as_str().unwrap().to_string();

        let (status, record) = get_json(app.clone(), &format!("/api/matches/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["id"], id.as_str());
        assert_eq!(record["team1_score"], body["result"]["team1_score"]);

        let (status, listing) = get_json(app, "/api/matches?page=1&page_size=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["pagination"]["total_items"], 1);
        assert_eq!(listing["matches"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_simulate_uses_provider_commentary() {
        let dir = tempfile::tempdir().unwrap();
        let commentary = CommentaryGenerator::new(
            Arc::new(MockBackend::new("NARRATIVE: What a game.\nSUMMARY: Harbor or Aces won.")),
            Duration::from_secs(5),
        );
        let app = build_router(setup_test_state(dir.path(), commentary));

        let (status, body) = post_json(
            app,
            "/api/matches",
            &json!({"team1": roster("Harbor"), "team2": roster("Aces")}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["highlights"]["source"], "provider");
        assert_eq!(body["result"]["highlights"]["narrative"], "What a game.");
    }

    #[tokio::test]
    async fn test_simulate_accepts_null_stats() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), CommentaryGenerator::default()));

        let sparse = json!({
            "name": "Sparse",
            "id": null,
            "players": [
                {"name": "Gap One", "position": "PG", "points_per_game": null, "three_point_percentage": null},
                {"name": "Gap Two", "position": null, "free_throw_percentage": null},
                {"name": "Gap Three", "position": "C", "rebounds_per_game": null}
            ]
        });

        let (status, body) = post_json(
            app,
            "/api/matches",
            &json!({"team1": sparse, "team2": roster("Aces"), "seed": 4}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["team1"]["players"][0]["points_per_game"], 10.0);
        assert_eq!(body["result"]["team1"]["players"][1]["position"], "SF");
    }

    #[tokio::test]
    async fn test_empty_roster_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), CommentaryGenerator::default()));

        let (status, body) = post_json(
            app,
            "/api/matches",
            &json!({"team1": roster("Harbor"), "team2": {"name": "Ghosts", "players": []}}),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(body["error"]["message"].as_str().unwrap().contains("Ghosts"));
    }

    #[tokio::test]
    async fn test_unknown_match_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(setup_test_state(dir.path(), CommentaryGenerator::default()));

        let (status, body) = get_json(app, "/api/matches/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
