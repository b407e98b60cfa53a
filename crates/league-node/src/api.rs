//! HTTP API for the league node.

use crate::node::NodeState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use league_core::{TierDefinition, WeekId};
use league_engine::{Clock, Error, JoinError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Interactive league surface
        .route("/api/v1/league/join", post(join))
        .route("/api/v1/league/me/:user_id", get(my_room))
        .route("/api/v1/league/rooms/:room_id/leaderboard", get(leaderboard))
        .route("/api/v1/league/tiers", get(tiers))
        .route("/api/v1/league/history/:user_id", get(history))
        // Points-accrual collaborator hook
        .route("/api/v1/league/points", post(record_points))
        // User directory (Identity stand-in)
        .route("/api/v1/users/:user_id", put(upsert_user))
        // Scheduler entry point; idempotent per room
        .route("/api/v1/admin/finalize/:week_id", post(finalize))
        .layer(cors)
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Error payloads ---

#[derive(Debug, Serialize, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn join_rejection(err: JoinError) -> ApiError {
    let status = match err {
        JoinError::RoomFull { .. } | JoinError::WeekClosed { .. } => StatusCode::CONFLICT,
        JoinError::IdentityUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        JoinError::StorageFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorBody {
        code: err.code().to_string(),
        message: err.to_string(),
    };
    (status, Json(body))
}

fn internal(err: Error) -> ApiError {
    tracing::error!(error = %err, "request failed");
    let body = ErrorBody {
        code: "INTERNAL".to_string(),
        message: err.to_string(),
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body))
}

fn not_found(message: impl Into<String>) -> ApiError {
    let body = ErrorBody {
        code: "NOT_FOUND".to_string(),
        message: message.into(),
    };
    (StatusCode::NOT_FOUND, Json(body))
}

fn bad_week(week_id: &str) -> ApiError {
    let body = ErrorBody {
        code: "INVALID_WEEK".to_string(),
        message: format!("not an ISO week id: {week_id}"),
    };
    (StatusCode::UNPROCESSABLE_ENTITY, Json(body))
}

// --- League endpoints ---

#[derive(Debug, Deserialize)]
struct JoinRequest {
    user_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JoinResponse {
    room_id: String,
    tier: String,
    already_member: bool,
}

async fn join(
    State(state): State<AppState>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let week = state.clock.current_week();
    let outcome = state
        .allocator
        .join(&req.user_id, week)
        .map_err(join_rejection)?;
    Ok(Json(JoinResponse {
        room_id: outcome.room_id,
        tier: outcome.tier,
        already_member: outcome.already_member,
    }))
}

async fn my_room(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<league_engine::RoomSummary>, ApiError> {
    let week = state.clock.current_week();
    match state.tracker.my_room(&user_id, week).map_err(internal)? {
        Some(summary) => Ok(Json(summary)),
        None => Err(not_found(format!("{user_id} has no room this week"))),
    }
}

async fn leaderboard(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<league_engine::RankedMember>>, ApiError> {
    if state.storage.room(&room_id).map_err(internal)?.is_none() {
        return Err(not_found(format!("no room {room_id}")));
    }
    let board = state.tracker.leaderboard(&room_id).map_err(internal)?;
    Ok(Json(board))
}

async fn tiers(State(state): State<AppState>) -> Json<Vec<TierDefinition>> {
    Json(state.catalog.all_ordered().to_vec())
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
}

async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<league_core::HistoryRecord>>, ApiError> {
    let limit = params.limit.unwrap_or(10);
    let records = state.storage.history_for(&user_id, limit).map_err(internal)?;
    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct PointsRequest {
    user_id: String,
    points: u64,
}

async fn record_points(
    State(state): State<AppState>,
    Json(req): Json<PointsRequest>,
) -> Result<StatusCode, ApiError> {
    let week = state.clock.current_week();
    match state.tracker.record_points(&req.user_id, week, req.points) {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(Error::NotFound(msg)) => Err(not_found(msg)),
        Err(e) => Err(internal(e)),
    }
}

// --- User directory ---

#[derive(Debug, Deserialize)]
struct UpsertUserRequest {
    tier: Option<String>,
    points: Option<u64>,
}

#[derive(Debug, Serialize)]
struct UserResponse {
    user_id: String,
    tier: Option<String>,
    points: u64,
}

async fn upsert_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UpsertUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .directory
        .upsert(&user_id, req.tier.as_deref(), req.points)
        .map_err(internal)?;
    Ok(Json(UserResponse {
        user_id: user.user_id,
        tier: user.tier,
        points: user.points,
    }))
}

// --- Scheduler entry point ---

async fn finalize(
    State(state): State<AppState>,
    Path(week_id): Path<String>,
) -> Result<Json<league_engine::FinalizeSummary>, ApiError> {
    let week: WeekId = week_id.parse().map_err(|_| bad_week(&week_id))?;
    let summary = state.finalizer.finalize_week(week).map_err(internal)?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{LeagueConfig, LeagueNode};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    fn test_router() -> (TempDir, Router) {
        let dir = TempDir::new().unwrap();
        let config = LeagueConfig {
            data_dir: dir.path().to_path_buf(),
            api_addr: "127.0.0.1:0".parse().unwrap(),
            utc_offset_hours: 0,
            tiers_file: None,
        };
        let node = LeagueNode::new(config).unwrap();
        (dir, build_router(node.state()))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn join_then_leaderboard() {
        let (_dir, router) = test_router();

        let response = router
            .clone()
            .oneshot(post_json("/api/v1/league/join", r#"{"user_id":"ali"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let join = body_json(response).await;
        // Fresh user lands in the lowest tier.
        assert_eq!(join["tier"], "ISINMA");
        assert_eq!(join["already_member"], false);

        let room_id = join["room_id"].as_str().unwrap();
        let response = router
            .clone()
            .oneshot(
                Request::get(format!("/api/v1/league/rooms/{room_id}/leaderboard"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let board = body_json(response).await;
        assert_eq!(board[0]["user_id"], "ali");
        assert_eq!(board[0]["rank"], 1);
    }

    #[tokio::test]
    async fn rejoin_reports_already_member() {
        let (_dir, router) = test_router();
        let first = router
            .clone()
            .oneshot(post_json("/api/v1/league/join", r#"{"user_id":"ali"}"#))
            .await
            .unwrap();
        let first = body_json(first).await;

        let second = router
            .clone()
            .oneshot(post_json("/api/v1/league/join", r#"{"user_id":"ali"}"#))
            .await
            .unwrap();
        let second = body_json(second).await;
        assert_eq!(second["already_member"], true);
        assert_eq!(second["room_id"], first["room_id"]);
    }

    #[tokio::test]
    async fn finalize_rejects_bad_week_id() {
        let (_dir, router) = test_router();
        let response = router
            .oneshot(post_json("/api/v1/admin/finalize/not-a-week", "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["code"], "INVALID_WEEK");
    }

    #[tokio::test]
    async fn points_for_stranger_is_not_found() {
        let (_dir, router) = test_router();
        let response = router
            .oneshot(post_json(
                "/api/v1/league/points",
                r#"{"user_id":"ghost","points":5}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn my_room_roundtrip() {
        let (_dir, router) = test_router();
        router
            .clone()
            .oneshot(post_json("/api/v1/league/join", r#"{"user_id":"ali"}"#))
            .await
            .unwrap();
        router
            .clone()
            .oneshot(post_json(
                "/api/v1/league/points",
                r#"{"user_id":"ali","points":42}"#,
            ))
            .await
            .unwrap();

        let response = router
            .oneshot(
                Request::get("/api/v1/league/me/ali")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["my_points"], 42);
        assert_eq!(summary["my_rank"], 1);
        assert_eq!(summary["tier"], "ISINMA");
    }
}
