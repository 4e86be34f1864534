use axum::{
    extract::{Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, instrument};

use super::aggregate::{normalize_tz_offset, DailySummary, WeeklySummary};
use super::services;
use crate::{
    auth::AuthUser, error::AppResult, extract::AppJson, state::AppState, users::parse_target,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/summary", get(summary))
        .route("/dashboard/weekly", get(weekly))
        .route("/dashboard/target", put(update_target))
}

#[derive(Debug, Deserialize)]
pub struct TzQuery {
    pub tz_offset: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TargetRequest {
    #[serde(default)]
    pub target: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TargetResponse {
    pub success: bool,
    pub new_target: i32,
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TzQuery>,
) -> AppResult<Json<DailySummary>> {
    let tz = normalize_tz_offset(q.tz_offset.as_deref());
    let summary = services::daily_summary(
        state.meals.as_ref(),
        state.users.as_ref(),
        user_id,
        OffsetDateTime::now_utc(),
        tz,
    )
    .await?;
    Ok(Json(summary))
}

#[instrument(skip(state))]
pub async fn weekly(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TzQuery>,
) -> AppResult<Json<WeeklySummary>> {
    let tz = normalize_tz_offset(q.tz_offset.as_deref());
    let weekly = services::weekly_summary(
        state.meals.as_ref(),
        state.users.as_ref(),
        user_id,
        OffsetDateTime::now_utc(),
        tz,
    )
    .await?;
    Ok(Json(weekly))
}

#[instrument(skip(state, body))]
pub async fn update_target(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<TargetRequest>,
) -> AppResult<Json<TargetResponse>> {
    let target = parse_target(body.target.as_ref())?;
    state.users.set_daily_target(user_id, target).await?;
    info!(%user_id, target, "daily target updated");
    Ok(Json(TargetResponse {
        success: true,
        new_target: target,
    }))
}
