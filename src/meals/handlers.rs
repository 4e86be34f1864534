use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{
    AnalyzeTextRequest, LogMealRequest, LogMealResponse, MealView, SuccessResponse, SuggestQuery,
    TodayResponse,
};
use crate::{
    analyzer::{AnalysisResult, Suggestion},
    auth::AuthUser,
    dashboard::{
        aggregate::{normalize_tz_offset, DayRange},
        handlers::TzQuery,
        services,
    },
    error::{AppError, AppResult},
    extract::{AppJson, AppPath},
    meals::repo_types::SortOrder,
    state::AppState,
};

/// Uploads on the analyze route are capped at 16 MiB.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

const DEFAULT_REMAINING_CALORIES: i64 = 500;

const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/analyze", post(analyze_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/meals/analyze/text", post(analyze_text))
        .route("/meals/log", post(log_meal))
        .route("/meals/today", get(today))
        .route("/meals/suggest", get(suggest))
        .route("/meals/image/:id", get(meal_image))
        .route("/meals/:id", delete(delete_meal))
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// POST /meals/analyze, multipart field `image`.
#[instrument(skip(state, multipart))]
pub async fn analyze_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<AnalysisResult>> {
    let mut multipart = multipart.map_err(|_| AppError::validation("No image provided"))?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(e.body_text()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mime_type = field
            .content_type()
            .unwrap_or(DEFAULT_IMAGE_MIME)
            .to_ascii_lowercase();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;
        let result = state.analyzer.analyze_image(data, &mime_type).await?;
        return Ok(Json(result));
    }
    Err(AppError::validation("No image provided"))
}

#[instrument(skip(state, body))]
pub async fn analyze_text(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<AnalyzeTextRequest>,
) -> AppResult<Json<AnalysisResult>> {
    let description = body.description.unwrap_or_default();
    let result = state.analyzer.analyze_text(&description).await?;
    Ok(Json(result))
}

#[instrument(skip(state, body))]
pub async fn log_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<LogMealRequest>,
) -> AppResult<Json<LogMealResponse>> {
    let meal = body.into_new_meal()?;
    let record = state.meals.create(user_id, meal).await?;
    info!(%user_id, meal_id = %record.id, calories = record.calories, "meal logged");
    Ok(Json(LogMealResponse {
        success: true,
        meal_id: record.id,
    }))
}

#[instrument(skip(state))]
pub async fn today(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<TzQuery>,
) -> AppResult<Json<TodayResponse>> {
    let tz = normalize_tz_offset(q.tz_offset.as_deref());
    let (records, summary) = services::today(
        state.meals.as_ref(),
        state.users.as_ref(),
        user_id,
        OffsetDateTime::now_utc(),
        tz,
    )
    .await?;
    Ok(Json(TodayResponse {
        meals: records.into_iter().map(MealView::from).collect(),
        summary,
    }))
}

#[instrument(skip(state))]
pub async fn delete_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(meal_id): AppPath<Uuid>,
) -> AppResult<Json<SuccessResponse>> {
    state.meals.delete(user_id, meal_id).await?;
    info!(%user_id, %meal_id, "meal deleted");
    Ok(Json(SuccessResponse { success: true }))
}

/// Base64 of the stored thumbnail, as a plain text body.
#[instrument(skip(state))]
pub async fn meal_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(meal_id): AppPath<Uuid>,
) -> AppResult<String> {
    let thumbnail = state.meals.get_thumbnail(user_id, meal_id).await?;
    Ok(STANDARD.encode(thumbnail))
}

#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<SuggestQuery>,
) -> AppResult<Json<SuggestionsResponse>> {
    let remaining = q
        .remaining_cal
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(DEFAULT_REMAINING_CALORIES);
    let tz = normalize_tz_offset(q.tz_offset.as_deref());
    let range = DayRange::today(OffsetDateTime::now_utc(), tz);

    let names: Vec<String> = state
        .meals
        .list_by_user_and_range(user_id, range.time_range(), SortOrder::OldestFirst)
        .await?
        .into_iter()
        .map(|m| m.food_name)
        .collect();

    let suggestions = state.analyzer.suggest_meals(remaining, &names).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}
