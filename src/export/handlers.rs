use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use time::{macros::format_description, OffsetDateTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::writer::{export_range, parse_date_filter, write_csv};
use crate::{
    auth::AuthUser,
    error::AppResult,
    meals::{repo::MealStore, repo_types::SortOrder},
    state::AppState,
};

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/export/csv", get(export_csv))
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// All of the user's meals inside the optional date window, newest first.
pub async fn render_export(
    meals: &dyn MealStore,
    user_id: Uuid,
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<Vec<u8>> {
    let range = export_range(parse_date_filter(start), parse_date_filter(end));
    let records = meals
        .list_by_user_and_range(user_id, range, SortOrder::NewestFirst)
        .await?;
    debug!(%user_id, rows = records.len(), "exporting meals");
    Ok(write_csv(&records)?)
}

#[instrument(skip(state))]
pub async fn export_csv(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let body = render_export(
        state.meals.as_ref(),
        user_id,
        q.start.as_deref(),
        q.end.as_deref(),
    )
    .await?;
    let stamp = OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]"))
        .map_err(anyhow::Error::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=mealmind-export-{stamp}.csv"),
            ),
        ],
        body,
    ))
}
