use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::aggregate::{self, DailySummary, DayRange, WeeklySummary};
use crate::error::AppResult;
use crate::meals::repo::MealStore;
use crate::meals::repo_types::{MealRecord, SortOrder, TimeRange};
use crate::users::UserStore;

/// Today's meals (newest first) together with their rollup.
pub async fn today(
    meals: &dyn MealStore,
    users: &dyn UserStore,
    user_id: Uuid,
    now: OffsetDateTime,
    tz_offset_minutes: i64,
) -> AppResult<(Vec<MealRecord>, DailySummary)> {
    let range = DayRange::today(now, tz_offset_minutes);
    let records = meals
        .list_by_user_and_range(user_id, range.time_range(), SortOrder::NewestFirst)
        .await?;
    let target = users.daily_target(user_id).await?;
    let summary = aggregate::daily_summary(&range, &records, target);
    Ok((records, summary))
}

pub async fn daily_summary(
    meals: &dyn MealStore,
    users: &dyn UserStore,
    user_id: Uuid,
    now: OffsetDateTime,
    tz_offset_minutes: i64,
) -> AppResult<DailySummary> {
    let (_, summary) = today(meals, users, user_id, now, tz_offset_minutes).await?;
    Ok(summary)
}

/// Loads the whole week in one query, then buckets each day on its own bounds.
pub async fn weekly_summary(
    meals: &dyn MealStore,
    users: &dyn UserStore,
    user_id: Uuid,
    now: OffsetDateTime,
    tz_offset_minutes: i64,
) -> AppResult<WeeklySummary> {
    let days = aggregate::week_ranges(now, tz_offset_minutes);
    let window = match (days.first(), days.last()) {
        (Some(first), Some(last)) => TimeRange::between(first.start, last.end),
        _ => TimeRange::default(),
    };
    let records = meals
        .list_by_user_and_range(user_id, window, SortOrder::OldestFirst)
        .await?;
    debug!(%user_id, meals = records.len(), "weekly window loaded");
    let target = users.daily_target(user_id).await?;
    Ok(aggregate::weekly_summary(&days, &records, target))
}
