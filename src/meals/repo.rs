use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{MealRecord, MealRow, NewMeal, SortOrder, TimeRange};
use crate::error::{AppError, AppResult};

/// Persisted meals. Every read and delete is scoped to the owning user; there
/// is no way to reach another user's records through this trait.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// Validates and stores `meal` with `logged_at = now (UTC)` in one write.
    async fn create(&self, user_id: Uuid, meal: NewMeal) -> AppResult<MealRecord>;

    async fn list_by_user_and_range(
        &self,
        user_id: Uuid,
        range: TimeRange,
        order: SortOrder,
    ) -> AppResult<Vec<MealRecord>>;

    /// `NotFound` when the meal does not exist or belongs to someone else.
    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<()>;

    async fn get_thumbnail(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<Vec<u8>>;
}

// Ownership predicate shared by every statement below; `$1` is always the caller.
const OWNED: &str = "user_id = $1";

const RECORD_COLUMNS: &str = "id, user_id, food_name, calories, protein, carbs, fat, food_score, \
     health_benefits, health_negatives, thumbnail IS NOT NULL AS has_thumbnail, logged_at";

#[derive(Clone)]
pub struct PgMealStore {
    db: PgPool,
}

impl PgMealStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MealStore for PgMealStore {
    async fn create(&self, user_id: Uuid, meal: NewMeal) -> AppResult<MealRecord> {
        meal.validate()?;
        let sql = format!(
            "INSERT INTO meals (user_id, id, food_name, calories, protein, carbs, fat, food_score,
                                health_benefits, health_negatives, thumbnail, logged_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MealRow>(&sql)
            .bind(user_id)
            .bind(Uuid::new_v4())
            .bind(meal.food_name.trim())
            .bind(meal.calories)
            .bind(meal.protein)
            .bind(meal.carbs)
            .bind(meal.fat)
            .bind(meal.food_score)
            .bind(Json(&meal.health_benefits))
            .bind(Json(&meal.health_negatives))
            .bind(meal.thumbnail.as_deref())
            .bind(OffsetDateTime::now_utc())
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn list_by_user_and_range(
        &self,
        user_id: Uuid,
        range: TimeRange,
        order: SortOrder,
    ) -> AppResult<Vec<MealRecord>> {
        let direction = match order {
            SortOrder::OldestFirst => "ASC",
            SortOrder::NewestFirst => "DESC",
        };
        let sql = format!(
            "SELECT {RECORD_COLUMNS}
             FROM meals
             WHERE {OWNED}
               AND ($2::timestamptz IS NULL OR logged_at >= $2)
               AND ($3::timestamptz IS NULL OR logged_at < $3)
             ORDER BY logged_at {direction}, id {direction}"
        );
        let rows = sqlx::query_as::<_, MealRow>(&sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(MealRecord::from).collect())
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<()> {
        let sql = format!("DELETE FROM meals WHERE {OWNED} AND id = $2");
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(meal_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Meal not found"));
        }
        Ok(())
    }

    async fn get_thumbnail(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<Vec<u8>> {
        let sql = format!("SELECT thumbnail FROM meals WHERE {OWNED} AND id = $2");
        let row: Option<(Option<Vec<u8>>,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(meal_id)
            .fetch_optional(&self.db)
            .await?;
        row.and_then(|(thumb,)| thumb)
            .ok_or(AppError::NotFound("Image not found"))
    }
}
