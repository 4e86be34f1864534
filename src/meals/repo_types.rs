use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MAX_FOOD_NAME_CHARS: usize = 200;
pub const DEFAULT_FOOD_SCORE: i32 = 5;
pub const MAX_CALORIES: f64 = 10_000.0;
pub const MAX_MACRO_GRAMS: f64 = 1_000.0;

/// A confirmed meal, as the client asked for it to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeal {
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_score: i32,
    pub health_benefits: Vec<String>,
    pub health_negatives: Vec<String>,
    pub thumbnail: Option<Vec<u8>>,
}

impl NewMeal {
    /// Whole-record check run by every store before anything is written.
    pub fn validate(&self) -> AppResult<()> {
        let name = self.food_name.trim();
        if name.is_empty() {
            return Err(AppError::validation("food_name must not be empty"));
        }
        if name.chars().count() > MAX_FOOD_NAME_CHARS {
            return Err(AppError::validation(format!(
                "food_name must be at most {MAX_FOOD_NAME_CHARS} characters"
            )));
        }
        for (field, value, max) in [
            ("calories", self.calories, MAX_CALORIES),
            ("protein", self.protein, MAX_MACRO_GRAMS),
            ("carbs", self.carbs, MAX_MACRO_GRAMS),
            ("fat", self.fat, MAX_MACRO_GRAMS),
        ] {
            if !(0.0..=max).contains(&value) {
                return Err(AppError::validation(format!(
                    "{field} must be between 0 and {max}"
                )));
            }
        }
        if !(1..=10).contains(&self.food_score) {
            return Err(AppError::validation("food_score must be between 1 and 10"));
        }
        Ok(())
    }
}

#[cfg(test)]
impl NewMeal {
    pub fn sample(food_name: &str, calories: f64) -> Self {
        Self {
            food_name: food_name.into(),
            calories,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            food_score: DEFAULT_FOOD_SCORE,
            health_benefits: vec![],
            health_negatives: vec![],
            thumbnail: None,
        }
    }
}

/// A stored meal. Thumbnail bytes are fetched separately; listings only carry
/// whether one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct MealRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_score: i32,
    pub health_benefits: Vec<String>,
    pub health_negatives: Vec<String>,
    pub has_thumbnail: bool,
    pub logged_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct MealRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_score: i32,
    pub health_benefits: Json<Vec<String>>,
    pub health_negatives: Json<Vec<String>>,
    pub has_thumbnail: bool,
    pub logged_at: OffsetDateTime,
}

impl From<MealRow> for MealRecord {
    fn from(r: MealRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            food_name: r.food_name,
            calories: r.calories,
            protein: r.protein,
            carbs: r.carbs,
            fat: r.fat,
            food_score: r.food_score,
            health_benefits: r.health_benefits.0,
            health_negatives: r.health_negatives.0,
            has_thumbnail: r.has_thumbnail,
            logged_at: r.logged_at,
        }
    }
}

/// Half-open `[start, end)` window over `logged_at`; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl TimeRange {
    pub fn between(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    #[cfg(test)]
    pub fn contains(&self, t: OffsetDateTime) -> bool {
        self.start.map_or(true, |s| s <= t) && self.end.map_or(true, |e| t < e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}
