use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::dashboard::aggregate::{round1, DailySummary};
use crate::error::{AppError, AppResult};
use crate::meals::repo_types::{MealRecord, NewMeal, DEFAULT_FOOD_SCORE};

#[derive(Debug, Deserialize)]
pub struct AnalyzeTextRequest {
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /meals/log`. Numbers may arrive as JSON numbers or numeric
/// strings, so they are read as raw values and converted in [`into_new_meal`].
///
/// [`into_new_meal`]: LogMealRequest::into_new_meal
#[derive(Debug, Default, Deserialize)]
pub struct LogMealRequest {
    pub food_name: Option<String>,
    pub calories: Option<Value>,
    pub protein: Option<Value>,
    pub carbs: Option<Value>,
    pub fat: Option<Value>,
    pub food_score: Option<Value>,
    #[serde(default)]
    pub health_benefits: Vec<String>,
    #[serde(default)]
    pub health_negatives: Vec<String>,
    /// Base64 thumbnail as returned by an earlier analysis.
    pub thumbnail: Option<String>,
}

impl LogMealRequest {
    pub fn into_new_meal(self) -> AppResult<NewMeal> {
        let (Some(food_name), Some(calories)) =
            (self.food_name, self.calories.filter(|v| !v.is_null()))
        else {
            return Err(AppError::validation("Missing required fields"));
        };

        let meal = NewMeal {
            food_name: food_name.trim().to_string(),
            calories: number_field("calories", Some(&calories))?,
            protein: number_field("protein", self.protein.as_ref())?,
            carbs: number_field("carbs", self.carbs.as_ref())?,
            fat: number_field("fat", self.fat.as_ref())?,
            food_score: score_field(self.food_score.as_ref())?,
            health_benefits: self.health_benefits,
            health_negatives: self.health_negatives,
            thumbnail: self.thumbnail.as_deref().and_then(decode_thumbnail),
        };
        meal.validate()?;
        Ok(meal)
    }
}

fn number_field(field: &str, value: Option<&Value>) -> AppResult<f64> {
    match value {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AppError::validation(format!("{field} must be a number"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| AppError::validation(format!("{field} must be a number"))),
        Some(_) => Err(AppError::validation(format!("{field} must be a number"))),
    }
}

fn score_field(value: Option<&Value>) -> AppResult<i32> {
    let invalid = || AppError::validation("food_score must be an integer between 1 and 10");
    let score = match value {
        None | Some(Value::Null) => return Ok(DEFAULT_FOOD_SCORE),
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    }
    .ok_or_else(invalid)?;
    i32::try_from(score).map_err(|_| invalid())
}

fn decode_thumbnail(encoded: &str) -> Option<Vec<u8>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return None;
    }
    match STANDARD.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            warn!(error = %e, "dropping thumbnail that is not valid base64");
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub success: bool,
    pub meal_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// A listed meal; the thumbnail itself is fetched through `/meals/image/:id`.
#[derive(Debug, Serialize)]
pub struct MealView {
    pub id: Uuid,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub food_score: i32,
    pub health_benefits: Vec<String>,
    pub health_negatives: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
    pub has_image: bool,
}

impl From<MealRecord> for MealView {
    fn from(m: MealRecord) -> Self {
        Self {
            id: m.id,
            food_name: m.food_name,
            calories: round1(m.calories),
            protein: round1(m.protein),
            carbs: round1(m.carbs),
            fat: round1(m.fat),
            food_score: m.food_score,
            health_benefits: m.health_benefits,
            health_negatives: m.health_negatives,
            logged_at: m.logged_at,
            has_image: m.has_thumbnail,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TodayResponse {
    pub meals: Vec<MealView>,
    #[serde(flatten)]
    pub summary: DailySummary,
}

#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    pub remaining_cal: Option<String>,
    pub tz_offset: Option<String>,
}
