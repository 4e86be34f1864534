pub mod dto;
pub mod handlers;
#[cfg(test)]
pub mod memory;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::{MealStore, PgMealStore};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::analyze_routes())
        .merge(handlers::meal_routes())
}
