//! CSV download of a user's meal history.

pub mod handlers;
pub mod writer;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::export_routes())
}
