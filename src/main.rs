use std::sync::Arc;

mod analyzer;
mod app;
mod auth;
mod config;
mod dashboard;
mod db;
mod error;
mod export;
mod extract;
mod meals;
mod state;
#[cfg(test)]
mod test_support;
mod thumbnail;
mod users;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "mealmind=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    let db = db::connect(&config).await?;
    db::migrate(&db).await;

    let state = AppState::postgres(config, db)?;
    app::serve(app::build_app(state)).await
}
