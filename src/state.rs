use std::sync::Arc;

use sqlx::PgPool;

use crate::analyzer::{Analyzer, GeminiClient, NutritionModel};
use crate::config::AppConfig;
use crate::meals::{MealStore, PgMealStore};
use crate::users::{PgUserStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub meals: Arc<dyn MealStore>,
    pub users: Arc<dyn UserStore>,
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    /// Production wiring: Postgres stores and the Gemini-backed analyzer.
    pub fn postgres(config: Arc<AppConfig>, db: PgPool) -> anyhow::Result<Self> {
        let gemini = GeminiClient::from_config(&config.gemini)?;
        if !gemini.is_configured() {
            tracing::warn!("GEMINI_API_KEY is not set; analysis routes will fail until it is");
        }
        Ok(Self::from_parts(
            config,
            Arc::new(PgMealStore::new(db.clone())),
            Arc::new(PgUserStore::new(db)),
            Arc::new(Analyzer::new(Arc::new(gemini) as Arc<dyn NutritionModel>)),
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        meals: Arc<dyn MealStore>,
        users: Arc<dyn UserStore>,
        analyzer: Arc<Analyzer>,
    ) -> Self {
        Self {
            config,
            meals,
            users,
            analyzer,
        }
    }
}
