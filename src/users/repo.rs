use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::DEFAULT_DAILY_TARGET;
use crate::error::AppResult;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stored target, or the default for users who never set one.
    async fn daily_target(&self, user_id: Uuid) -> AppResult<i32>;

    /// Callers validate the range first.
    async fn set_daily_target(&self, user_id: Uuid, target: i32) -> AppResult<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn daily_target(&self, user_id: Uuid) -> AppResult<i32> {
        let target: Option<i32> =
            sqlx::query_scalar(r#"SELECT daily_calorie_target FROM users WHERE id = $1"#)
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        Ok(target.unwrap_or(DEFAULT_DAILY_TARGET))
    }

    async fn set_daily_target(&self, user_id: Uuid, target: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, daily_calorie_target)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET daily_calorie_target = EXCLUDED.daily_calorie_target
            "#,
        )
        .bind(user_id)
        .bind(target)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;

    use tokio::sync::RwLock;

    use super::*;

    #[derive(Default)]
    pub struct MemoryUserStore {
        targets: RwLock<HashMap<Uuid, i32>>,
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn daily_target(&self, user_id: Uuid) -> AppResult<i32> {
            Ok(self
                .targets
                .read()
                .await
                .get(&user_id)
                .copied()
                .unwrap_or(DEFAULT_DAILY_TARGET))
        }

        async fn set_daily_target(&self, user_id: Uuid, target: i32) -> AppResult<()> {
            self.targets.write().await.insert(user_id, target);
            Ok(())
        }
    }
}
