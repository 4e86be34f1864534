use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo::MealStore;
use super::repo_types::{MealRecord, NewMeal, SortOrder, TimeRange};
use crate::error::{AppError, AppResult};

struct StoredMeal {
    record: MealRecord,
    thumbnail: Option<Vec<u8>>,
}

impl StoredMeal {
    fn owned_by(&self, user_id: Uuid) -> bool {
        self.record.user_id == user_id
    }
}

/// In-process [`MealStore`] with the same contract as the Postgres one.
#[derive(Default)]
pub struct MemoryMealStore {
    meals: RwLock<Vec<StoredMeal>>,
}

impl MemoryMealStore {
    /// Like `create`, but with an explicit timestamp so tests can place meals
    /// on chosen days.
    pub async fn insert_at(
        &self,
        user_id: Uuid,
        meal: NewMeal,
        logged_at: OffsetDateTime,
    ) -> AppResult<MealRecord> {
        meal.validate()?;
        let record = MealRecord {
            id: Uuid::new_v4(),
            user_id,
            food_name: meal.food_name.trim().to_string(),
            calories: meal.calories,
            protein: meal.protein,
            carbs: meal.carbs,
            fat: meal.fat,
            food_score: meal.food_score,
            health_benefits: meal.health_benefits,
            health_negatives: meal.health_negatives,
            has_thumbnail: meal.thumbnail.is_some(),
            logged_at,
        };
        self.meals.write().await.push(StoredMeal {
            record: record.clone(),
            thumbnail: meal.thumbnail,
        });
        Ok(record)
    }
}

#[async_trait]
impl MealStore for MemoryMealStore {
    async fn create(&self, user_id: Uuid, meal: NewMeal) -> AppResult<MealRecord> {
        self.insert_at(user_id, meal, OffsetDateTime::now_utc()).await
    }

    async fn list_by_user_and_range(
        &self,
        user_id: Uuid,
        range: TimeRange,
        order: SortOrder,
    ) -> AppResult<Vec<MealRecord>> {
        let meals = self.meals.read().await;
        let mut out: Vec<MealRecord> = meals
            .iter()
            .filter(|m| m.owned_by(user_id) && range.contains(m.record.logged_at))
            .map(|m| m.record.clone())
            .collect();
        out.sort_by_key(|m| m.logged_at);
        if order == SortOrder::NewestFirst {
            out.reverse();
        }
        Ok(out)
    }

    async fn delete(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<()> {
        let mut meals = self.meals.write().await;
        let pos = meals
            .iter()
            .position(|m| m.owned_by(user_id) && m.record.id == meal_id)
            .ok_or(AppError::NotFound("Meal not found"))?;
        meals.remove(pos);
        Ok(())
    }

    async fn get_thumbnail(&self, user_id: Uuid, meal_id: Uuid) -> AppResult<Vec<u8>> {
        self.meals
            .read()
            .await
            .iter()
            .find(|m| m.owned_by(user_id) && m.record.id == meal_id)
            .and_then(|m| m.thumbnail.clone())
            .ok_or(AppError::NotFound("Image not found"))
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[tokio::test]
    async fn create_assigns_identity_and_utc_timestamp() {
        let store = MemoryMealStore::default();
        let user = Uuid::new_v4();
        let before = OffsetDateTime::now_utc();
        let record = store
            .create(user, NewMeal::sample("  Oatmeal ", 300.0))
            .await
            .expect("create");
        assert_eq!(record.food_name, "Oatmeal");
        assert_eq!(record.user_id, user);
        assert!(record.logged_at >= before);
        assert!(record.logged_at.offset().is_utc());
    }

    #[tokio::test]
    async fn invalid_meal_is_not_written() {
        let store = MemoryMealStore::default();
        let user = Uuid::new_v4();
        let mut bad = NewMeal::sample("Toast", 100.0);
        bad.protein = -3.0;
        assert!(store.create(user, bad).await.is_err());

        let all = store
            .list_by_user_and_range(user, TimeRange::default(), SortOrder::OldestFirst)
            .await
            .expect("list");
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn listing_is_owner_scoped_half_open_and_ordered() {
        let store = MemoryMealStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        for (name, at) in [
            ("breakfast", datetime!(2024-01-10 08:00 UTC)),
            ("midnight snack", datetime!(2024-01-11 00:00 UTC)),
            ("dinner", datetime!(2024-01-10 19:30 UTC)),
        ] {
            store
                .insert_at(alice, NewMeal::sample(name, 100.0), at)
                .await
                .expect("insert");
        }
        store
            .insert_at(bob, NewMeal::sample("bob lunch", 500.0), datetime!(2024-01-10 12:00 UTC))
            .await
            .expect("insert");

        let range = TimeRange::between(
            datetime!(2024-01-10 00:00 UTC),
            datetime!(2024-01-11 00:00 UTC),
        );
        let newest: Vec<String> = store
            .list_by_user_and_range(alice, range, SortOrder::NewestFirst)
            .await
            .expect("list")
            .into_iter()
            .map(|m| m.food_name)
            .collect();
        assert_eq!(newest, vec!["dinner", "breakfast"]);

        let oldest = store
            .list_by_user_and_range(alice, range, SortOrder::OldestFirst)
            .await
            .expect("list");
        assert_eq!(oldest[0].food_name, "breakfast");
    }

    #[tokio::test]
    async fn delete_is_ownership_scoped_and_not_repeatable() {
        let store = MemoryMealStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let meal = store
            .create(alice, NewMeal::sample("Salad", 250.0))
            .await
            .expect("create");

        assert!(matches!(
            store.delete(bob, meal.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store.delete(alice, meal.id).await.is_ok());
        assert!(matches!(
            store.delete(alice, meal.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn thumbnails_are_owner_scoped() {
        let store = MemoryMealStore::default();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let mut with_thumb = NewMeal::sample("Pizza", 800.0);
        with_thumb.thumbnail = Some(vec![0xFF, 0xD8, 0xFF]);
        let meal = store.create(alice, with_thumb).await.expect("create");
        let plain = store
            .create(alice, NewMeal::sample("Apple", 95.0))
            .await
            .expect("create");

        assert!(meal.has_thumbnail);
        assert_eq!(
            store.get_thumbnail(alice, meal.id).await.expect("thumb"),
            vec![0xFF, 0xD8, 0xFF]
        );
        assert!(store.get_thumbnail(bob, meal.id).await.is_err());
        assert!(store.get_thumbnail(alice, plain.id).await.is_err());
    }
}
