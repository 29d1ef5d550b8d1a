use chrono::NaiveDate;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{CalorieSummary, Meal, MealEstimate};
use crate::nutrition::{estimate_calories, recipe_suggestions, Recipe};

use super::profile::get_profile;

const DEFAULT_MEAL_NAME: &str = "meal";

/// Estimate a meal's calories and store it
pub async fn log_meal(
  db: &DbPool,
  meal_name: &str,
  description: &str,
  date: NaiveDate,
) -> AppResult<MealEstimate> {
  let description = description.trim();
  if description.is_empty() {
    return Err(AppError::invalid("description is required"));
  }
  let meal_name = match meal_name.trim() {
    "" => DEFAULT_MEAL_NAME,
    name => name,
  };

  let estimate = estimate_calories(description);
  for skipped in estimate.details.iter().filter(|d| d.starts_with("Skipped")) {
    tracing::warn!(detail = %skipped, "meal item not estimated");
  }

  sqlx::query(
    "INSERT INTO meals (date, meal_name, description, estimated_calories) VALUES (?1, ?2, ?3, ?4)",
  )
  .bind(date)
  .bind(meal_name)
  .bind(description)
  .bind(estimate.total)
  .execute(db)
  .await?;

  tracing::info!(meal = meal_name, kcal = estimate.total, "meal logged");

  Ok(MealEstimate {
    estimated_calories: estimate.total,
    details: estimate.details,
  })
}

/// Sum of estimated calories for one day
pub async fn daily_calories(db: &DbPool, date: NaiveDate) -> AppResult<f64> {
  let total: f64 = sqlx::query_scalar(
    "SELECT CAST(COALESCE(SUM(estimated_calories), 0) AS REAL) FROM meals WHERE date = ?1",
  )
  .bind(date)
  .fetch_one(db)
  .await?;
  Ok(total)
}

/// Latest meals, newest first
pub async fn meal_history(db: &DbPool, limit: i64) -> AppResult<Vec<Meal>> {
  let meals = sqlx::query_as::<_, Meal>(
    r#"
    SELECT id, date, meal_name, description, estimated_calories
    FROM meals
    ORDER BY date DESC, id DESC
    LIMIT ?1
    "#,
  )
  .bind(limit)
  .fetch_all(db)
  .await?;
  Ok(meals)
}

pub async fn calorie_summary(db: &DbPool, date: NaiveDate) -> AppResult<CalorieSummary> {
  let total = daily_calories(db, date).await?;
  let profile = get_profile(db).await?;
  Ok(CalorieSummary::new(date, total, profile.daily_calorie_target))
}

/// Suggestions for `goal`, or the profile's goal when none is given
pub async fn recipes_for(
  db: &DbPool,
  recipes: &[Recipe],
  goal: Option<&str>,
  max_calories: Option<i64>,
  meal_type: Option<&str>,
  limit: usize,
) -> AppResult<Vec<Recipe>> {
  let goal = match goal.map(str::trim).filter(|g| !g.is_empty()) {
    Some(g) => g.to_string(),
    None => get_profile(db).await?.goal.as_str().to_string(),
  };

  let mut matches = recipe_suggestions(recipes, &goal, max_calories, meal_type);
  matches.truncate(limit);
  Ok(matches)
}
