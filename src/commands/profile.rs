use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Goal, Profile};

use super::nutrition::daily_calories;
use super::workouts::{motivation, workout_streak};

/// ---------------------------------------------------------------------------
/// Profile
/// ---------------------------------------------------------------------------

pub async fn get_profile(db: &DbPool) -> AppResult<Profile> {
  let row: Option<(String, String, i64)> =
    sqlx::query_as("SELECT name, goal, daily_calorie_target FROM user_profile WHERE id = 1")
      .fetch_optional(db)
      .await?;

  match row {
    Some((name, goal, daily_calorie_target)) => Ok(Profile {
      name,
      goal: Goal::parse_or_default(&goal),
      daily_calorie_target,
    }),
    None => Ok(Profile::default()),
  }
}

/// Update the goal and calorie target.
///
/// Unknown goals become maintenance; a missing target uses the goal default.
pub async fn set_profile_goal(db: &DbPool, goal: &str, daily_target: Option<i64>) -> AppResult<Profile> {
  let goal = Goal::parse_or_default(goal);
  let target = daily_target.unwrap_or_else(|| goal.default_calorie_target());
  if target <= 0 {
    return Err(AppError::invalid("daily_calorie_target must be positive"));
  }

  sqlx::query(
    r#"
    INSERT INTO user_profile (id, goal, daily_calorie_target, updated_at)
    VALUES (1, ?1, ?2, CURRENT_TIMESTAMP)
    ON CONFLICT(id) DO UPDATE SET
      goal = excluded.goal,
      daily_calorie_target = excluded.daily_calorie_target,
      updated_at = CURRENT_TIMESTAMP
    "#,
  )
  .bind(goal.as_str())
  .bind(target)
  .execute(db)
  .await?;

  tracing::info!(goal = %goal, target, "profile updated");
  get_profile(db).await
}

/// ---------------------------------------------------------------------------
/// Dashboard
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub date: NaiveDate,
  pub profile: Profile,
  pub calories_today: f64,
  pub workout_streak: u32,
  pub motivation: String,
}

impl Dashboard {
  pub fn render(&self) -> String {
    format!(
      "Date: {}\nGoal: {}\nDaily calorie target: {} kcal\nCalories logged today: {:.0} kcal\nWorkout streak: {} day(s)\nMotivation: {}",
      self.date,
      self.profile.goal,
      self.profile.daily_calorie_target,
      self.calories_today,
      self.workout_streak,
      self.motivation
    )
  }
}

pub async fn dashboard(db: &DbPool, today: NaiveDate) -> AppResult<Dashboard> {
  Ok(Dashboard {
    date: today,
    profile: get_profile(db).await?,
    calories_today: daily_calories(db, today).await?,
    workout_streak: workout_streak(db, today).await?,
    motivation: motivation(db, today).await?,
  })
}
