//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Seeding helpers for the workout, meal and interaction logs
//! - Mock data factories
//! - Helper assertions

use chrono::{Duration, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;

use crate::config::{Config, CoachTuning, OllamaConfig};
use crate::db::AppState;
use crate::llm::OllamaClient;
use crate::models::{NewWorkout, Workout};
use crate::nutrition::load_recipes;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) so every query sees the same in-memory database
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Full application state over an in-memory database.
///
/// `ollama_host` is usually a mockito server URL.
pub async fn setup_test_state(ollama_host: &str) -> AppState {
  let db = setup_test_db().await;
  let config = mock_config(ollama_host);
  let coach = OllamaClient::new(&config.ollama);
  let recipes = load_recipes(None).expect("Failed to load embedded recipes");

  AppState {
    db,
    config,
    coach,
    recipes,
  }
}

/// Insert one workout row directly, bypassing validation
pub async fn seed_workout(
  pool: &SqlitePool,
  date: NaiveDate,
  exercise: &str,
  sets: i64,
  reps: i64,
  weight: f64,
  rpe: Option<f64>,
) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO workouts (date, exercise, sets, reps, weight, duration_min, rpe, notes)
    VALUES (?1, ?2, ?3, ?4, ?5, 45, ?6, '')
    "#,
  )
  .bind(date)
  .bind(exercise)
  .bind(sets)
  .bind(reps)
  .bind(weight)
  .bind(rpe)
  .execute(pool)
  .await
  .expect("Failed to insert test workout")
  .last_insert_rowid()
}

pub async fn seed_meal(
  pool: &SqlitePool,
  date: NaiveDate,
  meal_name: &str,
  description: &str,
  calories: f64,
) -> i64 {
  sqlx::query(
    "INSERT INTO meals (date, meal_name, description, estimated_calories) VALUES (?1, ?2, ?3, ?4)",
  )
  .bind(date)
  .bind(meal_name)
  .bind(description)
  .bind(calories)
  .execute(pool)
  .await
  .expect("Failed to insert test meal")
  .last_insert_rowid()
}

/// Insert a coach interaction, optionally already rated
pub async fn seed_interaction(pool: &SqlitePool, strategy: &str, reward: Option<f64>) -> i64 {
  sqlx::query(
    r#"
    INSERT INTO llm_interactions (created_at, user_message, assistant_response, strategy, reward)
    VALUES (?1, 'how am I doing?', 'Keep going.', ?2, ?3)
    "#,
  )
  .bind(Utc::now())
  .bind(strategy)
  .bind(reward)
  .execute(pool)
  .await
  .expect("Failed to insert test interaction")
  .last_insert_rowid()
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_config(ollama_host: &str) -> Config {
  Config {
    database_path: PathBuf::from(":memory:"),
    ollama: OllamaConfig {
      host: ollama_host.trim_end_matches('/').to_string(),
      model: "llama3.1:8b".to_string(),
      chat_timeout: std::time::Duration::from_secs(5),
      status_timeout: std::time::Duration::from_secs(1),
    },
    http_host: "127.0.0.1".to_string(),
    http_port: 0,
    recipes_path: None,
    tuning: CoachTuning::default(),
  }
}

/// Workout row as it would come back from the log
pub fn mock_workout(
  date: NaiveDate,
  exercise: &str,
  sets: i64,
  reps: i64,
  weight: f64,
  rpe: Option<f64>,
) -> Workout {
  Workout {
    id: 0,
    date,
    exercise: exercise.to_string(),
    sets: Some(sets),
    reps: Some(reps),
    weight: Some(weight),
    duration_min: Some(45),
    rpe,
    notes: None,
  }
}

pub fn mock_new_workout(date: NaiveDate, exercise: &str, weight: f64) -> NewWorkout {
  NewWorkout {
    date,
    exercise: exercise.to_string(),
    sets: 3,
    reps: 5,
    weight,
    duration_min: 45,
    rpe: 7.0,
    notes: String::new(),
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Local calendar day, matching what the commands use
pub fn today() -> NaiveDate {
  chrono::Local::now().date_naive()
}

pub fn days_ago(days: i64) -> NaiveDate {
  today() - Duration::days(days)
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('workouts', 'meals', 'user_profile', 'llm_interactions')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 4, "Expected 4 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_helpers_insert_rows() {
    let pool = setup_test_db().await;

    seed_workout(&pool, today(), "squat", 3, 5, 100.0, Some(7.0)).await;
    seed_meal(&pool, today(), "lunch", "1 banana", 105.0).await;
    let id = seed_interaction(&pool, "concise", None).await;
    assert!(id > 0);

    let workouts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM workouts")
      .fetch_one(&pool)
      .await
      .expect("Failed to count workouts");
    assert_eq!(workouts, 1);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let workout = mock_workout(today(), "bench", 3, 5, 60.0, None);
    assert_eq!(workout.load(), 900.0);

    let new = mock_new_workout(today(), "Bench", 60.0);
    assert_eq!(new.normalized_exercise(), "bench");

    assert_eq!(days_ago(7), today() - Duration::days(7));
  }
}
