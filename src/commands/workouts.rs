use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

use crate::config::CoachTuning;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewWorkout, Workout};
use crate::trend;

const WORKOUT_COLUMNS: &str = "id, date, exercise, sets, reps, weight, duration_min, rpe, notes";

/// ---------------------------------------------------------------------------
/// Workout Log
/// ---------------------------------------------------------------------------

fn validate(workout: &NewWorkout) -> AppResult<()> {
  if workout.exercise.trim().is_empty() {
    return Err(AppError::invalid("exercise is required"));
  }
  if workout.sets < 0 || workout.reps < 0 || workout.duration_min < 0 {
    return Err(AppError::invalid("sets, reps and duration must not be negative"));
  }
  if !workout.weight.is_finite() || workout.weight < 0.0 {
    return Err(AppError::invalid("weight must be a non-negative number"));
  }
  if !(1.0..=10.0).contains(&workout.rpe) {
    return Err(AppError::invalid("rpe must be between 1 and 10"));
  }
  Ok(())
}

/// Append a workout; the exercise name is stored lowercased and trimmed
pub async fn log_workout(db: &DbPool, workout: &NewWorkout) -> AppResult<i64> {
  validate(workout)?;

  let result = sqlx::query(
    r#"
    INSERT INTO workouts (date, exercise, sets, reps, weight, duration_min, rpe, notes)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
  )
  .bind(workout.date)
  .bind(workout.normalized_exercise())
  .bind(workout.sets)
  .bind(workout.reps)
  .bind(workout.weight)
  .bind(workout.duration_min)
  .bind(workout.rpe)
  .bind(workout.notes.trim())
  .execute(db)
  .await?;

  let id = result.last_insert_rowid();
  tracing::info!(id, exercise = %workout.normalized_exercise(), "workout logged");
  Ok(id)
}

/// Workouts dated on or after `today - days`, newest first
pub async fn recent_workouts(db: &DbPool, days: i64, today: NaiveDate) -> AppResult<Vec<Workout>> {
  if days < 0 {
    return Err(AppError::invalid("days must not be negative"));
  }
  let since = Duration::try_days(days)
    .and_then(|span| today.checked_sub_signed(span))
    .ok_or_else(|| AppError::invalid("days out of range"))?;

  let workouts = sqlx::query_as::<_, Workout>(&format!(
    "SELECT {} FROM workouts WHERE date >= ?1 ORDER BY date DESC, id DESC",
    WORKOUT_COLUMNS
  ))
  .bind(since)
  .fetch_all(db)
  .await?;

  Ok(workouts)
}

/// Entire log, newest first
pub async fn workout_history(db: &DbPool) -> AppResult<Vec<Workout>> {
  let workouts = sqlx::query_as::<_, Workout>(&format!(
    "SELECT {} FROM workouts ORDER BY date DESC, id DESC",
    WORKOUT_COLUMNS
  ))
  .fetch_all(db)
  .await?;

  Ok(workouts)
}

/// Latest `limit` workouts, newest first
pub async fn latest_workouts(db: &DbPool, limit: i64) -> AppResult<Vec<Workout>> {
  let workouts = sqlx::query_as::<_, Workout>(&format!(
    "SELECT {} FROM workouts ORDER BY date DESC, id DESC LIMIT ?1",
    WORKOUT_COLUMNS
  ))
  .bind(limit)
  .fetch_all(db)
  .await?;

  Ok(workouts)
}

pub async fn workout_dates(db: &DbPool) -> AppResult<Vec<NaiveDate>> {
  let dates: Vec<NaiveDate> = sqlx::query_scalar("SELECT DISTINCT date FROM workouts ORDER BY date DESC")
    .fetch_all(db)
    .await?;
  Ok(dates)
}

/// ---------------------------------------------------------------------------
/// Trend Signals
/// ---------------------------------------------------------------------------

pub async fn workout_streak(db: &DbPool, today: NaiveDate) -> AppResult<u32> {
  let dates = workout_dates(db).await?;
  Ok(trend::workout_streak(&dates, today))
}

pub async fn load_trends(db: &DbPool) -> AppResult<BTreeMap<String, f64>> {
  let history = workout_history(db).await?;
  Ok(trend::exercise_load_trend(&history))
}

pub async fn adaptive_plan(db: &DbPool, tuning: &CoachTuning, today: NaiveDate) -> AppResult<String> {
  let recent = recent_workouts(db, tuning.recent_window_days, today).await?;
  let trends = load_trends(db).await?;
  Ok(trend::adaptive_routine(&recent, &trends, tuning))
}

pub async fn motivation(db: &DbPool, today: NaiveDate) -> AppResult<String> {
  let streak = workout_streak(db, today).await?;
  let trends = load_trends(db).await?;
  Ok(trend::motivation_message(streak, &trends))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
