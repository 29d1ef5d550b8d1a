use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{AppState, DbPool};
use crate::error::{AppError, AppResult};
use crate::llm::{system_prompt, user_prompt, CoachStatus, PROVIDER};
use crate::models::{Interaction, Meal, Workout};
use crate::strategy::{collect_stats, select_strategy, RewardAggregate, Strategy, StrategyStat};

use super::nutrition::{daily_calories, meal_history};
use super::profile::get_profile;
use super::workouts::latest_workouts;

/// Rows of each log included in the chat context
const CONTEXT_ROWS: i64 = 6;

/// ---------------------------------------------------------------------------
/// Response Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
  pub interaction_id: i64,
  pub response: String,
  pub strategy: Strategy,
  pub provider: String,
  pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResult {
  pub ok: bool,
  /// Reward as stored, after clamping
  pub reward: f64,
}

/// ---------------------------------------------------------------------------
/// Strategy Statistics
/// ---------------------------------------------------------------------------

/// Per-strategy reward aggregates; unrated interactions do not count
pub async fn strategy_stats(db: &DbPool) -> AppResult<Vec<StrategyStat>> {
  let rows = sqlx::query_as::<_, RewardAggregate>(
    r#"
    SELECT strategy, AVG(reward) AS avg_reward, COUNT(reward) AS reward_count
    FROM llm_interactions
    WHERE strategy IS NOT NULL
    GROUP BY strategy
    "#,
  )
  .fetch_all(db)
  .await?;

  for row in &rows {
    if row
      .strategy
      .as_deref()
      .is_some_and(|s| s.parse::<Strategy>().is_err())
    {
      tracing::warn!(strategy = ?row.strategy, "ignoring unknown strategy in interaction log");
    }
  }

  Ok(collect_stats(&rows))
}

/// ---------------------------------------------------------------------------
/// Chat Context
/// ---------------------------------------------------------------------------

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
  value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

fn workout_line(w: &Workout) -> String {
  format!(
    "- {}: {} {}x{} @ {} (rpe {})",
    w.date,
    w.exercise,
    fmt_opt(w.sets),
    fmt_opt(w.reps),
    fmt_opt(w.weight),
    fmt_opt(w.rpe)
  )
}

fn meal_line(m: &Meal) -> String {
  format!(
    "- {}: {} {:.0} kcal ({})",
    m.date, m.meal_name, m.estimated_calories, m.description
  )
}

fn bullet_block(lines: Vec<String>) -> String {
  if lines.is_empty() {
    "- none".to_string()
  } else {
    lines.join("\n")
  }
}

/// Plain-text summary of the user's data sent along with each message
pub async fn recent_context(db: &DbPool, today: NaiveDate) -> AppResult<String> {
  let profile = get_profile(db).await?;
  let workouts = latest_workouts(db, CONTEXT_ROWS).await?;
  let meals = meal_history(db, CONTEXT_ROWS).await?;
  let calories_today = daily_calories(db, today).await?;

  Ok(format!(
    "User: {}\nGoal: {}\nDaily calorie target: {}\nCalories today: {:.0}\nRecent workouts:\n{}\nRecent meals:\n{}",
    profile.name,
    profile.goal,
    profile.daily_calorie_target,
    calories_today,
    bullet_block(workouts.iter().map(workout_line).collect()),
    bullet_block(meals.iter().map(meal_line).collect()),
  ))
}

/// ---------------------------------------------------------------------------
/// Chat
/// ---------------------------------------------------------------------------

/// Answer a coaching message and record the interaction.
///
/// Nothing is stored when the backend fails.
pub async fn chat(state: &AppState, message: &str, today: NaiveDate) -> AppResult<ChatReply> {
  let message = message.trim();
  if message.is_empty() {
    return Err(AppError::invalid("message is required"));
  }

  let stats = strategy_stats(&state.db).await?;
  let strategy = {
    let mut rng = rand::thread_rng();
    select_strategy(&stats, state.config.tuning.exploration_rate, &mut rng)
  };

  let context = recent_context(&state.db, today).await?;
  let response = state
    .coach
    .chat(&system_prompt(strategy), &user_prompt(&context, message))
    .await
    .inspect_err(|e| tracing::warn!(error = %e, "coach backend failed"))?;

  let result = sqlx::query(
    r#"
    INSERT INTO llm_interactions (created_at, user_message, assistant_response, strategy, reward, feedback_notes)
    VALUES (?1, ?2, ?3, ?4, NULL, NULL)
    "#,
  )
  .bind(Utc::now())
  .bind(message)
  .bind(&response)
  .bind(strategy.as_str())
  .execute(&state.db)
  .await?;

  let interaction_id = result.last_insert_rowid();
  tracing::info!(interaction_id, strategy = %strategy, "interaction stored");

  Ok(ChatReply {
    interaction_id,
    response,
    strategy,
    provider: PROVIDER.to_string(),
    model: state.coach.model().to_string(),
  })
}

/// ---------------------------------------------------------------------------
/// Feedback
/// ---------------------------------------------------------------------------

/// Rate an interaction once; the reward is clamped to [-1, 1]
pub async fn feedback(db: &DbPool, interaction_id: i64, reward: f64, notes: &str) -> AppResult<FeedbackResult> {
  if reward.is_nan() {
    return Err(AppError::invalid("reward must be a number"));
  }
  let reward = reward.clamp(-1.0, 1.0);

  let result = sqlx::query(
    "UPDATE llm_interactions SET reward = ?1, feedback_notes = ?2 WHERE id = ?3 AND reward IS NULL",
  )
  .bind(reward)
  .bind(notes.trim())
  .bind(interaction_id)
  .execute(db)
  .await?;

  if result.rows_affected() == 0 {
    return match get_interaction(db, interaction_id).await? {
      Some(_) => Err(AppError::Conflict(format!(
        "Interaction {} has already been rated",
        interaction_id
      ))),
      None => Err(AppError::NotFound(format!("Interaction {} not found", interaction_id))),
    };
  }

  tracing::info!(interaction_id, reward, "feedback recorded");
  Ok(FeedbackResult { ok: true, reward })
}

pub async fn get_interaction(db: &DbPool, interaction_id: i64) -> AppResult<Option<Interaction>> {
  let interaction = sqlx::query_as::<_, Interaction>(
    r#"
    SELECT id, created_at, user_message, assistant_response, strategy, reward, feedback_notes
    FROM llm_interactions
    WHERE id = ?1
    "#,
  )
  .bind(interaction_id)
  .fetch_optional(db)
  .await?;
  Ok(interaction)
}

pub async fn coach_status(state: &AppState) -> CoachStatus {
  state.coach.status().await
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
