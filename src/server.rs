//! HTTP API
//!
//! JSON endpoints over the same operations the shell exposes. Errors are
//! rendered as `{"error": "..."}` with a status derived from `AppError`.

use axum::{
  extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
  http::{Method, StatusCode},
  response::{IntoResponse, Response},
  routing::get,
  Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::commands::{coach, local_today, nutrition, parse_date_or_today, profile, workouts};
use crate::db::AppState;
use crate::error::{AppError, AppResult};
use crate::llm::CoachStatus;
use crate::models::{CalorieSummary, Meal, NewWorkout, Profile, Workout};
use crate::nutrition::Recipe;

const DEFAULT_WORKOUT_DAYS: i64 = 30;
const MEAL_HISTORY_LIMIT: i64 = 40;
const RECIPE_LIMIT: usize = 8;
const DEFAULT_RPE: f64 = 7.0;

type ApiResult<T> = Result<Json<T>, AppError>;

/// ---------------------------------------------------------------------------
/// Error Rendering
/// ---------------------------------------------------------------------------

impl AppError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::Llm(_) => StatusCode::BAD_GATEWAY,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

impl From<JsonRejection> for AppError {
  fn from(rejection: JsonRejection) -> Self {
    tracing::debug!(reason = %rejection.body_text(), "rejected request body");
    AppError::invalid("Invalid JSON body.")
  }
}

impl From<QueryRejection> for AppError {
  fn from(rejection: QueryRejection) -> Self {
    AppError::invalid(rejection.body_text())
  }
}

/// ---------------------------------------------------------------------------
/// Request / Response Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DaysQuery {
  days: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DateQuery {
  date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecipeQuery {
  goal: Option<String>,
  max_calories: Option<i64>,
  meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileRequest {
  #[serde(default = "default_goal")]
  goal: String,
  daily_calorie_target: Option<i64>,
}

fn default_goal() -> String {
  "maintenance".to_string()
}

#[derive(Debug, Deserialize)]
struct WorkoutRequest {
  date: Option<String>,
  #[serde(default)]
  exercise: String,
  #[serde(default)]
  sets: i64,
  #[serde(default)]
  reps: i64,
  #[serde(default)]
  weight: f64,
  #[serde(default)]
  duration_min: i64,
  #[serde(default = "default_rpe")]
  rpe: f64,
  #[serde(default)]
  notes: String,
}

fn default_rpe() -> f64 {
  DEFAULT_RPE
}

#[derive(Debug, Deserialize)]
struct MealRequest {
  #[serde(default)]
  meal_name: String,
  #[serde(default)]
  description: String,
  date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
  #[serde(default)]
  message: String,
}

/// Loosely typed so numeric strings are accepted
#[derive(Debug, Deserialize)]
struct FeedbackRequest {
  interaction_id: Option<Value>,
  reward: Option<Value>,
  #[serde(default)]
  notes: String,
}

#[derive(Debug, Serialize)]
struct ProfileResponse {
  ok: bool,
  profile: Profile,
}

#[derive(Debug, Serialize)]
struct WorkoutsResponse {
  workouts: Vec<Workout>,
}

#[derive(Debug, Serialize)]
struct LoggedWorkoutResponse {
  ok: bool,
  motivation: String,
  workouts: Vec<Workout>,
}

#[derive(Debug, Serialize)]
struct PlanResponse {
  plan: String,
}

#[derive(Debug, Serialize)]
struct TrendsResponse {
  trends: BTreeMap<String, f64>,
}

#[derive(Debug, Serialize)]
struct MealsResponse {
  meals: Vec<Meal>,
}

#[derive(Debug, Serialize)]
struct LoggedMealResponse {
  ok: bool,
  estimated_calories: f64,
  details: Vec<String>,
  meals: Vec<Meal>,
}

#[derive(Debug, Serialize)]
struct RecipesResponse {
  recipes: Vec<Recipe>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
  ok: bool,
  #[serde(flatten)]
  reply: coach::ChatReply,
}

/// ---------------------------------------------------------------------------
/// Handlers
/// ---------------------------------------------------------------------------

async fn health() -> &'static str {
  "ok"
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<profile::Dashboard> {
  Ok(Json(profile::dashboard(&state.db, local_today()).await?))
}

async fn get_profile(State(state): State<Arc<AppState>>) -> ApiResult<Profile> {
  Ok(Json(profile::get_profile(&state.db).await?))
}

async fn post_profile(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<ProfileResponse> {
  let Json(req) = body?;
  let profile = profile::set_profile_goal(&state.db, &req.goal, req.daily_calorie_target).await?;
  Ok(Json(ProfileResponse { ok: true, profile }))
}

async fn get_workouts(
  State(state): State<Arc<AppState>>,
  query: Result<Query<DaysQuery>, QueryRejection>,
) -> ApiResult<WorkoutsResponse> {
  let Query(query) = query?;
  let days = query.days.unwrap_or(DEFAULT_WORKOUT_DAYS);
  let workouts = workouts::recent_workouts(&state.db, days, local_today()).await?;
  Ok(Json(WorkoutsResponse { workouts }))
}

async fn post_workout(
  State(state): State<Arc<AppState>>,
  body: Result<Json<WorkoutRequest>, JsonRejection>,
) -> ApiResult<LoggedWorkoutResponse> {
  let Json(req) = body?;
  let today = local_today();

  let workout = NewWorkout {
    date: parse_date_or_today(req.date.as_deref())?,
    exercise: req.exercise,
    sets: req.sets,
    reps: req.reps,
    weight: req.weight,
    duration_min: req.duration_min,
    rpe: req.rpe,
    notes: req.notes,
  };
  workouts::log_workout(&state.db, &workout).await?;

  Ok(Json(LoggedWorkoutResponse {
    ok: true,
    motivation: workouts::motivation(&state.db, today).await?,
    workouts: workouts::recent_workouts(&state.db, DEFAULT_WORKOUT_DAYS, today).await?,
  }))
}

async fn get_adaptive_plan(State(state): State<Arc<AppState>>) -> ApiResult<PlanResponse> {
  let plan = workouts::adaptive_plan(&state.db, &state.config.tuning, local_today()).await?;
  Ok(Json(PlanResponse { plan }))
}

async fn get_load_trends(State(state): State<Arc<AppState>>) -> ApiResult<TrendsResponse> {
  let trends = workouts::load_trends(&state.db).await?;
  Ok(Json(TrendsResponse { trends }))
}

async fn get_meals(State(state): State<Arc<AppState>>) -> ApiResult<MealsResponse> {
  let meals = nutrition::meal_history(&state.db, MEAL_HISTORY_LIMIT).await?;
  Ok(Json(MealsResponse { meals }))
}

async fn post_meal(
  State(state): State<Arc<AppState>>,
  body: Result<Json<MealRequest>, JsonRejection>,
) -> ApiResult<LoggedMealResponse> {
  let Json(req) = body?;
  let date = parse_date_or_today(req.date.as_deref())?;

  let estimate = nutrition::log_meal(&state.db, &req.meal_name, &req.description, date).await?;

  Ok(Json(LoggedMealResponse {
    ok: true,
    estimated_calories: estimate.estimated_calories,
    details: estimate.details,
    meals: nutrition::meal_history(&state.db, MEAL_HISTORY_LIMIT).await?,
  }))
}

async fn get_calorie_summary(
  State(state): State<Arc<AppState>>,
  query: Result<Query<DateQuery>, QueryRejection>,
) -> ApiResult<CalorieSummary> {
  let Query(query) = query?;
  let date = parse_date_or_today(query.date.as_deref())?;
  Ok(Json(nutrition::calorie_summary(&state.db, date).await?))
}

async fn get_recipes(
  State(state): State<Arc<AppState>>,
  query: Result<Query<RecipeQuery>, QueryRejection>,
) -> ApiResult<RecipesResponse> {
  let Query(query) = query?;
  let recipes = nutrition::recipes_for(
    &state.db,
    &state.recipes,
    query.goal.as_deref(),
    query.max_calories,
    query.meal_type.as_deref(),
    RECIPE_LIMIT,
  )
  .await?;
  Ok(Json(RecipesResponse { recipes }))
}

async fn get_coach_status(State(state): State<Arc<AppState>>) -> Json<CoachStatus> {
  Json(coach::coach_status(&state).await)
}

async fn post_chat(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
  let Json(req) = body?;
  let reply = coach::chat(&state, &req.message, local_today()).await?;
  Ok(Json(ChatResponse { ok: true, reply }))
}

fn value_as_i64(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| {
      n.as_f64()
        .filter(|f| f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f))
        .map(|f| f as i64)
    }),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

fn value_as_f64(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

async fn post_feedback(
  State(state): State<Arc<AppState>>,
  body: Result<Json<FeedbackRequest>, JsonRejection>,
) -> ApiResult<coach::FeedbackResult> {
  let Json(req) = body?;

  let interaction_id = req.interaction_id.as_ref().and_then(value_as_i64);
  let reward = req.reward.as_ref().and_then(value_as_f64);
  let (Some(interaction_id), Some(reward)) = (interaction_id, reward) else {
    return Err(AppError::invalid(
      "interaction_id (int) and reward (number) are required",
    ));
  };

  Ok(Json(coach::feedback(&state.db, interaction_id, reward, &req.notes).await?))
}

async fn not_found() -> AppError {
  AppError::NotFound("Endpoint not found.".to_string())
}

/// ---------------------------------------------------------------------------
/// Router
/// ---------------------------------------------------------------------------

pub fn router(state: Arc<AppState>, web_dir: Option<&Path>) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

  let api = Router::new()
    .route("/health", get(health))
    .route("/api/dashboard", get(get_dashboard))
    .route("/api/profile", get(get_profile).post(post_profile))
    .route("/api/workouts", get(get_workouts).post(post_workout))
    .route("/api/adaptive-plan", get(get_adaptive_plan))
    .route("/api/load-trends", get(get_load_trends))
    .route("/api/meals", get(get_meals).post(post_meal))
    .route("/api/calorie-summary", get(get_calorie_summary))
    .route("/api/recipes", get(get_recipes))
    .route("/api/coach/status", get(get_coach_status))
    .route("/api/coach/chat", axum::routing::post(post_chat))
    .route("/api/coach/feedback", axum::routing::post(post_feedback));

  let app = match web_dir {
    Some(dir) => api.fallback_service(ServeDir::new(dir)),
    None => api.fallback(not_found),
  };

  app
    .layer(TraceLayer::new_for_http())
    .layer(cors)
    .with_state(state)
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: Arc<AppState>, host: &str, port: u16, web_dir: Option<PathBuf>) -> AppResult<()> {
  let app = router(state, web_dir.as_deref());

  let listener = tokio::net::TcpListener::bind((host, port)).await?;
  let addr = listener.local_addr()?;
  tracing::info!(%addr, "HTTP API listening");
  println!("NOX running at http://{}", addr);
  println!("Press Ctrl+C to stop.");

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  tracing::info!("HTTP API stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!(error = %e, "failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
