use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Workout {
  pub id: i64,
  pub date: NaiveDate,
  pub exercise: String,
  pub sets: Option<i64>,
  pub reps: Option<i64>,
  pub weight: Option<f64>,
  pub duration_min: Option<i64>,
  pub rpe: Option<f64>,
  pub notes: Option<String>,
}

impl Workout {
  /// Training load proxy: sets * reps * weight, missing values count as zero
  pub fn load(&self) -> f64 {
    let sets = self.sets.unwrap_or(0) as f64;
    let reps = self.reps.unwrap_or(0) as f64;
    sets * reps * self.weight.unwrap_or(0.0)
  }
}

/// For inserting new workouts (without id)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkout {
  pub date: NaiveDate,
  pub exercise: String,
  pub sets: i64,
  pub reps: i64,
  pub weight: f64,
  pub duration_min: i64,
  pub rpe: f64,
  pub notes: String,
}

impl NewWorkout {
  /// Lowercased, trimmed exercise name as stored in the log
  pub fn normalized_exercise(&self) -> String {
    normalize_exercise(&self.exercise)
  }
}

pub fn normalize_exercise(name: &str) -> String {
  name.trim().to_lowercase()
}
