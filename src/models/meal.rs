use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Meal {
  pub id: i64,
  pub date: NaiveDate,
  pub meal_name: String,
  pub description: String,
  pub estimated_calories: f64,
}

/// Result of logging a meal: the stored estimate plus per-item details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEstimate {
  pub estimated_calories: f64,
  pub details: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalorieSummary {
  pub date: NaiveDate,
  pub total: f64,
  pub target: i64,
  /// total - target; positive means over target
  pub delta: f64,
}

impl CalorieSummary {
  pub fn new(date: NaiveDate, total: f64, target: i64) -> Self {
    Self {
      date,
      total,
      target,
      delta: total - target as f64,
    }
  }

  pub fn is_over(&self) -> bool {
    self.delta > 0.0
  }
}
