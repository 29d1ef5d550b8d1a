use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Interaction {
  pub id: i64,
  pub created_at: DateTime<Utc>,
  pub user_message: String,
  pub assistant_response: String,
  pub strategy: Option<String>,
  /// None means unrated, not zero
  pub reward: Option<f64>,
  pub feedback_notes: Option<String>,
}
