use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::LlmError;

/// ---------------------------------------------------------------------------
/// Application Error
/// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error(transparent)]
  Llm(#[from] LlmError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("{0}")]
  InvalidInput(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to parse recipes: {0}")]
  Recipes(#[from] serde_json::Error),

  #[error("Input error: {0}")]
  Readline(#[from] rustyline::error::ReadlineError),
}

impl AppError {
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }
}

impl Serialize for AppError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

pub type AppResult<T> = Result<T, AppError>;
