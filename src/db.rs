use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::AppResult;
use crate::llm::OllamaClient;
use crate::nutrition::{load_recipes, Recipe};

pub type DbPool = SqlitePool;

/// Application state shared by the shell and the HTTP server
pub struct AppState {
  /// Single-connection pool; every statement is serialized through it
  pub db: DbPool,
  pub config: Config,
  pub coach: OllamaClient,
  pub recipes: Vec<Recipe>,
}

impl AppState {
  /// Open the database, load recipes and build the coach client
  pub async fn initialize(config: Config) -> AppResult<Self> {
    let db = initialize_db(&config.database_path).await?;
    let recipes = load_recipes(config.recipes_path.as_deref())?;
    tracing::debug!(count = recipes.len(), "recipes loaded");
    let coach = OllamaClient::new(&config.ollama);

    Ok(Self {
      db,
      config,
      coach,
      recipes,
    })
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_path: &Path) -> AppResult<DbPool> {
  // Create directory if it doesn't exist
  if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    fs::create_dir_all(parent)?;
  }

  tracing::info!(path = %db_path.display(), "initializing database");

  let options = SqliteConnectOptions::new()
    .filename(db_path)
    .create_if_missing(true);

  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect_with(options)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("database initialized");

  Ok(pool)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_initialize_db_creates_file_and_parent_dirs() {
    let dir = std::env::temp_dir().join(format!("nox-db-test-{}", std::process::id()));
    let path = dir.join("nested").join("nox.db");
    let _ = fs::remove_dir_all(&dir);

    let pool = initialize_db(&path).await.expect("database should initialize");
    assert!(path.exists());

    let target: i64 = sqlx::query_scalar("SELECT daily_calorie_target FROM user_profile WHERE id = 1")
      .fetch_one(&pool)
      .await
      .unwrap();
    assert_eq!(target, 2200);

    pool.close().await;
    let _ = fs::remove_dir_all(&dir);
  }

  #[tokio::test]
  async fn test_initialize_db_is_idempotent() {
    let dir = std::env::temp_dir().join(format!("nox-db-reopen-{}", std::process::id()));
    let path = dir.join("nox.db");
    let _ = fs::remove_dir_all(&dir);

    let first = initialize_db(&path).await.unwrap();
    first.close().await;
    let second = initialize_db(&path).await.expect("reopening should not rerun migrations");

    let profiles: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_profile")
      .fetch_one(&second)
      .await
      .unwrap();
    assert_eq!(profiles, 1);

    second.close().await;
    let _ = fs::remove_dir_all(&dir);
  }
}
