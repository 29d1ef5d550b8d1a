//! Runtime configuration
//!
//! Everything is read from the environment (a `.env` file is loaded first by
//! the binary). CLI flags override individual fields after loading.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// ---------------------------------------------------------------------------
/// Defaults
/// ---------------------------------------------------------------------------

const DEFAULT_OLLAMA_HOST: &str = "http://127.0.0.1:11434";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.1:8b";
const DEFAULT_CHAT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_STATUS_TIMEOUT_SECS: u64 = 4;
const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DB_DIR_NAME: &str = "nox";
const DB_FILE_NAME: &str = "nox.db";

/// ---------------------------------------------------------------------------
/// Error Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: '{value}' ({reason})")]
  Invalid {
    key: String,
    value: String,
    reason: String,
  },

  #[error("Could not determine a data directory; set NOX_DB_PATH")]
  NoDataDir,
}

impl ConfigError {
  fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
    Self::Invalid {
      key: key.to_string(),
      value: value.to_string(),
      reason: reason.into(),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Coaching Heuristic Parameters
/// ---------------------------------------------------------------------------

/// Tunable constants for the strategy selector and trend engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoachTuning {
  /// Probability of picking a uniformly random strategy
  pub exploration_rate: f64,

  /// Load trend (percent) at or above which an exercise counts as progressing
  pub progress_threshold_pct: f64,

  /// Average RPE at or above which a deload is recommended
  pub deload_rpe: f64,

  /// Window used for "recent" workouts in the adaptive routine
  pub recent_window_days: i64,
}

impl Default for CoachTuning {
  fn default() -> Self {
    Self {
      exploration_rate: 0.18,
      progress_threshold_pct: 3.0,
      deload_rpe: 8.6,
      recent_window_days: 14,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Ollama Backend
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OllamaConfig {
  /// Base URL without trailing slash
  pub host: String,
  pub model: String,
  pub chat_timeout: Duration,
  pub status_timeout: Duration,
}

impl Default for OllamaConfig {
  fn default() -> Self {
    Self {
      host: DEFAULT_OLLAMA_HOST.to_string(),
      model: DEFAULT_OLLAMA_MODEL.to_string(),
      chat_timeout: Duration::from_secs(DEFAULT_CHAT_TIMEOUT_SECS),
      status_timeout: Duration::from_secs(DEFAULT_STATUS_TIMEOUT_SECS),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Application Config
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
  pub database_path: PathBuf,
  pub ollama: OllamaConfig,
  pub http_host: String,
  pub http_port: u16,
  /// Recipe JSON file; the embedded set is used when absent
  pub recipes_path: Option<PathBuf>,
  pub tuning: CoachTuning,
}

impl Config {
  /// Load configuration from environment variables
  pub fn from_env() -> Result<Self, ConfigError> {
    let database_path = match non_empty_var("NOX_DB_PATH") {
      Some(path) => PathBuf::from(path),
      None => default_database_path()?,
    };

    let host = match non_empty_var("OLLAMA_HOST") {
      Some(raw) => normalize_host(&raw)?,
      None => DEFAULT_OLLAMA_HOST.to_string(),
    };

    let ollama = OllamaConfig {
      host,
      model: non_empty_var("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
      chat_timeout: Duration::from_secs(parse_positive_secs(
        "NOX_CHAT_TIMEOUT_SECS",
        DEFAULT_CHAT_TIMEOUT_SECS,
      )?),
      status_timeout: Duration::from_secs(parse_positive_secs(
        "NOX_STATUS_TIMEOUT_SECS",
        DEFAULT_STATUS_TIMEOUT_SECS,
      )?),
    };

    let defaults = CoachTuning::default();
    let tuning = CoachTuning {
      exploration_rate: parse_var("NOX_EXPLORATION_RATE", defaults.exploration_rate)?,
      progress_threshold_pct: parse_var("NOX_PROGRESS_THRESHOLD_PCT", defaults.progress_threshold_pct)?,
      deload_rpe: parse_var("NOX_DELOAD_RPE", defaults.deload_rpe)?,
      recent_window_days: defaults.recent_window_days,
    };
    validate_tuning(&tuning)?;

    Ok(Self {
      database_path,
      ollama,
      http_host: non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HTTP_HOST.to_string()),
      http_port: parse_var("PORT", DEFAULT_HTTP_PORT)?,
      recipes_path: non_empty_var("NOX_RECIPES_PATH").map(PathBuf::from),
      tuning,
    })
  }
}

/// Default database location: <platform data dir>/nox/nox.db
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
  let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
  Ok(data_dir.join(DB_DIR_NAME).join(DB_FILE_NAME))
}

/// Validate an Ollama base URL and strip any trailing slash
pub fn normalize_host(raw: &str) -> Result<String, ConfigError> {
  let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid("OLLAMA_HOST", raw, e.to_string()))?;

  if !matches!(url.scheme(), "http" | "https") {
    return Err(ConfigError::invalid("OLLAMA_HOST", raw, "scheme must be http or https"));
  }

  Ok(url.as_str().trim_end_matches('/').to_string())
}

fn validate_tuning(tuning: &CoachTuning) -> Result<(), ConfigError> {
  if !(0.0..=1.0).contains(&tuning.exploration_rate) {
    return Err(ConfigError::invalid(
      "NOX_EXPLORATION_RATE",
      &tuning.exploration_rate.to_string(),
      "must be between 0 and 1",
    ));
  }
  if !tuning.progress_threshold_pct.is_finite() {
    return Err(ConfigError::invalid(
      "NOX_PROGRESS_THRESHOLD_PCT",
      &tuning.progress_threshold_pct.to_string(),
      "must be a finite number",
    ));
  }
  if !(tuning.deload_rpe > 0.0 && tuning.deload_rpe <= 10.0) {
    return Err(ConfigError::invalid(
      "NOX_DELOAD_RPE",
      &tuning.deload_rpe.to_string(),
      "must be within (0, 10]",
    ));
  }
  Ok(())
}

fn non_empty_var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
  T::Err: std::fmt::Display,
{
  match non_empty_var(key) {
    Some(raw) => raw
      .parse()
      .map_err(|e: T::Err| ConfigError::invalid(key, &raw, e.to_string())),
    None => Ok(default),
  }
}

fn parse_positive_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
  let secs = parse_var(key, default)?;
  if secs == 0 {
    return Err(ConfigError::invalid(key, "0", "must be greater than zero"));
  }
  Ok(secs)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const ALL_KEYS: [&str; 11] = [
    "NOX_DB_PATH",
    "OLLAMA_HOST",
    "OLLAMA_MODEL",
    "NOX_CHAT_TIMEOUT_SECS",
    "NOX_STATUS_TIMEOUT_SECS",
    "HOST",
    "PORT",
    "NOX_RECIPES_PATH",
    "NOX_EXPLORATION_RATE",
    "NOX_PROGRESS_THRESHOLD_PCT",
    "NOX_DELOAD_RPE",
  ];

  fn with_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
    let vars: Vec<(&str, Option<&str>)> = ALL_KEYS
      .iter()
      .map(|key| {
        let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
        (*key, value)
      })
      .collect();
    temp_env::with_vars(vars, f);
  }

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    with_env(&[("NOX_DB_PATH", "/tmp/nox-test.db")], || {
      let config = Config::from_env().expect("defaults should load");
      assert_eq!(config.database_path, PathBuf::from("/tmp/nox-test.db"));
      assert_eq!(config.ollama.host, "http://127.0.0.1:11434");
      assert_eq!(config.ollama.model, "llama3.1:8b");
      assert_eq!(config.ollama.chat_timeout, Duration::from_secs(120));
      assert_eq!(config.ollama.status_timeout, Duration::from_secs(4));
      assert_eq!(config.http_host, "127.0.0.1");
      assert_eq!(config.http_port, 8080);
      assert!(config.recipes_path.is_none());
      assert_eq!(config.tuning, CoachTuning::default());
    });
  }

  #[test]
  #[serial]
  fn test_overrides_from_env() {
    with_env(
      &[
        ("NOX_DB_PATH", "/tmp/other.db"),
        ("OLLAMA_HOST", "http://gpu-box:11434/"),
        ("OLLAMA_MODEL", "qwen2.5:7b"),
        ("PORT", "9090"),
        ("NOX_EXPLORATION_RATE", "0.05"),
        ("NOX_PROGRESS_THRESHOLD_PCT", "5"),
      ],
      || {
        let config = Config::from_env().expect("overrides should load");
        assert_eq!(config.ollama.host, "http://gpu-box:11434");
        assert_eq!(config.ollama.model, "qwen2.5:7b");
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.tuning.exploration_rate, 0.05);
        assert_eq!(config.tuning.progress_threshold_pct, 5.0);
      },
    );
  }

  #[test]
  #[serial]
  fn test_rejects_out_of_range_exploration_rate() {
    with_env(
      &[("NOX_DB_PATH", "/tmp/nox.db"), ("NOX_EXPLORATION_RATE", "1.5")],
      || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "NOX_EXPLORATION_RATE"));
      },
    );
  }

  #[test]
  #[serial]
  fn test_rejects_unparseable_port() {
    with_env(&[("NOX_DB_PATH", "/tmp/nox.db"), ("PORT", "eighty")], || {
      let err = Config::from_env().unwrap_err();
      assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "PORT"));
    });
  }

  #[test]
  #[serial]
  fn test_rejects_zero_timeout() {
    with_env(
      &[("NOX_DB_PATH", "/tmp/nox.db"), ("NOX_CHAT_TIMEOUT_SECS", "0")],
      || {
        assert!(Config::from_env().is_err());
      },
    );
  }

  #[test]
  fn test_normalize_host() {
    assert_eq!(normalize_host("http://localhost:11434/").unwrap(), "http://localhost:11434");
    assert!(normalize_host("localhost:11434").is_err());
    assert!(normalize_host("ftp://localhost").is_err());
  }
}
