//! Command-line argument parsing
//!
//! With no subcommand the interactive shell starts.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// NOX - local fitness coach and nutrition tracker
#[derive(Parser, Debug)]
#[command(name = "nox")]
#[command(version)]
#[command(about = "Log workouts and meals, track trends and chat with a local coach", long_about = None)]
pub struct Cli {
  /// SQLite database file (overrides NOX_DB_PATH)
  #[arg(long, global = true, value_name = "PATH")]
  pub db: Option<PathBuf>,

  /// Verbosity: -v (info), -vv (debug), -vvv (trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,

  /// Suppress log output
  #[arg(short, long, global = true)]
  pub quiet: bool,

  #[command(subcommand)]
  pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
  /// Start the interactive shell (default)
  Shell,

  /// Run the HTTP API
  Serve {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Directory of static files served for non-API paths
    #[arg(long, value_name = "DIR")]
    web_dir: Option<PathBuf>,
  },

  /// Print today's overview
  Dashboard,

  /// Print adaptive training suggestions
  Plan,

  /// Print per-exercise load trends
  Trends,

  /// Send one message to the coach
  Chat {
    #[arg(required = true, num_args = 1..)]
    message: Vec<String>,
  },

  /// Rate a coach reply between -1 and 1
  Feedback {
    interaction_id: i64,

    #[arg(allow_negative_numbers = true)]
    reward: f64,

    #[arg(long, default_value = "")]
    notes: String,
  },

  /// Check whether the Ollama backend is usable
  CoachStatus,
}

impl Cli {
  /// Default tracing filter for the chosen verbosity, or None when quiet
  pub fn log_filter(&self) -> Option<&'static str> {
    if self.quiet {
      return None;
    }
    Some(match self.verbose {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace",
    })
  }

  /// Apply global flag overrides on top of environment configuration
  pub fn apply(&self, config: &mut Config) {
    if let Some(db) = &self.db {
      config.database_path = db.clone();
    }
    if let Some(Command::Serve { host, port, .. }) = &self.command {
      if let Some(host) = host {
        config.http_host = host.clone();
      }
      if let Some(port) = port {
        config.http_port = *port;
      }
    }
  }
}
