pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod nutrition;
pub mod server;
pub mod strategy;
pub mod trend;

#[cfg(test)]
pub mod test_utils;

use cli::{Cli, Command, Shell};
use commands::local_today;
use config::Config;
use db::AppState;
use error::AppResult;
use std::sync::Arc;

/// Load configuration, open the database and run the requested command
pub async fn run(cli: Cli) -> AppResult<()> {
  let mut config = Config::from_env()?;
  cli.apply(&mut config);

  let state = AppState::initialize(config).await?;
  let command = cli.command.unwrap_or(Command::Shell);

  match command {
    Command::Shell => Shell::new(&state)?.run().await?,
    Command::Serve { web_dir, .. } => {
      let host = state.config.http_host.clone();
      let port = state.config.http_port;
      let state = Arc::new(state);
      server::serve(state.clone(), &host, port, web_dir).await?;
      state.db.close().await;
      return Ok(());
    }
    Command::Dashboard => {
      let board = commands::profile::dashboard(&state.db, local_today()).await?;
      println!("{}", board.render());
    }
    Command::Plan => {
      let plan = commands::workouts::adaptive_plan(&state.db, &state.config.tuning, local_today()).await?;
      println!("{}", plan);
    }
    Command::Trends => {
      let trends = commands::workouts::load_trends(&state.db).await?;
      if trends.is_empty() {
        println!("Not enough history yet (4 sessions per exercise needed).");
      }
      for (exercise, pct) in &trends {
        println!("{:<20} {:>+7.1}%", exercise, pct);
      }
    }
    Command::Chat { message } => {
      let reply = commands::coach::chat(&state, &message.join(" "), local_today()).await?;
      println!("{}\n\n[interaction {} | strategy {}]", reply.response, reply.interaction_id, reply.strategy);
    }
    Command::Feedback {
      interaction_id,
      reward,
      notes,
    } => {
      let result = commands::coach::feedback(&state.db, interaction_id, reward, &notes).await?;
      println!("Feedback saved (reward {}).", result.reward);
    }
    Command::CoachStatus => {
      let status = commands::coach::coach_status(&state).await;
      println!("{} [{}] {}", status.provider, status.model, status.message);
    }
  }

  state.db.close().await;
  Ok(())
}
