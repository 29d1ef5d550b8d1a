use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nox_lib::cli::Cli;

fn init_tracing(cli: &Cli) {
  let Some(filter) = cli.log_filter() else {
    return;
  };

  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::registry()
    .with(env_filter)
    .with(fmt::layer().with_writer(std::io::stderr))
    .init();
}

#[tokio::main]
async fn main() -> ExitCode {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  let cli = Cli::parse();
  init_tracing(&cli);

  match nox_lib::run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("Error: {}", e);
      ExitCode::FAILURE
    }
  }
}
