//! `goalbot-migrate` -- schema tooling for the goal-tracking bot.
//!
//! # Environment variables
//!
//! | Variable                  | Required        | Default | Description                          |
//! |---------------------------|-----------------|---------|--------------------------------------|
//! | `DATABASE_URL`            | all but `bundle`| --      | PostgreSQL connection string         |
//! | `DB_MAX_CONNECTIONS`      | no              | `5`     | Pool size                            |
//! | `GOALBOT_ENABLE_SESSIONS` | no              | `false` | Include the optional sessions table  |
//! | `RUST_LOG`                | no              | `goalbot_migrate=info,goalbot_db=info` | Log filter |
//!
//! Logs go to stderr so that `bundle` and `--output json` stay pipeable.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goalbot_migrate::args::Cli;
use goalbot_migrate::commands;
use goalbot_migrate::config::MigrateConfig;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "goalbot_migrate=info,goalbot_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = MigrateConfig::from_env();

    match commands::dispatch(&cli, &config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!(error = %err, "Command failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
