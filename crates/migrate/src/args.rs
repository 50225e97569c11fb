use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use goalbot_db::migrations::BundleFormat;

#[derive(Parser, Debug)]
#[command(name = "goalbot-migrate")]
#[command(about = "Apply, inspect, and bundle the goal-tracking database schema")]
#[command(long_about = "goalbot-migrate - schema tooling for the goal-tracking bot

Migrations live in db/migrations and are applied in numeric order. Every
file is idempotent, so re-running is always safe. Applied migrations are
recorded in the _schema_migrations ledger with a checksum.

QUICK START:
  goalbot-migrate up                 Apply pending migrations, then verify
  goalbot-migrate status             Show applied / pending migrations
  goalbot-migrate bundle > all.sql   Write the consolidated script
  goalbot-migrate check              Deployment readiness checks

DATABASE_URL must be set (environment or .env) for every command except
bundle.")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for reports
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Pretty,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations in order, then verify the table set
    Up(UpArgs),

    /// Compare the migration files against the ledger
    Status(SessionsArgs),

    /// Check that every expected table exists (exit 1 otherwise)
    Verify(SessionsArgs),

    /// Render the consolidated script or the psql \i script
    ///
    /// Needs no database. The output is generated from the same embedded
    /// files `up` applies, so it cannot drift from them.
    Bundle(BundleArgs),

    /// Deployment readiness: configuration, connectivity, migrations, tables
    Check(SessionsArgs),
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct SessionsArgs {
    /// Include the optional sessions migration
    /// (also enabled by GOALBOT_ENABLE_SESSIONS=true)
    #[arg(long)]
    pub with_sessions: bool,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct UpArgs {
    #[command(flatten)]
    pub sessions: SessionsArgs,

    /// Re-execute migrations the ledger already records
    #[arg(long)]
    pub reapply: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BundleArgs {
    #[command(flatten)]
    pub sessions: SessionsArgs,

    /// Artifact to render
    #[arg(long, value_enum, default_value = "sql")]
    pub format: BundleKind,

    /// Directory the psql \i directives point at
    #[arg(long, default_value = "db/migrations")]
    pub migrations_dir: String,

    /// Write to this file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BundleKind {
    /// Consolidated all-in-one SQL script
    #[default]
    Sql,
    /// One `\i` directive per migration file, for psql
    Psql,
}

impl From<BundleKind> for BundleFormat {
    fn from(kind: BundleKind) -> Self {
        match kind {
            BundleKind::Sql => BundleFormat::Sql,
            BundleKind::Psql => BundleFormat::Psql,
        }
    }
}
