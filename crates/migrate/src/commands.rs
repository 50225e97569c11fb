//! Command implementations. Each returns `Ok(true)` on success and
//! `Ok(false)` when the command ran but its check failed.

use std::io::Write;

use anyhow::Context;
use serde::Serialize;
use serde_json::json;

use goalbot_db::migrations::{
    self, MigrationOptions, MigrationReport, MigrationSet, MigrationState, MigrationStatus,
    SkipReason, VerificationReport,
};
use goalbot_db::DbPool;

use crate::args::{BundleArgs, Cli, Commands, OutputFormat, SessionsArgs, UpArgs};
use crate::config::MigrateConfig;

/// Run the command selected on the command line.
pub async fn dispatch(cli: &Cli, config: &MigrateConfig) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Up(args) => up(config, args, cli.output).await,
        Commands::Status(args) => status(config, args, cli.output).await,
        Commands::Verify(args) => verify(config, args, cli.output).await,
        Commands::Bundle(args) => bundle(config, args),
        Commands::Check(args) => check(config, args, cli.output).await,
    }
}

fn include_optional(config: &MigrateConfig, args: &SessionsArgs) -> bool {
    args.with_sessions || config.enable_sessions
}

async fn connect(config: &MigrateConfig) -> anyhow::Result<DbPool> {
    let url = config.require_database_url()?;
    let pool = goalbot_db::create_pool(url, config.max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::debug!(max_connections = config.max_connections, "Database connection pool created");
    Ok(pool)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn file_label(version: i64, name: &str) -> String {
    format!("{version:03}_{name}.sql")
}

// ---------------------------------------------------------------------------
// up
// ---------------------------------------------------------------------------

async fn up(config: &MigrateConfig, args: &UpArgs, output: OutputFormat) -> anyhow::Result<bool> {
    let include_optional = include_optional(config, &args.sessions);
    let pool = connect(config).await?;
    let set = MigrationSet::embedded();
    let options = MigrationOptions {
        include_optional,
        reapply: args.reapply,
    };

    let report = migrations::run(&pool, &set, &options).await?;
    let verification = migrations::verify_tables(&pool, &set.expected_tables(include_optional)).await?;

    match output {
        OutputFormat::Json => print_json(&json!({
            "migrations": report,
            "verification": verification,
        }))?,
        OutputFormat::Pretty => {
            print_migration_report(&report);
            print_verification(&verification);
        }
    }
    Ok(verification.is_complete())
}

fn print_migration_report(report: &MigrationReport) {
    for m in &report.applied {
        println!("applied  {}  ({} ms)", file_label(m.version, &m.name), m.elapsed_ms);
    }
    for m in &report.skipped {
        let why = match m.reason {
            SkipReason::OptionalDisabled => "optional, not enabled",
            SkipReason::AlreadyApplied => "already applied",
        };
        println!("skipped  {}  ({why})", file_label(m.version, &m.name));
    }
    println!(
        "{} applied, {} skipped",
        report.applied.len(),
        report.skipped.len()
    );
}

fn print_verification(report: &VerificationReport) {
    if report.is_complete() {
        println!(
            "verified {}/{} tables",
            report.present.len(),
            report.expected.len()
        );
    } else {
        println!(
            "verification FAILED: {}/{} tables, missing: {}",
            report.present.len(),
            report.expected.len(),
            report.missing.join(", ")
        );
    }
}

// ---------------------------------------------------------------------------
// status / verify
// ---------------------------------------------------------------------------

async fn status(
    config: &MigrateConfig,
    args: &SessionsArgs,
    output: OutputFormat,
) -> anyhow::Result<bool> {
    let pool = connect(config).await?;
    let set = MigrationSet::embedded();
    let statuses = migrations::status(&pool, &set, include_optional(config, args)).await?;

    match output {
        OutputFormat::Json => print_json(&statuses)?,
        OutputFormat::Pretty => print_statuses(&statuses),
    }
    Ok(!statuses.iter().any(|s| s.state == MigrationState::Drifted))
}

fn print_statuses(statuses: &[MigrationStatus]) {
    for s in statuses {
        let state = match s.state {
            MigrationState::Applied => "applied",
            MigrationState::Pending => "pending",
            MigrationState::OptionalDisabled => "optional (disabled)",
            MigrationState::Drifted => "DRIFTED (file changed after apply)",
        };
        let when = s
            .applied_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default();
        println!("{:<40} {:<36} {when}", file_label(s.version, &s.name), state);
    }
}

async fn verify(
    config: &MigrateConfig,
    args: &SessionsArgs,
    output: OutputFormat,
) -> anyhow::Result<bool> {
    let pool = connect(config).await?;
    let set = MigrationSet::embedded();
    let report = migrations::verify_tables(&pool, &set.expected_tables(include_optional(config, args))).await?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => print_verification(&report),
    }
    Ok(report.is_complete())
}

// ---------------------------------------------------------------------------
// bundle
// ---------------------------------------------------------------------------

fn bundle(config: &MigrateConfig, args: &BundleArgs) -> anyhow::Result<bool> {
    let set = MigrationSet::embedded();
    let script = migrations::render(
        &set,
        args.format.into(),
        include_optional(config, &args.sessions),
        &args.migrations_dir,
    );

    match &args.out {
        Some(path) => {
            std::fs::write(path, &script)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = script.len(), "Bundle written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(script.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// Outcome of one readiness check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Show only the ends of a secret: `post...ods2`, or `***` if short.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

async fn check(
    config: &MigrateConfig,
    args: &SessionsArgs,
    output: OutputFormat,
) -> anyhow::Result<bool> {
    let include_optional = include_optional(config, args);
    let results = readiness_checks(config, include_optional).await;

    match output {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Pretty => {
            for r in &results {
                let mark = if r.passed { "PASS" } else { "FAIL" };
                println!("{mark}: {}: {}", r.name, r.detail);
            }
        }
    }
    Ok(results.iter().all(|r| r.passed))
}

async fn readiness_checks(config: &MigrateConfig, include_optional: bool) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let Some(url) = config.database_url.as_deref() else {
        results.push(CheckResult::fail("configuration", "DATABASE_URL is not set"));
        for name in ["connectivity", "migrations", "tables"] {
            results.push(CheckResult::fail(name, "skipped: no database configured"));
        }
        return results;
    };
    results.push(CheckResult::pass(
        "configuration",
        format!("DATABASE_URL = {}", mask_secret(url)),
    ));

    let pool = match goalbot_db::create_pool(url, config.max_connections).await {
        Ok(pool) => pool,
        Err(err) => {
            results.push(CheckResult::fail("connectivity", err.to_string()));
            for name in ["migrations", "tables"] {
                results.push(CheckResult::fail(name, "skipped: database unreachable"));
            }
            return results;
        }
    };
    results.push(match goalbot_db::health_check(&pool).await {
        Ok(()) => CheckResult::pass("connectivity", "database reachable"),
        Err(err) => CheckResult::fail("connectivity", err.to_string()),
    });

    let set = MigrationSet::embedded();
    let options = MigrationOptions {
        include_optional,
        reapply: false,
    };
    results.push(match migrations::plan(&pool, &set, &options).await {
        Ok(pending) if pending.is_empty() => CheckResult::pass("migrations", "no pending migrations"),
        Ok(pending) => {
            let names: Vec<_> = pending.iter().map(|m| m.file_name()).collect();
            CheckResult::fail("migrations", format!("pending: {}", names.join(", ")))
        }
        Err(err) => CheckResult::fail("migrations", err.to_string()),
    });

    results.push(
        match migrations::verify_tables(&pool, &set.expected_tables(include_optional)).await {
            Ok(report) if report.is_complete() => CheckResult::pass(
                "tables",
                format!("{}/{} present", report.present.len(), report.expected.len()),
            ),
            Ok(report) => CheckResult::fail("tables", format!("missing: {}", report.missing.join(", "))),
            Err(err) => CheckResult::fail("tables", err.to_string()),
        },
    );

    results
}
