//! Applies a [`MigrationSet`] in version order and keeps the ledger.
//!
//! Each migration runs in its own transaction together with its ledger
//! row, so a file is either fully applied and recorded or not at all. The
//! first failure aborts the batch; migrations before it stay applied.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use goalbot_core::types::Timestamp;

use super::{
    AppliedMigration, Migration, MigrationKind, MigrationOptions, MigrationReport, MigrationSet,
    SkipReason, SkippedMigration,
};
use crate::error::MigrationError;

/// Ledger table name. Excluded from schema verification and snapshots.
pub const LEDGER_TABLE: &str = "_schema_migrations";

const CREATE_LEDGER: &str = "CREATE TABLE IF NOT EXISTS _schema_migrations (
    version    BIGINT PRIMARY KEY,
    name       TEXT NOT NULL,
    checksum   TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// One row of the migration ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LedgerEntry {
    pub version: i64,
    pub name: String,
    pub checksum: String,
    pub applied_at: Timestamp,
}

/// Create the ledger table if it does not exist yet.
pub async fn ensure_ledger(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_LEDGER).execute(pool).await?;
    Ok(())
}

/// All ledger rows ordered by version. Empty if the ledger was never created.
pub async fn applied(pool: &PgPool) -> Result<Vec<LedgerEntry>, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT to_regclass('public._schema_migrations') IS NOT NULL")
            .fetch_one(pool)
            .await?;
    if !exists {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, LedgerEntry>(
        "SELECT version, name, checksum, applied_at
         FROM _schema_migrations
         ORDER BY version",
    )
    .fetch_all(pool)
    .await
}

async fn ledger_by_version(pool: &PgPool) -> Result<BTreeMap<i64, LedgerEntry>, sqlx::Error> {
    Ok(applied(pool)
        .await?
        .into_iter()
        .map(|entry| (entry.version, entry))
        .collect())
}

#[derive(Debug, PartialEq, Eq)]
enum Decision {
    Apply,
    Skip(SkipReason),
}

fn decide(
    migration: &Migration,
    recorded: Option<&LedgerEntry>,
    options: &MigrationOptions,
) -> Result<Decision, MigrationError> {
    // A recorded migration is checked against the ledger even when it is
    // optional and not enabled for this run.
    let Some(entry) = recorded else {
        if !migration.is_selected(options.include_optional) {
            return Ok(Decision::Skip(SkipReason::OptionalDisabled));
        }
        return Ok(Decision::Apply);
    };
    if options.reapply {
        return Ok(Decision::Apply);
    }
    let expected = migration.checksum();
    if entry.checksum != expected {
        return Err(MigrationError::ChecksumMismatch {
            version: migration.version,
            name: migration.name.to_string(),
            recorded: entry.checksum.clone(),
            expected,
        });
    }
    Ok(Decision::Skip(SkipReason::AlreadyApplied))
}

/// The migrations [`run`] would execute with the same options, in order.
pub async fn plan(
    pool: &PgPool,
    set: &MigrationSet,
    options: &MigrationOptions,
) -> Result<Vec<Migration>, MigrationError> {
    let recorded = ledger_by_version(pool).await?;
    let mut pending = Vec::new();
    for migration in set.iter() {
        if decide(migration, recorded.get(&migration.version), options)? == Decision::Apply {
            pending.push(*migration);
        }
    }
    Ok(pending)
}

/// Apply every pending migration of `set` in ascending version order.
pub async fn run(
    pool: &PgPool,
    set: &MigrationSet,
    options: &MigrationOptions,
) -> Result<MigrationReport, MigrationError> {
    ensure_ledger(pool).await?;
    let recorded = ledger_by_version(pool).await?;
    let mut report = MigrationReport::default();

    for migration in set.iter() {
        match decide(migration, recorded.get(&migration.version), options)? {
            Decision::Skip(reason) => {
                tracing::info!(
                    version = migration.version,
                    name = migration.name,
                    ?reason,
                    "Skipping migration"
                );
                report.skipped.push(SkippedMigration {
                    version: migration.version,
                    name: migration.name.to_string(),
                    reason,
                });
            }
            Decision::Apply => {
                let applied = apply_one(pool, migration).await?;
                tracing::info!(
                    version = applied.version,
                    name = %applied.name,
                    elapsed_ms = applied.elapsed_ms,
                    "Applied migration"
                );
                report.applied.push(applied);
            }
        }
    }

    Ok(report)
}

async fn apply_one(pool: &PgPool, migration: &Migration) -> Result<AppliedMigration, MigrationError> {
    let started = Instant::now();
    let checksum = migration.checksum();
    let failed = |source: sqlx::Error| MigrationError::Failed {
        version: migration.version,
        name: migration.name.to_string(),
        source,
    };

    let mut tx = pool.begin().await?;
    sqlx::raw_sql(migration.sql)
        .execute(&mut *tx)
        .await
        .map_err(failed)?;
    sqlx::query(
        "INSERT INTO _schema_migrations (version, name, checksum)
         VALUES ($1, $2, $3)
         ON CONFLICT (version) DO UPDATE SET
            name = EXCLUDED.name,
            checksum = EXCLUDED.checksum,
            applied_at = NOW()",
    )
    .bind(migration.version)
    .bind(migration.name)
    .bind(&checksum)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(AppliedMigration {
        version: migration.version,
        name: migration.name.to_string(),
        checksum,
        elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

/// Where a migration stands relative to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationState {
    Applied,
    Pending,
    /// Optional and not enabled; never blocks later migrations.
    OptionalDisabled,
    /// Recorded with a checksum that differs from the current file.
    Drifted,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub name: String,
    pub kind: MigrationKind,
    pub state: MigrationState,
    pub checksum: String,
    pub applied_at: Option<Timestamp>,
}

fn classify(
    migration: &Migration,
    recorded: Option<&LedgerEntry>,
    include_optional: bool,
) -> MigrationState {
    match recorded {
        Some(entry) if entry.checksum == migration.checksum() => MigrationState::Applied,
        Some(_) => MigrationState::Drifted,
        None if !migration.is_selected(include_optional) => MigrationState::OptionalDisabled,
        None => MigrationState::Pending,
    }
}

/// Compare `set` against the ledger without changing anything.
pub async fn status(
    pool: &PgPool,
    set: &MigrationSet,
    include_optional: bool,
) -> Result<Vec<MigrationStatus>, sqlx::Error> {
    let recorded = ledger_by_version(pool).await?;
    Ok(set
        .iter()
        .map(|migration| {
            let entry = recorded.get(&migration.version);
            MigrationStatus {
                version: migration.version,
                name: migration.name.to_string(),
                kind: migration.kind,
                state: classify(migration, entry, include_optional),
                checksum: migration.checksum(),
                applied_at: entry.map(|e| e.applied_at),
            }
        })
        .collect())
}
