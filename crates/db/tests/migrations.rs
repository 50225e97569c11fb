//! Integration tests for the migration runner.
//!
//! Each test starts from an empty database and drives the runner
//! directly, so the ledger behaviour is what is under test:
//! - Ordering and the optional sessions migration
//! - Re-running and re-applying converge to the same schema
//! - The consolidated script produces the same schema as the files
//! - Checksum drift and mid-batch failures

use assert_matches::assert_matches;
use sqlx::PgPool;

use goalbot_db::error::MigrationError;
use goalbot_db::migrations::{
    self, Migration, MigrationKind, MigrationOptions, MigrationSet, MigrationState,
    SchemaSnapshot, SkipReason, TOUCHED_TABLES,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const REQUIRED: [i64; 6] = [1, 2, 3, 4, 5, 7];

fn with_sessions() -> MigrationOptions {
    MigrationOptions {
        include_optional: true,
        ..Default::default()
    }
}

fn embedded(version: i64) -> Migration {
    *MigrationSet::embedded()
        .get(version)
        .unwrap_or_else(|| panic!("no embedded migration {version}"))
}

/// Drop every object the migrations and the ledger create.
async fn drop_schema_objects(pool: &PgPool) {
    sqlx::raw_sql(
        "DROP TABLE IF EXISTS sessions, settings, daily_checkins, progress_log, goals, users,
                              _schema_migrations CASCADE;
         DROP FUNCTION IF EXISTS update_updated_at_column();",
    )
    .execute(pool)
    .await
    .unwrap();
}

async fn table_exists(pool: &PgPool, table: &str) -> bool {
    let (exists,): (bool,) = sqlx::query_as("SELECT to_regclass($1) IS NOT NULL")
        .bind(format!("public.{table}"))
        .fetch_one(pool)
        .await
        .unwrap();
    exists
}

async fn ledger_versions(pool: &PgPool) -> Vec<i64> {
    migrations::applied(pool)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.version)
        .collect()
}

fn assert_same_schema(expected: &SchemaSnapshot, actual: &SchemaSnapshot) {
    let diff = expected.diff(actual);
    assert!(diff.is_empty(), "schemas differ:\n{}", diff.join("\n"));
}

// ---------------------------------------------------------------------------
// Fresh database
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_fresh_database_applies_required_migrations_in_order(pool: PgPool) {
    let report = goalbot_db::run_migrations(&pool).await.unwrap();

    assert_eq!(report.applied_versions(), REQUIRED);
    assert_eq!(report.skipped_versions(SkipReason::OptionalDisabled), vec![6]);
    assert_eq!(ledger_versions(&pool).await, REQUIRED);

    let tables = migrations::list_public_tables(&pool).await.unwrap();
    assert_eq!(
        tables,
        vec!["daily_checkins", "goals", "progress_log", "settings", "users"]
    );
    assert!(!table_exists(&pool, "sessions").await);
}

#[sqlx::test(migrations = false)]
async fn test_verification_passes_after_migrating(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &with_sessions()).await.unwrap();

    let report = migrations::verify_tables(&pool, &set.expected_tables(true))
        .await
        .unwrap();
    assert!(report.is_complete(), "missing: {:?}", report.missing);
    assert_eq!(report.present.len(), 6);
}

#[sqlx::test(migrations = false)]
async fn test_verification_reports_missing_tables(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &MigrationOptions::default())
        .await
        .unwrap();

    let report = migrations::verify_tables(&pool, &set.expected_tables(true))
        .await
        .unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.missing, vec!["sessions"]);
}

// ---------------------------------------------------------------------------
// Re-running
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_second_run_applies_nothing(pool: PgPool) {
    goalbot_db::run_migrations(&pool).await.unwrap();
    let before = SchemaSnapshot::capture(&pool).await.unwrap();

    let report = goalbot_db::run_migrations(&pool).await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.skipped_versions(SkipReason::AlreadyApplied), REQUIRED);

    let after = SchemaSnapshot::capture(&pool).await.unwrap();
    assert_same_schema(&before, &after);
}

#[sqlx::test(migrations = false)]
async fn test_reapplying_every_file_converges_and_keeps_data(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &with_sessions()).await.unwrap();
    let before = SchemaSnapshot::capture(&pool).await.unwrap();

    sqlx::query("INSERT INTO users (telegram_user_id) VALUES (42)")
        .execute(&pool)
        .await
        .unwrap();

    let options = MigrationOptions {
        include_optional: true,
        reapply: true,
    };
    let report = migrations::run(&pool, &set, &options).await.unwrap();
    assert_eq!(report.applied_versions(), vec![1, 2, 3, 4, 5, 6, 7]);

    let after = SchemaSnapshot::capture(&pool).await.unwrap();
    assert_same_schema(&before, &after);

    let (users,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(users, 1);
}

#[sqlx::test(migrations = false)]
async fn test_enabling_sessions_later_applies_only_sessions(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &MigrationOptions::default())
        .await
        .unwrap();

    let report = migrations::run(&pool, &set, &with_sessions()).await.unwrap();
    assert_eq!(report.applied_versions(), vec![6]);
    assert!(table_exists(&pool, "sessions").await);
    assert_eq!(ledger_versions(&pool).await, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[sqlx::test(migrations = false)]
async fn test_each_touched_table_has_exactly_one_trigger(pool: PgPool) {
    let set = MigrationSet::embedded();
    let options = MigrationOptions {
        include_optional: true,
        reapply: true,
    };
    migrations::run(&pool, &set, &options).await.unwrap();
    migrations::run(&pool, &set, &options).await.unwrap();

    let snapshot = SchemaSnapshot::capture(&pool).await.unwrap();
    for table in TOUCHED_TABLES {
        assert_eq!(snapshot.trigger_count(table), 1, "{table}");
    }
    for table in ["progress_log", "daily_checkins", "sessions"] {
        assert_eq!(snapshot.trigger_count(table), 0, "{table}");
    }
    assert_eq!(snapshot.functions.len(), 1);
}

// ---------------------------------------------------------------------------
// Consolidated script
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_consolidated_script_matches_per_file_schema(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &with_sessions()).await.unwrap();
    let per_file = SchemaSnapshot::capture(&pool).await.unwrap();

    drop_schema_objects(&pool).await;
    assert!(migrations::list_public_tables(&pool).await.unwrap().is_empty());

    migrations::apply_consolidated(&pool, &set, true).await.unwrap();
    migrations::apply_consolidated(&pool, &set, true).await.unwrap();
    let consolidated = SchemaSnapshot::capture(&pool).await.unwrap();

    assert_same_schema(&per_file, &consolidated);
}

#[sqlx::test(migrations = false)]
async fn test_consolidated_script_skips_sessions_by_default(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::apply_consolidated(&pool, &set, false).await.unwrap();

    assert!(!table_exists(&pool, "sessions").await);
    let report = migrations::verify_tables(&pool, &set.expected_tables(false))
        .await
        .unwrap();
    assert!(report.is_complete());
}

// ---------------------------------------------------------------------------
// Ledger and failures
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn test_status_and_plan_track_the_ledger(pool: PgPool) {
    let set = MigrationSet::embedded();
    let default = MigrationOptions::default();

    assert!(migrations::applied(&pool).await.unwrap().is_empty());
    let before = migrations::status(&pool, &set, false).await.unwrap();
    for s in &before {
        let expected = if s.version == 6 {
            MigrationState::OptionalDisabled
        } else {
            MigrationState::Pending
        };
        assert_eq!(s.state, expected, "version {}", s.version);
        assert!(s.applied_at.is_none());
    }
    let pending: Vec<_> = migrations::plan(&pool, &set, &default)
        .await
        .unwrap()
        .iter()
        .map(|m| m.version)
        .collect();
    assert_eq!(pending, REQUIRED);

    migrations::run(&pool, &set, &default).await.unwrap();

    assert!(migrations::plan(&pool, &set, &default).await.unwrap().is_empty());
    let after = migrations::status(&pool, &set, false).await.unwrap();
    assert!(after
        .iter()
        .filter(|s| s.version != 6)
        .all(|s| s.state == MigrationState::Applied && s.applied_at.is_some()));
}

#[sqlx::test(migrations = false)]
async fn test_changed_checksum_is_rejected_until_reapplied(pool: PgPool) {
    let set = MigrationSet::embedded();
    goalbot_db::run_migrations(&pool).await.unwrap();

    sqlx::query("UPDATE _schema_migrations SET checksum = 'tampered' WHERE version = 2")
        .execute(&pool)
        .await
        .unwrap();

    let err = goalbot_db::run_migrations(&pool).await.unwrap_err();
    assert_matches!(err, MigrationError::ChecksumMismatch { version: 2, .. });

    let status = migrations::status(&pool, &set, false).await.unwrap();
    let goals = status.iter().find(|s| s.version == 2).unwrap();
    assert_eq!(goals.state, MigrationState::Drifted);

    let options = MigrationOptions {
        reapply: true,
        ..Default::default()
    };
    migrations::run(&pool, &set, &options).await.unwrap();
    let status = migrations::status(&pool, &set, false).await.unwrap();
    assert!(status.iter().all(|s| s.state != MigrationState::Drifted));
}

#[sqlx::test(migrations = false)]
async fn test_applied_sessions_migration_is_checked_without_the_toggle(pool: PgPool) {
    let set = MigrationSet::embedded();
    migrations::run(&pool, &set, &with_sessions()).await.unwrap();

    let report = goalbot_db::run_migrations(&pool).await.unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(
        report.skipped_versions(SkipReason::AlreadyApplied),
        vec![1, 2, 3, 4, 5, 6, 7]
    );
    assert!(report.skipped_versions(SkipReason::OptionalDisabled).is_empty());

    sqlx::query("UPDATE _schema_migrations SET checksum = 'tampered' WHERE version = 6")
        .execute(&pool)
        .await
        .unwrap();

    let err = goalbot_db::run_migrations(&pool).await.unwrap_err();
    assert_matches!(err, MigrationError::ChecksumMismatch { version: 6, .. });
    let err = migrations::plan(&pool, &set, &MigrationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MigrationError::ChecksumMismatch { version: 6, .. });

    let status = migrations::status(&pool, &set, false).await.unwrap();
    let sessions = status.iter().find(|s| s.version == 6).unwrap();
    assert_eq!(sessions.state, MigrationState::Drifted);
}

#[sqlx::test(migrations = false)]
async fn test_failing_migration_aborts_and_keeps_earlier_ones(pool: PgPool) {
    let broken = Migration {
        version: 2,
        name: "broken",
        kind: MigrationKind::Required,
        tables: &["half_done"],
        sql: "CREATE TABLE half_done (id UUID PRIMARY KEY);
              SELECT * FROM table_that_does_not_exist;",
    };
    let set = MigrationSet::new(vec![embedded(1), broken, embedded(3)]).unwrap();

    let err = migrations::run(&pool, &set, &MigrationOptions::default())
        .await
        .unwrap_err();
    assert_matches!(err, MigrationError::Failed { version: 2, .. });

    // The failed file rolled back as a unit; nothing after it ran.
    assert!(table_exists(&pool, "users").await);
    assert!(!table_exists(&pool, "half_done").await);
    assert!(!table_exists(&pool, "progress_log").await);
    assert_eq!(ledger_versions(&pool).await, vec![1]);

    let pending: Vec<_> = migrations::plan(&pool, &set, &MigrationOptions::default())
        .await
        .unwrap()
        .iter()
        .map(|m| m.version)
        .collect();
    assert_eq!(pending, vec![2, 3]);
}
