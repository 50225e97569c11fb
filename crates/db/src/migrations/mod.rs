//! The ordered, idempotent migration set for the goal-tracking schema.
//!
//! The SQL files under `db/migrations/` are the single source of truth.
//! They are embedded here at compile time; the consolidated "all-in-one"
//! script and the `\i` inclusion script are rendered from the same
//! [`MigrationSet`] by [`bundle`], so neither can drift from the files.
//!
//! Every file is safe to re-run on its own (`IF NOT EXISTS` guards,
//! `CREATE OR REPLACE FUNCTION`, drop-then-create triggers). The ledger
//! kept by [`runner`] adds auditability on top of that, it does not
//! replace it.

use serde::Serialize;

use goalbot_core::hashing::sha256_hex;

use crate::error::MigrationError;

pub mod bundle;
pub mod inspect;
pub mod runner;
pub mod verify;

pub use bundle::{apply_consolidated, render, render_consolidated, render_psql_includes, BundleFormat};
pub use inspect::SchemaSnapshot;
pub use runner::{
    applied, ensure_ledger, plan, run, status, LedgerEntry, MigrationState, MigrationStatus,
    LEDGER_TABLE,
};
pub use verify::{list_public_tables, verify_tables, VerificationReport};

/// Whether a migration belongs to the default path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationKind {
    /// Always applied.
    Required,
    /// Applied only when explicitly enabled; skipping it never blocks
    /// later migrations.
    Optional,
}

/// One numbered migration file.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    /// File stem without the numeric prefix, e.g. `create_users_table`.
    pub name: &'static str,
    pub kind: MigrationKind,
    /// Tables this migration creates, used by table verification.
    pub tables: &'static [&'static str],
    pub sql: &'static str,
}

impl Migration {
    /// File name under `db/migrations/`, e.g. `001_create_users_table.sql`.
    pub fn file_name(&self) -> String {
        format!("{:03}_{}.sql", self.version, self.name)
    }

    /// SHA-256 of the SQL text, as recorded in the ledger.
    pub fn checksum(&self) -> String {
        sha256_hex(self.sql.as_bytes())
    }

    pub fn is_optional(&self) -> bool {
        self.kind == MigrationKind::Optional
    }

    /// Whether this migration runs given the optional-migration toggle.
    pub fn is_selected(&self, include_optional: bool) -> bool {
        include_optional || !self.is_optional()
    }
}

const EMBEDDED: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users_table",
        kind: MigrationKind::Required,
        tables: &["users"],
        sql: include_str!("../../../../db/migrations/001_create_users_table.sql"),
    },
    Migration {
        version: 2,
        name: "create_goals_table",
        kind: MigrationKind::Required,
        tables: &["goals"],
        sql: include_str!("../../../../db/migrations/002_create_goals_table.sql"),
    },
    Migration {
        version: 3,
        name: "create_progress_log_table",
        kind: MigrationKind::Required,
        tables: &["progress_log"],
        sql: include_str!("../../../../db/migrations/003_create_progress_log_table.sql"),
    },
    Migration {
        version: 4,
        name: "create_daily_checkins_table",
        kind: MigrationKind::Required,
        tables: &["daily_checkins"],
        sql: include_str!("../../../../db/migrations/004_create_daily_checkins_table.sql"),
    },
    Migration {
        version: 5,
        name: "create_settings_table",
        kind: MigrationKind::Required,
        tables: &["settings"],
        sql: include_str!("../../../../db/migrations/005_create_settings_table.sql"),
    },
    Migration {
        version: 6,
        name: "create_sessions_table",
        kind: MigrationKind::Optional,
        tables: &["sessions"],
        sql: include_str!("../../../../db/migrations/006_create_sessions_table.sql"),
    },
    Migration {
        version: 7,
        name: "create_triggers",
        kind: MigrationKind::Required,
        tables: &[],
        sql: include_str!("../../../../db/migrations/007_create_triggers.sql"),
    },
];

/// Tables whose `updated_at` is maintained by the shared trigger function.
pub const TOUCHED_TABLES: &[&str] = &["users", "goals", "settings"];

/// An ordered list of migrations with strictly increasing versions.
#[derive(Debug, Clone)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Build a set, rejecting duplicate or decreasing versions.
    pub fn new(migrations: Vec<Migration>) -> Result<Self, MigrationError> {
        for pair in migrations.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.version <= prev.version {
                return Err(MigrationError::InvalidOrder {
                    version: next.version,
                    name: next.name.to_string(),
                    previous: prev.version,
                });
            }
        }
        Ok(Self { migrations })
    }

    /// The migrations shipped in `db/migrations/`.
    pub fn embedded() -> Self {
        Self {
            migrations: EMBEDDED.to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Migrations that run given the optional-migration toggle, in order.
    pub fn selected(&self, include_optional: bool) -> impl Iterator<Item = &Migration> {
        self.migrations
            .iter()
            .filter(move |m| m.is_selected(include_optional))
    }

    pub fn get(&self, version: i64) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.version == version)
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Table names the selected migrations create, in migration order.
    pub fn expected_tables(&self, include_optional: bool) -> Vec<&'static str> {
        self.selected(include_optional)
            .flat_map(|m| m.tables.iter().copied())
            .collect()
    }
}

/// Knobs for [`runner::run`] and [`runner::plan`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationOptions {
    /// Apply optional migrations (the sessions table).
    pub include_optional: bool,
    /// Re-execute migrations the ledger already records. Safe because every
    /// file is idempotent; also accepts files whose checksum changed.
    pub reapply: bool,
}

/// Why a migration was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    OptionalDisabled,
    AlreadyApplied,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub checksum: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedMigration {
    pub version: i64,
    pub name: String,
    pub reason: SkipReason,
}

/// Outcome of one [`runner::run`] call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub applied: Vec<AppliedMigration>,
    pub skipped: Vec<SkippedMigration>,
}

impl MigrationReport {
    pub fn applied_versions(&self) -> Vec<i64> {
        self.applied.iter().map(|m| m.version).collect()
    }

    pub fn skipped_versions(&self, reason: SkipReason) -> Vec<i64> {
        self.skipped
            .iter()
            .filter(|m| m.reason == reason)
            .map(|m| m.version)
            .collect()
    }
}
