//! Alternate application artifacts rendered from a [`MigrationSet`].
//!
//! - The consolidated script concatenates every selected file verbatim, for
//!   pasting into a SQL console that has no file-inclusion directive.
//! - The psql script emits one `\i` directive per file in version order,
//!   each wrapped in its own transaction.
//!
//! Both are generated, never stored, so they always match the files.

use serde::Serialize;
use sqlx::PgPool;

use super::MigrationSet;

/// Which artifact [`render`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleFormat {
    /// All-in-one SQL script.
    #[default]
    Sql,
    /// psql script of `\i` file-inclusion directives.
    Psql,
}

const RULE: &str = "-- ============================================================";

/// Render the artifact for `format`.
///
/// `migrations_dir` is only used by [`BundleFormat::Psql`]; it is the path
/// the `\i` directives resolve against, relative to where psql runs.
pub fn render(
    set: &MigrationSet,
    format: BundleFormat,
    include_optional: bool,
    migrations_dir: &str,
) -> String {
    match format {
        BundleFormat::Sql => render_consolidated(set, include_optional),
        BundleFormat::Psql => render_psql_includes(set, include_optional, migrations_dir),
    }
}

/// Concatenate the selected migrations into one re-runnable script.
///
/// Each file's text is copied byte-for-byte under a banner naming it.
pub fn render_consolidated(set: &MigrationSet, include_optional: bool) -> String {
    let mut out = String::new();
    out.push_str("-- Consolidated schema script, generated from db/migrations.\n");
    out.push_str("-- Every statement is guarded and safe to run more than once.\n");
    if !include_optional {
        out.push_str("-- Optional migrations are not included.\n");
    }

    for migration in set.selected(include_optional) {
        out.push_str(&format!("\n{RULE}\n-- {}\n{RULE}\n\n", migration.file_name()));
        out.push_str(migration.sql);
        if !migration.sql.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// One `\i` directive per selected migration, each in its own transaction.
pub fn render_psql_includes(
    set: &MigrationSet,
    include_optional: bool,
    migrations_dir: &str,
) -> String {
    let dir = migrations_dir.trim_end_matches('/');
    let mut out = String::new();
    out.push_str("-- Run with: psql \"$DATABASE_URL\" -f <this file>\n");
    out.push_str("\\set ON_ERROR_STOP on\n");

    for migration in set.selected(include_optional) {
        out.push_str(&format!(
            "\nBEGIN;\n\\i {dir}/{}\nCOMMIT;\n",
            migration.file_name()
        ));
    }
    out
}

/// Execute the consolidated script in a single transaction.
///
/// Bypasses the ledger: this is the console path, applied exactly as an
/// operator pasting the script would.
pub async fn apply_consolidated(
    pool: &PgPool,
    set: &MigrationSet,
    include_optional: bool,
) -> Result<(), sqlx::Error> {
    let script = render_consolidated(set, include_optional);
    let mut tx = pool.begin().await?;
    sqlx::raw_sql(&script).execute(&mut *tx).await?;
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consolidated_contains_each_file_verbatim_in_order() {
        let set = MigrationSet::embedded();
        let script = render_consolidated(&set, true);

        let mut cursor = 0;
        for migration in set.iter() {
            let offset = script[cursor..]
                .find(migration.sql)
                .unwrap_or_else(|| panic!("{} missing or out of order", migration.file_name()));
            cursor += offset + migration.sql.len();
        }
    }

    #[test]
    fn consolidated_omits_optional_by_default() {
        let set = MigrationSet::embedded();
        let script = render_consolidated(&set, false);
        assert!(!script.contains("006_create_sessions_table.sql"));
        assert!(!script.contains("CREATE TABLE IF NOT EXISTS sessions"));
        assert!(script.contains("007_create_triggers.sql"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let set = MigrationSet::embedded();
        assert_eq!(render_consolidated(&set, false), render_consolidated(&set, false));
    }

    #[test]
    fn psql_script_includes_files_in_numeric_order() {
        let set = MigrationSet::embedded();
        let script = render_psql_includes(&set, false, "db/migrations/");
        let includes: Vec<_> = script
            .lines()
            .filter_map(|line| line.strip_prefix("\\i "))
            .collect();
        assert_eq!(
            includes,
            vec![
                "db/migrations/001_create_users_table.sql",
                "db/migrations/002_create_goals_table.sql",
                "db/migrations/003_create_progress_log_table.sql",
                "db/migrations/004_create_daily_checkins_table.sql",
                "db/migrations/005_create_settings_table.sql",
                "db/migrations/007_create_triggers.sql",
            ]
        );
        assert_eq!(script.matches("BEGIN;").count(), includes.len());
        assert_eq!(script.matches("COMMIT;").count(), includes.len());
    }

    #[test]
    fn render_dispatches_on_format() {
        let set = MigrationSet::embedded();
        assert_eq!(
            render(&set, BundleFormat::Sql, true, "db/migrations"),
            render_consolidated(&set, true)
        );
        assert!(render(&set, BundleFormat::Psql, true, "db/migrations")
            .contains("\\i db/migrations/006_create_sessions_table.sql"));
    }
}
