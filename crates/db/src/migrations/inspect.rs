//! Catalog snapshot of the `public` schema.
//!
//! Two snapshots compare equal when the tables, columns, constraints,
//! indexes, triggers, and functions are the same, which is how
//! re-application is shown to converge.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::PgPool;

use super::runner::LEDGER_TABLE;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub tables: BTreeSet<String>,
    /// `table.column type null=YES|NO default=...`
    pub columns: BTreeSet<String>,
    /// `table.constraint kind definition`
    pub constraints: BTreeSet<String>,
    /// `table.index definition`
    pub indexes: BTreeSet<String>,
    /// `table.trigger timing event action`
    pub triggers: BTreeSet<String>,
    pub functions: BTreeSet<String>,
}

impl SchemaSnapshot {
    /// Read the current state of the `public` schema from the catalog.
    pub async fn capture(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name::TEXT
             FROM information_schema.tables
             WHERE table_schema = 'public'
               AND table_type = 'BASE TABLE'
               AND table_name <> $1",
        )
        .bind(LEDGER_TABLE)
        .fetch_all(pool)
        .await?;

        let columns: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT table_name::TEXT, column_name::TEXT, data_type::TEXT,
                    is_nullable::TEXT, COALESCE(column_default::TEXT, '')
             FROM information_schema.columns
             WHERE table_schema = 'public'
               AND table_name <> $1",
        )
        .bind(LEDGER_TABLE)
        .fetch_all(pool)
        .await?;

        let constraints: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT c.conrelid::regclass::TEXT, c.conname::TEXT, c.contype::TEXT,
                    pg_get_constraintdef(c.oid)
             FROM pg_constraint c
             JOIN pg_namespace n ON n.oid = c.connamespace
             WHERE n.nspname = 'public'
               AND c.conrelid <> 0
               AND c.conrelid::regclass::TEXT <> $1",
        )
        .bind(LEDGER_TABLE)
        .fetch_all(pool)
        .await?;

        let indexes: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT tablename::TEXT, indexname::TEXT, indexdef
             FROM pg_indexes
             WHERE schemaname = 'public'
               AND tablename <> $1",
        )
        .bind(LEDGER_TABLE)
        .fetch_all(pool)
        .await?;

        let triggers: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT event_object_table::TEXT, trigger_name::TEXT, action_timing::TEXT,
                    event_manipulation::TEXT, action_statement::TEXT
             FROM information_schema.triggers
             WHERE trigger_schema = 'public'",
        )
        .fetch_all(pool)
        .await?;

        let functions: Vec<(String,)> = sqlx::query_as(
            "SELECT p.proname::TEXT || '(' || pg_get_function_identity_arguments(p.oid) || ')'
             FROM pg_proc p
             JOIN pg_namespace n ON n.oid = p.pronamespace
             WHERE n.nspname = 'public'",
        )
        .fetch_all(pool)
        .await?;

        Ok(Self {
            tables: tables.into_iter().map(|(t,)| t).collect(),
            columns: columns
                .into_iter()
                .map(|(t, c, ty, null, default)| format!("{t}.{c} {ty} null={null} default={default}"))
                .collect(),
            constraints: constraints
                .into_iter()
                .map(|(t, name, kind, def)| format!("{t}.{name} {kind} {def}"))
                .collect(),
            indexes: indexes
                .into_iter()
                .map(|(t, name, def)| format!("{t}.{name} {def}"))
                .collect(),
            triggers: triggers
                .into_iter()
                .map(|(t, name, timing, event, action)| {
                    format!("{t}.{name} {timing} {event} {action}")
                })
                .collect(),
            functions: functions.into_iter().map(|(f,)| f).collect(),
        })
    }

    /// Human-readable differences, `+` for entries only in `other`,
    /// `-` for entries only in `self`. Empty when equal.
    pub fn diff(&self, other: &Self) -> Vec<String> {
        let sections = [
            ("table", &self.tables, &other.tables),
            ("column", &self.columns, &other.columns),
            ("constraint", &self.constraints, &other.constraints),
            ("index", &self.indexes, &other.indexes),
            ("trigger", &self.triggers, &other.triggers),
            ("function", &self.functions, &other.functions),
        ];
        let mut out = Vec::new();
        for (label, mine, theirs) in sections {
            out.extend(mine.difference(theirs).map(|e| format!("- {label} {e}")));
            out.extend(theirs.difference(mine).map(|e| format!("+ {label} {e}")));
        }
        out
    }

    /// Number of triggers attached to `table`.
    pub fn trigger_count(&self, table: &str) -> usize {
        let prefix = format!("{table}.");
        self.triggers.iter().filter(|t| t.starts_with(&prefix)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tables: &[&str], triggers: &[&str]) -> SchemaSnapshot {
        SchemaSnapshot {
            tables: tables.iter().map(|t| t.to_string()).collect(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn equal_snapshots_have_no_diff() {
        let a = snapshot(&["users"], &["users.update_users_updated_at BEFORE UPDATE x"]);
        assert!(a.diff(&a.clone()).is_empty());
    }

    #[test]
    fn diff_marks_both_directions() {
        let a = snapshot(&["users", "goals"], &[]);
        let b = snapshot(&["users", "settings"], &[]);
        let diff = a.diff(&b);
        assert_eq!(diff, vec!["- table goals", "+ table settings"]);
    }

    #[test]
    fn trigger_count_matches_table_prefix_only() {
        let s = snapshot(
            &[],
            &[
                "goals.update_goals_updated_at BEFORE UPDATE x",
                "goals_archive.something BEFORE UPDATE x",
            ],
        );
        assert_eq!(s.trigger_count("goals"), 1);
    }
}
