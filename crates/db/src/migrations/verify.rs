//! Post-migration smoke test: are the expected tables present?
//!
//! This only checks table names in the `public` schema against the
//! expected list. It says nothing about columns or constraints; use
//! [`super::SchemaSnapshot`] for that.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::PgPool;

use super::runner::LEDGER_TABLE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub expected: Vec<String>,
    /// Expected tables that exist.
    pub present: Vec<String>,
    /// Expected tables that do not exist.
    pub missing: Vec<String>,
}

impl VerificationReport {
    /// Compare the expected names against the tables the catalog reported.
    pub fn compare<S: AsRef<str>>(expected: &[S], found: &[String]) -> Self {
        let found: BTreeSet<&str> = found.iter().map(String::as_str).collect();
        let (present, missing): (Vec<String>, Vec<String>) = expected
            .iter()
            .map(|name| name.as_ref().to_string())
            .partition(|name| found.contains(name.as_str()));
        Self {
            expected: expected.iter().map(|n| n.as_ref().to_string()).collect(),
            present,
            missing,
        }
    }

    /// Success means every expected table was found.
    pub fn is_complete(&self) -> bool {
        self.present.len() == self.expected.len()
    }
}

/// Base tables in the `public` schema, excluding the migration ledger.
pub async fn list_public_tables(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT table_name::TEXT
         FROM information_schema.tables
         WHERE table_schema = 'public'
           AND table_type = 'BASE TABLE'
           AND table_name <> $1
         ORDER BY table_name",
    )
    .bind(LEDGER_TABLE)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Query the catalog and report which of `expected` exist.
pub async fn verify_tables(
    pool: &PgPool,
    expected: &[&str],
) -> Result<VerificationReport, sqlx::Error> {
    let found = list_public_tables(pool).await?;
    let report = VerificationReport::compare(expected, &found);
    if report.is_complete() {
        tracing::info!(
            found = report.present.len(),
            expected = report.expected.len(),
            "Schema verification passed"
        );
    } else {
        tracing::warn!(
            found = report.present.len(),
            expected = report.expected.len(),
            missing = ?report.missing,
            "Schema verification failed"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn all_present_is_complete() {
        let report = VerificationReport::compare(
            &["users", "goals"],
            &found(&["goals", "users", "unrelated"]),
        );
        assert!(report.is_complete());
        assert!(report.missing.is_empty());
        assert_eq!(report.present, vec!["users", "goals"]);
    }

    #[test]
    fn missing_tables_are_reported() {
        let report =
            VerificationReport::compare(&["users", "goals", "settings"], &found(&["users"]));
        assert!(!report.is_complete());
        assert_eq!(report.missing, vec!["goals", "settings"]);
    }

    #[test]
    fn extra_tables_do_not_count() {
        let report = VerificationReport::compare(&["users"], &found(&["users", "sessions"]));
        assert!(report.is_complete());
        assert_eq!(report.present.len(), 1);
    }
}
