//! Repository for the optional `sessions` table.
//!
//! Only usable when the sessions migration has been applied; every query
//! fails with an undefined-table error otherwise.

use sqlx::PgPool;

use goalbot_core::types::DbId;

use crate::models::session::{Session, SessionStats};

const COLUMNS: &str = "id, user_id, started_at, last_activity_at, ended_at, command_count, created_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Open a new session for the user.
    pub async fn start(pool: &PgPool, user_id: DbId) -> Result<Session, sqlx::Error> {
        let query = format!("INSERT INTO sessions (user_id) VALUES ($1) RETURNING {COLUMNS}");
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// The user's most recent session that has not ended.
    pub async fn find_open_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE user_id = $1 AND ended_at IS NULL
             ORDER BY started_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Count one command and bump the activity timestamp of an open session.
    ///
    /// Returns `None` if the session does not exist or already ended.
    pub async fn record_command(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET
                command_count = command_count + 1,
                last_activity_at = NOW()
             WHERE id = $1 AND ended_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Close a session. Returns `true` if it was open.
    pub async fn end(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET ended_at = NOW() WHERE id = $1 AND ended_at IS NULL")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Usage totals for a user across all sessions.
    pub async fn stats_for_user(pool: &PgPool, user_id: DbId) -> Result<SessionStats, sqlx::Error> {
        sqlx::query_as::<_, SessionStats>(
            "SELECT COUNT(*) AS session_count,
                    COALESCE(SUM(command_count), 0)::BIGINT AS total_commands,
                    MAX(last_activity_at) AS last_activity_at
             FROM sessions
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
