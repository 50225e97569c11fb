//! Repository for the append-only `progress_log` table.

use sqlx::PgPool;

use goalbot_core::types::DbId;

use crate::models::progress::{CreateProgressEntry, ProgressEntry};

const COLUMNS: &str = "id, goal_id, user_id, value, note, logged_at";

/// Default page size for history queries.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

/// Inserts and reads progress history. There is no update or delete:
/// rows only disappear through cascade from their goal or user.
pub struct ProgressLogRepo;

impl ProgressLogRepo {
    /// Append an entry, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProgressEntry,
    ) -> Result<ProgressEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO progress_log (goal_id, user_id, value, note)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProgressEntry>(&query)
            .bind(input.goal_id)
            .bind(input.user_id)
            .bind(input.value)
            .bind(&input.note)
            .fetch_one(pool)
            .await
    }

    /// A user's history, newest first, optionally for a single goal.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        goal_id: Option<DbId>,
        limit: i64,
    ) -> Result<Vec<ProgressEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM progress_log
             WHERE user_id = $1
               AND ($2::UUID IS NULL OR goal_id = $2)
             ORDER BY logged_at DESC, id
             LIMIT $3"
        );
        sqlx::query_as::<_, ProgressEntry>(&query)
            .bind(user_id)
            .bind(goal_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
