//! Usage session model. Backed by the optional `sessions` table.

use serde::Serialize;
use sqlx::FromRow;

use goalbot_core::types::{DbId, Timestamp};

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub user_id: DbId,
    pub started_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub command_count: i32,
    pub created_at: Timestamp,
}

/// Aggregate usage for one user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionStats {
    pub session_count: i64,
    pub total_commands: i64,
    pub last_activity_at: Option<Timestamp>,
}
