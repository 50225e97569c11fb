//! Progress log model. Rows are append-only.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use goalbot_core::types::{DbId, Timestamp};

/// A row from the `progress_log` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProgressEntry {
    pub id: DbId,
    pub goal_id: DbId,
    pub user_id: DbId,
    pub value: f64,
    pub note: Option<String>,
    pub logged_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgressEntry {
    pub goal_id: DbId,
    pub user_id: DbId,
    pub value: f64,
    pub note: Option<String>,
}
