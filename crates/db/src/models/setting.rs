//! Per-user key/value setting model.

use serde::Serialize;
use sqlx::FromRow;

use goalbot_core::types::{DbId, Timestamp};

/// A row from the `settings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Setting {
    pub id: DbId,
    pub user_id: DbId,
    pub key: String,
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
