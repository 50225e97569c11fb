//! Daily check-in model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use goalbot_core::types::{Date, DbId, Timestamp};

/// A row from the `daily_checkins` table. One per user per day.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyCheckin {
    pub id: DbId,
    pub user_id: DbId,
    pub date: Date,
    pub workout: bool,
    pub income: f64,
    pub new_connections: i32,
    pub weight: Option<f64>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for recording a day. Writing the same `(user_id, date)` twice
/// replaces the earlier values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertDailyCheckin {
    pub user_id: DbId,
    /// `None` means the database's current date.
    pub date: Option<Date>,
    pub workout: bool,
    pub income: f64,
    pub new_connections: i32,
    pub weight: Option<f64>,
    pub notes: Option<String>,
}
