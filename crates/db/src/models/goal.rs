//! Goal entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use goalbot_core::types::{Date, DbId, Timestamp};

/// A row from the `goals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Goal {
    pub id: DbId,
    pub user_id: DbId,
    pub category: String,
    pub name: String,
    pub target_value: f64,
    pub current_value: f64,
    /// Starting point for goals measured downwards (e.g. weight).
    pub initial_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<Date>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a goal. `current_value` defaults to `0`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGoal {
    pub user_id: DbId,
    pub category: String,
    pub name: String,
    pub target_value: f64,
    pub current_value: Option<f64>,
    pub initial_value: Option<f64>,
    pub unit: Option<String>,
    pub deadline: Option<Date>,
}
