//! Repository for the `daily_checkins` table.

use sqlx::PgPool;

use goalbot_core::types::{Date, DbId};

use crate::models::checkin::{DailyCheckin, UpsertDailyCheckin};

const COLUMNS: &str = "id, user_id, date, workout, income, new_connections, weight, notes, created_at";

/// Days covered by a weekly report.
pub const WEEK_DAYS: i32 = 7;

pub struct DailyCheckinRepo;

impl DailyCheckinRepo {
    /// Record a day, replacing any earlier check-in for the same
    /// `(user_id, date)`.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertDailyCheckin,
    ) -> Result<DailyCheckin, sqlx::Error> {
        let query = format!(
            "INSERT INTO daily_checkins
                (user_id, date, workout, income, new_connections, weight, notes)
             VALUES ($1, COALESCE($2, CURRENT_DATE), $3, $4, $5, $6, $7)
             ON CONFLICT (user_id, date) DO UPDATE SET
                workout = EXCLUDED.workout,
                income = EXCLUDED.income,
                new_connections = EXCLUDED.new_connections,
                weight = EXCLUDED.weight,
                notes = EXCLUDED.notes
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DailyCheckin>(&query)
            .bind(input.user_id)
            .bind(input.date)
            .bind(input.workout)
            .bind(input.income)
            .bind(input.new_connections)
            .bind(input.weight)
            .bind(&input.notes)
            .fetch_one(pool)
            .await
    }

    /// The check-in for `date`, or for the database's current date if `None`.
    pub async fn find_for_date(
        pool: &PgPool,
        user_id: DbId,
        date: Option<Date>,
    ) -> Result<Option<DailyCheckin>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM daily_checkins
             WHERE user_id = $1 AND date = COALESCE($2, CURRENT_DATE)"
        );
        sqlx::query_as::<_, DailyCheckin>(&query)
            .bind(user_id)
            .bind(date)
            .fetch_optional(pool)
            .await
    }

    /// Check-ins dated on or after `CURRENT_DATE - days`, newest first.
    pub async fn list_recent(
        pool: &PgPool,
        user_id: DbId,
        days: i32,
    ) -> Result<Vec<DailyCheckin>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM daily_checkins
             WHERE user_id = $1 AND date >= CURRENT_DATE - $2::INTEGER
             ORDER BY date DESC"
        );
        sqlx::query_as::<_, DailyCheckin>(&query)
            .bind(user_id)
            .bind(days)
            .fetch_all(pool)
            .await
    }
}
