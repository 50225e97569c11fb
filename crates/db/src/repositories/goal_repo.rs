//! Repository for the `goals` table.

use sqlx::PgPool;

use goalbot_core::defaults::DEFAULT_GOALS;
use goalbot_core::types::DbId;

use crate::models::goal::{CreateGoal, Goal};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, category, name, target_value, current_value, \
                        initial_value, unit, deadline, created_at, updated_at";

/// Provides CRUD operations for goals.
///
/// Every lookup takes the owning `user_id` as well as the goal id, so one
/// user can never read or change another user's goal.
pub struct GoalRepo;

impl GoalRepo {
    /// Insert a new goal, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateGoal) -> Result<Goal, sqlx::Error> {
        let query = format!(
            "INSERT INTO goals (user_id, category, name, target_value, current_value,
                                initial_value, unit, deadline)
             VALUES ($1, $2, $3, $4, COALESCE($5, 0), $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(input.user_id)
            .bind(&input.category)
            .bind(&input.name)
            .bind(input.target_value)
            .bind(input.current_value)
            .bind(input.initial_value)
            .bind(&input.unit)
            .bind(input.deadline)
            .fetch_one(pool)
            .await
    }

    /// Find one of the user's goals by id.
    pub async fn find_for_user(
        pool: &PgPool,
        user_id: DbId,
        goal_id: DbId,
    ) -> Result<Option<Goal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM goals WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Goal>(&query)
            .bind(goal_id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's goals, optionally restricted to one category.
    ///
    /// Ordered by deadline (open-ended last), then category, then name.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        category: Option<&str>,
    ) -> Result<Vec<Goal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM goals
             WHERE user_id = $1
               AND ($2::TEXT IS NULL OR category = $2)
             ORDER BY deadline ASC NULLS LAST, category ASC, name ASC"
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(user_id)
            .bind(category)
            .fetch_all(pool)
            .await
    }

    /// Set a goal's current value and append the change to `progress_log`,
    /// atomically.
    ///
    /// Returns `None` (and writes nothing) if the goal does not belong to
    /// the user.
    pub async fn update_value(
        pool: &PgPool,
        user_id: DbId,
        goal_id: DbId,
        new_value: f64,
        note: Option<&str>,
    ) -> Result<Option<Goal>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE goals SET current_value = $3
             WHERE id = $1 AND user_id = $2
             RETURNING {COLUMNS}"
        );
        let Some(goal) = sqlx::query_as::<_, Goal>(&query)
            .bind(goal_id)
            .bind(user_id)
            .bind(new_value)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "INSERT INTO progress_log (goal_id, user_id, value, note)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(goal_id)
        .bind(user_id)
        .bind(new_value)
        .bind(note)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(%goal_id, new_value, "Updated goal value");
        Ok(Some(goal))
    }

    /// [`Self::update_value`] addressed by `(category, name)` instead of id.
    pub async fn update_by_name(
        pool: &PgPool,
        user_id: DbId,
        category: &str,
        name: &str,
        new_value: f64,
    ) -> Result<Option<Goal>, sqlx::Error> {
        let goal_id: Option<(DbId,)> = sqlx::query_as(
            "SELECT id FROM goals WHERE user_id = $1 AND category = $2 AND name = $3",
        )
        .bind(user_id)
        .bind(category)
        .bind(name)
        .fetch_optional(pool)
        .await?;

        match goal_id {
            Some((id,)) => Self::update_value(pool, user_id, id, new_value, None).await,
            None => Ok(None),
        }
    }

    /// Delete one of the user's goals; its progress log cascades.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: DbId, goal_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
            .bind(goal_id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Give a user the default goal template.
    ///
    /// Users that already have any goal are left untouched and their
    /// existing goals returned, so calling this on every start is safe.
    pub async fn seed_defaults(pool: &PgPool, user_id: DbId) -> Result<Vec<Goal>, sqlx::Error> {
        let existing = Self::list_for_user(pool, user_id, None).await?;
        if !existing.is_empty() {
            tracing::debug!(%user_id, count = existing.len(), "User already has goals, skipping seed");
            return Ok(existing);
        }

        let mut tx = pool.begin().await?;
        for template in DEFAULT_GOALS {
            sqlx::query(
                "INSERT INTO goals (user_id, category, name, target_value, current_value,
                                    initial_value, unit, deadline)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (user_id, category, name) DO NOTHING",
            )
            .bind(user_id)
            .bind(template.category)
            .bind(template.name)
            .bind(template.target_value)
            .bind(template.current_value)
            .bind(template.initial_value)
            .bind(template.unit)
            .bind(template.deadline_date())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let seeded = Self::list_for_user(pool, user_id, None).await?;
        tracing::info!(%user_id, count = seeded.len(), "Seeded default goals");
        Ok(seeded)
    }
}
