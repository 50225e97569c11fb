//! Repository for the `users` table.

use sqlx::PgPool;

use goalbot_core::settings::{NOTIFICATIONS_DEFAULT, NOTIFICATIONS_ENABLED, ON};
use goalbot_core::types::DbId;

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, telegram_user_id, telegram_username, first_name, last_name, \
                        language_code, is_active, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    ///
    /// Fails with a unique violation if the Telegram id is already taken.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (telegram_user_id, telegram_username, first_name, last_name, language_code)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'ru'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.telegram_user_id)
            .bind(&input.telegram_username)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.language_code)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by Telegram user id.
    pub async fn find_by_telegram_id(
        pool: &PgPool,
        telegram_user_id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE telegram_user_id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(telegram_user_id)
            .fetch_optional(pool)
            .await
    }

    /// Return the user for `input.telegram_user_id`, creating it on first contact.
    ///
    /// The insert is a no-op on conflict, so two concurrent first messages
    /// from the same account still produce exactly one row.
    pub async fn get_or_create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        if let Some(user) = Self::find_by_telegram_id(pool, input.telegram_user_id).await? {
            return Ok(user);
        }

        let query = format!(
            "INSERT INTO users (telegram_user_id, telegram_username, first_name, last_name, language_code)
             VALUES ($1, $2, $3, $4, COALESCE($5, 'ru'))
             ON CONFLICT (telegram_user_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&query)
            .bind(input.telegram_user_id)
            .bind(&input.telegram_username)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.language_code)
            .fetch_optional(pool)
            .await?;

        match created {
            Some(user) => {
                tracing::info!(telegram_user_id = user.telegram_user_id, id = %user.id, "Created user");
                Ok(user)
            }
            None => Self::find_by_telegram_id(pool, input.telegram_user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    /// Update a user. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                telegram_username = COALESCE($2, telegram_username),
                first_name = COALESCE($3, first_name),
                last_name = COALESCE($4, last_name),
                language_code = COALESCE($5, language_code),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.telegram_username)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.language_code)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a user by setting `is_active = false`.
    ///
    /// Returns `true` if the row was updated.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete a user. Goals, progress, check-ins, settings and
    /// sessions go with it via `ON DELETE CASCADE`.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Active users whose notifications setting is exactly `on`, or unset.
    pub async fn list_with_notifications_enabled(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {cols} FROM users u
             LEFT JOIN settings s ON s.user_id = u.id AND s.key = $1
             WHERE u.is_active = true
               AND COALESCE(s.value, $2) = $3
             ORDER BY u.created_at",
            cols = qualified_columns("u"),
        );
        sqlx::query_as::<_, User>(&query)
            .bind(NOTIFICATIONS_ENABLED)
            .bind(NOTIFICATIONS_DEFAULT)
            .bind(ON)
            .fetch_all(pool)
            .await
    }
}

/// [`COLUMNS`] prefixed with a table alias, for joins.
fn qualified_columns(alias: &str) -> String {
    COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
