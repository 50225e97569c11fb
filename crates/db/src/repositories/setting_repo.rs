//! Repository for the per-user `settings` table.

use sqlx::PgPool;

use goalbot_core::types::DbId;

use crate::models::setting::Setting;

const COLUMNS: &str = "id, user_id, key, value, created_at, updated_at";

pub struct SettingRepo;

impl SettingRepo {
    /// The stored setting row, if any.
    pub async fn get(pool: &PgPool, user_id: DbId, key: &str) -> Result<Option<Setting>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM settings WHERE user_id = $1 AND key = $2");
        sqlx::query_as::<_, Setting>(&query)
            .bind(user_id)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// The stored value, or `default` when the user never set it.
    pub async fn get_or(
        pool: &PgPool,
        user_id: DbId,
        key: &str,
        default: &str,
    ) -> Result<String, sqlx::Error> {
        Ok(Self::get(pool, user_id, key)
            .await?
            .map(|s| s.value)
            .unwrap_or_else(|| default.to_string()))
    }

    /// Insert a new setting. Fails with a unique violation if the key is
    /// already set for this user; use [`Self::upsert`] to overwrite.
    pub async fn insert(
        pool: &PgPool,
        user_id: DbId,
        key: &str,
        value: &str,
    ) -> Result<Setting, sqlx::Error> {
        let query = format!(
            "INSERT INTO settings (user_id, key, value)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Setting>(&query)
            .bind(user_id)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await
    }

    /// Insert or overwrite a setting.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        key: &str,
        value: &str,
    ) -> Result<Setting, sqlx::Error> {
        let query = format!(
            "INSERT INTO settings (user_id, key, value)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, key) DO UPDATE SET value = EXCLUDED.value
             RETURNING {COLUMNS}"
        );
        let setting = sqlx::query_as::<_, Setting>(&query)
            .bind(user_id)
            .bind(key)
            .bind(value)
            .fetch_one(pool)
            .await?;
        tracing::debug!(%user_id, key, "Setting stored");
        Ok(setting)
    }

    /// Remove a setting so its default applies again.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: DbId, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM settings WHERE user_id = $1 AND key = $2")
            .bind(user_id)
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
