//! Repository for the key/value `settings` table.

use sqlx::PgPool;

pub const ACTIVE_LIMIT_KEY: &str = "active_limit";
pub const SLA_TARGET_MIN_KEY: &str = "sla_target_min";

pub struct SettingsRepo;

impl SettingsRepo {
    /// All stored `(key, value)` pairs.
    pub async fn list(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(pool)
            .await
    }

    /// Upsert every pair in a single transaction.
    pub async fn upsert_all(pool: &PgPool, pairs: &[(&str, i64)]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for &(key, value) in pairs {
            sqlx::query(
                "INSERT INTO settings (key, value) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
            )
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}
