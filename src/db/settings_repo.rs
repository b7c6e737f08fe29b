// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{common::error::AppError, models::settings::ConfigEntry};

// Acesso à tabela chave/valor app_config
#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<ConfigEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, ConfigEntry>(
            "SELECT config_key, config_value FROM app_config ORDER BY config_key",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list_by_keys(&self, keys: &[&str]) -> Result<Vec<ConfigEntry>, AppError> {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let rows = sqlx::query_as::<_, ConfigEntry>(
            "SELECT config_key, config_value FROM app_config WHERE config_key = ANY($1)",
        )
        .bind(keys)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get<'e, E>(&self, executor: E, key: &str) -> Result<Option<String>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT config_value FROM app_config WHERE config_key = $1")
                .bind(key)
                .fetch_optional(executor)
                .await?;
        Ok(value.flatten())
    }

    // UPSERT (Insert or Update)
    pub async fn upsert<'e, E>(&self, executor: E, key: &str, value: Option<&str>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO app_config (config_key, config_value) VALUES ($1, $2)
             ON CONFLICT (config_key) DO UPDATE SET config_value = EXCLUDED.config_value",
        )
        .bind(key)
        .bind(value)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_all<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM app_config").execute(executor).await?;
        Ok(result.rows_affected())
    }
}
