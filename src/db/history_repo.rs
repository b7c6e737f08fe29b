// src/db/history_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::history::{ChangeType, EquipmentHistory},
};

#[derive(Clone)]
pub struct HistoryRepository {
    pool: PgPool,
}

impl HistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_by_equipment(&self, equipment_id: i32) -> Result<Vec<EquipmentHistory>, AppError> {
        let rows = sqlx::query_as::<_, EquipmentHistory>(
            "SELECT * FROM equipment_history WHERE equipment_id = $1 ORDER BY changed_at DESC, id DESC",
        )
        .bind(equipment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<EquipmentHistory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, EquipmentHistory>("SELECT * FROM equipment_history ORDER BY id")
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn record<'e, E>(
        &self,
        executor: E,
        equipment_id: i32,
        changed_by: &str,
        change_type: ChangeType,
        from_value: Option<&str>,
        to_value: Option<&str>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO equipment_history (equipment_id, changed_by, change_type, from_value, to_value)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(equipment_id)
        .bind(changed_by)
        .bind(change_type.as_str())
        .bind(from_value)
        .bind(to_value)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Regrava uma entrada exatamente como veio do backup.
    pub async fn restore<'e, E>(&self, executor: E, entry: &EquipmentHistory) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO equipment_history (id, equipment_id, changed_at, changed_by, change_type, from_value, to_value)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.equipment_id)
        .bind(entry.changed_at)
        .bind(&entry.changed_by)
        .bind(&entry.change_type)
        .bind(&entry.from_value)
        .bind(&entry.to_value)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_all<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM equipment_history").execute(executor).await?;
        Ok(result.rows_affected())
    }
}
