// src/db/equipment_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{
        db_utils::{build_insert, build_update, ColumnValue, RowMeta},
        error::AppError,
    },
    models::equipment::{Equipment, EquipmentColumn, EquipmentInput},
};

const TABLE: &str = "equipment";

// Pendentes e rejeitados só aparecem na fila de aprovação
const LIST_APPROVED_SQL: &str =
    "SELECT * FROM equipment WHERE approval_status = 'approved' ORDER BY id DESC";
const TRUNCATE_SQL: &str = "TRUNCATE TABLE equipment_history, equipment RESTART IDENTITY";

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: PgPool,
}

impl EquipmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Itens aprovados, mais novos primeiro.
    pub async fn list_approved(&self) -> Result<Vec<Equipment>, AppError> {
        let rows = sqlx::query_as::<_, Equipment>(LIST_APPROVED_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<Equipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment ORDER BY id")
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i32) -> Result<Option<Equipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Busca pela chave natural, travando a linha até o fim da transação.
    pub async fn find_by_serial_for_update<'e, E>(
        &self,
        executor: E,
        serial: &str,
    ) -> Result<Option<Equipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Equipment>(
            "SELECT * FROM equipment WHERE serial = $1 FOR UPDATE",
        )
        .bind(serial)
        .fetch_optional(executor)
        .await?;
        Ok(row)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &EquipmentInput,
        meta: RowMeta,
    ) -> Result<Equipment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = build_insert(TABLE, input.columns(), meta);
        let row = builder
            .build_query_as::<Equipment>()
            .fetch_one(executor)
            .await?;
        Ok(row)
    }

    /// Atualiza só as colunas informadas. `Ok(None)` se o id não existe.
    pub async fn update_columns<'e, E>(
        &self,
        executor: E,
        id: i32,
        columns: Vec<(EquipmentColumn, ColumnValue)>,
    ) -> Result<Option<Equipment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(mut builder) = build_update(TABLE, id, columns) else {
            return self.find_by_id(executor, id).await;
        };
        let row = builder
            .build_query_as::<Equipment>()
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    /// Remove o item (o histórico vai junto pelo ON DELETE CASCADE).
    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apaga equipamentos e histórico e reinicia os contadores de id.
    pub async fn truncate_with_history<'e, E>(&self, executor: E) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(TRUNCATE_SQL)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete_all<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM equipment").execute(executor).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_is_gated_on_approval() {
        assert!(LIST_APPROVED_SQL.contains("WHERE approval_status = 'approved'"));
        assert!(LIST_APPROVED_SQL.ends_with("ORDER BY id DESC"));
    }

    #[test]
    fn replacement_clears_history_and_restarts_ids() {
        assert!(TRUNCATE_SQL.contains("equipment_history, equipment"));
        assert!(TRUNCATE_SQL.ends_with("RESTART IDENTITY"));
    }
}
