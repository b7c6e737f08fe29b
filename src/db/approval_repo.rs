// src/db/approval_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::approval::{ApprovalItemType, PendingItem},
};

#[derive(Clone)]
pub struct ApprovalRepository {
    pool: PgPool,
}

impl ApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Equipamentos e licenças aguardando revisão.
    pub async fn list_pending(&self) -> Result<Vec<PendingItem>, AppError> {
        let rows = sqlx::query_as::<_, PendingItem>(
            r#"
            SELECT id, equipamento AS name, 'equipment' AS item_type
            FROM equipment WHERE approval_status = 'pending_approval'
            UNION ALL
            SELECT id, produto AS name, 'license' AS item_type
            FROM licenses WHERE approval_status = 'pending_approval'
            ORDER BY item_type, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // As transições só valem a partir de pending_approval (approved/rejected são finais).
    pub async fn approve<'e, E>(&self, executor: E, item_type: ApprovalItemType, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE {} SET approval_status = 'approved', rejection_reason = NULL \
             WHERE id = $1 AND approval_status = 'pending_approval'",
            item_type.table()
        );
        let result = sqlx::query(&sql).bind(id).execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn reject<'e, E>(
        &self,
        executor: E,
        item_type: ApprovalItemType,
        id: i32,
        reason: &str,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "UPDATE {} SET approval_status = 'rejected', rejection_reason = $1 \
             WHERE id = $2 AND approval_status = 'pending_approval'",
            item_type.table()
        );
        let result = sqlx::query(&sql).bind(reason).bind(id).execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }
}
