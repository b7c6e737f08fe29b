// src/db/audit_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::audit::{AuditLogEntry, NewAuditEntry},
};

#[derive(Clone)]
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record<'e, E>(&self, executor: E, entry: &NewAuditEntry) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "INSERT INTO audit_log (username, action_type, target_type, target_id, details)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&entry.username)
        .bind(entry.action.as_str())
        .bind(entry.target.as_str())
        .bind(&entry.target_id)
        .bind(&entry.details)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// As `limit` entradas mais recentes.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLogEntry>, AppError> {
        let rows = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
