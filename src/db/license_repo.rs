// src/db/license_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::{
        db_utils::{build_insert, build_update, RowMeta},
        error::AppError,
    },
    models::license::{License, LicenseInput},
};

const TABLE: &str = "licenses";

#[derive(Clone)]
pub struct LicenseRepository {
    pool: PgPool,
}

impl LicenseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_approved(&self) -> Result<Vec<License>, AppError> {
        let rows = sqlx::query_as::<_, License>(
            "SELECT * FROM licenses WHERE approval_status = 'approved' ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_all<'e, E>(&self, executor: E) -> Result<Vec<License>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, License>("SELECT * FROM licenses ORDER BY id")
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        input: &LicenseInput,
        meta: RowMeta,
    ) -> Result<License, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let mut builder = build_insert(TABLE, input.columns(), meta);
        let row = builder.build_query_as::<License>().fetch_one(executor).await?;
        Ok(row)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        input: &LicenseInput,
    ) -> Result<Option<License>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let Some(mut builder) = build_update(TABLE, id, input.columns()) else {
            let row = sqlx::query_as::<_, License>("SELECT * FROM licenses WHERE id = $1")
                .bind(id)
                .fetch_optional(executor)
                .await?;
            return Ok(row);
        };
        let row = builder
            .build_query_as::<License>()
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM licenses WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn rename_product<'e, E>(
        &self,
        executor: E,
        old_name: &str,
        new_name: &str,
    ) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("UPDATE licenses SET produto = $1 WHERE produto = $2")
            .bind(new_name)
            .bind(old_name)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_by_product<'e, E>(&self, executor: E, product: &str) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM licenses WHERE produto = $1")
            .bind(product)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_all<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM licenses").execute(executor).await?;
        Ok(result.rows_affected())
    }
}
