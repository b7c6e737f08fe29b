// src/db/user_repo.rs

use sqlx::{Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

// O repositório de usuários, responsável por todas as interações com a tabela 'users'
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

/// Campos gravados na criação (hash já calculado).
pub struct NewUser<'a> {
    pub username: &'a str,
    pub real_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: UserRole,
    pub is_2fa_enabled: bool,
    pub avatar_url: Option<&'a str>,
}

/// Alteração parcial: `None` mantém o valor atual.
#[derive(Default)]
pub struct UserChanges<'a> {
    pub real_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<UserRole>,
    pub password_hash: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
    pub is_2fa_enabled: Option<bool>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn create<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, real_name, email, password_hash, role, is_2fa_enabled, avatar_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.real_name)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.is_2fa_enabled)
        .bind(new_user.avatar_url)
        .fetch_one(executor)
        .await?;
        Ok(user)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: i32,
        changes: UserChanges<'_>,
    ) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                real_name = COALESCE($2, real_name),
                email = COALESCE($3, email),
                role = COALESCE($4, role),
                password_hash = COALESCE($5, password_hash),
                avatar_url = COALESCE($6, avatar_url),
                is_2fa_enabled = COALESCE($7, is_2fa_enabled)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.real_name)
        .bind(changes.email)
        .bind(changes.role)
        .bind(changes.password_hash)
        .bind(changes.avatar_url)
        .bind(changes.is_2fa_enabled)
        .fetch_optional(executor)
        .await?;
        Ok(user)
    }

    /// Perfil: o avatar pode ser removido (NULL), por isso não usa COALESCE.
    pub async fn update_profile(
        &self,
        id: i32,
        real_name: &str,
        avatar_url: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET real_name = $2, avatar_url = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(real_name)
        .bind(avatar_url)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn touch_last_login<'e, E>(&self, executor: E, id: i32) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn delete<'e, E>(&self, executor: E, id: i32) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_non_admins<'e, E>(&self, executor: E) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM users WHERE role <> 'Admin'")
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    // --- 2FA ---

    pub async fn set_two_fa_secret(&self, id: i32, secret: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET two_fa_secret = $2 WHERE id = $1")
            .bind(id)
            .bind(secret)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn enable_two_fa(&self, id: i32) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_2fa_enabled = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn disable_two_fa(&self, id: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET is_2fa_enabled = FALSE, two_fa_secret = NULL WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
