// src/services/user_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{
        user_repo::{NewUser, UserChanges},
        AuditRepository, UserRepository,
    },
    models::{
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::{CreateUserPayload, UpdateUserPayload, UpdateProfilePayload, User, UserRole},
    },
    services::auth::hash_password,
};

fn not_found() -> AppError {
    AppError::NotFound("Usuário não encontrado.".into())
}

// Só um Admin concede ou mexe no papel de Admin
fn ensure_can_assign(actor: &User, role: Option<UserRole>) -> Result<(), AppError> {
    if role == Some(UserRole::Admin) && !actor.is_admin() {
        return Err(AppError::Forbidden(
            "Apenas administradores podem conceder o perfil Admin.".into(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(user_repo: UserRepository, audit_repo: AuditRepository, pool: PgPool, bcrypt_cost: u32) -> Self {
        Self {
            user_repo,
            audit_repo,
            pool,
            bcrypt_cost,
        }
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list().await
    }

    pub async fn create(&self, actor: &User, payload: CreateUserPayload) -> Result<User, AppError> {
        ensure_can_assign(actor, Some(payload.role))?;
        let password_hash = hash_password(&payload.password, self.bcrypt_cost).await?;

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .create(
                &mut *tx,
                NewUser {
                    username: payload.username.trim(),
                    real_name: &payload.real_name,
                    email: &payload.email,
                    password_hash: &password_hash,
                    role: payload.role,
                    is_2fa_enabled: payload.is_2fa_enabled,
                    avatar_url: payload.avatar_url.as_deref(),
                },
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Create,
                    AuditTarget::User,
                    format!("Created user: {}", user.username),
                )
                .with_target_id(user.id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Usuário '{}' criado por '{}'", user.username, actor.username);
        Ok(user)
    }

    pub async fn update(&self, actor: &User, id: i32, payload: UpdateUserPayload) -> Result<User, AppError> {
        ensure_can_assign(actor, payload.role)?;

        let target = self.user_repo.find_by_id(id).await?.ok_or_else(not_found)?;
        if target.is_admin() && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Apenas administradores podem alterar outro administrador.".into(),
            ));
        }

        let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password, self.bcrypt_cost).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let user = self
            .user_repo
            .update(
                &mut *tx,
                id,
                UserChanges {
                    real_name: payload.real_name.as_deref(),
                    email: payload.email.as_deref(),
                    role: payload.role,
                    password_hash: password_hash.as_deref(),
                    avatar_url: payload.avatar_url.as_deref(),
                    is_2fa_enabled: payload.is_2fa_enabled,
                },
            )
            .await?
            .ok_or_else(not_found)?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::User,
                    format!("Updated user: {}", user.username),
                )
                .with_target_id(id),
            )
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    pub async fn delete(&self, actor: &User, id: i32) -> Result<(), AppError> {
        if actor.id == id {
            return Err(AppError::BadRequest("Você não pode excluir o próprio usuário.".into()));
        }

        let mut tx = self.pool.begin().await?;
        if !self.user_repo.delete(&mut *tx, id).await? {
            return Err(not_found());
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(&actor.username, AuditAction::Delete, AuditTarget::User, "Deleted user")
                    .with_target_id(id),
            )
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Perfil: o próprio usuário ou um Admin.
    pub async fn update_profile(
        &self,
        actor: &User,
        id: i32,
        payload: UpdateProfilePayload,
    ) -> Result<User, AppError> {
        if actor.id != id && !actor.is_admin() {
            return Err(AppError::Forbidden("Você só pode alterar o próprio perfil.".into()));
        }
        self.user_repo
            .update_profile(id, &payload.real_name, payload.avatar_url.as_deref())
            .await?
            .ok_or_else(not_found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: UserRole) -> User {
        User {
            id: 7,
            username: "gestor".into(),
            real_name: "Gestor".into(),
            email: "gestor@empresa.com".into(),
            password_hash: String::new(),
            role,
            last_login: None,
            is_2fa_enabled: false,
            two_fa_secret: None,
            sso_provider: None,
            avatar_url: None,
        }
    }

    #[test]
    fn only_admins_grant_admin_role() {
        assert!(ensure_can_assign(&user(UserRole::Admin), Some(UserRole::Admin)).is_ok());
        assert!(ensure_can_assign(&user(UserRole::UserManager), Some(UserRole::User)).is_ok());
        assert!(ensure_can_assign(&user(UserRole::UserManager), None).is_ok());
        assert!(matches!(
            ensure_can_assign(&user(UserRole::UserManager), Some(UserRole::Admin)),
            Err(AppError::Forbidden(_))
        ));
    }
}
