// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    common::error::AppError,
    models::auth::{User, UserRole},
};

/// 1. O Trait que define quais papéis passam pela rota
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [UserRole];
    fn denied_message() -> &'static str;
}

/// 2. O Extractor (Guardião)
pub struct RequireRole<T>(pub User, PhantomData<T>);

impl<T> RequireRole<T> {
    pub fn user(&self) -> &User {
        &self.0
    }
}

fn check<T: RoleDef>(user: &User) -> Result<(), AppError> {
    if T::allowed().contains(&user.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(T::denied_message().to_string()))
    }
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O auth_guard já rodou; sem usuário aqui é token ausente
        let user = parts
            .extensions
            .get::<User>()
            .cloned()
            .ok_or(AppError::InvalidToken)?;

        check::<T>(&user)?;
        Ok(RequireRole(user, PhantomData))
    }
}

// ---
// DEFINIÇÃO DOS PAPÉIS (TIPOS)
// ---

pub struct AdminOnly;
impl RoleDef for AdminOnly {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin]
    }
    fn denied_message() -> &'static str {
        "Apenas administradores podem realizar esta ação."
    }
}

pub struct UserManagers;
impl RoleDef for UserManagers {
    fn allowed() -> &'static [UserRole] {
        &[UserRole::Admin, UserRole::UserManager]
    }
    fn denied_message() -> &'static str {
        "Você não tem permissão para gerenciar usuários."
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    fn user(role: UserRole) -> User {
        User {
            id: 1,
            username: "ana".into(),
            real_name: "Ana".into(),
            email: "ana@empresa.com".into(),
            password_hash: String::new(),
            role,
            last_login: None,
            is_2fa_enabled: false,
            two_fa_secret: None,
            sso_provider: None,
            avatar_url: None,
        }
    }

    async fn extract<T: RoleDef>(user: Option<User>) -> Result<RequireRole<T>, AppError> {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        RequireRole::<T>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn admin_only_rejects_other_roles() {
        assert!(extract::<AdminOnly>(Some(user(UserRole::Admin))).await.is_ok());

        let err = extract::<AdminOnly>(Some(user(UserRole::UserManager))).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn user_managers_include_admins() {
        assert!(extract::<UserManagers>(Some(user(UserRole::Admin))).await.is_ok());
        assert!(extract::<UserManagers>(Some(user(UserRole::UserManager))).await.is_ok());
        assert!(extract::<UserManagers>(Some(user(UserRole::User))).await.is_err());
    }

    #[tokio::test]
    async fn missing_user_is_unauthorized() {
        let err = extract::<AdminOnly>(None).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }
}
