// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AuditRepository, UserRepository},
    models::{
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::{Claims, LoginResponse, User, PRE_AUTH_STAGE},
    },
};

const TOKEN_TTL_DAYS: i64 = 7;
const PRE_AUTH_TTL_MINUTES: i64 = 5;

/// Gera o hash bcrypt fora do executor assíncrono.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    jwt_secret: String,
    pool: PgPool,
}

impl AuthService {
    pub fn new(
        user_repo: UserRepository,
        audit_repo: AuditRepository,
        jwt_secret: String,
        pool: PgPool,
    ) -> Self {
        Self {
            user_repo,
            audit_repo,
            jwt_secret,
            pool,
        }
    }

    pub async fn login_user(&self, username: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or(AppError::InvalidCredentials("Usuário não encontrado"))?;

        if user.sso_provider.as_deref().is_some_and(|p| !p.is_empty()) {
            return Err(AppError::InvalidCredentials("Por favor, use o login via SSO."));
        }

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials("Senha incorreta"));
        }

        let mut tx = self.pool.begin().await?;
        self.user_repo.touch_last_login(&mut *tx, user.id).await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(&user.username, AuditAction::Login, AuditTarget::User, "User logged in")
                    .with_target_id(user.id),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Login de '{}' (2FA: {})", user.username, user.is_2fa_enabled);

        // Com 2FA ligado o token de sessão só sai depois do /verify-2fa
        if user.is_2fa_enabled {
            let pre_auth_token = self.create_pre_auth_token(user.id)?;
            return Ok(LoginResponse {
                user,
                token: None,
                requires_2fa: true,
                pre_auth_token: Some(pre_auth_token),
            });
        }
        self.issue_session(user)
    }

    /// Perfil + token para um usuário já autenticado.
    pub fn issue_session(&self, user: User) -> Result<LoginResponse, AppError> {
        let token = self.create_token(user.id)?;
        Ok(LoginResponse {
            user,
            token: Some(token),
            requires_2fa: false,
            pre_auth_token: None,
        })
    }

    /// Token de sessão -> usuário. Tokens de etapa (pré-2FA) não valem aqui.
    pub async fn validate_token(&self, token: &str) -> Result<User, AppError> {
        let user_id = self.session_subject(token)?;
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::InvalidToken)
    }

    fn session_subject(&self, token: &str) -> Result<i32, AppError> {
        let claims = self.decode_token(token)?;
        if claims.stage.is_some() {
            return Err(AppError::InvalidToken);
        }
        Ok(claims.sub)
    }

    /// Id do usuário que passou pela senha e ainda deve o código TOTP.
    pub fn validate_pre_auth_token(&self, token: &str) -> Result<i32, AppError> {
        let claims = self.decode_token(token)?;
        if claims.stage.as_deref() != Some(PRE_AUTH_STAGE) {
            return Err(AppError::InvalidToken);
        }
        Ok(claims.sub)
    }

    fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }

    fn create_token(&self, user_id: i32) -> Result<String, AppError> {
        self.sign(user_id, chrono::Duration::days(TOKEN_TTL_DAYS), None)
    }

    fn create_pre_auth_token(&self, user_id: i32) -> Result<String, AppError> {
        self.sign(
            user_id,
            chrono::Duration::minutes(PRE_AUTH_TTL_MINUTES),
            Some(PRE_AUTH_STAGE.to_string()),
        )
    }

    fn sign(&self, user_id: i32, ttl: chrono::Duration, stage: Option<String>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + ttl;

        let claims = Claims {
            sub: user_id,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
            stage,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    // Pool preguiçoso: nenhuma conexão é aberta nestes testes.
    fn service(secret: &str) -> AuthService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/inventario_test")
            .unwrap();
        AuthService::new(
            UserRepository::new(pool.clone()),
            AuditRepository::new(pool.clone()),
            secret.to_string(),
            pool,
        )
    }

    #[tokio::test]
    async fn token_round_trips_the_user_id() {
        let auth = service("segredo-de-teste");
        let token = auth.create_token(42).unwrap();
        let claims = auth.decode_token(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn token_signed_with_other_secret_is_rejected() {
        let token = service("um").create_token(1).unwrap();
        let result = service("outro").decode_token(&token);
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn pre_auth_token_is_not_a_session() {
        let auth = service("segredo-de-teste");
        let pre = auth.create_pre_auth_token(7).unwrap();

        assert_eq!(auth.validate_pre_auth_token(&pre).unwrap(), 7);
        assert!(matches!(auth.session_subject(&pre), Err(AppError::InvalidToken)));

        let claims = auth.decode_token(&pre).unwrap();
        assert!(claims.exp - claims.iat <= (PRE_AUTH_TTL_MINUTES * 60) as usize);
    }

    #[tokio::test]
    async fn session_token_is_refused_at_the_second_step() {
        let auth = service("segredo-de-teste");
        let session = auth.create_token(7).unwrap();

        assert_eq!(auth.session_subject(&session).unwrap(), 7);
        assert!(matches!(
            auth.validate_pre_auth_token(&session),
            Err(AppError::InvalidToken)
        ));
        assert!(matches!(
            auth.validate_pre_auth_token("nao-e-um-jwt"),
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn stage_must_match_exactly() {
        let auth = service("segredo-de-teste");
        let other = auth
            .sign(7, chrono::Duration::minutes(5), Some("outra".into()))
            .unwrap();
        assert!(auth.validate_pre_auth_token(&other).is_err());
        assert!(auth.session_subject(&other).is_err());
    }

    #[tokio::test]
    async fn hashes_are_verifiable() {
        let hashed = hash_password("s3nha-forte", 4).await.unwrap();
        assert!(verify("s3nha-forte", &hashed).unwrap());
        assert!(!verify("outra", &hashed).unwrap());
    }
}
