// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role")]
pub enum UserRole {
    Admin,
    #[sqlx(rename = "User Manager")]
    #[serde(rename = "User Manager")]
    UserManager,
    User,
}

// Representa um usuário vindo do banco de dados
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "Administrador")]
    pub real_name: String,
    #[schema(example = "admin@empresa.com")]
    pub email: String,

    #[serde(skip_serializing)] // nunca sai na resposta
    pub password_hash: String,

    pub role: UserRole,
    pub last_login: Option<DateTime<Utc>>,

    #[serde(rename = "is2FAEnabled")]
    pub is_2fa_enabled: bool,

    #[serde(skip_serializing)]
    pub two_fa_secret: Option<String>,

    pub sso_provider: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

// Dados para login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginUserPayload {
    #[validate(length(min = 1, message = "O usuário é obrigatório."))]
    #[schema(example = "admin")]
    pub username: String,
    #[validate(length(min = 1, message = "A senha é obrigatória."))]
    pub password: String,
}

// Resposta do login: o perfil + token (ou o aviso de 2FA pendente)
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(rename = "requires2FA", skip_serializing_if = "std::ops::Not::not")]
    pub requires_2fa: bool,
    /// Token curto que só vale no /verify-2fa.
    #[serde(rename = "preAuthToken", skip_serializing_if = "Option::is_none")]
    pub pre_auth_token: Option<String>,
}

/// Etapa gravada no token entre a senha e o código TOTP.
pub const PRE_AUTH_STAGE: &str = "2fa";

// Estrutura de dados ("claims") dentro do JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,   // Subject (ID do usuário)
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
    // Ausente em tokens de sessão
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

// ---
// Gestão de usuários
// ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserPayload {
    #[validate(length(min = 1, max = 255, message = "O usuário é obrigatório."))]
    #[schema(example = "joao.silva")]
    pub username: String,
    #[validate(length(min = 1, max = 255, message = "O nome é obrigatório."))]
    #[schema(example = "João Silva")]
    pub real_name: String,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,
    pub role: UserRole,
    #[serde(default, rename = "is2FAEnabled")]
    pub is_2fa_enabled: bool,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, max = 255, message = "O nome não pode ficar vazio."))]
    pub real_name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub role: Option<UserRole>,
    // Só troca a senha quando vier preenchida
    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(rename = "is2FAEnabled")]
    pub is_2fa_enabled: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub user: CreateUserPayload,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub user: UpdateUserPayload,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 255, message = "O nome não pode ficar vazio."))]
    pub real_name: String,
    pub avatar_url: Option<String>,
}

// ---
// 2FA
// ---

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetup {
    #[schema(example = "JBSWY3DPEHPK3PXP")]
    pub secret: String,
    #[schema(example = "otpauth://totp/InventarioPro:admin?secret=JBSWY3DPEHPK3PXP&issuer=InventarioPro")]
    pub qr_code_url: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EnableTwoFactorPayload {
    #[validate(length(equal = 6, message = "O código deve ter 6 dígitos."))]
    #[schema(example = "123456")]
    pub token: String,
}

// Um `userId` enviado por clientes antigos é ignorado: quem manda é o preAuthToken.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTwoFactorPayload {
    pub pre_auth_token: String,
    #[schema(example = "123456")]
    pub token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisableUserTwoFactorPayload {
    pub user_id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "admin".into(),
            real_name: "Administrador".into(),
            email: "admin@empresa.com".into(),
            password_hash: "$2b$10$hash".into(),
            role: UserRole::Admin,
            last_login: None,
            is_2fa_enabled: true,
            two_fa_secret: Some("SEGREDO".into()),
            sso_provider: None,
            avatar_url: None,
        }
    }

    #[test]
    fn profile_never_exposes_secrets() {
        let value = serde_json::to_value(sample_user()).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("twoFaSecret").is_none());
        assert_eq!(value["is2FAEnabled"], json!(true));
        assert_eq!(value["realName"], json!("Administrador"));
    }

    #[test]
    fn login_response_flattens_profile() {
        let pending = LoginResponse {
            user: sample_user(),
            token: None,
            requires_2fa: true,
            pre_auth_token: Some("pre".into()),
        };
        let value = serde_json::to_value(pending).unwrap();
        assert_eq!(value["username"], json!("admin"));
        assert_eq!(value["requires2FA"], json!(true));
        assert_eq!(value["preAuthToken"], json!("pre"));
        assert!(value.get("token").is_none());

        let done = LoginResponse {
            user: sample_user(),
            token: Some("jwt".into()),
            requires_2fa: false,
            pre_auth_token: None,
        };
        let value = serde_json::to_value(done).unwrap();
        assert_eq!(value["token"], json!("jwt"));
        assert!(value.get("requires2FA").is_none());
        assert!(value.get("preAuthToken").is_none());
    }

    #[test]
    fn verify_payload_ignores_legacy_user_id() {
        let payload: VerifyTwoFactorPayload = serde_json::from_value(json!({
            "userId": 1,
            "preAuthToken": "pre",
            "token": "123456"
        }))
        .unwrap();
        assert_eq!(payload.pre_auth_token, "pre");

        let missing = serde_json::from_value::<VerifyTwoFactorPayload>(json!({
            "userId": 1,
            "token": "123456"
        }));
        assert!(missing.is_err());
    }

    #[test]
    fn role_uses_display_labels() {
        assert_eq!(serde_json::to_value(UserRole::UserManager).unwrap(), json!("User Manager"));
        let role: UserRole = serde_json::from_value(json!("Admin")).unwrap();
        assert_eq!(role, UserRole::Admin);
    }
}
