// src/handlers/two_factor.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        auth::{
            DisableUserTwoFactorPayload, EnableTwoFactorPayload, LoginResponse, TwoFactorSetup,
            VerifyTwoFactorPayload,
        },
        response::ActionResponse,
    },
};

// POST /api/generate-2fa
#[utoipa::path(
    post,
    path = "/api/generate-2fa",
    tag = "2FA",
    responses(
        (status = 200, description = "Segredo gerado e URI otpauth para o QR Code", body = TwoFactorSetup)
    ),
    security(("api_jwt" = []))
)]
pub async fn generate(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<TwoFactorSetup>, AppError> {
    let setup = app_state.two_factor_service.generate(&user).await?;
    Ok(Json(setup))
}

// POST /api/enable-2fa
#[utoipa::path(
    post,
    path = "/api/enable-2fa",
    tag = "2FA",
    request_body = EnableTwoFactorPayload,
    responses(
        (status = 200, description = "2FA ativado", body = ActionResponse),
        (status = 400, description = "Token inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn enable(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<EnableTwoFactorPayload>,
) -> Result<Json<ActionResponse>, AppError> {
    if payload.validate().is_err() {
        return Err(AppError::BadRequest("Token inválido".into()));
    }
    app_state.two_factor_service.enable(user.id, &payload.token).await?;
    Ok(Json(ActionResponse::ok()))
}

// POST /api/verify-2fa (pública: segunda etapa do login)
#[utoipa::path(
    post,
    path = "/api/verify-2fa",
    tag = "2FA",
    request_body = VerifyTwoFactorPayload,
    responses(
        (status = 200, description = "Código válido: perfil + token", body = LoginResponse),
        (status = 400, description = "Código inválido"),
        (status = 401, description = "preAuthToken ausente, expirado ou inválido"),
        (status = 429, description = "Tentativas demais para este usuário")
    )
)]
pub async fn verify(
    State(app_state): State<AppState>,
    Json(payload): Json<VerifyTwoFactorPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = app_state
        .two_factor_service
        .verify(&payload.pre_auth_token, &payload.token)
        .await?;
    Ok(Json(response))
}

// POST /api/disable-2fa
#[utoipa::path(
    post,
    path = "/api/disable-2fa",
    tag = "2FA",
    responses((status = 200, description = "2FA desativado", body = ActionResponse)),
    security(("api_jwt" = []))
)]
pub async fn disable(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ActionResponse>, AppError> {
    app_state.two_factor_service.disable(user.id).await?;
    Ok(Json(ActionResponse::ok()))
}

// POST /api/disable-user-2fa
#[utoipa::path(
    post,
    path = "/api/disable-user-2fa",
    tag = "2FA",
    request_body = DisableUserTwoFactorPayload,
    responses(
        (status = 200, description = "2FA do usuário desativado", body = ActionResponse),
        (status = 403, description = "Apenas administradores"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn disable_for_user(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<DisableUserTwoFactorPayload>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state.two_factor_service.disable(payload.user_id).await?;
    tracing::info!("2FA de {} desativado por '{}'", payload.user_id, admin.user().username);
    Ok(Json(ActionResponse::ok()))
}
