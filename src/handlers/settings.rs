// src/handlers/settings.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{
        audit::AuditLogEntry,
        response::ActionResponse,
        settings::{AppSettings, TermoTemplates, UpdateSettingsRequest},
    },
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Configurações do sistema", body = AppSettings)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(State(app_state): State<AppState>) -> Result<Json<AppSettings>, AppError> {
    Ok(Json(app_state.settings_service.get().await?))
}

// POST /api/settings
#[utoipa::path(
    post,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações salvas", body = ActionResponse),
        (status = 400, description = "Chave desconhecida ou nada a salvar"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state
        .settings_service
        .update(admin.user(), payload.settings)
        .await?;
    Ok(Json(ActionResponse::with_message("Configurações salvas")))
}

// GET /api/config/termo-templates
#[utoipa::path(
    get,
    path = "/api/config/termo-templates",
    tag = "Settings",
    responses((status = 200, description = "Modelos dos termos de entrega e devolução", body = TermoTemplates)),
    security(("api_jwt" = []))
)]
pub async fn termo_templates(State(app_state): State<AppState>) -> Result<Json<TermoTemplates>, AppError> {
    Ok(Json(app_state.settings_service.termo_templates().await?))
}

// GET /api/audit-log
#[utoipa::path(
    get,
    path = "/api/audit-log",
    tag = "Settings",
    responses((status = 200, description = "As 100 entradas mais recentes", body = Vec<AuditLogEntry>)),
    security(("api_jwt" = []))
)]
pub async fn audit_log(State(app_state): State<AppState>) -> Result<Json<Vec<AuditLogEntry>>, AppError> {
    Ok(Json(app_state.settings_service.audit_log().await?))
}
