// src/handlers/database.rs

use axum::{extract::State, Json};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{database::BackupStatus, response::ActionResponse},
};

// GET /api/database/backup-status
#[utoipa::path(
    get,
    path = "/api/database/backup-status",
    tag = "Database",
    responses((status = 200, description = "Último backup disponível", body = BackupStatus)),
    security(("api_jwt" = []))
)]
pub async fn backup_status(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<BackupStatus>, AppError> {
    Ok(Json(app_state.database_service.backup_status().await?))
}

// POST /api/database/backup
#[utoipa::path(
    post,
    path = "/api/database/backup",
    tag = "Database",
    responses(
        (status = 200, description = "Snapshot gravado", body = ActionResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn backup(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state.database_service.backup(admin.user()).await?;
    Ok(Json(ActionResponse::with_message("Backup realizado com sucesso!")))
}

// POST /api/database/restore
#[utoipa::path(
    post,
    path = "/api/database/restore",
    tag = "Database",
    responses(
        (status = 200, description = "Snapshot mais recente restaurado", body = ActionResponse),
        (status = 404, description = "Nenhum backup encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn restore(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state.database_service.restore(admin.user()).await?;
    Ok(Json(ActionResponse::with_message("Banco de dados restaurado com sucesso!")))
}

// POST /api/database/clear
#[utoipa::path(
    post,
    path = "/api/database/clear",
    tag = "Database",
    responses(
        (status = 200, description = "Inventário, licenças e usuários não-admin removidos", body = ActionResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn clear(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state.database_service.clear(admin.user()).await?;
    Ok(Json(ActionResponse::with_message("Banco de dados limpo com sucesso.")))
}
