// src/handlers/equipment.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        equipment::{Equipment, EquipmentInput, EquipmentListRequest, EquipmentRequest, ImportResponse},
        history::EquipmentHistory,
    },
};

// GET /api/equipment
#[utoipa::path(
    get,
    path = "/api/equipment",
    tag = "Equipment",
    responses((status = 200, description = "Equipamentos aprovados, mais novos primeiro", body = Vec<Equipment>)),
    security(("api_jwt" = []))
)]
pub async fn list_equipment(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<Equipment>>, AppError> {
    Ok(Json(app_state.equipment_service.list().await?))
}

// POST /api/equipment
#[utoipa::path(
    post,
    path = "/api/equipment",
    tag = "Equipment",
    request_body = EquipmentRequest,
    responses(
        (status = 201, description = "Equipamento criado (pendente se o autor não for Admin)", body = Equipment),
        (status = 400, description = "Dados inválidos"),
        (status = 500, description = "Serial ou patrimônio duplicado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_equipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<EquipmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.equipment_service.create(&user, payload.equipment).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/equipment/{id}
#[utoipa::path(
    put,
    path = "/api/equipment/{id}",
    tag = "Equipment",
    request_body = EquipmentRequest,
    params(("id" = i32, Path, description = "ID do equipamento")),
    responses(
        (status = 200, description = "Equipamento atualizado", body = Equipment),
        (status = 404, description = "Equipamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_equipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<EquipmentRequest>,
) -> Result<Json<Equipment>, AppError> {
    let updated = app_state.equipment_service.update(&user, id, payload.equipment).await?;
    Ok(Json(updated))
}

// DELETE /api/equipment/{id}
#[utoipa::path(
    delete,
    path = "/api/equipment/{id}",
    tag = "Equipment",
    params(("id" = i32, Path, description = "ID do equipamento")),
    responses(
        (status = 204, description = "Equipamento e histórico removidos"),
        (status = 404, description = "Equipamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_equipment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.equipment_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/equipment/{id}/history
#[utoipa::path(
    get,
    path = "/api/equipment/{id}/history",
    tag = "Equipment",
    params(("id" = i32, Path, description = "ID do equipamento")),
    responses((status = 200, description = "Histórico, mais recente primeiro", body = Vec<EquipmentHistory>)),
    security(("api_jwt" = []))
)]
pub async fn equipment_history(
    State(app_state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<EquipmentHistory>>, AppError> {
    Ok(Json(app_state.equipment_service.history(id).await?))
}

// POST /api/equipment/periodic-update
#[utoipa::path(
    post,
    path = "/api/equipment/periodic-update",
    tag = "Import",
    request_body = EquipmentListRequest,
    responses(
        (status = 200, description = "Merge por serial concluído", body = ImportResponse),
        (status = 500, description = "Lote inteiro desfeito")
    ),
    security(("api_jwt" = []))
)]
pub async fn periodic_update(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<EquipmentListRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let response = app_state
        .import_service
        .periodic_update(&user, payload.equipment_list)
        .await?;
    Ok(Json(response))
}

// POST /api/equipment/periodic-update/csv
#[utoipa::path(
    post,
    path = "/api/equipment/periodic-update/csv",
    tag = "Import",
    request_body(content = String, content_type = "text/plain", description = "Arquivo CSV (',' ou ';')"),
    responses(
        (status = 200, description = "CSV interpretado e mesclado", body = ImportResponse),
        (status = 400, description = "CSV sem cabeçalho/dados ou sem linhas válidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn periodic_update_csv(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    body: String,
) -> Result<Json<ImportResponse>, AppError> {
    let response = app_state.import_service.periodic_update_csv(&user, &body).await?;
    Ok(Json(response))
}

// POST /api/equipment/parse-csv
#[utoipa::path(
    post,
    path = "/api/equipment/parse-csv",
    tag = "Import",
    request_body(content = String, content_type = "text/plain", description = "Arquivo CSV (',' ou ';')"),
    responses(
        (status = 200, description = "Pré-visualização das linhas com serial", body = Vec<EquipmentInput>),
        (status = 400, description = "CSV sem cabeçalho/dados ou sem linhas válidas")
    ),
    security(("api_jwt" = []))
)]
pub async fn parse_csv(
    State(app_state): State<AppState>,
    body: String,
) -> Result<Json<Vec<EquipmentInput>>, AppError> {
    Ok(Json(app_state.import_service.parse_csv(&body)?))
}

// POST /api/equipment/import
#[utoipa::path(
    post,
    path = "/api/equipment/import",
    tag = "Import",
    request_body = EquipmentListRequest,
    responses(
        (status = 200, description = "Inventário substituído", body = ImportResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_equipment(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<EquipmentListRequest>,
) -> Result<Json<ImportResponse>, AppError> {
    let response = app_state
        .import_service
        .full_replacement(admin.user(), payload.equipment_list)
        .await?;
    Ok(Json(response))
}
