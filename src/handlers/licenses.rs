// src/handlers/licenses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{AdminOnly, RequireRole},
    },
    models::{
        license::{
            License, LicenseImportRequest, LicenseRequest, LicenseTotals, RenameProductPayload,
            TotalsRequest,
        },
        response::ActionResponse,
    },
};

// GET /api/licenses
#[utoipa::path(
    get,
    path = "/api/licenses",
    tag = "Licenses",
    responses((status = 200, description = "Licenças aprovadas", body = Vec<License>)),
    security(("api_jwt" = []))
)]
pub async fn list_licenses(State(app_state): State<AppState>) -> Result<Json<Vec<License>>, AppError> {
    Ok(Json(app_state.license_service.list().await?))
}

// POST /api/licenses
#[utoipa::path(
    post,
    path = "/api/licenses",
    tag = "Licenses",
    request_body = LicenseRequest,
    responses(
        (status = 201, description = "Licença criada (pendente se o autor não for Admin)", body = License),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_license(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<LicenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = app_state.license_service.create(&user, payload.license).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

// PUT /api/licenses/{id}
#[utoipa::path(
    put,
    path = "/api/licenses/{id}",
    tag = "Licenses",
    request_body = LicenseRequest,
    params(("id" = i32, Path, description = "ID da licença")),
    responses(
        (status = 200, description = "Licença atualizada", body = License),
        (status = 404, description = "Licença não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_license(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<LicenseRequest>,
) -> Result<Json<License>, AppError> {
    let updated = app_state.license_service.update(&user, id, payload.license).await?;
    Ok(Json(updated))
}

// DELETE /api/licenses/{id}
#[utoipa::path(
    delete,
    path = "/api/licenses/{id}",
    tag = "Licenses",
    params(("id" = i32, Path, description = "ID da licença")),
    responses(
        (status = 204, description = "Licença removida"),
        (status = 404, description = "Licença não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_license(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.license_service.delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/licenses/totals
#[utoipa::path(
    get,
    path = "/api/licenses/totals",
    tag = "Licenses",
    responses((status = 200, description = "Total contratado por produto", body = LicenseTotals)),
    security(("api_jwt" = []))
)]
pub async fn get_totals(State(app_state): State<AppState>) -> Result<Json<LicenseTotals>, AppError> {
    Ok(Json(app_state.license_service.totals().await?))
}

// POST /api/licenses/totals
#[utoipa::path(
    post,
    path = "/api/licenses/totals",
    tag = "Licenses",
    request_body = TotalsRequest,
    responses(
        (status = 200, description = "Totais atualizados", body = ActionResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_totals(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<TotalsRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state
        .license_service
        .save_totals(admin.user(), LicenseTotals::new(payload.totals))
        .await?;
    Ok(Json(ActionResponse::with_message("Totais atualizados")))
}

// POST /api/licenses/rename-product
#[utoipa::path(
    post,
    path = "/api/licenses/rename-product",
    tag = "Licenses",
    request_body = RenameProductPayload,
    responses(
        (status = 200, description = "Produto renomeado nas licenças e nos totais", body = ActionResponse),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn rename_product(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<RenameProductPayload>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    let renamed = app_state
        .license_service
        .rename_product(admin.user(), &payload.old_name, &payload.new_name)
        .await?;
    Ok(Json(ActionResponse::with_message(format!(
        "Produto renomeado ({} licenças).",
        renamed
    ))))
}

// POST /api/licenses/import
#[utoipa::path(
    post,
    path = "/api/licenses/import",
    tag = "Licenses",
    request_body = LicenseImportRequest,
    responses(
        (status = 200, description = "Licenças do produto substituídas", body = ActionResponse),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_licenses(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<LicenseImportRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    let message = app_state
        .license_service
        .import(&user, payload.product_name.trim(), payload.licenses)
        .await?;
    Ok(Json(ActionResponse::with_message(message)))
}
