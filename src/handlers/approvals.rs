// src/handlers/approvals.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{AdminOnly, RequireRole},
    models::{
        approval::{ApprovePayload, PendingItem, RejectPayload},
        response::ActionResponse,
    },
};

// GET /api/approvals/pending
#[utoipa::path(
    get,
    path = "/api/approvals/pending",
    tag = "Approvals",
    responses(
        (status = 200, description = "Equipamentos e licenças aguardando revisão", body = Vec<PendingItem>),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    _admin: RequireRole<AdminOnly>,
) -> Result<Json<Vec<PendingItem>>, AppError> {
    Ok(Json(app_state.approval_service.pending().await?))
}

// POST /api/approvals/approve
#[utoipa::path(
    post,
    path = "/api/approvals/approve",
    tag = "Approvals",
    request_body = ApprovePayload,
    responses(
        (status = 200, description = "Item aprovado", body = ActionResponse),
        (status = 404, description = "Item pendente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<ApprovePayload>,
) -> Result<Json<ActionResponse>, AppError> {
    app_state
        .approval_service
        .approve(admin.user(), payload.item_type, payload.id)
        .await?;
    Ok(Json(ActionResponse::ok()))
}

// POST /api/approvals/reject
#[utoipa::path(
    post,
    path = "/api/approvals/reject",
    tag = "Approvals",
    request_body = RejectPayload,
    responses(
        (status = 200, description = "Item rejeitado", body = ActionResponse),
        (status = 400, description = "Motivo ausente"),
        (status = 404, description = "Item pendente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject(
    State(app_state): State<AppState>,
    admin: RequireRole<AdminOnly>,
    Json(payload): Json<RejectPayload>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    app_state
        .approval_service
        .reject(admin.user(), payload.item_type, payload.id, &payload.reason)
        .await?;
    Ok(Json(ActionResponse::ok()))
}
