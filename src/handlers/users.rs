// src/handlers/users.rs

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
        rbac::{RequireRole, UserManagers},
    },
    models::auth::{CreateUserRequest, UpdateProfilePayload, UpdateUserRequest, User},
};

// GET /api/users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "Usuários (sem senha nem segredo 2FA)", body = Vec<User>),
        (status = 403, description = "Sem permissão")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _manager: RequireRole<UserManagers>,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(app_state.user_service.list().await?))
}

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Usuário criado", body = User),
        (status = 400, description = "Dados inválidos"),
        (status = 500, description = "Usuário ou e-mail já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    manager: RequireRole<UserManagers>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.user.validate()?;
    let user = app_state.user_service.create(manager.user(), payload.user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

// PUT /api/users/{id}
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "Users",
    request_body = UpdateUserRequest,
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = User),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_user(
    State(app_state): State<AppState>,
    manager: RequireRole<UserManagers>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    payload.user.validate()?;
    let user = app_state.user_service.update(manager.user(), id, payload.user).await?;
    Ok(Json(user))
}

// DELETE /api/users/{id}
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 204, description = "Usuário removido"),
        (status = 400, description = "Tentativa de excluir o próprio usuário"),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_user(
    State(app_state): State<AppState>,
    manager: RequireRole<UserManagers>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.user_service.delete(manager.user(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// PUT /api/users/{id}/profile
#[utoipa::path(
    put,
    path = "/api/users/{id}/profile",
    tag = "Users",
    request_body = UpdateProfilePayload,
    params(("id" = i32, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Perfil atualizado", body = User),
        (status = 403, description = "Perfil de outro usuário")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;
    let updated = app_state.user_service.update_profile(&user, id, payload).await?;
    Ok(Json(updated))
}
