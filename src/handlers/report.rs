// src/handlers/report.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::report::{GenerateReportRequest, ReportResponse},
};

// POST /api/ai/generate-report
#[utoipa::path(
    post,
    path = "/api/ai/generate-report",
    tag = "Reports",
    request_body = GenerateReportRequest,
    responses(
        (status = 200, description = "Registros que atendem à consulta", body = ReportResponse),
        (status = 500, description = "Serviço de IA indisponível ou resposta em formato inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_report(
    State(app_state): State<AppState>,
    Json(payload): Json<GenerateReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    payload.validate()?;
    let report_data = app_state
        .report_service
        .generate(&payload.query, payload.data)
        .await?;
    Ok(Json(ReportResponse { report_data }))
}
