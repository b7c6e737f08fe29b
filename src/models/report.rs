// src/models/report.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateReportRequest {
    #[validate(length(min = 1, message = "A consulta é obrigatória."))]
    #[schema(example = "Notebooks Dell em manutenção no setor financeiro")]
    pub query: String,
    // Quando ausente, o servidor usa a lista de equipamentos aprovados
    #[schema(value_type = Option<Vec<Object>>)]
    pub data: Option<Vec<Value>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[schema(value_type = Vec<Object>)]
    pub report_data: Vec<Value>,
}
