// src/models/history.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Nota fixa gravada quando a importação periódica cria um equipamento.
pub const IMPORT_CREATE_NOTE: &str = "Importado via Atualização Periódica";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Create,
    Update,
    UpdateAuto,
    CreateImport,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Create => "CREATE",
            ChangeType::Update => "UPDATE",
            ChangeType::UpdateAuto => "UPDATE (AUTO)",
            ChangeType::CreateImport => "CREATE (IMPORT)",
        }
    }
}

// --- Histórico do equipamento (imutável) ---
// `from_value`/`to_value` guardam o estado anterior/posterior como texto
// (JSON da linha completa nas edições manuais, valor do campo no merge).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentHistory {
    pub id: i32,
    pub equipment_id: Option<i32>,
    #[serde(rename = "timestamp")]
    pub changed_at: DateTime<Utc>,
    #[schema(example = "admin")]
    pub changed_by: Option<String>,
    #[schema(example = "UPDATE (AUTO)")]
    pub change_type: String,
    #[schema(example = "Alice")]
    pub from_value: Option<String>,
    #[schema(example = "Bob")]
    pub to_value: Option<String>,
}
