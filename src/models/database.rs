// src/models/database.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{
    equipment::Equipment, history::EquipmentHistory, license::License, settings::ConfigEntry,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    pub has_backup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_timestamp: Option<DateTime<Utc>>,
}

/// Conteúdo de um arquivo de backup (JSON).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSnapshot {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub equipment: Vec<Equipment>,
    pub history: Vec<EquipmentHistory>,
    pub licenses: Vec<License>,
    pub config: Vec<ConfigEntry>,
}

impl DatabaseSnapshot {
    pub const FORMAT_VERSION: u32 = 1;
}
