// src/models/audit.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Login,
    Create,
    Update,
    Delete,
    Approve,
    Reject,
    Backup,
    Restore,
    Clear,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::Login => "LOGIN",
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
            AuditAction::Backup => "BACKUP",
            AuditAction::Restore => "RESTORE",
            AuditAction::Clear => "CLEAR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    Equipment,
    License,
    User,
    Settings,
    Product,
    Database,
}

impl AuditTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditTarget::Equipment => "EQUIPMENT",
            AuditTarget::License => "LICENSE",
            AuditTarget::User => "USER",
            AuditTarget::Settings => "SETTINGS",
            AuditTarget::Product => "PRODUCT",
            AuditTarget::Database => "DATABASE",
        }
    }
}

// Linha do log de auditoria (append-only)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: i32,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[schema(example = "admin")]
    pub username: Option<String>,
    #[schema(example = "UPDATE")]
    pub action_type: String,
    #[schema(example = "EQUIPMENT")]
    pub target_type: String,
    pub target_id: Option<String>,
    pub details: Option<String>,
}

/// Entrada a ser gravada.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub username: String,
    pub action: AuditAction,
    pub target: AuditTarget,
    pub target_id: Option<String>,
    pub details: String,
}

impl NewAuditEntry {
    pub fn new(
        username: impl Into<String>,
        action: AuditAction,
        target: AuditTarget,
        details: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            action,
            target,
            target_id: None,
            details: details.into(),
        }
    }

    pub fn with_target_id(mut self, id: impl ToString) -> Self {
        self.target_id = Some(id.to_string());
        self
    }
}
