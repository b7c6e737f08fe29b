// src/models/approval.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{audit::AuditTarget, auth::UserRole};

// pending_approval -> approved | rejected (ambos terminais)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    PendingApproval,
    Rejected,
}

impl ApprovalStatus {
    /// Status inicial de um registro criado manualmente.
    pub fn for_creator(role: UserRole) -> Self {
        match role {
            UserRole::Admin => ApprovalStatus::Approved,
            UserRole::UserManager | UserRole::User => ApprovalStatus::PendingApproval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalItemType {
    Equipment,
    License,
}

impl ApprovalItemType {
    pub fn table(self) -> &'static str {
        match self {
            ApprovalItemType::Equipment => "equipment",
            ApprovalItemType::License => "licenses",
        }
    }

    pub fn audit_target(self) -> AuditTarget {
        match self {
            ApprovalItemType::Equipment => AuditTarget::Equipment,
            ApprovalItemType::License => AuditTarget::License,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ApprovalItemType::Equipment => "equipment",
            ApprovalItemType::License => "license",
        }
    }
}

/// Item aguardando revisão do administrador.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingItem {
    pub id: i32,
    #[schema(example = "Notebook Dell Latitude 5420")]
    pub name: String,
    #[schema(example = "equipment")]
    pub item_type: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApprovePayload {
    #[serde(rename = "type")]
    pub item_type: ApprovalItemType,
    pub id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectPayload {
    #[serde(rename = "type")]
    pub item_type: ApprovalItemType,
    pub id: i32,
    #[validate(length(min = 1, message = "O motivo da rejeição é obrigatório."))]
    #[schema(example = "Número de série duplicado")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_admins_create_approved_records() {
        assert_eq!(ApprovalStatus::for_creator(UserRole::Admin), ApprovalStatus::Approved);
        assert_eq!(
            ApprovalStatus::for_creator(UserRole::UserManager),
            ApprovalStatus::PendingApproval
        );
        assert_eq!(ApprovalStatus::for_creator(UserRole::User), ApprovalStatus::PendingApproval);
    }

    #[test]
    fn reject_requires_a_reason() {
        let payload: RejectPayload =
            serde_json::from_value(json!({ "type": "license", "id": 4, "reason": "" })).unwrap();
        assert!(payload.validate().is_err());
        assert_eq!(payload.item_type.table(), "licenses");
    }

    #[test]
    fn status_serializes_like_the_database_labels() {
        assert_eq!(
            serde_json::to_value(ApprovalStatus::PendingApproval).unwrap(),
            json!("pending_approval")
        );
    }
}
