// src/services/approval_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ApprovalRepository, AuditRepository},
    models::{
        approval::{ApprovalItemType, PendingItem},
        audit::{AuditAction, NewAuditEntry},
        auth::User,
    },
};

fn not_pending() -> AppError {
    AppError::NotFound("Item pendente não encontrado.".into())
}

#[derive(Clone)]
pub struct ApprovalService {
    approval_repo: ApprovalRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl ApprovalService {
    pub fn new(approval_repo: ApprovalRepository, audit_repo: AuditRepository, pool: PgPool) -> Self {
        Self {
            approval_repo,
            audit_repo,
            pool,
        }
    }

    pub async fn pending(&self) -> Result<Vec<PendingItem>, AppError> {
        self.approval_repo.list_pending().await
    }

    pub async fn approve(&self, actor: &User, item_type: ApprovalItemType, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.approval_repo.approve(&mut *tx, item_type, id).await? {
            return Err(not_pending());
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Approve,
                    item_type.audit_target(),
                    format!("Approved {} item", item_type.label()),
                )
                .with_target_id(id),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn reject(
        &self,
        actor: &User,
        item_type: ApprovalItemType,
        id: i32,
        reason: &str,
    ) -> Result<(), AppError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::field("reason", "O motivo da rejeição é obrigatório."));
        }

        let mut tx = self.pool.begin().await?;

        if !self.approval_repo.reject(&mut *tx, item_type, id, reason).await? {
            return Err(not_pending());
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Reject,
                    item_type.audit_target(),
                    format!("Rejected {} item. Reason: {}", item_type.label(), reason),
                )
                .with_target_id(id),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
