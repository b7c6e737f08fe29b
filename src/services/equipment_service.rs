// src/services/equipment_service.rs

use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::{db_utils::RowMeta, error::AppError},
    db::{AuditRepository, EquipmentRepository, HistoryRepository},
    models::{
        approval::ApprovalStatus,
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::User,
        equipment::{Equipment, EquipmentInput},
        history::{ChangeType, EquipmentHistory},
    },
};

fn not_found() -> AppError {
    AppError::NotFound("Equipamento não encontrado.".into())
}

#[derive(Clone)]
pub struct EquipmentService {
    equipment_repo: EquipmentRepository,
    history_repo: HistoryRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl EquipmentService {
    pub fn new(
        equipment_repo: EquipmentRepository,
        history_repo: HistoryRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            equipment_repo,
            history_repo,
            audit_repo,
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<Equipment>, AppError> {
        self.equipment_repo.list_approved().await
    }

    pub async fn history(&self, equipment_id: i32) -> Result<Vec<EquipmentHistory>, AppError> {
        self.history_repo.list_by_equipment(equipment_id).await
    }

    /// Cria o item (pendente se o autor não for Admin), com histórico e auditoria.
    pub async fn create(&self, actor: &User, input: EquipmentInput) -> Result<Equipment, AppError> {
        input.validate_for_create()?;

        let snapshot = serde_json::to_string(&input)?;
        let meta = RowMeta::new(ApprovalStatus::for_creator(actor.role), Some(actor.id));

        let mut tx = self.pool.begin().await?;

        let created = self.equipment_repo.insert(&mut *tx, &input, meta).await?;
        self.history_repo
            .record(&mut *tx, created.id, &actor.username, ChangeType::Create, None, Some(&snapshot))
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Create,
                    AuditTarget::Equipment,
                    format!("Created equipment: {}", created.equipamento),
                )
                .with_target_id(created.id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("Equipamento {} criado por '{}' ({:?})", created.id, actor.username, created.approval_status);
        Ok(created)
    }

    /// Atualiza só os campos enviados; o histórico guarda a linha anterior inteira.
    pub async fn update(&self, actor: &User, id: i32, input: EquipmentInput) -> Result<Equipment, AppError> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;

        let before = self
            .equipment_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or_else(not_found)?;

        let updated = self
            .equipment_repo
            .update_columns(&mut *tx, id, input.columns())
            .await?
            .ok_or_else(not_found)?;

        let from_value = serde_json::to_string(&before)?;
        let to_value = serde_json::to_string(&input)?;
        self.history_repo
            .record(
                &mut *tx,
                id,
                &actor.username,
                ChangeType::Update,
                Some(&from_value),
                Some(&to_value),
            )
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::Equipment,
                    format!("Updated equipment: {}", updated.equipamento),
                )
                .with_target_id(id),
            )
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Exclusão definitiva; o histórico sai em cascata.
    pub async fn delete(&self, actor: &User, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.equipment_repo.delete(&mut *tx, id).await? {
            return Err(not_found());
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(&actor.username, AuditAction::Delete, AuditTarget::Equipment, "Deleted equipment")
                    .with_target_id(id),
            )
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
