// src/services/import_service.rs

use chrono::{SecondsFormat, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::{
    common::{db_utils::RowMeta, error::AppError},
    db::{AuditRepository, EquipmentRepository, HistoryRepository, SettingsRepository},
    importer::{
        csv::{parse_equipment_csv, CsvError},
        merge::{plan_merge, MergePlan},
    },
    models::{
        approval::ApprovalStatus,
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::User,
        equipment::{EquipmentInput, ImportResponse, ImportSummary},
        history::{ChangeType, IMPORT_CREATE_NOTE},
        settings::keys,
    },
};

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Importação de inventário: merge periódico por serial e substituição total.
#[derive(Clone)]
pub struct ImportService {
    equipment_repo: EquipmentRepository,
    history_repo: HistoryRepository,
    audit_repo: AuditRepository,
    settings_repo: SettingsRepository,
    pool: PgPool,
}

impl ImportService {
    pub fn new(
        equipment_repo: EquipmentRepository,
        history_repo: HistoryRepository,
        audit_repo: AuditRepository,
        settings_repo: SettingsRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            equipment_repo,
            history_repo,
            audit_repo,
            settings_repo,
            pool,
        }
    }

    /// Só interpreta o CSV (pré-visualização).
    pub fn parse_csv(&self, text: &str) -> Result<Vec<EquipmentInput>, AppError> {
        let rows = parse_equipment_csv(text)?;
        if rows.is_empty() {
            return Err(CsvError::NoValidRows.into());
        }
        Ok(rows)
    }

    pub async fn periodic_update_csv(&self, actor: &User, text: &str) -> Result<ImportResponse, AppError> {
        let rows = self.parse_csv(text)?;
        self.periodic_update(actor, rows).await
    }

    /// Merge do lote inteiro numa única transação: qualquer erro desfaz tudo.
    pub async fn periodic_update(
        &self,
        actor: &User,
        rows: Vec<EquipmentInput>,
    ) -> Result<ImportResponse, AppError> {
        let mut summary = ImportSummary {
            received: rows.len(),
            ..ImportSummary::default()
        };

        let mut tx = self.pool.begin().await?;

        for mut row in rows {
            row.normalize_serial();
            self.merge_row(&mut tx, actor, &row, &mut summary).await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::Equipment,
                    format!("Atualização periódica de {} itens", summary.received),
                ),
            )
            .await?;
        self.settings_repo
            .upsert(&mut *tx, keys::LAST_ABSOLUTE_UPDATE, Some(&now_iso()))
            .await?;

        tx.commit().await?;

        tracing::info!(
            "Atualização periódica por '{}': {} recebidos, {} criados, {} atualizados, {} sem mudança, {} ignorados",
            actor.username,
            summary.received,
            summary.created,
            summary.updated,
            summary.unchanged,
            summary.skipped
        );

        Ok(ImportResponse {
            success: true,
            message: "Atualização periódica concluída com sucesso.".into(),
            summary,
        })
    }

    async fn merge_row(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        actor: &User,
        row: &EquipmentInput,
        summary: &mut ImportSummary,
    ) -> Result<(), AppError> {
        // Linha já normalizada: o serial gravado é a própria chave de busca
        let Some(serial) = row.serial_key() else {
            summary.skipped += 1;
            return Ok(());
        };
        let current = self
            .equipment_repo
            .find_by_serial_for_update(&mut **tx, serial)
            .await?;

        match plan_merge(current.as_ref(), row) {
            MergePlan::Unchanged => summary.unchanged += 1,
            MergePlan::Update {
                equipment_id,
                changes,
            } => {
                let columns = changes
                    .iter()
                    .map(|change| (change.column, change.value.clone()))
                    .collect();
                self.equipment_repo
                    .update_columns(&mut **tx, equipment_id, columns)
                    .await?;

                for change in &changes {
                    self.history_repo
                        .record(
                            &mut **tx,
                            equipment_id,
                            &actor.username,
                            ChangeType::UpdateAuto,
                            Some(&change.from_value),
                            Some(&change.to_value),
                        )
                        .await?;
                }
                summary.updated += 1;
            }
            MergePlan::Insert => {
                // Itens importados já entram aprovados
                let meta = RowMeta::new(ApprovalStatus::Approved, Some(actor.id));
                let created = self.equipment_repo.insert(&mut **tx, row, meta).await?;
                self.history_repo
                    .record(
                        &mut **tx,
                        created.id,
                        &actor.username,
                        ChangeType::CreateImport,
                        None,
                        Some(IMPORT_CREATE_NOTE),
                    )
                    .await?;
                summary.created += 1;
            }
        }
        Ok(())
    }

    /// Substitui todo o inventário pela lista recebida (ids recomeçam em 1).
    pub async fn full_replacement(
        &self,
        actor: &User,
        rows: Vec<EquipmentInput>,
    ) -> Result<ImportResponse, AppError> {
        let received = rows.len();
        let mut tx = self.pool.begin().await?;

        self.equipment_repo.truncate_with_history(&mut *tx).await?;
        for mut row in rows {
            row.normalize_serial();
            let meta = RowMeta::new(ApprovalStatus::Approved, Some(actor.id));
            self.equipment_repo.insert(&mut *tx, &row, meta).await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Delete,
                    AuditTarget::Database,
                    "Substituição total do inventário via consolidação",
                ),
            )
            .await?;
        self.settings_repo
            .upsert(&mut *tx, keys::LAST_ABSOLUTE_UPDATE, Some(&now_iso()))
            .await?;
        self.settings_repo
            .upsert(&mut *tx, keys::INITIAL_CONSOLIDATION, Some("true"))
            .await?;

        tx.commit().await?;

        tracing::warn!("Inventário substituído por '{}' ({} itens)", actor.username, received);

        Ok(ImportResponse {
            success: true,
            message: "Inventário consolidado com sucesso.".into(),
            summary: ImportSummary {
                received,
                created: received,
                ..ImportSummary::default()
            },
        })
    }
}
