// src/services/license_service.rs

use sqlx::PgPool;
use validator::Validate;

use crate::{
    common::{db_utils::RowMeta, error::AppError},
    db::{AuditRepository, LicenseRepository, SettingsRepository},
    models::{
        approval::ApprovalStatus,
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::User,
        license::{License, LicenseInput, LicenseTotals},
        settings::keys,
    },
};

fn not_found() -> AppError {
    AppError::NotFound("Licença não encontrada.".into())
}

#[derive(Clone)]
pub struct LicenseService {
    license_repo: LicenseRepository,
    settings_repo: SettingsRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl LicenseService {
    pub fn new(
        license_repo: LicenseRepository,
        settings_repo: SettingsRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            license_repo,
            settings_repo,
            audit_repo,
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<License>, AppError> {
        self.license_repo.list_approved().await
    }

    pub async fn create(&self, actor: &User, input: LicenseInput) -> Result<License, AppError> {
        input.validate_for_create()?;
        let meta = RowMeta::new(ApprovalStatus::for_creator(actor.role), Some(actor.id));

        let mut tx = self.pool.begin().await?;
        let created = self.license_repo.insert(&mut *tx, &input, meta).await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Create,
                    AuditTarget::License,
                    format!("Created license for: {}", created.produto),
                )
                .with_target_id(created.id),
            )
            .await?;
        tx.commit().await?;

        Ok(created)
    }

    pub async fn update(&self, actor: &User, id: i32, input: LicenseInput) -> Result<License, AppError> {
        input.validate()?;

        let mut tx = self.pool.begin().await?;
        let updated = self
            .license_repo
            .update(&mut *tx, id, &input)
            .await?
            .ok_or_else(not_found)?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::License,
                    format!("Updated license for: {}", updated.produto),
                )
                .with_target_id(id),
            )
            .await?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete(&self, actor: &User, id: i32) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        if !self.license_repo.delete(&mut *tx, id).await? {
            return Err(not_found());
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(&actor.username, AuditAction::Delete, AuditTarget::License, "Deleted license")
                    .with_target_id(id),
            )
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // --- Totais por produto ---

    pub async fn totals(&self) -> Result<LicenseTotals, AppError> {
        let raw = self.settings_repo.get(&self.pool, keys::LICENSE_TOTALS).await?;
        Ok(LicenseTotals::decode(raw.as_deref()))
    }

    pub async fn save_totals(&self, actor: &User, totals: LicenseTotals) -> Result<LicenseTotals, AppError> {
        if let Some((product, _)) = totals.totals.iter().find(|(_, quantity)| **quantity < 0) {
            return Err(AppError::BadRequest(format!(
                "Quantidade inválida para '{}': o total não pode ser negativo.",
                product
            )));
        }
        let encoded = totals.encode()?;

        let mut tx = self.pool.begin().await?;
        self.settings_repo
            .upsert(&mut *tx, keys::LICENSE_TOTALS, Some(&encoded))
            .await?;
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::Settings,
                    "Atualizou totais de licenças",
                ),
            )
            .await?;
        tx.commit().await?;

        Ok(totals)
    }

    /// Renomeia o produto nas licenças e move o total junto, numa transação só.
    pub async fn rename_product(&self, actor: &User, old_name: &str, new_name: &str) -> Result<u64, AppError> {
        let old_name = old_name.trim();
        let new_name = new_name.trim();
        if old_name.is_empty() || new_name.is_empty() {
            return Err(AppError::BadRequest("Informe o nome atual e o novo nome do produto.".into()));
        }

        let mut tx = self.pool.begin().await?;

        let renamed = self.license_repo.rename_product(&mut *tx, old_name, new_name).await?;

        let raw = self.settings_repo.get(&mut *tx, keys::LICENSE_TOTALS).await?;
        let mut totals = LicenseTotals::decode(raw.as_deref());
        if totals.totals.contains_key(old_name) {
            totals.rename(old_name, new_name);
            self.settings_repo
                .upsert(&mut *tx, keys::LICENSE_TOTALS, Some(&totals.encode()?))
                .await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::Product,
                    format!("Renomeou produto de \"{}\" para \"{}\"", old_name, new_name),
                ),
            )
            .await?;

        tx.commit().await?;

        tracing::info!("Produto '{}' renomeado para '{}' ({} licenças)", old_name, new_name, renamed);
        Ok(renamed)
    }

    /// Troca todas as licenças de um produto pela lista recebida.
    pub async fn import(
        &self,
        actor: &User,
        product_name: &str,
        licenses: Vec<LicenseInput>,
    ) -> Result<String, AppError> {
        let licenses: Vec<LicenseInput> = licenses
            .into_iter()
            .map(|license| LicenseInput {
                produto: Some(product_name.to_string()),
                ..license
            })
            .collect();
        for license in &licenses {
            license.validate_for_create()?;
        }

        let mut tx = self.pool.begin().await?;

        self.license_repo.delete_by_product(&mut *tx, product_name).await?;
        for license in &licenses {
            let meta = RowMeta::new(ApprovalStatus::Approved, Some(actor.id));
            self.license_repo.insert(&mut *tx, license, meta).await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::License,
                    format!("Importou via CSV {} licenças para: {}", licenses.len(), product_name),
                ),
            )
            .await?;

        tx.commit().await?;

        Ok(format!(
            "Importação concluída! {} licenças substituídas para {}.",
            licenses.len(),
            product_name
        ))
    }
}
