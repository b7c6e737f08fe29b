// src/services/settings_service.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{AuditRepository, SettingsRepository},
    models::{
        audit::{AuditAction, AuditLogEntry, AuditTarget, NewAuditEntry},
        auth::User,
        settings::{keys, AppSettings, SettingsUpdate, TermoTemplates},
    },
};

const AUDIT_LOG_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct SettingsService {
    settings_repo: SettingsRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
}

impl SettingsService {
    pub fn new(settings_repo: SettingsRepository, audit_repo: AuditRepository, pool: PgPool) -> Self {
        Self {
            settings_repo,
            audit_repo,
            pool,
        }
    }

    pub async fn get(&self) -> Result<AppSettings, AppError> {
        let entries = self.settings_repo.list_all(&self.pool).await?;
        Ok(AppSettings::from_entries(&entries))
    }

    /// Grava cada campo enviado; devolve a visão atualizada.
    pub async fn update(&self, actor: &User, update: SettingsUpdate) -> Result<AppSettings, AppError> {
        let entries = update.entries();
        if entries.is_empty() {
            return Err(AppError::BadRequest("Nenhuma configuração informada.".into()));
        }

        let mut tx = self.pool.begin().await?;
        for (key, value) in &entries {
            self.settings_repo.upsert(&mut *tx, key, Some(value)).await?;
        }
        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Update,
                    AuditTarget::Settings,
                    "Configurações do sistema atualizadas",
                ),
            )
            .await?;
        tx.commit().await?;

        tracing::info!("Configurações atualizadas por '{}' ({} chaves)", actor.username, entries.len());
        self.get().await
    }

    pub async fn termo_templates(&self) -> Result<TermoTemplates, AppError> {
        let entries = self
            .settings_repo
            .list_by_keys(&[keys::TERMO_ENTREGA, keys::TERMO_DEVOLUCAO])
            .await?;
        Ok(TermoTemplates::from_entries(&entries))
    }

    pub async fn audit_log(&self) -> Result<Vec<AuditLogEntry>, AppError> {
        self.audit_repo.list_recent(AUDIT_LOG_LIMIT).await
    }
}
