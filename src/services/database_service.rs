// src/services/database_service.rs

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::path::{Path, PathBuf};

use crate::{
    common::{
        db_utils::{reseed_identity, RowMeta},
        error::AppError,
    },
    db::{
        AuditRepository, EquipmentRepository, HistoryRepository, LicenseRepository, SettingsRepository,
        UserRepository,
    },
    models::{
        audit::{AuditAction, AuditTarget, NewAuditEntry},
        auth::User,
        database::{BackupStatus, DatabaseSnapshot},
        equipment::EquipmentInput,
        license::LicenseInput,
    },
};

const BACKUP_PREFIX: &str = "backup-";
const BACKUP_EXTENSION: &str = ".json";

fn is_backup_file(name: &str) -> bool {
    name.starts_with(BACKUP_PREFIX) && name.ends_with(BACKUP_EXTENSION)
}

/// Nome do arquivo mais recente (os nomes carregam o instante em milissegundos).
fn newest_backup_name<I>(names: I) -> Option<String>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .filter(|name| is_backup_file(name))
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
}

async fn latest_backup(dir: &Path) -> Result<Option<PathBuf>, AppError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(newest_backup_name(names).map(|name| dir.join(name)))
}

#[derive(Clone)]
pub struct DatabaseService {
    equipment_repo: EquipmentRepository,
    history_repo: HistoryRepository,
    license_repo: LicenseRepository,
    settings_repo: SettingsRepository,
    user_repo: UserRepository,
    audit_repo: AuditRepository,
    pool: PgPool,
    backup_dir: PathBuf,
}

impl DatabaseService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        equipment_repo: EquipmentRepository,
        history_repo: HistoryRepository,
        license_repo: LicenseRepository,
        settings_repo: SettingsRepository,
        user_repo: UserRepository,
        audit_repo: AuditRepository,
        pool: PgPool,
        backup_dir: PathBuf,
    ) -> Self {
        Self {
            equipment_repo,
            history_repo,
            license_repo,
            settings_repo,
            user_repo,
            audit_repo,
            pool,
            backup_dir,
        }
    }

    pub async fn backup_status(&self) -> Result<BackupStatus, AppError> {
        let Some(path) = latest_backup(&self.backup_dir).await? else {
            return Ok(BackupStatus {
                has_backup: false,
                backup_timestamp: None,
            });
        };
        let modified = tokio::fs::metadata(&path).await?.modified()?;
        Ok(BackupStatus {
            has_backup: true,
            backup_timestamp: Some(DateTime::<Utc>::from(modified)),
        })
    }

    /// Grava um snapshot JSON (equipamentos, histórico, licenças e configurações).
    pub async fn backup(&self, actor: &User) -> Result<PathBuf, AppError> {
        let mut tx = self.pool.begin().await?;
        let snapshot = DatabaseSnapshot {
            format_version: DatabaseSnapshot::FORMAT_VERSION,
            created_at: Utc::now(),
            equipment: self.equipment_repo.list_all(&mut *tx).await?,
            history: self.history_repo.list_all(&mut *tx).await?,
            licenses: self.license_repo.list_all(&mut *tx).await?,
            config: self.settings_repo.list_all(&mut *tx).await?,
        };
        tx.commit().await?;

        tokio::fs::create_dir_all(&self.backup_dir).await?;
        let path = self.backup_dir.join(format!(
            "{}{}{}",
            BACKUP_PREFIX,
            snapshot.created_at.timestamp_millis(),
            BACKUP_EXTENSION
        ));
        tokio::fs::write(&path, serde_json::to_vec_pretty(&snapshot)?).await?;

        self.audit_repo
            .record(
                &self.pool,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Backup,
                    AuditTarget::Database,
                    "Realizou backup do banco de dados",
                ),
            )
            .await?;

        tracing::info!(
            "Backup gravado em {} ({} equipamentos, {} licenças)",
            path.display(),
            snapshot.equipment.len(),
            snapshot.licenses.len()
        );
        Ok(path)
    }

    /// Substitui os dados pelo snapshot mais recente, numa transação só.
    pub async fn restore(&self, actor: &User) -> Result<(), AppError> {
        let path = latest_backup(&self.backup_dir)
            .await?
            .ok_or_else(|| AppError::NotFound("Nenhum backup encontrado.".into()))?;

        let bytes = tokio::fs::read(&path).await?;
        let snapshot: DatabaseSnapshot = serde_json::from_slice(&bytes)?;
        if snapshot.format_version > DatabaseSnapshot::FORMAT_VERSION {
            return Err(AppError::BadRequest(format!(
                "Versão de backup não suportada: {}",
                snapshot.format_version
            )));
        }

        let mut tx = self.pool.begin().await?;

        self.history_repo.delete_all(&mut *tx).await?;
        self.equipment_repo.delete_all(&mut *tx).await?;
        self.license_repo.delete_all(&mut *tx).await?;
        self.settings_repo.delete_all(&mut *tx).await?;

        for row in &snapshot.equipment {
            let meta = RowMeta {
                id: Some(row.id),
                approval_status: row.approval_status,
                rejection_reason: row.rejection_reason.clone(),
                created_by_id: row.created_by_id,
            };
            self.equipment_repo
                .insert(&mut *tx, &EquipmentInput::from(row), meta)
                .await?;
        }
        for entry in &snapshot.history {
            self.history_repo.restore(&mut *tx, entry).await?;
        }
        for row in &snapshot.licenses {
            let meta = RowMeta {
                id: Some(row.id),
                approval_status: row.approval_status,
                rejection_reason: row.rejection_reason.clone(),
                created_by_id: row.created_by_id,
            };
            self.license_repo
                .insert(&mut *tx, &LicenseInput::from(row), meta)
                .await?;
        }
        for entry in &snapshot.config {
            self.settings_repo
                .upsert(&mut *tx, &entry.config_key, entry.config_value.as_deref())
                .await?;
        }

        for table in ["equipment", "equipment_history", "licenses"] {
            reseed_identity(&mut *tx, table).await?;
        }

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Restore,
                    AuditTarget::Database,
                    "Restaurou backup do banco de dados",
                ),
            )
            .await?;

        tx.commit().await?;

        tracing::warn!("Banco restaurado por '{}' a partir de {}", actor.username, path.display());
        Ok(())
    }

    /// Apaga inventário, licenças e usuários que não são Admin.
    pub async fn clear(&self, actor: &User) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        self.history_repo.delete_all(&mut *tx).await?;
        self.equipment_repo.delete_all(&mut *tx).await?;
        self.license_repo.delete_all(&mut *tx).await?;
        let removed_users = self.user_repo.delete_non_admins(&mut *tx).await?;

        self.audit_repo
            .record(
                &mut *tx,
                &NewAuditEntry::new(
                    &actor.username,
                    AuditAction::Clear,
                    AuditTarget::Database,
                    "Resetou o banco de dados (mantendo admin)",
                ),
            )
            .await?;

        tx.commit().await?;

        tracing::warn!("Banco limpo por '{}' ({} usuários removidos)", actor.username, removed_users);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn picks_the_newest_backup_file() {
        let names = vec![
            "backup-999.json".to_string(),
            "backup-1700000000000.json".to_string(),
            "backup-1700000000500.json".to_string(),
            "notas.txt".to_string(),
            "backup-1800000000000.sql".to_string(),
        ];
        assert_eq!(newest_backup_name(names).as_deref(), Some("backup-1700000000500.json"));
    }

    #[test]
    fn no_backup_files_means_none() {
        assert_eq!(newest_backup_name(vec!["leia-me.md".to_string()]), None);
    }

    #[tokio::test]
    async fn missing_directory_has_no_backup() {
        let dir = std::env::temp_dir().join("inventario-api-sem-backups-inexistente");
        assert_eq!(latest_backup(&dir).await.unwrap(), None);
    }

    #[tokio::test]
    async fn finds_latest_file_on_disk() {
        let dir = std::env::temp_dir().join(format!("inventario-api-backups-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("backup-1000.json"), b"{}").await.unwrap();
        tokio::fs::write(dir.join("backup-2000.json"), b"{}").await.unwrap();

        let latest = latest_backup(&dir).await.unwrap();
        assert_eq!(latest, Some(dir.join("backup-2000.json")));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
