// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        ApprovalRepository, AuditRepository, EquipmentRepository, HistoryRepository,
        LicenseRepository, SettingsRepository, UserRepository,
    },
    services::{
        approval_service::ApprovalService,
        auth::AuthService,
        database_service::DatabaseService,
        equipment_service::EquipmentService,
        import_service::ImportService,
        license_service::LicenseService,
        report_service::{OllamaReportGenerator, ReportService},
        settings_service::SettingsService,
        two_factor::{TotpAuthenticator, TwoFactorService},
        user_service::UserService,
    },
};

/// Configuração lida do ambiente (.env é opcional).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub api_port: u16,
    pub db_max_connections: u32,
    pub backup_dir: PathBuf,
    pub bcrypt_cost: u32,
    pub admin_initial_password: Option<String>,
    pub ollama_url: String,
    pub ollama_model: String,
    pub report_timeout: Duration,
    pub migrations_fail_closed: bool,
    pub totp_issuer: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_port: parsed_or("API_PORT", 3001)?,
            db_max_connections: parsed_or("DB_MAX_CONNECTIONS", 10)?,
            backup_dir: PathBuf::from(optional("BACKUP_DIR").unwrap_or_else(|| "./backups".into())),
            bcrypt_cost: parsed_or("BCRYPT_COST", 10)?,
            admin_initial_password: optional("ADMIN_INITIAL_PASSWORD"),
            ollama_url: optional("OLLAMA_URL").unwrap_or_else(|| "http://127.0.0.1:11434".into()),
            ollama_model: optional("OLLAMA_MODEL").unwrap_or_else(|| "llama3.2".into()),
            report_timeout: Duration::from_secs(parsed_or("REPORT_TIMEOUT_SECS", 120)?),
            migrations_fail_closed: parsed_or("MIGRATIONS_FAIL_CLOSED", false)?,
            totp_issuer: optional("TOTP_ISSUER").unwrap_or_else(|| "InventarioPro".into()),
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).with_context(|| format!("{} deve ser definida", key))
}

// Variável vazia conta como ausente.
fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Valor inválido para {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub two_factor_service: TwoFactorService,
    pub user_service: UserService,
    pub equipment_service: EquipmentService,
    pub import_service: ImportService,
    pub license_service: LicenseService,
    pub approval_service: ApprovalService,
    pub settings_service: SettingsService,
    pub database_service: DatabaseService,
    pub report_service: ReportService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let user_repo = UserRepository::new(db_pool.clone());
        let equipment_repo = EquipmentRepository::new(db_pool.clone());
        let history_repo = HistoryRepository::new(db_pool.clone());
        let license_repo = LicenseRepository::new(db_pool.clone());
        let audit_repo = AuditRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());
        let approval_repo = ApprovalRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            audit_repo.clone(),
            config.jwt_secret.clone(),
            db_pool.clone(),
        );
        let two_factor_service = TwoFactorService::new(
            user_repo.clone(),
            auth_service.clone(),
            Arc::new(TotpAuthenticator::new(config.totp_issuer.clone())),
        );
        let user_service = UserService::new(
            user_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
            config.bcrypt_cost,
        );
        let equipment_service = EquipmentService::new(
            equipment_repo.clone(),
            history_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let import_service = ImportService::new(
            equipment_repo.clone(),
            history_repo.clone(),
            audit_repo.clone(),
            settings_repo.clone(),
            db_pool.clone(),
        );
        let license_service = LicenseService::new(
            license_repo.clone(),
            settings_repo.clone(),
            audit_repo.clone(),
            db_pool.clone(),
        );
        let approval_service = ApprovalService::new(approval_repo, audit_repo.clone(), db_pool.clone());
        let settings_service = SettingsService::new(settings_repo.clone(), audit_repo.clone(), db_pool.clone());
        let database_service = DatabaseService::new(
            equipment_repo.clone(),
            history_repo,
            license_repo,
            settings_repo,
            user_repo,
            audit_repo,
            db_pool.clone(),
            config.backup_dir.clone(),
        );

        let generator = OllamaReportGenerator::new(
            &config.ollama_url,
            &config.ollama_model,
            config.report_timeout,
        )?;
        let report_service = ReportService::new(Arc::new(generator), equipment_repo);

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            two_factor_service,
            user_service,
            equipment_service,
            import_service,
            license_service,
            approval_service,
            settings_service,
            database_service,
            report_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Chaves exclusivas deste teste para não disputar o ambiente com os outros.
    #[test]
    fn parses_optional_values_with_defaults() {
        unsafe {
            env::set_var("INVENTARIO_TEST_PORT", " 8080 ");
            env::set_var("INVENTARIO_TEST_EMPTY", "   ");
            env::set_var("INVENTARIO_TEST_BAD", "abc");
        }

        assert_eq!(parsed_or::<u16>("INVENTARIO_TEST_PORT", 3001).unwrap(), 8080);
        assert_eq!(parsed_or::<u16>("INVENTARIO_TEST_EMPTY", 3001).unwrap(), 3001);
        assert_eq!(parsed_or::<u16>("INVENTARIO_TEST_MISSING", 3001).unwrap(), 3001);
        assert!(parsed_or::<u16>("INVENTARIO_TEST_BAD", 3001).is_err());
        assert!(required("INVENTARIO_TEST_EMPTY").is_err());
    }
}
