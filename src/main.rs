//src/main.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use rand::{distributions::Alphanumeric, Rng};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod importer;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::db::{
    migrations::{self, ADMIN_SEED_ID, COLUMN_REPAIRS},
    migrator::{Migrator, PgSchemaTarget, SchemaTarget},
};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::auth::hash_password;

// CSVs grandes e avatares em base64
const BODY_LIMIT: usize = 50 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let app_state = AppState::new(config).await?;

    run_migrations(&app_state).await?;

    // Rotas públicas
    let public_routes = Router::new()
        .route("/api/health", get(handlers::auth::health))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/verify-2fa", post(handlers::two_factor::verify));

    let two_factor_routes = Router::new()
        .route("/generate-2fa", post(handlers::two_factor::generate))
        .route("/enable-2fa", post(handlers::two_factor::enable))
        .route("/disable-2fa", post(handlers::two_factor::disable))
        .route("/disable-user-2fa", post(handlers::two_factor::disable_for_user));

    let user_routes = Router::new()
        .route("/",
               get(handlers::users::list_users)
               .post(handlers::users::create_user)
        )
        .route("/{id}",
               put(handlers::users::update_user)
               .delete(handlers::users::delete_user)
        )
        .route("/{id}/profile", put(handlers::users::update_profile));

    let equipment_routes = Router::new()
        .route("/",
               get(handlers::equipment::list_equipment)
               .post(handlers::equipment::create_equipment)
        )
        .route("/{id}",
               put(handlers::equipment::update_equipment)
               .delete(handlers::equipment::delete_equipment)
        )
        .route("/{id}/history", get(handlers::equipment::equipment_history))
        .route("/periodic-update", post(handlers::equipment::periodic_update))
        .route("/periodic-update/csv", post(handlers::equipment::periodic_update_csv))
        .route("/parse-csv", post(handlers::equipment::parse_csv))
        .route("/import", post(handlers::equipment::import_equipment));

    let license_routes = Router::new()
        .route("/",
               get(handlers::licenses::list_licenses)
               .post(handlers::licenses::create_license)
        )
        .route("/{id}",
               put(handlers::licenses::update_license)
               .delete(handlers::licenses::delete_license)
        )
        .route("/totals",
               get(handlers::licenses::get_totals)
               .post(handlers::licenses::save_totals)
        )
        .route("/rename-product", post(handlers::licenses::rename_product))
        .route("/import", post(handlers::licenses::import_licenses));

    let approval_routes = Router::new()
        .route("/pending", get(handlers::approvals::list_pending))
        .route("/approve", post(handlers::approvals::approve))
        .route("/reject", post(handlers::approvals::reject));

    let database_routes = Router::new()
        .route("/backup-status", get(handlers::database::backup_status))
        .route("/backup", post(handlers::database::backup))
        .route("/restore", post(handlers::database::restore))
        .route("/clear", post(handlers::database::clear));

    // Tudo abaixo exige Bearer token
    let protected_routes = Router::new()
        .merge(two_factor_routes)
        .route("/settings",
               get(handlers::settings::get_settings)
               .post(handlers::settings::update_settings)
        )
        .route("/config/termo-templates", get(handlers::settings::termo_templates))
        .route("/audit-log", get(handlers::settings::audit_log))
        .route("/ai/generate-report", post(handlers::report::generate_report))
        .nest("/users", user_routes)
        .nest("/equipment", equipment_routes)
        .nest("/licenses", license_routes)
        .nest("/approvals", approval_routes)
        .nest("/database", database_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let port = app_state.config.api_port;

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes)
        .nest("/api", protected_routes)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Senha do admin inicial, decidida antes de rodar o ledger.
#[derive(Debug, PartialEq, Eq)]
enum AdminSeed {
    Configured(String),
    Generated,
    NotNeeded,
}

fn admin_seed(configured: Option<&str>, seed_pending: bool) -> AdminSeed {
    match (seed_pending, configured) {
        (false, _) => AdminSeed::NotNeeded,
        (true, Some(password)) => AdminSeed::Configured(password.to_string()),
        (true, None) => AdminSeed::Generated,
    }
}

fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

async fn run_migrations(app_state: &AppState) -> anyhow::Result<()> {
    let config = &app_state.config;
    let target = PgSchemaTarget::new(app_state.db_pool.clone());

    target.ensure_ledger().await?;
    let seed_pending = !target.applied_ids().await?.contains(&ADMIN_SEED_ID);

    // Com o admin já criado a migração não roda de novo; o hash não é usado
    let admin_hash = match admin_seed(config.admin_initial_password.as_deref(), seed_pending) {
        AdminSeed::NotNeeded => String::new(),
        AdminSeed::Configured(password) => hash_password(&password, config.bcrypt_cost).await?,
        AdminSeed::Generated => {
            let generated = random_password();
            tracing::warn!(
                "ADMIN_INITIAL_PASSWORD não definida. Senha gerada para o admin inicial: {}",
                generated
            );
            hash_password(&generated, config.bcrypt_cost).await?
        }
    };

    Migrator::new(target, COLUMN_REPAIRS, migrations::all(&admin_hash))
    .fail_closed(config.migrations_fail_closed)
    .run()
    .await?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn admin_password_is_only_chosen_while_the_seed_is_pending() {
        assert_eq!(admin_seed(Some("s3nha"), false), AdminSeed::NotNeeded);
        assert_eq!(admin_seed(None, false), AdminSeed::NotNeeded);
        assert_eq!(admin_seed(Some("s3nha"), true), AdminSeed::Configured("s3nha".into()));
        assert_eq!(admin_seed(None, true), AdminSeed::Generated);
    }

    #[test]
    fn generated_passwords_are_alphanumeric() {
        let password = random_password();
        assert_eq!(password.len(), 16);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(password, random_password());
    }
}
