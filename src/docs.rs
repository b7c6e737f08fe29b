// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Health / Auth ---
        handlers::auth::health,
        handlers::auth::login,

        // --- 2FA ---
        handlers::two_factor::generate,
        handlers::two_factor::enable,
        handlers::two_factor::verify,
        handlers::two_factor::disable,
        handlers::two_factor::disable_for_user,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::users::update_profile,

        // --- Equipment ---
        handlers::equipment::list_equipment,
        handlers::equipment::create_equipment,
        handlers::equipment::update_equipment,
        handlers::equipment::delete_equipment,
        handlers::equipment::equipment_history,
        handlers::equipment::periodic_update,
        handlers::equipment::periodic_update_csv,
        handlers::equipment::parse_csv,
        handlers::equipment::import_equipment,

        // --- Licenses ---
        handlers::licenses::list_licenses,
        handlers::licenses::create_license,
        handlers::licenses::update_license,
        handlers::licenses::delete_license,
        handlers::licenses::get_totals,
        handlers::licenses::save_totals,
        handlers::licenses::rename_product,
        handlers::licenses::import_licenses,

        // --- Approvals ---
        handlers::approvals::list_pending,
        handlers::approvals::approve,
        handlers::approvals::reject,

        // --- Settings ---
        handlers::settings::get_settings,
        handlers::settings::update_settings,
        handlers::settings::termo_templates,
        handlers::settings::audit_log,

        // --- Database ---
        handlers::database::backup_status,
        handlers::database::backup,
        handlers::database::restore,
        handlers::database::clear,

        // --- Reports ---
        handlers::report::generate_report,
    ),
    components(
        schemas(
            models::response::ActionResponse,

            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::LoginResponse,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::CreateUserRequest,
            models::auth::UpdateUserRequest,
            models::auth::UpdateProfilePayload,
            models::auth::TwoFactorSetup,
            models::auth::EnableTwoFactorPayload,
            models::auth::VerifyTwoFactorPayload,
            models::auth::DisableUserTwoFactorPayload,

            // --- Equipment ---
            models::equipment::EquipmentStatus,
            models::equipment::TermCondition,
            models::equipment::Equipment,
            models::equipment::EquipmentInput,
            models::equipment::EquipmentRequest,
            models::equipment::EquipmentListRequest,
            models::equipment::ImportSummary,
            models::equipment::ImportResponse,
            models::history::EquipmentHistory,

            // --- Licenses ---
            models::license::License,
            models::license::LicenseInput,
            models::license::LicenseRequest,
            models::license::LicenseTotals,
            models::license::TotalsRequest,
            models::license::RenameProductPayload,
            models::license::LicenseImportRequest,

            // --- Approvals ---
            models::approval::ApprovalStatus,
            models::approval::ApprovalItemType,
            models::approval::PendingItem,
            models::approval::ApprovePayload,
            models::approval::RejectPayload,

            // --- Settings / Audit ---
            models::settings::AppSettings,
            models::settings::SettingsUpdate,
            models::settings::UpdateSettingsRequest,
            models::settings::TermoTemplates,
            models::audit::AuditLogEntry,

            // --- Database / Reports ---
            models::database::BackupStatus,
            models::report::GenerateReportRequest,
            models::report::ReportResponse,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Login e sessão"),
        (name = "2FA", description = "Autenticação em dois fatores (TOTP)"),
        (name = "Users", description = "Gestão de usuários e perfil"),
        (name = "Equipment", description = "Inventário de equipamentos e histórico"),
        (name = "Import", description = "Importação CSV e atualização periódica"),
        (name = "Licenses", description = "Licenças de software e totais por produto"),
        (name = "Approvals", description = "Fila de aprovação do administrador"),
        (name = "Settings", description = "Configurações, modelos de termo e auditoria"),
        (name = "Database", description = "Backup, restauração e limpeza"),
        (name = "Reports", description = "Relatórios em linguagem natural")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/api/login",
            "/api/verify-2fa",
            "/api/users/{id}/profile",
            "/api/equipment/{id}/history",
            "/api/equipment/periodic-update/csv",
            "/api/licenses/rename-product",
            "/api/approvals/reject",
            "/api/config/termo-templates",
            "/api/database/backup-status",
            "/api/ai/generate-report",
        ] {
            assert!(paths.contains_key(path), "rota ausente: {}", path);
        }

        let schemes = doc.components.as_ref().map(|c| &c.security_schemes);
        assert!(schemes.is_some_and(|s| s.contains_key("api_jwt")));
    }
}
