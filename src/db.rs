pub mod migrations;
pub mod migrator;

pub mod user_repo;
pub use user_repo::UserRepository;
pub mod equipment_repo;
pub use equipment_repo::EquipmentRepository;
pub mod history_repo;
pub use history_repo::HistoryRepository;
pub mod license_repo;
pub use license_repo::LicenseRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
pub mod approval_repo;
pub use approval_repo::ApprovalRepository;

#[cfg(test)]
mod pg_tests;
