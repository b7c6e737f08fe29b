// src/services.rs

pub mod approval_service;
pub mod auth;
pub mod database_service;
pub mod equipment_service;
pub mod import_service;
pub mod license_service;
pub mod report_service;
pub mod settings_service;
pub mod two_factor;
pub mod user_service;
