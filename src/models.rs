pub mod approval;
pub mod audit;
pub mod auth;
pub mod database;
pub mod equipment;
pub mod history;
pub mod license;
pub mod report;
pub mod response;
pub mod settings;
