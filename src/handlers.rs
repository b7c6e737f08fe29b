pub mod approvals;
pub mod auth;
pub mod database;
pub mod equipment;
pub mod licenses;
pub mod report;
pub mod settings;
pub mod two_factor;
pub mod users;
