//! Department persistence core.
//! Maps one `Department` entity onto the SQLite `departments` table and keeps
//! a per-repository identity map of loaded rows.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{ConfigError, StoreConfig};
pub use db::{open_db, open_db_in_memory, open_store, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::department::{Department, DepartmentId, DepartmentRow, SharedDepartment};
pub use repo::department_repo::{
    DepartmentRepository, RepoError, RepoResult, SqliteDepartmentRepository,
};
pub use repo::identity_cache::IdentityCache;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
