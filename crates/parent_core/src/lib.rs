//! Persistence core for parent records.
//! This crate owns the entity invariants and the SQLite mapping.

pub mod db;
pub mod fixture;
pub mod logging;
pub mod model;
pub mod repo;

pub use db::{open_db, open_db_in_memory, DbError};
pub use fixture::{parent_supply, Supply};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LogLevel};
pub use model::parent::{Parent, ParentBuilder, ParentId, ParentValidationError};
pub use repo::parent_repo::{ParentRepository, RepoError, RepoResult, SqliteParentRepository};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
