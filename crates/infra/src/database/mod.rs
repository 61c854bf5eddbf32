//! SQLite persistence for credentials and scheduler state

pub mod credential_repository;
pub mod manager;
pub mod scheduler_state_repository;
mod time;

pub use credential_repository::SqliteCredentialStore;
pub use manager::{DbManager, SqliteConnection};
pub use scheduler_state_repository::SqliteSchedulerStateStore;
