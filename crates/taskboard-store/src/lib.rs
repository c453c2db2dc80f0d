//! taskboard-store library.
//!
//! Persists projects, user stories and tasks in an embedded SQLite file and
//! applies every mutation from `taskboard-core` atomically. [`Store`] is
//! the entry point.
//!
//! # Conventions
//!
//! - **Errors**: [`StoreError`] for operations, `anyhow::Result` for opening
//!   and migrating the database file.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod backup;
pub mod cleanup;
pub mod db;
pub mod error;
pub mod store;
pub mod telemetry;

pub use backup::{BackupData, BackupDocument, ImportSummary};
pub use cleanup::CleanupReport;
pub use error::{Result, StoreError};
pub use store::{
    DeleteSummary, NewProject, NewUserStory, ProjectUpdate, Store, TaskScope, UserStoryUpdate,
};
