//! The state-owning layer.
//!
//! [`Store`] owns the SQLite connection and is the only writer. Each public
//! mutation samples the clock once, asks `taskboard-core` for the field
//! changes, and writes them inside one transaction. A missing id aborts the
//! operation with [`StoreError::NotFound`] before anything is written.

mod projects;
mod stories;
mod tasks;
mod views;

pub use projects::{NewProject, ProjectUpdate};
pub use stories::{NewUserStory, UserStoryUpdate};
pub use tasks::TaskScope;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use taskboard_core::clock::{Clock, SystemClock};
use taskboard_core::config::Config;
use taskboard_core::model::{EntityKind, Project, Task, UserStory};
use tracing::info;

use crate::db::{self, rows};
use crate::error::{Result, StoreError};

/// Rows removed by a cascading delete, beyond the target itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub user_stories: usize,
    pub tasks: usize,
}

pub struct Store {
    pub(crate) conn: Connection,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) config: Config,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.conn.path())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Open the database at `path`, creating and migrating it as needed,
    /// then run the orphan cleanup pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, migrated or
    /// cleaned.
    pub fn open(path: &Path, config: Config) -> anyhow::Result<Self> {
        let conn = db::open_database(path)?;
        let store = Self::from_connection(conn, Arc::new(SystemClock), config)?;
        info!(path = %path.display(), "opened store");
        Ok(store)
    }

    /// A private in-memory store, used by tests and throwaway sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot create or migrate the database.
    pub fn open_in_memory(config: Config) -> anyhow::Result<Self> {
        let conn = db::open_in_memory()?;
        Self::from_connection(conn, Arc::new(SystemClock), config)
    }

    /// Wrap a migrated connection and run the orphan cleanup pass.
    ///
    /// # Errors
    ///
    /// Returns an error if the cleanup pass fails.
    pub fn from_connection(
        conn: Connection,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> anyhow::Result<Self> {
        let mut store = Self {
            conn,
            clock,
            config,
        };
        store
            .cleanup_orphans()
            .context("remove orphaned records on open")?;
        Ok(store)
    }

    /// Replace the clock, e.g. with a `FixedClock` in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The single "now" for one logical operation.
    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub(crate) fn require_project(conn: &Connection, id: &str) -> Result<Project> {
    rows::get_project(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::Project, id))
}

pub(crate) fn require_story(conn: &Connection, id: &str) -> Result<UserStory> {
    rows::get_story(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::UserStory, id))
}

pub(crate) fn require_task(conn: &Connection, id: &str) -> Result<Task> {
    rows::get_task(conn, id)?.ok_or_else(|| StoreError::not_found(EntityKind::Task, id))
}
