//! Orphan cleanup.
//!
//! Stories whose project is gone and tasks whose story is gone are removed
//! in one transaction. The pass runs every time a [`Store`] is opened and
//! records when it last ran in `store_meta`.

use rusqlite::params;
use tracing::{debug, warn};

use crate::db::rows;
use crate::error::Result;
use crate::store::Store;

/// Rows removed by one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub user_stories: usize,
    pub tasks: usize,
}

impl CleanupReport {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user_stories == 0 && self.tasks == 0
    }
}

impl Store {
    /// Delete orphaned stories, then orphaned tasks, including tasks that
    /// belonged to the stories just removed.
    ///
    /// # Errors
    ///
    /// Returns a storage error, in which case nothing is deleted.
    pub fn cleanup_orphans(&mut self) -> Result<CleanupReport> {
        let now = self.now();
        let tx = self.conn.transaction()?;
        let user_stories = tx.execute(
            "DELETE FROM user_stories
             WHERE project_id NOT IN (SELECT project_id FROM projects)",
            [],
        )?;
        let tasks = tx.execute(
            "DELETE FROM tasks
             WHERE user_story_id NOT IN (SELECT story_id FROM user_stories)",
            [],
        )?;
        tx.execute(
            "UPDATE store_meta SET last_cleanup_at_us = ?1 WHERE id = 1",
            params![rows::to_micros(now)],
        )?;
        tx.commit()?;

        let report = CleanupReport {
            user_stories,
            tasks,
        };
        if report.is_empty() {
            debug!("no orphaned records");
        } else {
            warn!(user_stories, tasks, "removed orphaned records");
        }
        Ok(report)
    }
}
