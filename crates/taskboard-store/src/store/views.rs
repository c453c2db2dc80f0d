//! Read-side projections over the whole store.

use taskboard_core::completed::{self, CompletedQuery};
use taskboard_core::dates::Quarter;
use taskboard_core::report::{self, QuarterlyReport};
use taskboard_core::tags;
use taskboard_core::view::{self, Ancestry, TaskView};

use super::{Store, TaskScope};
use crate::db::rows::{self, TaskSelect};
use crate::error::Result;

impl Store {
    /// Views of the tasks in `scope`, projected against one `now`.
    /// Orphaned tasks are left out.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn task_views(&self, scope: &TaskScope) -> Result<Vec<TaskView>> {
        let tasks = self.tasks(scope)?;
        let stories = rows::list_stories(&self.conn, None, true)?;
        let projects = rows::list_projects(&self.conn, true)?;
        let ancestry = Ancestry::new(&stories, &projects);
        Ok(view::project_tasks(
            &tasks,
            &ancestry,
            self.now(),
            &self.config.thresholds,
        ))
    }

    /// Active-scope views, the input for dashboard sections and filters.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn dashboard_views(&self) -> Result<Vec<TaskView>> {
        self.task_views(&TaskScope::Active)
    }

    /// Completed tasks matching `query`, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn completed(&self, query: &CompletedQuery) -> Result<Vec<TaskView>> {
        let views = self.task_views(&TaskScope::Completed)?;
        Ok(completed::completed_tasks(&views, query, self.now())
            .into_iter()
            .cloned()
            .collect())
    }

    /// The report for quarter `quarter` (1-4) of `year`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a quarter outside 1-4, or a storage
    /// error.
    pub fn quarterly_report(&self, year: i32, quarter: u32) -> Result<QuarterlyReport> {
        let quarter = Quarter::new(year, quarter)?;
        let projects = rows::list_projects(&self.conn, true)?;
        let stories = rows::list_stories(&self.conn, None, true)?;
        let tasks = rows::list_tasks(&self.conn, TaskSelect::All)?;
        Ok(report::quarterly_report(
            &projects,
            &stories,
            &tasks,
            quarter,
            self.now(),
        ))
    }

    /// Every distinct tag in use, case-insensitively sorted.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn tags(&self) -> Result<Vec<String>> {
        let projects = rows::list_projects(&self.conn, true)?;
        let stories = rows::list_stories(&self.conn, None, true)?;
        let tasks = rows::list_tasks(&self.conn, TaskSelect::All)?;
        Ok(tags::all_tags(&projects, &stories, &tasks))
    }
}
