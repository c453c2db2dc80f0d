use std::collections::BTreeSet;

use taskboard_core::model::{EntityKind, Project, new_id};
use taskboard_core::ordering;
use taskboard_core::validate::{TitleKind, require_title};
use taskboard_core::view::{self, ProjectWithCounts};
use tracing::{debug, info};

use super::{DeleteSummary, Store, require_project};
use crate::db::rows::{self, Ordered, TaskSelect};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

/// Field edits for a project. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
}

impl Store {
    /// Create a project at the end of the manual order.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank or oversized title, or a
    /// storage error.
    pub fn create_project(&mut self, input: NewProject) -> Result<Project> {
        let title = require_title(TitleKind::Project, &input.title, &self.config.limits)?;
        let now = self.now();

        let tx = self.conn.transaction()?;
        let existing = rows::list_projects(&tx, true)?;
        let project = Project {
            id: new_id(EntityKind::Project, now),
            title: title.to_string(),
            description: input.description,
            tags: input.tags,
            created_at: now,
            is_archived: false,
            sort_order: ordering::next_sort_order(existing.iter().map(|p| p.sort_order)),
        };
        rows::insert_project(&tx, &project)?;
        tx.commit()?;

        debug!(project_id = %project.id, "created project");
        Ok(project)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn project(&self, id: &str) -> Result<Project> {
        require_project(&self.conn, id)
    }

    /// # Errors
    ///
    /// Returns `NotFound`, a validation error, or a storage
    /// error.
    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) -> Result<Project> {
        let title = update
            .title
            .as_deref()
            .map(|t| require_title(TitleKind::Project, t, &self.config.limits))
            .transpose()?
            .map(str::to_string);

        let tx = self.conn.transaction()?;
        let mut project = require_project(&tx, id)?;
        if let Some(title) = title {
            project.title = title;
        }
        if let Some(description) = update.description {
            project.description = description;
        }
        if let Some(tags) = update.tags {
            project.tags = tags;
        }
        rows::update_project(&tx, &project)?;
        tx.commit()?;

        debug!(project_id = %id, "updated project");
        Ok(project)
    }

    /// Flip the archive flag only; children keep their own flags.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn set_project_archived(&mut self, id: &str, archived: bool) -> Result<Project> {
        let tx = self.conn.transaction()?;
        let mut project = require_project(&tx, id)?;
        project.is_archived = archived;
        rows::update_project(&tx, &project)?;
        tx.commit()?;

        debug!(project_id = %id, archived, "set project archive flag");
        Ok(project)
    }

    /// Delete a project with all its stories and their tasks, atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage
    /// error, in which case nothing is deleted.
    pub fn delete_project(&mut self, id: &str) -> Result<DeleteSummary> {
        let tx = self.conn.transaction()?;
        require_project(&tx, id)?;

        let tasks = tx.execute(
            "DELETE FROM tasks
             WHERE user_story_id IN (SELECT story_id FROM user_stories WHERE project_id = ?1)",
            [id],
        )?;
        let user_stories = tx.execute("DELETE FROM user_stories WHERE project_id = ?1", [id])?;
        tx.execute("DELETE FROM projects WHERE project_id = ?1", [id])?;
        tx.commit()?;

        info!(project_id = %id, user_stories, tasks, "deleted project");
        Ok(DeleteSummary {
            user_stories,
            tasks,
        })
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn projects(&self, include_archived: bool) -> Result<Vec<Project>> {
        Ok(rows::list_projects(&self.conn, include_archived)?)
    }

    /// Non-archived projects with sidebar counters.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn projects_with_counts(&self) -> Result<Vec<ProjectWithCounts>> {
        let projects = rows::list_projects(&self.conn, false)?;
        let stories = rows::list_stories(&self.conn, None, true)?;
        let tasks = rows::list_tasks(&self.conn, TaskSelect::All)?;
        Ok(projects
            .iter()
            .map(|project| view::project_counts(project, &stories, &tasks))
            .collect())
    }

    /// Assign `sort_order = index` to the non-archived projects in the
    /// given order.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `ids` names every non-archived
    /// project exactly once.
    pub fn reorder_projects(&mut self, ids: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        let current: Vec<String> = rows::list_projects(&tx, false)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        let assignments = ordering::reorder_assignments(&current, ids)?;
        rows::write_sort_orders(&tx, Ordered::Projects, &assignments)?;
        tx.commit()?;

        debug!(count = ids.len(), "reordered projects");
        Ok(())
    }

    /// Move one project to `position` among the non-archived projects.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a validation
    /// error for an archived project or an out-of-range position.
    pub fn move_project(&mut self, id: &str, position: usize) -> Result<Vec<String>> {
        let current: Vec<String> = rows::list_projects(&self.conn, false)?
            .into_iter()
            .map(|p| p.id)
            .collect();
        if !current.iter().any(|p| p == id) {
            require_project(&self.conn, id)?;
        }
        let ordered = ordering::move_to_position(&current, id, position)?;
        self.reorder_projects(&ordered)?;
        Ok(ordered)
    }
}
