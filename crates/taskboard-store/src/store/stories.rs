use std::collections::BTreeSet;

use rusqlite::Connection;
use taskboard_core::model::{EntityKind, UserStory, new_id};
use taskboard_core::ordering;
use taskboard_core::validate::{TitleKind, require_title};
use taskboard_core::view::{self, UserStoryWithCounts};
use tracing::{debug, info};

use super::{DeleteSummary, Store, require_project, require_story};
use crate::db::rows::{self, Ordered, TaskSelect};
use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct NewUserStory {
    pub project_id: String,
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
}

/// Field edits for a story. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UserStoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    /// Moves the story, appending it to the destination's order.
    pub project_id: Option<String>,
}

fn next_order_in(conn: &Connection, project_id: &str) -> rusqlite::Result<i64> {
    let siblings = rows::list_stories(conn, Some(project_id), true)?;
    Ok(ordering::next_sort_order(siblings.iter().map(|s| s.sort_order)))
}

/// Renumber the non-archived stories of a project to `0..n`, keeping
/// their relative order.
fn compact_orders(conn: &Connection, project_id: &str) -> rusqlite::Result<()> {
    let ids: Vec<String> = rows::list_stories(conn, Some(project_id), false)?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let assignments: Vec<(&str, i64)> = ids.iter().map(String::as_str).zip(0_i64..).collect();
    rows::write_sort_orders(conn, Ordered::Stories, &assignments)?;
    Ok(())
}

impl Store {
    /// Create a story at the end of its project's order.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `NotFound` when the project does not
    /// exist, or a storage error.
    pub fn create_story(&mut self, input: NewUserStory) -> Result<UserStory> {
        let title = require_title(TitleKind::UserStory, &input.title, &self.config.limits)?;
        let now = self.now();

        let tx = self.conn.transaction()?;
        require_project(&tx, &input.project_id)?;
        let story = UserStory {
            id: new_id(EntityKind::UserStory, now),
            sort_order: next_order_in(&tx, &input.project_id)?,
            project_id: input.project_id,
            title: title.to_string(),
            description: input.description,
            tags: input.tags,
            created_at: now,
            is_archived: false,
        };
        rows::insert_story(&tx, &story)?;
        tx.commit()?;

        debug!(story_id = %story.id, project_id = %story.project_id, "created user story");
        Ok(story)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn story(&self, id: &str) -> Result<UserStory> {
        require_story(&self.conn, id)
    }

    /// Edit a story. A new `project_id` moves it to the end of the
    /// destination; both projects' live stories are renumbered `0..n`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown story or destination project, a
    /// validation error, or a storage error.
    pub fn update_story(&mut self, id: &str, update: UserStoryUpdate) -> Result<UserStory> {
        let title = update
            .title
            .as_deref()
            .map(|t| require_title(TitleKind::UserStory, t, &self.config.limits))
            .transpose()?
            .map(str::to_string);

        let tx = self.conn.transaction()?;
        let mut story = require_story(&tx, id)?;
        if let Some(title) = title {
            story.title = title;
        }
        if let Some(description) = update.description {
            story.description = description;
        }
        if let Some(tags) = update.tags {
            story.tags = tags;
        }

        let moved_from = match update.project_id {
            Some(destination) if destination != story.project_id => {
                require_project(&tx, &destination)?;
                story.sort_order = next_order_in(&tx, &destination)?;
                Some(std::mem::replace(&mut story.project_id, destination))
            }
            _ => None,
        };

        rows::update_story(&tx, &story)?;
        if let Some(source) = &moved_from {
            compact_orders(&tx, source)?;
            compact_orders(&tx, &story.project_id)?;
            if let Some(moved) = rows::get_story(&tx, id)? {
                story.sort_order = moved.sort_order;
            }
        }
        tx.commit()?;

        match moved_from {
            Some(source) => {
                debug!(story_id = %id, from = %source, to = %story.project_id, "moved user story");
            }
            None => debug!(story_id = %id, "updated user story"),
        }
        Ok(story)
    }

    /// Flip the archive flag only; tasks keep their own flags.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn set_story_archived(&mut self, id: &str, archived: bool) -> Result<UserStory> {
        let tx = self.conn.transaction()?;
        let mut story = require_story(&tx, id)?;
        story.is_archived = archived;
        rows::update_story(&tx, &story)?;
        tx.commit()?;

        debug!(story_id = %id, archived, "set user story archive flag");
        Ok(story)
    }

    /// Delete a story and its tasks, atomically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error, in which
    /// case nothing is deleted.
    pub fn delete_story(&mut self, id: &str) -> Result<DeleteSummary> {
        let tx = self.conn.transaction()?;
        require_story(&tx, id)?;
        let tasks = tx.execute("DELETE FROM tasks WHERE user_story_id = ?1", [id])?;
        tx.execute("DELETE FROM user_stories WHERE story_id = ?1", [id])?;
        tx.commit()?;

        info!(story_id = %id, tasks, "deleted user story");
        Ok(DeleteSummary {
            user_stories: 0,
            tasks,
        })
    }

    /// Stories of one project, or of every project when `None`.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn stories(
        &self,
        project_id: Option<&str>,
        include_archived: bool,
    ) -> Result<Vec<UserStory>> {
        Ok(rows::list_stories(&self.conn, project_id, include_archived)?)
    }

    /// # Errors
    ///
    /// Returns a storage error.
    pub fn stories_with_counts(
        &self,
        project_id: &str,
        include_archived: bool,
    ) -> Result<Vec<UserStoryWithCounts>> {
        let stories = rows::list_stories(&self.conn, Some(project_id), include_archived)?;
        let tasks = rows::list_tasks(&self.conn, TaskSelect::Project(project_id))?;
        Ok(stories
            .iter()
            .map(|story| view::story_counts(story, &tasks))
            .collect())
    }

    /// Assign `sort_order = index` to the non-archived stories of a
    /// project in the given order.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `ids` names every non-archived
    /// story of the project exactly once.
    pub fn reorder_stories(&mut self, project_id: &str, ids: &[String]) -> Result<()> {
        let tx = self.conn.transaction()?;
        require_project(&tx, project_id)?;
        let current: Vec<String> = rows::list_stories(&tx, Some(project_id), false)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let assignments = ordering::reorder_assignments(&current, ids)?;
        rows::write_sort_orders(&tx, Ordered::Stories, &assignments)?;
        tx.commit()?;

        debug!(project_id, count = ids.len(), "reordered user stories");
        Ok(())
    }

    /// Move one story to `position` within its project.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a validation error for an
    /// archived story or an out-of-range position.
    pub fn move_story(&mut self, id: &str, position: usize) -> Result<Vec<String>> {
        let story = require_story(&self.conn, id)?;
        let current: Vec<String> = rows::list_stories(&self.conn, Some(&story.project_id), false)?
            .into_iter()
            .map(|s| s.id)
            .collect();
        let ordered = ordering::move_to_position(&current, id, position)?;
        self.reorder_stories(&story.project_id, &ordered)?;
        Ok(ordered)
    }
}
