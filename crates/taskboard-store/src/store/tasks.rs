use chrono::{DateTime, Utc};
use taskboard_core::lifecycle::{self, EntryEdit, NewTask, TaskChanges, TaskEdit};
use taskboard_core::model::{Task, TaskStatus};
use taskboard_core::validate::{TitleKind, require_text, require_title};
use tracing::{debug, info};

use super::{Store, require_story, require_task};
use crate::db::rows::{self, TaskSelect};
use crate::error::Result;

/// Which tasks a listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    /// Tasks of one story.
    Story { id: String, include_archived: bool },
    /// Non-archived tasks under any story of the project.
    Project(String),
    /// Non-archived tasks that are not completed.
    Active,
    /// Non-archived blocked tasks.
    Blocked,
    /// Completed tasks plus anything archived.
    Completed,
    /// Everything, archived included.
    All,
}

impl TaskScope {
    fn select(&self) -> TaskSelect<'_> {
        match self {
            Self::Story { id, .. } => TaskSelect::Story(id),
            Self::Project(id) => TaskSelect::Project(id),
            Self::Blocked => TaskSelect::Status(TaskStatus::Blocked),
            Self::Active | Self::Completed | Self::All => TaskSelect::All,
        }
    }

    fn admits(&self, task: &Task) -> bool {
        match self {
            Self::Story {
                include_archived, ..
            } => *include_archived || !task.is_archived,
            Self::Project(_) | Self::Blocked => !task.is_archived,
            Self::Active => !task.is_archived && task.status != TaskStatus::Completed,
            Self::Completed => task.is_archived || task.status == TaskStatus::Completed,
            Self::All => true,
        }
    }
}

impl Store {
    /// Load a task, let `change` compute its field updates from the single
    /// `now` of this operation, and persist the result atomically.
    fn mutate_task<F>(&mut self, id: &str, change: F) -> Result<Task>
    where
        F: FnOnce(&Task, DateTime<Utc>) -> Result<TaskChanges>,
    {
        let now = self.now();
        let tx = self.conn.transaction()?;
        let task = require_task(&tx, id)?;
        let updated = change(&task, now)?.applied_to(&task);
        rows::update_task(&tx, &updated)?;
        tx.commit()?;
        Ok(updated)
    }

    /// Create a task in the New state under an existing story.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `NotFound` for an unknown story, or a
    /// storage error.
    pub fn create_task(&mut self, mut input: NewTask) -> Result<Task> {
        input.title =
            require_title(TitleKind::Task, &input.title, &self.config.limits)?.to_string();
        let now = self.now();

        let tx = self.conn.transaction()?;
        require_story(&tx, &input.user_story_id)?;
        let task = lifecycle::new_task(input, now);
        rows::insert_task(&tx, &task)?;
        tx.commit()?;

        debug!(task_id = %task.id, user_story_id = %task.user_story_id, "created task");
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn task(&self, id: &str) -> Result<Task> {
        require_task(&self.conn, id)
    }

    /// Apply field edits; a status in the edit runs the full lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown task or destination story, a
    /// validation error, or a storage error.
    pub fn edit_task(&mut self, id: &str, mut edit: TaskEdit) -> Result<Task> {
        if let Some(title) = &edit.title {
            let title = require_title(TitleKind::Task, title, &self.config.limits)?;
            edit.title = Some(title.to_string());
        }
        if let Some(by) = &edit.blocked_by {
            edit.blocked_by = Some(require_text("blocked by", by)?.to_string());
        }
        if let Some(reason) = &edit.blocked_reason {
            edit.blocked_reason = Some(require_text("blocked reason", reason)?.to_string());
        }
        if let Some(story_id) = &edit.user_story_id {
            require_story(&self.conn, story_id)?;
        }

        let task = self.mutate_task(id, |task, now| Ok(lifecycle::edit(task, edit, now)))?;
        debug!(task_id = %id, "edited task");
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn set_status(&mut self, id: &str, status: TaskStatus) -> Result<Task> {
        self.mutate_task(id, |task, now| Ok(lifecycle::set_status(task, status, now)))
    }

    /// Block a task, recording who or what it waits on and why.
    ///
    /// # Errors
    ///
    /// Returns a validation error when either text is blank, `NotFound`
    /// for an unknown id, or a storage error.
    pub fn set_blocked(
        &mut self,
        id: &str,
        blocked_by: &str,
        blocked_reason: &str,
    ) -> Result<Task> {
        let blocked_by = require_text("blocked by", blocked_by)?;
        let blocked_reason = require_text("blocked reason", blocked_reason)?;
        self.mutate_task(id, |task, now| {
            Ok(lifecycle::set_blocked(task, blocked_by, blocked_reason, now))
        })
    }

    /// Unblock a task into Active.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn clear_blocked(&mut self, id: &str) -> Result<Task> {
        self.mutate_task(id, |task, now| Ok(lifecycle::clear_blocked(task, now)))
    }

    /// Flip the archive flag only; `last_updated_at` is untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id.
    pub fn set_task_archived(&mut self, id: &str, archived: bool) -> Result<Task> {
        let tx = self.conn.transaction()?;
        let mut task = require_task(&tx, id)?;
        task.is_archived = archived;
        rows::update_task(&tx, &task)?;
        tx.commit()?;

        debug!(task_id = %id, archived, "set task archive flag");
        Ok(task)
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        require_task(&tx, id)?;
        tx.execute("DELETE FROM tasks WHERE task_id = ?1", [id])?;
        tx.commit()?;

        info!(task_id = %id, "deleted task");
        Ok(())
    }

    /// Append a note dated `date` (default now). The task's last update
    /// follows the note's date.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank note, `NotFound` for an
    /// unknown id, or a storage error.
    pub fn add_entry(&mut self, id: &str, note: &str, date: Option<DateTime<Utc>>) -> Result<Task> {
        let note = require_text("note", note)?;
        self.mutate_task(id, |task, now| Ok(lifecycle::add_entry(task, note, date, now)))
    }

    /// # Errors
    ///
    /// Returns a validation error for a blank note, `NotFound` for an
    /// unknown task or entry, or a storage error.
    pub fn update_entry(&mut self, id: &str, entry_id: &str, mut edit: EntryEdit) -> Result<Task> {
        if let Some(note) = &edit.note {
            edit.note = Some(require_text("note", note)?.to_string());
        }
        self.mutate_task(id, |task, now| {
            Ok(lifecycle::update_entry(task, entry_id, edit, now)?)
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` for an unknown task or entry, or a storage error.
    pub fn delete_entry(&mut self, id: &str, entry_id: &str) -> Result<Task> {
        self.mutate_task(id, |task, now| Ok(lifecycle::delete_entry(task, entry_id, now)?))
    }

    /// Tasks in `scope`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn tasks(&self, scope: &TaskScope) -> Result<Vec<Task>> {
        let mut tasks = rows::list_tasks(&self.conn, scope.select())?;
        tasks.retain(|task| scope.admits(task));
        Ok(tasks)
    }
}
