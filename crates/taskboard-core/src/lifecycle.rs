//! Task lifecycle engine.
//!
//! Every operation is a pure function of `(task, input, now)` returning a
//! [`TaskChanges`] set: the exact fields a mutation writes. The caller owns
//! persistence and applies the set atomically. `now` is captured once per
//! logical operation, so every derived timestamp in one set is identical.
//!
//! # Status side effects
//!
//! Applied in order by [`set_status`], each independently:
//!
//! 1. `status = new`, `last_updated_at = now`
//! 2. entering Active without a start date sets `start_date = now`
//! 3. entering Blocked sets `is_blocked`, `blocked_at = now`, and a missing
//!    `start_date = now`
//! 4. leaving Blocked clears `is_blocked`, `blocked_at`, `blocked_by`,
//!    `blocked_reason`
//! 5. entering Completed sets `completed_at = now`
//! 6. leaving Completed clears `completed_at`
//!
//! A New → Completed jump leaves `start_date` unset, so the task's age is
//! measured from `created_at`.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::{ActivityLogEntry, EntityKind, Task, TaskStatus, new_id};

/// Errors from activity-log edits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("activity log entry {entry_id} not found on task {task_id}")]
    EntryNotFound { task_id: String, entry_id: String },
}

/// The field updates produced by one lifecycle operation.
///
/// `None` leaves a field untouched. Nullable fields use `Some(None)` to
/// clear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub status: Option<TaskStatus>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub is_blocked: Option<bool>,
    pub blocked_at: Option<Option<DateTime<Utc>>>,
    pub blocked_by: Option<String>,
    pub blocked_reason: Option<String>,
    pub activity_log: Option<Vec<ActivityLogEntry>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub user_story_id: Option<String>,
}

impl TaskChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every present field into `task`.
    pub fn apply(self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(at) = self.last_updated_at {
            task.last_updated_at = at;
        }
        if let Some(start) = self.start_date {
            task.start_date = start;
        }
        if let Some(completed) = self.completed_at {
            task.completed_at = completed;
        }
        if let Some(blocked) = self.is_blocked {
            task.is_blocked = blocked;
        }
        if let Some(at) = self.blocked_at {
            task.blocked_at = at;
        }
        if let Some(by) = self.blocked_by {
            task.blocked_by = by;
        }
        if let Some(reason) = self.blocked_reason {
            task.blocked_reason = reason;
        }
        if let Some(log) = self.activity_log {
            task.activity_log = log;
        }
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(tags) = self.tags {
            task.tags = tags;
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if let Some(story) = self.user_story_id {
            task.user_story_id = story;
        }
    }

    /// A copy of `task` with the changes applied.
    #[must_use]
    pub fn applied_to(self, task: &Task) -> Task {
        let mut next = task.clone();
        self.apply(&mut next);
        next
    }
}

/// Compute the side effects of moving `task` to `new_status`.
///
/// A transition to the current status is not an error; it still refreshes
/// `last_updated_at` and re-applies the entry rules for that status.
#[must_use]
pub fn set_status(task: &Task, new_status: TaskStatus, now: DateTime<Utc>) -> TaskChanges {
    let old_status = task.status;
    let mut changes = TaskChanges {
        status: Some(new_status),
        last_updated_at: Some(now),
        ..TaskChanges::default()
    };

    if new_status == TaskStatus::Active && task.start_date.is_none() {
        changes.start_date = Some(Some(now));
    }

    if new_status == TaskStatus::Blocked {
        changes.is_blocked = Some(true);
        changes.blocked_at = Some(Some(now));
        if task.start_date.is_none() {
            changes.start_date = Some(Some(now));
        }
    }

    if old_status == TaskStatus::Blocked && new_status != TaskStatus::Blocked {
        changes.is_blocked = Some(false);
        changes.blocked_at = Some(None);
        changes.blocked_by = Some(String::new());
        changes.blocked_reason = Some(String::new());
    }

    if new_status == TaskStatus::Completed {
        changes.completed_at = Some(Some(now));
    }

    if old_status == TaskStatus::Completed && new_status != TaskStatus::Completed {
        changes.completed_at = Some(None);
    }

    debug!(task_id = %task.id, from = %old_status, to = %new_status, "status transition");
    changes
}

/// Force the task into Blocked, recording who or what blocks it.
///
/// Leaving Completed this way clears `completed_at` like any other exit.
#[must_use]
pub fn set_blocked(
    task: &Task,
    blocked_by: &str,
    blocked_reason: &str,
    now: DateTime<Utc>,
) -> TaskChanges {
    let mut changes = set_status(task, TaskStatus::Blocked, now);
    changes.blocked_by = Some(blocked_by.to_string());
    changes.blocked_reason = Some(blocked_reason.to_string());
    changes
}

/// Unblocking always lands in Active, never back in New.
#[must_use]
pub fn clear_blocked(task: &Task, now: DateTime<Utc>) -> TaskChanges {
    set_status(task, TaskStatus::Active, now)
}

/// Input for [`new_task`].
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub user_story_id: String,
    pub title: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// Backdates the last-update marker, e.g. when importing existing work.
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// Build a fresh task in the New state.
#[must_use]
pub fn new_task(input: NewTask, now: DateTime<Utc>) -> Task {
    Task {
        id: new_id(EntityKind::Task, now),
        user_story_id: input.user_story_id,
        title: input.title,
        description: input.description,
        tags: input.tags,
        status: TaskStatus::New,
        created_at: now,
        start_date: input.start_date,
        due_date: input.due_date,
        last_updated_at: input.last_updated_at.unwrap_or(now),
        completed_at: None,
        is_blocked: false,
        blocked_at: None,
        blocked_by: String::new(),
        blocked_reason: String::new(),
        activity_log: Vec::new(),
        is_archived: false,
    }
}

/// A field edit request. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<BTreeSet<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub start_date: Option<Option<DateTime<Utc>>>,
    pub blocked_by: Option<String>,
    pub blocked_reason: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    pub user_story_id: Option<String>,
}

/// Apply a field edit.
///
/// A status in the edit goes through [`set_status`] first; explicit field
/// values then take precedence. Blocked details are only kept when the
/// resulting status is Blocked.
#[must_use]
pub fn edit(task: &Task, edit: TaskEdit, now: DateTime<Utc>) -> TaskChanges {
    let mut changes = match edit.status {
        Some(status) => set_status(task, status, now),
        None => TaskChanges::default(),
    };
    let resulting_status = changes.status.unwrap_or(task.status);

    changes.title = edit.title;
    changes.description = edit.description;
    changes.tags = edit.tags;
    changes.due_date = edit.due_date;
    changes.user_story_id = edit.user_story_id;
    if edit.start_date.is_some() {
        changes.start_date = edit.start_date;
    }
    if resulting_status == TaskStatus::Blocked {
        if edit.blocked_by.is_some() {
            changes.blocked_by = edit.blocked_by;
        }
        if edit.blocked_reason.is_some() {
            changes.blocked_reason = edit.blocked_reason;
        }
    }
    changes.last_updated_at = Some(edit.last_updated_at.unwrap_or(now));
    changes
}

fn sort_log(log: &mut [ActivityLogEntry]) {
    log.sort_by_key(|entry| Reverse(entry.date));
}

/// Append a note dated `date` (default `now`).
///
/// The task's `last_updated_at` follows the entry's date, so backdated
/// notes backdate the task.
#[must_use]
pub fn add_entry(
    task: &Task,
    note: &str,
    date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TaskChanges {
    let entry_date = date.unwrap_or(now);
    let mut log = task.activity_log.clone();
    log.push(ActivityLogEntry {
        id: new_id(EntityKind::ActivityEntry, now),
        date: entry_date,
        note: note.to_string(),
        created_at: now,
    });
    sort_log(&mut log);

    TaskChanges {
        activity_log: Some(log),
        last_updated_at: Some(entry_date),
        ..TaskChanges::default()
    }
}

/// Changes to one activity log entry.
#[derive(Debug, Clone, Default)]
pub struct EntryEdit {
    pub note: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Edit a note or its date.
///
/// # Errors
///
/// Returns [`LifecycleError::EntryNotFound`] when `entry_id` is not in the
/// task's log.
pub fn update_entry(
    task: &Task,
    entry_id: &str,
    entry_edit: EntryEdit,
    now: DateTime<Utc>,
) -> Result<TaskChanges, LifecycleError> {
    let mut log = task.activity_log.clone();
    let entry = log
        .iter_mut()
        .find(|entry| entry.id == entry_id)
        .ok_or_else(|| LifecycleError::EntryNotFound {
            task_id: task.id.clone(),
            entry_id: entry_id.to_string(),
        })?;

    if let Some(note) = entry_edit.note {
        entry.note = note;
    }
    if let Some(date) = entry_edit.date {
        entry.date = date;
    }
    sort_log(&mut log);

    Ok(TaskChanges {
        activity_log: Some(log),
        last_updated_at: Some(now),
        ..TaskChanges::default()
    })
}

/// Remove a note.
///
/// # Errors
///
/// Returns [`LifecycleError::EntryNotFound`] when `entry_id` is not in the
/// task's log.
pub fn delete_entry(
    task: &Task,
    entry_id: &str,
    now: DateTime<Utc>,
) -> Result<TaskChanges, LifecycleError> {
    if !task.activity_log.iter().any(|entry| entry.id == entry_id) {
        return Err(LifecycleError::EntryNotFound {
            task_id: task.id.clone(),
            entry_id: entry_id.to_string(),
        });
    }

    let mut log: Vec<ActivityLogEntry> = task
        .activity_log
        .iter()
        .filter(|entry| entry.id != entry_id)
        .cloned()
        .collect();
    sort_log(&mut log);

    Ok(TaskChanges {
        activity_log: Some(log),
        last_updated_at: Some(now),
        ..TaskChanges::default()
    })
}
