//! Row mapping between SQLite and the entity model.
//!
//! Functions take a `&Connection` (a `Transaction` derefs to one) and
//! return `rusqlite::Result` with typed entities, never raw rows. Callers
//! decide the transaction scope.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use serde::Serialize;
use serde::de::DeserializeOwned;
use taskboard_core::model::{ActivityLogEntry, Project, Task, TaskStatus, UserStory};

// ---------------------------------------------------------------------------
// Column codecs
// ---------------------------------------------------------------------------

#[must_use]
pub fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(idx: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {micros}us out of range").into(),
        )
    })
}

fn get_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    from_micros(idx, row.get(idx)?)
}

fn get_opt_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(idx)?
        .map(|micros| from_micros(idx, micros))
        .transpose()
}

fn get_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
        })
}

fn to_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value)
        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))
}

fn get_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<TaskStatus> {
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
        })
}

fn get_flag(row: &Row<'_>, idx: usize) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(idx)? != 0)
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> rusqlite::Result<Vec<T>> {
    rows.collect()
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

const PROJECT_COLUMNS: &str =
    "project_id, title, description, tags_json, created_at_us, is_archived, sort_order";

fn row_to_project(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        tags: get_json::<BTreeSet<String>>(row, 3)?,
        created_at: get_time(row, 4)?,
        is_archived: get_flag(row, 5)?,
        sort_order: row.get(6)?,
    })
}

/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn get_project(conn: &Connection, id: &str) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE project_id = ?1"),
        [id],
        row_to_project,
    )
    .optional()
}

/// Projects by `sort_order`, then creation time.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_projects(conn: &Connection, include_archived: bool) -> rusqlite::Result<Vec<Project>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects
         WHERE ?1 OR is_archived = 0
         ORDER BY sort_order ASC, created_at_us ASC, project_id ASC"
    ))?;
    let rows = stmt.query_map([include_archived], row_to_project)?;
    collect(rows)
}

/// # Errors
///
/// Returns an error if the insert fails, including on a duplicate id.
pub fn insert_project(conn: &Connection, project: &Project) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT INTO projects ({PROJECT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
        params![
            project.id,
            project.title,
            project.description,
            to_json(&project.tags)?,
            to_micros(project.created_at),
            project.is_archived,
            project.sort_order,
        ],
    )?;
    Ok(())
}

/// Overwrite every mutable column. Returns whether the row existed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_project(conn: &Connection, project: &Project) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE projects
         SET title = ?2, description = ?3, tags_json = ?4, is_archived = ?5, sort_order = ?6
         WHERE project_id = ?1",
        params![
            project.id,
            project.title,
            project.description,
            to_json(&project.tags)?,
            project.is_archived,
            project.sort_order,
        ],
    )?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// User stories
// ---------------------------------------------------------------------------

const STORY_COLUMNS: &str =
    "story_id, project_id, title, description, tags_json, created_at_us, is_archived, sort_order";

fn row_to_story(row: &Row<'_>) -> rusqlite::Result<UserStory> {
    Ok(UserStory {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: get_json::<BTreeSet<String>>(row, 4)?,
        created_at: get_time(row, 5)?,
        is_archived: get_flag(row, 6)?,
        sort_order: row.get(7)?,
    })
}

/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn get_story(conn: &Connection, id: &str) -> rusqlite::Result<Option<UserStory>> {
    conn.query_row(
        &format!("SELECT {STORY_COLUMNS} FROM user_stories WHERE story_id = ?1"),
        [id],
        row_to_story,
    )
    .optional()
}

/// Stories, optionally of one project, by `sort_order` then creation time.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_stories(
    conn: &Connection,
    project_id: Option<&str>,
    include_archived: bool,
) -> rusqlite::Result<Vec<UserStory>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STORY_COLUMNS} FROM user_stories
         WHERE (?1 IS NULL OR project_id = ?1) AND (?2 OR is_archived = 0)
         ORDER BY sort_order ASC, created_at_us ASC, story_id ASC"
    ))?;
    let rows = stmt.query_map(params![project_id, include_archived], row_to_story)?;
    collect(rows)
}

/// # Errors
///
/// Returns an error if the insert fails, including on a duplicate id.
pub fn insert_story(conn: &Connection, story: &UserStory) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO user_stories ({STORY_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        ),
        params![
            story.id,
            story.project_id,
            story.title,
            story.description,
            to_json(&story.tags)?,
            to_micros(story.created_at),
            story.is_archived,
            story.sort_order,
        ],
    )?;
    Ok(())
}

/// Overwrite every mutable column. Returns whether the row existed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_story(conn: &Connection, story: &UserStory) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE user_stories
         SET project_id = ?2, title = ?3, description = ?4, tags_json = ?5,
             is_archived = ?6, sort_order = ?7
         WHERE story_id = ?1",
        params![
            story.id,
            story.project_id,
            story.title,
            story.description,
            to_json(&story.tags)?,
            story.is_archived,
            story.sort_order,
        ],
    )?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

const TASK_COLUMNS: &str = "task_id, user_story_id, title, description, tags_json, status, \
     created_at_us, start_date_us, due_date_us, last_updated_at_us, completed_at_us, \
     is_blocked, blocked_at_us, blocked_by, blocked_reason, activity_log_json, is_archived";

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        user_story_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        tags: get_json::<BTreeSet<String>>(row, 4)?,
        status: get_status(row, 5)?,
        created_at: get_time(row, 6)?,
        start_date: get_opt_time(row, 7)?,
        due_date: get_opt_time(row, 8)?,
        last_updated_at: get_time(row, 9)?,
        completed_at: get_opt_time(row, 10)?,
        is_blocked: get_flag(row, 11)?,
        blocked_at: get_opt_time(row, 12)?,
        blocked_by: row.get(13)?,
        blocked_reason: row.get(14)?,
        activity_log: get_json::<Vec<ActivityLogEntry>>(row, 15)?,
        is_archived: get_flag(row, 16)?,
    })
}

/// Which tasks a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSelect<'a> {
    All,
    Story(&'a str),
    /// Every task under any story of the project.
    Project(&'a str),
    Status(TaskStatus),
}

/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn get_task(conn: &Connection, id: &str) -> rusqlite::Result<Option<Task>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1"),
        [id],
        row_to_task,
    )
    .optional()
}

/// Tasks matching `select`, oldest first.
///
/// # Errors
///
/// Returns an error if the query fails or a row cannot be decoded.
pub fn list_tasks(conn: &Connection, select: TaskSelect<'_>) -> rusqlite::Result<Vec<Task>> {
    let (clause, arg): (&str, Option<&str>) = match select {
        TaskSelect::All => ("1 = 1", None),
        TaskSelect::Story(id) => ("user_story_id = ?1", Some(id)),
        TaskSelect::Project(id) => (
            "user_story_id IN (SELECT story_id FROM user_stories WHERE project_id = ?1)",
            Some(id),
        ),
        TaskSelect::Status(status) => ("status = ?1", Some(status.as_str())),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE {clause} ORDER BY created_at_us ASC, task_id ASC"
    ))?;
    let rows = stmt.query_map(params_from_iter(arg), row_to_task)?;
    collect(rows)
}

/// # Errors
///
/// Returns an error if the insert fails, including on a duplicate id.
pub fn insert_task(conn: &Connection, task: &Task) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO tasks ({TASK_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)"
        ),
        params![
            task.id,
            task.user_story_id,
            task.title,
            task.description,
            to_json(&task.tags)?,
            task.status.as_str(),
            to_micros(task.created_at),
            task.start_date.map(to_micros),
            task.due_date.map(to_micros),
            to_micros(task.last_updated_at),
            task.completed_at.map(to_micros),
            task.is_blocked,
            task.blocked_at.map(to_micros),
            task.blocked_by,
            task.blocked_reason,
            to_json(&task.activity_log)?,
            task.is_archived,
        ],
    )?;
    Ok(())
}

/// Overwrite every mutable column. Returns whether the row existed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn update_task(conn: &Connection, task: &Task) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE tasks
         SET user_story_id = ?2, title = ?3, description = ?4, tags_json = ?5, status = ?6,
             start_date_us = ?7, due_date_us = ?8, last_updated_at_us = ?9,
             completed_at_us = ?10, is_blocked = ?11, blocked_at_us = ?12, blocked_by = ?13,
             blocked_reason = ?14, activity_log_json = ?15, is_archived = ?16
         WHERE task_id = ?1",
        params![
            task.id,
            task.user_story_id,
            task.title,
            task.description,
            to_json(&task.tags)?,
            task.status.as_str(),
            task.start_date.map(to_micros),
            task.due_date.map(to_micros),
            to_micros(task.last_updated_at),
            task.completed_at.map(to_micros),
            task.is_blocked,
            task.blocked_at.map(to_micros),
            task.blocked_by,
            task.blocked_reason,
            to_json(&task.activity_log)?,
            task.is_archived,
        ],
    )?;
    Ok(changed > 0)
}

// ---------------------------------------------------------------------------
// Shared writes
// ---------------------------------------------------------------------------

/// Which sibling table a `sort_order` write targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordered {
    Projects,
    Stories,
}

/// Assign `sort_order` values; returns how many rows matched.
///
/// # Errors
///
/// Returns an error if an update fails.
pub fn write_sort_orders(
    conn: &Connection,
    table: Ordered,
    assignments: &[(&str, i64)],
) -> rusqlite::Result<usize> {
    let sql = match table {
        Ordered::Projects => "UPDATE projects SET sort_order = ?2 WHERE project_id = ?1",
        Ordered::Stories => "UPDATE user_stories SET sort_order = ?2 WHERE story_id = ?1",
    };
    let mut stmt = conn.prepare(sql)?;
    let mut matched = 0;
    for (id, order) in assignments {
        matched += stmt.execute(params![id, order])?;
    }
    Ok(matched)
}

/// Empty all three collections.
///
/// # Errors
///
/// Returns an error if a delete fails.
pub fn clear_collections(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM tasks;
         DELETE FROM user_stories;
         DELETE FROM projects;",
    )
}
