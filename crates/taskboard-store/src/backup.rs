//! JSON export and import of the whole store.
//!
//! A backup is one document holding every project, story and task
//! verbatim, archived and orphaned records included. Import replaces the
//! store's contents atomically: either every record lands or none does.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::model::{Project, Task, UserStory};
use tracing::info;

use crate::db::rows::{self, TaskSelect};
use crate::error::{Result, StoreError};
use crate::store::Store;

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub data: BackupData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupData {
    pub projects: Vec<Project>,
    pub user_stories: Vec<UserStory>,
    pub tasks: Vec<Task>,
}

/// Records written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub projects: usize,
    pub user_stories: usize,
    pub tasks: usize,
}

/// The first record holding an instant finer than the store's microsecond
/// columns, which would not survive an import unchanged.
fn first_sub_micro(data: &BackupData) -> Option<&str> {
    let fine = |at: &DateTime<Utc>| at.timestamp_subsec_nanos() % 1_000 != 0;
    let fine_opt = |at: &Option<DateTime<Utc>>| at.as_ref().is_some_and(fine);

    let project = data.projects.iter().find(|p| fine(&p.created_at));
    let story = data.user_stories.iter().find(|s| fine(&s.created_at));
    let task = data.tasks.iter().find(|t| {
        fine(&t.created_at)
            || fine(&t.last_updated_at)
            || fine_opt(&t.start_date)
            || fine_opt(&t.due_date)
            || fine_opt(&t.completed_at)
            || fine_opt(&t.blocked_at)
    });
    project
        .map(|p| p.id.as_str())
        .or_else(|| story.map(|s| s.id.as_str()))
        .or_else(|| task.map(|t| t.id.as_str()))
}

/// `taskboard-backup-YYYY-MM-DD.json`
#[must_use]
pub fn default_file_name(date: NaiveDate) -> String {
    format!("taskboard-backup-{}.json", date.format("%Y-%m-%d"))
}

impl Store {
    /// Snapshot every collection.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn export(&self) -> Result<BackupDocument> {
        Ok(BackupDocument {
            version: BACKUP_VERSION.to_string(),
            exported_at: self.now(),
            data: BackupData {
                projects: rows::list_projects(&self.conn, true)?,
                user_stories: rows::list_stories(&self.conn, None, true)?,
                tasks: rows::list_tasks(&self.conn, TaskSelect::All)?,
            },
        })
    }

    /// The export as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns a storage or serialization error.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export()?)?)
    }

    /// Replace the store's contents with `document`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backup`] for a document without a version or
    /// with an instant finer than a microsecond, or a storage error (e.g.
    /// a duplicate id). On error the store is left exactly as it was.
    pub fn import(&mut self, document: BackupDocument) -> Result<ImportSummary> {
        if document.version.trim().is_empty() {
            return Err(StoreError::Backup("missing version".into()));
        }
        if let Some(id) = first_sub_micro(&document.data) {
            return Err(StoreError::Backup(format!(
                "{id} has a timestamp finer than one microsecond"
            )));
        }
        let BackupData {
            projects,
            user_stories,
            tasks,
        } = document.data;

        let tx = self.conn.transaction()?;
        rows::clear_collections(&tx)?;
        for project in &projects {
            rows::insert_project(&tx, project)?;
        }
        for story in &user_stories {
            rows::insert_story(&tx, story)?;
        }
        for task in &tasks {
            rows::insert_task(&tx, task)?;
        }
        tx.commit()?;

        let summary = ImportSummary {
            projects: projects.len(),
            user_stories: user_stories.len(),
            tasks: tasks.len(),
        };
        info!(
            version = %document.version,
            projects = summary.projects,
            user_stories = summary.user_stories,
            tasks = summary.tasks,
            "imported backup"
        );
        Ok(summary)
    }

    /// Parse and import a JSON backup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] for malformed JSON or missing
    /// collections, otherwise as [`Store::import`].
    pub fn import_json(&mut self, json: &str) -> Result<ImportSummary> {
        let document: BackupDocument = serde_json::from_str(json)?;
        self.import(document)
    }

    /// Empty every collection atomically.
    ///
    /// # Errors
    ///
    /// Returns a storage error, in which case nothing is deleted.
    pub fn clear_all(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        rows::clear_collections(&tx)?;
        tx.commit()?;

        info!("cleared all collections");
        Ok(())
    }
}
