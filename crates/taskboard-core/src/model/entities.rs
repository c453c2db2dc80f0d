use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::TaskStatus;

/// Top-level responsibility area. Projects never complete; they are
/// archived or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub sort_order: i64,
}

/// An ongoing process inside a project; container for tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_archived: bool,
    /// Position among the non-archived stories of the same project.
    #[serde(default)]
    pub sort_order: i64,
}

/// A dated note attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: String,
    /// User-assignable date the note refers to.
    pub date: DateTime<Utc>,
    pub note: String,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

/// A unit of work with a lifecycle.
///
/// `is_blocked`/`blocked_at` mirror `status == Blocked` and `completed_at`
/// mirrors `status == Completed`; [`crate::lifecycle`] keeps them in step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_story_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub last_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_blocked: bool,
    pub blocked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked_by: String,
    #[serde(default)]
    pub blocked_reason: String,
    /// Newest entry first.
    #[serde(default)]
    pub activity_log: Vec<ActivityLogEntry>,
    #[serde(default)]
    pub is_archived: bool,
}

impl Task {
    /// Whether the redundant blocked/completed fields agree with `status`.
    #[must_use]
    pub fn lifecycle_consistent(&self) -> bool {
        let blocked = self.status == TaskStatus::Blocked;
        let completed = self.status == TaskStatus::Completed;
        self.is_blocked == blocked
            && self.blocked_at.is_some() == blocked
            && self.completed_at.is_some() == completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
    }

    fn sample_task() -> Task {
        Task {
            id: "t-1".into(),
            user_story_id: "s-1".into(),
            title: "Update benefits section".into(),
            description: "Coordinate with Finance".into(),
            tags: BTreeSet::from(["benefits".to_string(), "urgent".to_string()]),
            status: TaskStatus::Blocked,
            created_at: at(1),
            start_date: Some(at(2)),
            due_date: None,
            last_updated_at: at(3),
            completed_at: None,
            is_blocked: true,
            blocked_at: Some(at(3)),
            blocked_by: "Finance".into(),
            blocked_reason: "Waiting on rates".into(),
            activity_log: vec![ActivityLogEntry {
                id: "a-1".into(),
                date: at(3),
                note: "Pinged Finance".into(),
                created_at: at(3),
            }],
            is_archived: false,
        }
    }

    #[test]
    fn task_json_uses_camel_case_and_round_trips() {
        let task = sample_task();
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("userStoryId").is_some());
        assert!(json.get("blockedReason").is_some());
        assert_eq!(json["status"], "blocked");

        let back: Task = serde_json::from_value(json).unwrap();
        assert_eq!(back, task);
    }

    #[test]
    fn legacy_records_without_optional_fields_deserialize() {
        let json = serde_json::json!({
            "id": "p-1",
            "title": "Onboarding Team",
            "createdAt": "2024-01-01T00:00:00Z",
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.sort_order, 0);
        assert!(project.tags.is_empty());
        assert!(!project.is_archived);
    }

    #[test]
    fn lifecycle_consistency_detects_mismatch() {
        let mut task = sample_task();
        assert!(task.lifecycle_consistent());
        task.blocked_at = None;
        assert!(!task.lifecycle_consistent());
    }
}
