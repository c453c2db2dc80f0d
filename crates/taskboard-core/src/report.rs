//! Quarterly report generation.
//!
//! The report walks every project, ignoring archive flags, then each of
//! its stories and their tasks. Completion is scoped to the quarter;
//! active and blocked counts describe the system as it stands at `now`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::dates::{self, Quarter};
use crate::model::{Project, Task, TaskStatus, UserStory};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyReport {
    pub year: i32,
    pub quarter: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub summary: ReportSummary,
    pub completed_by_project: Vec<ProjectCompletedTasks>,
    pub blocked_tasks: Vec<BlockedTaskInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_completed: usize,
    pub total_active: usize,
    pub total_blocked: usize,
    /// Mean `days_open` of the tasks completed in the quarter; `0.0` if none.
    pub avg_days_to_complete: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCompletedTasks {
    pub project_id: String,
    pub project_title: String,
    pub count: usize,
    pub tasks: Vec<CompletedTaskInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTaskInfo {
    pub id: String,
    pub title: String,
    pub user_story_title: String,
    pub completed_at: DateTime<Utc>,
    pub days_open: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedTaskInfo {
    pub id: String,
    pub title: String,
    pub project_title: String,
    pub user_story_title: String,
    pub blocked_by: String,
    pub blocked_reason: String,
    pub days_blocked: Option<i64>,
}

/// Build the report for `quarter` over the given collections.
///
/// Tasks and stories that do not hang off one of `projects` are never
/// visited, so orphans are excluded without a separate pass.
#[must_use]
pub fn quarterly_report(
    projects: &[Project],
    stories: &[UserStory],
    tasks: &[Task],
    quarter: Quarter,
    now: DateTime<Utc>,
) -> QuarterlyReport {
    let mut completed_by_project = Vec::new();
    let mut blocked_tasks = Vec::new();
    let mut total_active = 0;
    let mut total_completed = 0;
    let mut total_days_open = 0_i64;

    for project in projects {
        let mut completed = Vec::new();

        for story in stories.iter().filter(|s| s.project_id == project.id) {
            for task in tasks.iter().filter(|t| t.user_story_id == story.id) {
                match task.status {
                    TaskStatus::Active => total_active += 1,
                    TaskStatus::Blocked => blocked_tasks.push(BlockedTaskInfo {
                        id: task.id.clone(),
                        title: task.title.clone(),
                        project_title: project.title.clone(),
                        user_story_title: story.title.clone(),
                        blocked_by: task.blocked_by.clone(),
                        blocked_reason: task.blocked_reason.clone(),
                        days_blocked: dates::days_blocked(task.blocked_at, now),
                    }),
                    TaskStatus::New | TaskStatus::Completed => {}
                }

                let Some(completed_at) = task.completed_at.filter(|at| quarter.contains(*at))
                else {
                    continue;
                };
                let days_open = dates::days_open(task.start_date, task.created_at, now);
                total_completed += 1;
                total_days_open += days_open;
                completed.push(CompletedTaskInfo {
                    id: task.id.clone(),
                    title: task.title.clone(),
                    user_story_title: story.title.clone(),
                    completed_at,
                    days_open,
                });
            }
        }

        if !completed.is_empty() {
            completed_by_project.push(ProjectCompletedTasks {
                project_id: project.id.clone(),
                project_title: project.title.clone(),
                count: completed.len(),
                tasks: completed,
            });
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let avg_days_to_complete = if total_completed == 0 {
        0.0
    } else {
        total_days_open as f64 / total_completed as f64
    };

    QuarterlyReport {
        year: quarter.year(),
        quarter: quarter.quarter(),
        start_date: quarter.start(),
        end_date: quarter.end(),
        summary: ReportSummary {
            total_completed,
            total_active,
            total_blocked: blocked_tasks.len(),
            avg_days_to_complete,
        },
        completed_by_project,
        blocked_tasks,
    }
}
