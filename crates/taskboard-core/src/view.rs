//! View-model projector.
//!
//! Joins a task to its owning story and project and derives the
//! point-in-time attributes the dashboard, board and reports display.
//! Projection is a pure function of its inputs and `now`; nothing is
//! cached, views are recomputed on every read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::ThresholdConfig;
use crate::dates;
use crate::model::{Project, Task, TaskStatus, UserStory};

/// A task enriched with ancestry and time-derived flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: Task,
    pub project_id: String,
    pub project_title: String,
    pub user_story_title: String,
    pub days_open: i64,
    pub days_blocked: Option<i64>,
    /// `due_date - now` in whole days; negative once overdue.
    pub days_until_due: Option<i64>,
    pub is_overdue: bool,
    pub is_due_soon: bool,
    pub is_stale: bool,
    pub days_since_update: i64,
}

impl TaskView {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.task.id
    }

    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.task.status
    }
}

/// Project one task against its ancestors.
#[must_use]
pub fn project_task(
    task: &Task,
    story: &UserStory,
    project: &Project,
    now: DateTime<Utc>,
    thresholds: &ThresholdConfig,
) -> TaskView {
    let days_until_due = task.due_date.map(|due| dates::days_until(due, now));

    TaskView {
        task: task.clone(),
        project_id: project.id.clone(),
        project_title: project.title.clone(),
        user_story_title: story.title.clone(),
        days_open: dates::days_open(task.start_date, task.created_at, now),
        days_blocked: dates::days_blocked(task.blocked_at, now),
        days_until_due,
        is_overdue: dates::is_overdue(task.due_date, now),
        is_due_soon: dates::is_due_soon(task.due_date, now, thresholds.due_soon_days),
        is_stale: dates::is_stale(task.last_updated_at, now, thresholds.stale_days),
        days_since_update: dates::days_ago(task.last_updated_at, now),
    }
}

/// Lookup tables for resolving a task's ancestry.
#[derive(Debug, Default)]
pub struct Ancestry<'a> {
    stories: HashMap<&'a str, &'a UserStory>,
    projects: HashMap<&'a str, &'a Project>,
}

impl<'a> Ancestry<'a> {
    #[must_use]
    pub fn new(stories: &'a [UserStory], projects: &'a [Project]) -> Self {
        Self {
            stories: stories.iter().map(|s| (s.id.as_str(), s)).collect(),
            projects: projects.iter().map(|p| (p.id.as_str(), p)).collect(),
        }
    }

    /// The story and project owning `task`, if both still exist.
    #[must_use]
    pub fn resolve(&self, task: &Task) -> Option<(&'a UserStory, &'a Project)> {
        let story = *self.stories.get(task.user_story_id.as_str())?;
        let project = *self.projects.get(story.project_id.as_str())?;
        Some((story, project))
    }
}

/// Project a list of tasks, preserving order.
///
/// Tasks whose story or project no longer exists are left out; they are
/// orphans awaiting the cleanup pass, not errors.
#[must_use]
pub fn project_tasks(
    tasks: &[Task],
    ancestry: &Ancestry<'_>,
    now: DateTime<Utc>,
    thresholds: &ThresholdConfig,
) -> Vec<TaskView> {
    tasks
        .iter()
        .filter_map(|task| {
            let Some((story, project)) = ancestry.resolve(task) else {
                debug!(
                    task_id = %task.id,
                    user_story_id = %task.user_story_id,
                    "dropping orphaned task from view"
                );
                return None;
            };
            Some(project_task(task, story, project, now, thresholds))
        })
        .collect()
}

/// A project with sidebar counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWithCounts {
    pub project: Project,
    pub user_story_count: usize,
    pub task_count: usize,
    pub blocked_count: usize,
    pub active_count: usize,
}

/// A user story with sidebar counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStoryWithCounts {
    pub story: UserStory,
    pub task_count: usize,
    pub completed_count: usize,
    pub blocked_count: usize,
}

/// Counts over the project's non-archived stories and their non-archived
/// tasks.
#[must_use]
pub fn project_counts(
    project: &Project,
    stories: &[UserStory],
    tasks: &[Task],
) -> ProjectWithCounts {
    let story_ids: Vec<&str> = stories
        .iter()
        .filter(|s| s.project_id == project.id && !s.is_archived)
        .map(|s| s.id.as_str())
        .collect();
    let owned: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_archived && story_ids.contains(&t.user_story_id.as_str()))
        .collect();

    ProjectWithCounts {
        project: project.clone(),
        user_story_count: story_ids.len(),
        task_count: owned.len(),
        blocked_count: owned.iter().filter(|t| t.status == TaskStatus::Blocked).count(),
        active_count: owned.iter().filter(|t| t.status == TaskStatus::Active).count(),
    }
}

/// Counts over the story's non-archived tasks.
#[must_use]
pub fn story_counts(story: &UserStory, tasks: &[Task]) -> UserStoryWithCounts {
    let owned: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.user_story_id == story.id && !t.is_archived)
        .collect();

    UserStoryWithCounts {
        story: story.clone(),
        task_count: owned.len(),
        completed_count: owned.iter().filter(|t| t.status == TaskStatus::Completed).count(),
        blocked_count: owned.iter().filter(|t| t.status == TaskStatus::Blocked).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{self, NewTask};
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeSet;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 20, 9, 0, 0).unwrap()
    }

    fn project(id: &str) -> Project {
        Project {
            id: id.into(),
            title: format!("Project {id}"),
            description: String::new(),
            tags: BTreeSet::new(),
            created_at: now() - Duration::days(90),
            is_archived: false,
            sort_order: 0,
        }
    }

    fn story(id: &str, project_id: &str) -> UserStory {
        UserStory {
            id: id.into(),
            project_id: project_id.into(),
            title: format!("Story {id}"),
            description: String::new(),
            tags: BTreeSet::new(),
            created_at: now() - Duration::days(60),
            is_archived: false,
            sort_order: 0,
        }
    }

    fn task(story_id: &str, created_days_ago: i64) -> Task {
        lifecycle::new_task(
            NewTask {
                user_story_id: story_id.into(),
                title: "Collect references".into(),
                ..NewTask::default()
            },
            now() - Duration::days(created_days_ago),
        )
    }

    #[test]
    fn derived_attributes_follow_dates() {
        let p = project("p-1");
        let s = story("s-1", "p-1");
        let mut t = task("s-1", 10);
        t.due_date = Some(now() + Duration::days(3));
        lifecycle::set_blocked(&t, "Payroll", "Waiting on numbers", now() - Duration::days(2))
            .apply(&mut t);

        let view = project_task(&t, &s, &p, now(), &ThresholdConfig::default());
        assert_eq!(view.project_id, "p-1");
        assert_eq!(view.project_title, "Project p-1");
        assert_eq!(view.user_story_title, "Story s-1");
        assert_eq!(view.days_open, 2, "measured from the auto-set start date");
        assert_eq!(view.days_blocked, Some(2));
        assert_eq!(view.days_until_due, Some(3));
        assert!(view.is_due_soon);
        assert!(!view.is_overdue);
        assert!(!view.is_stale);
        assert_eq!(view.days_since_update, 2);
    }

    #[test]
    fn untouched_task_goes_stale() {
        let p = project("p-1");
        let s = story("s-1", "p-1");
        let t = task("s-1", 8);
        let view = project_task(&t, &s, &p, now(), &ThresholdConfig::default());
        assert!(view.is_stale);
        assert_eq!(view.days_open, 8);
        assert_eq!(view.days_blocked, None);
        assert_eq!(view.days_until_due, None);
    }

    #[test]
    fn thresholds_are_configurable() {
        let p = project("p-1");
        let s = story("s-1", "p-1");
        let mut t = task("s-1", 3);
        t.due_date = Some(now() + Duration::days(5));
        let tight = ThresholdConfig {
            due_soon_days: 2,
            stale_days: 3,
        };
        let view = project_task(&t, &s, &p, now(), &tight);
        assert!(!view.is_due_soon);
        assert!(view.is_stale);
    }

    #[test]
    fn orphans_are_dropped_silently() {
        let projects = vec![project("p-1")];
        let stories = vec![story("s-1", "p-1"), story("s-gone-project", "p-missing")];
        let tasks = vec![task("s-1", 1), task("s-missing", 1), task("s-gone-project", 1)];

        let ancestry = Ancestry::new(&stories, &projects);
        let views = project_tasks(&tasks, &ancestry, now(), &ThresholdConfig::default());
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].id(), tasks[0].id);
    }

    #[test]
    fn counts_skip_archived_records() {
        let p = project("p-1");
        let mut archived_story = story("s-2", "p-1");
        archived_story.is_archived = true;
        let stories = vec![story("s-1", "p-1"), archived_story];

        let mut blocked = task("s-1", 1);
        lifecycle::set_blocked(&blocked, "x", "y", now()).apply(&mut blocked);
        let mut active = task("s-1", 1);
        lifecycle::set_status(&active, TaskStatus::Active, now()).apply(&mut active);
        let mut archived = task("s-1", 1);
        archived.is_archived = true;
        let hidden = task("s-2", 1);
        let tasks = vec![blocked, active, archived, hidden];

        let counts = project_counts(&p, &stories, &tasks);
        assert_eq!(counts.user_story_count, 1);
        assert_eq!(counts.task_count, 2);
        assert_eq!(counts.blocked_count, 1);
        assert_eq!(counts.active_count, 1);

        let story_view = story_counts(&stories[0], &tasks);
        assert_eq!(story_view.task_count, 2);
        assert_eq!(story_view.blocked_count, 1);
        assert_eq!(story_view.completed_count, 0);
    }
}
