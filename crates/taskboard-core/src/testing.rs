//! Builders shared by unit tests.

use chrono::{DateTime, TimeZone, Utc};

use crate::config::ThresholdConfig;
use crate::dates;
use crate::lifecycle::{self, NewTask};
use crate::model::TaskStatus;
use crate::view::TaskView;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap()
}

/// Builds a [`TaskView`] directly, bypassing the store.
pub struct ViewBuilder {
    view: TaskView,
}

impl ViewBuilder {
    pub fn new(title: &str) -> Self {
        let task = lifecycle::new_task(
            NewTask {
                user_story_id: "s-1".into(),
                title: title.into(),
                ..NewTask::default()
            },
            now(),
        );
        Self {
            view: TaskView {
                task,
                project_id: "p-1".into(),
                project_title: "Project".into(),
                user_story_title: "Story".into(),
                days_open: 0,
                days_blocked: None,
                days_until_due: None,
                is_overdue: false,
                is_due_soon: false,
                is_stale: false,
                days_since_update: 0,
            },
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        let changes = match status {
            TaskStatus::Blocked => {
                lifecycle::set_blocked(&self.view.task, "someone", "something", now())
            }
            other => lifecycle::set_status(&self.view.task, other, now()),
        };
        changes.apply(&mut self.view.task);
        self.view.days_blocked = dates::days_blocked(self.view.task.blocked_at, now());
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        let thresholds = ThresholdConfig::default();
        self.view.task.due_date = Some(due);
        self.view.days_until_due = Some(dates::days_until(due, now()));
        self.view.is_overdue = dates::is_overdue(Some(due), now());
        self.view.is_due_soon = dates::is_due_soon(Some(due), now(), thresholds.due_soon_days);
        self
    }

    pub fn stale(mut self) -> Self {
        self.view.is_stale = true;
        self
    }

    pub fn archived(mut self) -> Self {
        self.view.task.is_archived = true;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.view.task.tags.insert(tag.to_string());
        self
    }

    pub fn project(mut self, id: &str) -> Self {
        self.view.project_id = id.into();
        self
    }

    pub fn project_title(mut self, title: &str) -> Self {
        self.view.project_title = title.into();
        self
    }

    pub fn story(mut self, id: &str) -> Self {
        self.view.task.user_story_id = id.into();
        self
    }

    pub fn story_title(mut self, title: &str) -> Self {
        self.view.user_story_title = title.into();
        self
    }

    pub fn last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.view.task.last_updated_at = at;
        self.view.days_since_update = dates::days_ago(at, now());
        self
    }

    pub fn build(self) -> TaskView {
        self.view
    }
}
