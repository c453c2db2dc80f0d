//! Completed-work listing with time windows.
//!
//! Windows are measured on `last_updated_at`, which for a completed task
//! is the moment it was completed unless it was edited afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::dashboard::matches_search;
use crate::dates::{self, Quarter};
use crate::model::{ParseEnumError, TaskStatus};
use crate::view::TaskView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletedWindow {
    All,
    ThisWeek,
    #[default]
    ThisMonth,
    ThisQuarter,
    LastQuarter,
}

impl CompletedWindow {
    const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ThisWeek => "this_week",
            Self::ThisMonth => "this_month",
            Self::ThisQuarter => "this_quarter",
            Self::LastQuarter => "last_quarter",
        }
    }

    /// Whether `at` falls inside the window as seen from `now`.
    #[must_use]
    pub fn contains(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::ThisWeek => at >= dates::start_of_week(now),
            Self::ThisMonth => at >= dates::start_of_month(now),
            Self::ThisQuarter => Quarter::containing(now).contains(at),
            Self::LastQuarter => Quarter::containing(now).previous().contains(at),
        }
    }
}

impl fmt::Display for CompletedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletedWindow {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "all" => Ok(Self::All),
            "this_week" | "week" => Ok(Self::ThisWeek),
            "this_month" | "month" => Ok(Self::ThisMonth),
            "this_quarter" | "quarter" => Ok(Self::ThisQuarter),
            "last_quarter" => Ok(Self::LastQuarter),
            _ => Err(ParseEnumError {
                expected: "completed window",
                got: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedQuery {
    pub window: CompletedWindow,
    pub search_term: String,
    pub project_id: Option<String>,
    pub user_story_id: Option<String>,
}

fn matches_term(view: &TaskView, term: &str) -> bool {
    let hit = |text: &str| matches_search(Some(text), term);
    hit(&view.task.title)
        || hit(&view.task.description)
        || hit(&view.project_title)
        || hit(&view.user_story_title)
        || view.task.tags.iter().any(|tag| hit(tag))
}

/// Completed tasks matching `query`, most recently updated first.
#[must_use]
pub fn completed_tasks<'a>(
    views: &'a [TaskView],
    query: &CompletedQuery,
    now: DateTime<Utc>,
) -> Vec<&'a TaskView> {
    let mut out: Vec<&TaskView> = views
        .iter()
        .filter(|v| v.status() == TaskStatus::Completed)
        .filter(|v| query.project_id.as_ref().is_none_or(|id| *id == v.project_id))
        .filter(|v| {
            query
                .user_story_id
                .as_ref()
                .is_none_or(|id| *id == v.task.user_story_id)
        })
        .filter(|v| query.window.contains(v.task.last_updated_at, now))
        .filter(|v| matches_term(v, &query.search_term))
        .collect();

    out.sort_by(|a, b| b.task.last_updated_at.cmp(&a.task.last_updated_at));
    out
}
