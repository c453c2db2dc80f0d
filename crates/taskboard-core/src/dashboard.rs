//! Dashboard filtering and bucketing.
//!
//! Filters combine with AND semantics. Buckets are independent predicates
//! over the filtered set, so one task may appear in several (an Active task
//! due tomorrow is in both Active and Due Soon).

use std::fmt;
use std::str::FromStr;

use crate::model::{ParseEnumError, TaskStatus};
use crate::view::TaskView;

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Case-insensitive substring match. A blank term matches everything; a
/// missing text matches nothing.
#[must_use]
pub fn matches_search(text: Option<&str>, term: &str) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    text.is_some_and(|text| text.to_lowercase().contains(&term.to_lowercase()))
}

/// Title, description, project title, story title or the joined tags.
#[must_use]
pub fn view_matches_search(view: &TaskView, term: &str) -> bool {
    if term.trim().is_empty() {
        return true;
    }
    let joined_tags = view
        .task
        .tags
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ");

    [
        view.task.title.as_str(),
        view.task.description.as_str(),
        view.project_title.as_str(),
        view.user_story_title.as_str(),
        joined_tags.as_str(),
    ]
    .into_iter()
    .any(|text| matches_search(Some(text), term))
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Status restriction; `All` disables it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    #[must_use]
    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(status) => write!(f, "{status}"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

/// Dashboard filter configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardFilter {
    pub search_term: String,
    pub status_filter: StatusFilter,
    pub show_blocked_only: bool,
    pub show_due_soon_only: bool,
    pub show_stale_only: bool,
    pub project_id: Option<String>,
    pub user_story_id: Option<String>,
}

impl DashboardFilter {
    /// Whether any user-facing filter is set (scope is not a filter).
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.search_term.is_empty()
            || self.show_blocked_only
            || self.show_due_soon_only
            || self.show_stale_only
            || self.status_filter != StatusFilter::All
    }

    /// Reset user-facing filters, keeping the scope.
    pub fn clear(&mut self) {
        *self = Self {
            project_id: self.project_id.take(),
            user_story_id: self.user_story_id.take(),
            ..Self::default()
        };
    }

    #[must_use]
    pub fn matches(&self, view: &TaskView) -> bool {
        if self
            .project_id
            .as_ref()
            .is_some_and(|id| *id != view.project_id)
        {
            return false;
        }
        if self
            .user_story_id
            .as_ref()
            .is_some_and(|id| *id != view.task.user_story_id)
        {
            return false;
        }
        if !self.search_term.is_empty() && !view_matches_search(view, &self.search_term) {
            return false;
        }
        if !self.status_filter.matches(view.status()) {
            return false;
        }
        if self.show_blocked_only && !view.task.is_blocked {
            return false;
        }
        if self.show_due_soon_only && !view.is_due_soon {
            return false;
        }
        if self.show_stale_only && !view.is_stale {
            return false;
        }
        true
    }
}

/// The subset of `views` passing every active filter, in input order.
#[must_use]
pub fn filter_tasks<'a>(views: &'a [TaskView], filter: &DashboardFilter) -> Vec<&'a TaskView> {
    views.iter().filter(|view| filter.matches(view)).collect()
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Dashboard buckets in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    New,
    Blocked,
    Active,
    DueSoon,
    Stale,
}

impl SectionKind {
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Blocked,
        Self::Active,
        Self::DueSoon,
        Self::Stale,
    ];

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Blocked => "Blocked / Waiting",
            Self::Active => "Active",
            Self::DueSoon => "Due Soon",
            Self::Stale => "Stale",
        }
    }

    /// Bucket membership for a single task.
    #[must_use]
    pub fn admits(self, view: &TaskView) -> bool {
        let status = view.status();
        match self {
            Self::New => status == TaskStatus::New,
            Self::Blocked => status == TaskStatus::Blocked,
            Self::Active => status == TaskStatus::Active,
            Self::DueSoon => view.is_due_soon && status != TaskStatus::Completed,
            Self::Stale => {
                view.is_stale && !matches!(status, TaskStatus::Completed | TaskStatus::Blocked)
            }
        }
    }
}

/// One rendered bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section<'a> {
    pub kind: SectionKind,
    pub tasks: Vec<&'a TaskView>,
}

/// Filter `views` and split the result into buckets, omitting empty ones.
#[must_use]
pub fn dashboard_sections<'a>(
    views: &'a [TaskView],
    filter: &DashboardFilter,
) -> Vec<Section<'a>> {
    let filtered = filter_tasks(views, filter);
    SectionKind::ALL
        .into_iter()
        .map(|kind| Section {
            kind,
            tasks: filtered.iter().copied().filter(|v| kind.admits(v)).collect(),
        })
        .filter(|section| !section.tasks.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Board columns
// ---------------------------------------------------------------------------

/// Per-status columns for a story board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KanbanColumns<'a> {
    pub new: Vec<&'a TaskView>,
    pub active: Vec<&'a TaskView>,
    pub blocked: Vec<&'a TaskView>,
    /// Archived completed tasks are hidden from the board.
    pub completed: Vec<&'a TaskView>,
}

impl<'a> KanbanColumns<'a> {
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> &[&'a TaskView] {
        match status {
            TaskStatus::New => &self.new,
            TaskStatus::Active => &self.active,
            TaskStatus::Blocked => &self.blocked,
            TaskStatus::Completed => &self.completed,
        }
    }
}

#[must_use]
pub fn kanban_columns(views: &[TaskView]) -> KanbanColumns<'_> {
    let mut columns = KanbanColumns::default();
    for view in views {
        match view.status() {
            TaskStatus::New => columns.new.push(view),
            TaskStatus::Active => columns.active.push(view),
            TaskStatus::Blocked => columns.blocked.push(view),
            TaskStatus::Completed if !view.task.is_archived => columns.completed.push(view),
            TaskStatus::Completed => {}
        }
    }
    columns
}
