//! Tag vocabulary shared across projects, stories and tasks.

use std::collections::BTreeSet;

use crate::model::{Project, Task, UserStory};

/// Every distinct tag in use, sorted case-insensitively.
///
/// Tags differing only in case are kept as separate entries.
#[must_use]
pub fn all_tags(projects: &[Project], stories: &[UserStory], tasks: &[Task]) -> Vec<String> {
    let distinct: BTreeSet<&String> = projects
        .iter()
        .flat_map(|p| &p.tags)
        .chain(stories.iter().flat_map(|s| &s.tags))
        .chain(tasks.iter().flat_map(|t| &t.tags))
        .collect();

    let mut tags: Vec<String> = distinct.into_iter().cloned().collect();
    tags.sort_by_cached_key(|t| (t.to_lowercase(), t.clone()));
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{self, NewTask};
    use chrono::{TimeZone, Utc};

    #[test]
    fn merges_and_sorts_ignoring_case() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let project = Project {
            id: "p-1".into(),
            title: "Ops".into(),
            description: String::new(),
            tags: ["beta".to_string(), "Alpha".to_string()].into(),
            created_at: now,
            is_archived: false,
            sort_order: 0,
        };
        let story = UserStory {
            id: "s-1".into(),
            project_id: "p-1".into(),
            title: "Story".into(),
            description: String::new(),
            tags: ["beta".to_string()].into(),
            created_at: now,
            is_archived: true,
            sort_order: 0,
        };
        let task = lifecycle::new_task(
            NewTask {
                user_story_id: "s-1".into(),
                title: "Task".into(),
                tags: ["Gamma".to_string(), "alpha".to_string()].into(),
                ..NewTask::default()
            },
            now,
        );

        let tags = all_tags(&[project], &[story], &[task]);
        assert_eq!(tags, ["Alpha", "alpha", "beta", "Gamma"]);
    }
}
