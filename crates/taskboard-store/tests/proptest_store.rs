//! The store persists exactly what the pure lifecycle computes.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use taskboard_core::clock::{Clock, FixedClock};
use taskboard_core::config::Config;
use taskboard_core::lifecycle::{self, NewTask};
use taskboard_core::model::{Task, TaskStatus};
use taskboard_store::{NewProject, NewUserStory, Store};

#[derive(Debug, Clone)]
enum Step {
    Status(TaskStatus),
    Block { by: String, reason: String },
    Unblock,
    Note { backdate_hours: Option<i64> },
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => prop_oneof![
            Just(TaskStatus::New),
            Just(TaskStatus::Active),
            Just(TaskStatus::Blocked),
            Just(TaskStatus::Completed),
        ]
        .prop_map(Step::Status),
        2 => ("[a-zA-Z][a-zA-Z ]{0,11}", "[a-zA-Z][a-zA-Z ]{0,23}")
            .prop_map(|(by, reason)| Step::Block { by, reason }),
        1 => Just(Step::Unblock),
        1 => proptest::option::of(0i64..240)
            .prop_map(|backdate_hours| Step::Note { backdate_hours }),
    ]
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap()
}

fn seeded(clock: &Arc<FixedClock>) -> (Store, Task) {
    let mut store = Store::open_in_memory(Config::default())
        .expect("open")
        .with_clock(clock.clone());
    let project = store
        .create_project(NewProject {
            title: "Platform".into(),
            ..NewProject::default()
        })
        .expect("project");
    let story = store
        .create_story(NewUserStory {
            project_id: project.id,
            title: "Observability".into(),
            ..NewUserStory::default()
        })
        .expect("story");
    let task = store
        .create_task(NewTask {
            user_story_id: story.id,
            title: "Ship dashboards".into(),
            ..NewTask::default()
        })
        .expect("task");
    (store, task)
}

/// Everything but the generated activity entry ids.
fn comparable(task: &Task) -> (Task, Vec<(DateTime<Utc>, String)>) {
    let entries = task
        .activity_log
        .iter()
        .map(|e| (e.date, e.note.clone()))
        .collect();
    let mut rest = task.clone();
    rest.activity_log.clear();
    (rest, entries)
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(64))]

    #[test]
    fn persisted_task_matches_pure_engine(
        steps in prop::collection::vec((arb_step(), 1i64..(3 * 24 * 60)), 1..25)
    ) {
        let clock = Arc::new(FixedClock::new(start()));
        let (mut store, mut expected) = seeded(&clock);
        let id = expected.id.clone();

        for (step, gap) in &steps {
            clock.advance(Duration::minutes(*gap));
            let now = clock.now();
            let (stored, changes) = match step {
                Step::Status(status) => (
                    store.set_status(&id, *status),
                    lifecycle::set_status(&expected, *status, now),
                ),
                Step::Block { by, reason } => (
                    store.set_blocked(&id, by, reason),
                    lifecycle::set_blocked(&expected, by.trim(), reason.trim(), now),
                ),
                Step::Unblock => (
                    store.clear_blocked(&id),
                    lifecycle::clear_blocked(&expected, now),
                ),
                Step::Note { backdate_hours } => {
                    let date = backdate_hours.map(|h| now - Duration::hours(h));
                    (
                        store.add_entry(&id, "progress", date),
                        lifecycle::add_entry(&expected, "progress", date, now),
                    )
                }
            };
            changes.apply(&mut expected);
            let stored = stored.expect("store step");

            prop_assert!(stored.lifecycle_consistent());
            prop_assert_eq!(comparable(&stored), comparable(&expected));
            prop_assert_eq!(&store.task(&id).expect("reload"), &stored);
        }
    }
}
