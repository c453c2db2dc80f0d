use proptest::prelude::*;
use taskboard_core::lifecycle::{self, NewTask};
use taskboard_core::model::{Task, TaskStatus};

use generators::*;

fn fresh(now: chrono::DateTime<chrono::Utc>) -> Task {
    lifecycle::new_task(
        NewTask {
            user_story_id: "s-1".into(),
            title: "Prepare onboarding pack".into(),
            ..NewTask::default()
        },
        now,
    )
}

fn run(task: &mut Task, step: &Step, now: chrono::DateTime<chrono::Utc>) {
    let changes = match step {
        Step::Status(status) => lifecycle::set_status(task, *status, now),
        Step::Block { by, reason } => lifecycle::set_blocked(task, by, reason, now),
        Step::Unblock => lifecycle::clear_blocked(task, now),
        Step::Note { backdate_hours } => {
            let date = backdate_hours.map(|h| now - chrono::Duration::hours(h));
            lifecycle::add_entry(task, "progress", date, now)
        }
    };
    changes.apply(task);
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(2000))]

    #[test]
    fn redundant_fields_track_status(
        (steps, times) in prop::collection::vec(arb_step(), 1..40)
            .prop_flat_map(|steps| { let n = steps.len() + 1; (Just(steps), arb_timeline(n)) })
    ) {
        let mut task = fresh(times[0]);
        for (step, now) in steps.iter().zip(&times[1..]) {
            run(&mut task, step, *now);
            prop_assert!(task.lifecycle_consistent(), "after {:?}: {:?}", step, task);
        }
    }

    #[test]
    fn start_date_is_never_cleared(
        (steps, times) in prop::collection::vec(arb_step(), 1..40)
            .prop_flat_map(|steps| { let n = steps.len() + 1; (Just(steps), arb_timeline(n)) })
    ) {
        let mut task = fresh(times[0]);
        let mut started = None;
        for (step, now) in steps.iter().zip(&times[1..]) {
            run(&mut task, step, *now);
            if let Some(first) = started {
                prop_assert_eq!(task.start_date, Some(first));
            }
            started = task.start_date;
        }
    }

    #[test]
    fn leaving_blocked_clears_details(
        status in arb_status().prop_filter("leaves blocked", |s| *s != TaskStatus::Blocked),
        (by, reason) in ("[a-z]{1,8}", "[a-z]{1,8}"),
        times in arb_timeline(3),
    ) {
        let mut task = fresh(times[0]);
        lifecycle::set_blocked(&task, &by, &reason, times[1]).apply(&mut task);
        prop_assert_eq!(&task.blocked_by, &by);
        lifecycle::set_status(&task, status, times[2]).apply(&mut task);
        prop_assert!(task.blocked_by.is_empty());
        prop_assert!(task.blocked_reason.is_empty());
        prop_assert_eq!(task.last_updated_at, times[2]);
    }

    #[test]
    fn activity_log_stays_newest_first(
        backdates in prop::collection::vec(proptest::option::of(0i64..500), 1..20),
        times in arb_timeline(21),
    ) {
        let mut task = fresh(times[0]);
        for (hours, now) in backdates.iter().zip(&times[1..]) {
            let date = hours.map(|h| *now - chrono::Duration::hours(h));
            lifecycle::add_entry(&task, "note", date, *now).apply(&mut task);
        }
        prop_assert_eq!(task.activity_log.len(), backdates.len());
        prop_assert!(task.activity_log.windows(2).all(|w| w[0].date >= w[1].date));
    }
}
