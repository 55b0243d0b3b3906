//! End-to-end scheduling flows through the task store.

use chaoscontrol_core::{
    CoreError, FlexScope, Frequency, PlacementFailure, Placement, Priority, RecurrenceEnd,
    RecurrenceRule, ScheduleScope, SchedulerOptions, Settings, TaskRequest, TaskStore,
    TimePreference,
};
use chrono::{Duration, NaiveDate};

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

// A Monday well clear of holidays.
fn today() -> NaiveDate {
    d(2025, 3, 3)
}

fn request(title: &str, duration: u32, preference: TimePreference) -> TaskRequest {
    TaskRequest {
        title: title.to_string(),
        duration_minutes: duration,
        priority: Priority::Medium,
        calendar: "work".to_string(),
        preference,
        recurrence: None,
        depends_on: None,
    }
}

fn flexible(scope: FlexScope) -> TimePreference {
    TimePreference::Flexible { scope }
}

#[test]
fn first_task_of_the_day_starts_at_nine() {
    let mut store = TaskStore::new(Settings::default());
    let outcome = store
        .create(
            request("Deep work", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();

    let task = store.get(&outcome.created[0]).unwrap();
    assert_eq!(
        task.placement,
        Placement::Placed {
            date: today(),
            start_minute: 540
        }
    );
}

#[test]
fn second_task_respects_the_buffer() {
    let mut store = TaskStore::new(Settings::default());
    store
        .create(
            request("Morning block", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();
    let outcome = store
        .create(
            request("Follow-up", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();

    // 09:00-10:00 exists, so the next start is 10:05.
    let task = store.get(&outcome.created[0]).unwrap();
    assert_eq!(
        task.placement,
        Placement::Placed {
            date: today(),
            start_minute: 605
        }
    );
}

#[test]
fn mandatory_time_displaces_lower_priority_work() {
    let mut store = TaskStore::new(Settings::default());
    let mut filler = request("Filler", 120, flexible(FlexScope::Today));
    filler.priority = Priority::Low;
    let filler = store.create(filler, true, today()).unwrap();

    let mut urgent = request(
        "Client call",
        60,
        TimePreference::Fixed {
            date: today(),
            time: Some(540),
        },
    );
    urgent.priority = Priority::High;
    let outcome = store.create(urgent, true, today()).unwrap();

    let call = store.get(&outcome.created[0]).unwrap();
    assert_eq!(
        call.placement,
        Placement::Placed {
            date: today(),
            start_minute: 540
        }
    );
    let report = outcome.report.unwrap();
    assert_eq!(report.bumped, vec![filler.created[0].clone()]);

    // The displaced task came back later the same day with its bump counted.
    let displaced = store.get(&filler.created[0]).unwrap();
    assert_eq!(displaced.bump_count, 1);
    assert!(displaced.rescheduled);
    match displaced.placement {
        Placement::Placed { date, start_minute } => {
            assert_eq!(date, today());
            assert!(start_minute >= 605);
        }
        Placement::Unplaced => panic!("displaced task should be re-placed"),
    }
}

#[test]
fn daily_recurrence_materializes_five_mornings() {
    let mut store = TaskStore::new(Settings::default());
    let mut req = request(
        "Standup",
        15,
        TimePreference::Fixed {
            date: today(),
            time: Some(540),
        },
    );
    req.recurrence = Some(RecurrenceRule {
        frequency: Frequency::Daily,
        interval: 1,
        end: RecurrenceEnd::Count { count: 5 },
    });
    let outcome = store.create(req, true, today()).unwrap();

    assert_eq!(outcome.created.len(), 5);
    for (i, id) in outcome.created.iter().enumerate() {
        let instance = store.get(id).unwrap();
        assert_eq!(
            instance.placement,
            Placement::Placed {
                date: today() + Duration::days(i as i64),
                start_minute: 540
            }
        );
        assert!(instance.recurrence_group_id.is_some());
    }

    // All instances share one group and none carries the rule itself.
    let group = store
        .get(&outcome.created[0])
        .unwrap()
        .recurrence_group_id
        .clone();
    assert!(store
        .tasks()
        .iter()
        .all(|t| t.recurrence_group_id == group && t.recurrence.is_none()));
}

#[test]
fn dependent_lands_after_its_predecessor() {
    let mut store = TaskStore::new(Settings::default());
    let first = store
        .create(
            request("Draft report", 90, flexible(FlexScope::Today)),
            false,
            today(),
        )
        .unwrap();
    let mut second = request("Review report", 30, flexible(FlexScope::Today));
    second.depends_on = Some(first.created[0].clone());
    let second = store.create(second, false, today()).unwrap();

    store
        .auto_schedule(ScheduleScope::AllUnplaced, today(), None)
        .unwrap();

    let first = store.get(&first.created[0]).unwrap();
    let second = store.get(&second.created[0]).unwrap();
    let first_end = first.end_minute().unwrap();
    match second.placement {
        Placement::Placed { date, start_minute } => {
            assert_eq!(date, first.placed_date().unwrap());
            assert!(start_minute >= first_end);
        }
        Placement::Unplaced => panic!("dependent should be placed"),
    }
}

#[test]
fn full_day_refuses_fixed_work_until_confirmed() {
    let mut store = TaskStore::new(Settings::default());
    let filler = store
        .create(
            request("All-day workshop", 480, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();
    // Completed work still occupies the day and is not bumpable.
    store
        .toggle_completed(&filler.created[0], today())
        .unwrap();

    let req = request(
        "Extra meeting",
        60,
        TimePreference::Fixed {
            date: today(),
            time: Some(540),
        },
    );
    let outcome = store.create(req, true, today()).unwrap();
    let report = outcome.report.unwrap();
    assert_eq!(
        report.unplaced[0].reason,
        PlacementFailure::CapacityExceeded {
            date: today(),
            needs_confirmation: true
        }
    );

    // The explicit confirmation path places it anyway.
    let options = SchedulerOptions {
        allow_overbook: true,
        ..SchedulerOptions::default()
    };
    let report = store
        .auto_schedule(
            ScheduleScope::Single(outcome.created[0].clone()),
            today(),
            Some(options),
        )
        .unwrap();
    assert_eq!(report.placed, outcome.created);
}

#[test]
fn holiday_refuses_fixed_and_diverts_flexible() {
    let mut store = TaskStore::new(Settings::default());
    let good_friday = d(2025, 4, 18);

    let fixed = store
        .create(
            request(
                "Holiday meeting",
                30,
                TimePreference::Fixed {
                    date: good_friday,
                    time: Some(600),
                },
            ),
            true,
            d(2025, 4, 14),
        )
        .unwrap();
    let report = fixed.report.unwrap();
    assert_eq!(
        report.unplaced[0].reason,
        PlacementFailure::HolidayConflict { date: good_friday }
    );

    let flexible = store
        .create(
            request("Errand", 30, flexible(FlexScope::Today)),
            true,
            good_friday,
        )
        .unwrap();
    let task = store.get(&flexible.created[0]).unwrap();
    assert!(task.placed_date().unwrap() > good_friday);
}

#[test]
fn rollover_pulls_missed_work_forward() {
    let mut store = TaskStore::new(Settings::default());
    let last_week = d(2025, 2, 24);
    let missed = store
        .create(
            request("Lingering chore", 45, flexible(FlexScope::Today)),
            true,
            last_week,
        )
        .unwrap();
    let done = store
        .create(
            request("Finished chore", 30, flexible(FlexScope::Today)),
            true,
            last_week,
        )
        .unwrap();
    store.toggle_completed(&done.created[0], last_week).unwrap();

    let report = store.rollover_missed(today()).unwrap();
    assert!(report.placed.contains(&missed.created[0]));

    let rolled = store.get(&missed.created[0]).unwrap();
    assert!(rolled.placed_date().unwrap() >= today());
    assert_eq!(rolled.bump_count, 1);
    // Completed history keeps its original day.
    let kept = store.get(&done.created[0]).unwrap();
    assert_eq!(kept.placed_date(), Some(last_week));
}

#[test]
fn export_import_round_trip_preserves_placements() {
    let mut store = TaskStore::new(Settings {
        buffer_minutes: 10,
        ..Settings::default()
    });
    store
        .create(
            request("Keep me", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();
    let exported = serde_json::to_string(&store.snapshot()).unwrap();

    let (snapshot, report) = chaoscontrol_core::storage::snapshot::parse(&exported).unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.skipped, 0);

    let restored = TaskStore::from_snapshot(snapshot);
    assert_eq!(restored.settings().buffer_minutes, 10);
    assert_eq!(restored.tasks().len(), 1);
    assert!(restored.tasks()[0].is_placed());
}

#[test]
fn capacity_surface_tracks_booked_minutes() {
    let mut store = TaskStore::new(Settings::default());
    store
        .create(
            request("Hour one", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();
    store
        .create(
            request("Hour two", 60, flexible(FlexScope::Today)),
            true,
            today(),
        )
        .unwrap();

    let all = chaoscontrol_core::CalendarFilter::all();
    assert_eq!(store.used_minutes(today(), &all), 120);
    assert_eq!(store.free_minutes(today(), &all), 360);
}

#[test]
fn unknown_task_operations_surface_not_found() {
    let mut store = TaskStore::new(Settings::default());
    assert!(matches!(
        store.delete("ghost"),
        Err(CoreError::TaskNotFound(_))
    ));
    assert!(matches!(
        store.toggle_completed("ghost", today()),
        Err(CoreError::TaskNotFound(_))
    ));
    assert!(matches!(
        store.move_task("ghost", today(), 540, today()),
        Err(CoreError::TaskNotFound(_))
    ));
}
