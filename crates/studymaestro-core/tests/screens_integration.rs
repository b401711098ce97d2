//! Integration tests for the screen models over the SQLite store.

mod common;

use std::time::Duration;

use common::{drain, subject, CountingStore};
use proptest::prelude::*;
use studymaestro_core::{
    DashboardEvent, DashboardModel, Priority, ScreenSettings, Session, SessionEvent,
    SessionModel, SessionRepository, SubjectEvent, SubjectModel, SubjectRepository, Task,
    TaskRepository, UiEvent,
};

fn task(subject_id: i64, title: &str) -> Task {
    Task {
        id: None,
        title: title.into(),
        description: String::new(),
        due_date: 1_700_000_000_000,
        priority: Priority::Medium,
        related_to_subject: "Physics".into(),
        is_complete: false,
        subject_id,
    }
}

#[tokio::test]
async fn test_subject_progress_scenario() {
    let store = CountingStore::new();
    let id = store.upsert_subject(&subject(None, "Physics", 10.0)).unwrap();
    for duration in [7_200, 7_200, 3_600] {
        store
            .insert_session(&Session {
                id: None,
                subject_id: id,
                related_to_subject: "Physics".into(),
                date: 1,
                duration,
            })
            .unwrap();
    }

    let model = SubjectModel::new(store.clone(), id, &ScreenSettings::default());
    let mut sub = model.subscribe();
    model.load().await;

    let snap = sub
        .wait_for(|s| s.goal_hours == "10" && s.studied_hours > 0.0)
        .await
        .unwrap();
    assert_eq!(snap.studied_hours, 5.0);
    assert_eq!(snap.progress, 0.5);
    assert_eq!(snap.recent_sessions.len(), 3);
}

#[tokio::test]
async fn test_delete_loaded_subject_navigates_up() {
    let store = CountingStore::new();
    store.upsert_subject(&subject(Some(7), "Physics", 4.0)).unwrap();
    store.upsert_task(&task(7, "Read chapter 2")).unwrap();

    let model = SubjectModel::new(store.clone(), 7, &ScreenSettings::default());
    model.load().await;
    assert_eq!(model.aggregator().draft().current_subject_id, Some(7));

    let mut events = model.events();
    model.on_event(SubjectEvent::DeleteSubject).await;

    assert_eq!(
        drain(&mut events),
        vec![
            UiEvent::message("Subject deleted successfully"),
            UiEvent::NavigateUp
        ]
    );
    assert!(store.subject_by_id(7).unwrap().is_none());
    assert!(store.tasks_for_subject(7).fetch().unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_without_loaded_subject() {
    let store = CountingStore::new();
    let model = SubjectModel::new(store.clone(), 7, &ScreenSettings::default());
    let mut events = model.events();
    model.on_event(SubjectEvent::DeleteSubject).await;

    assert_eq!(
        drain(&mut events),
        vec![UiEvent::message("No Subject to delete")]
    );
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn test_double_toggle_restores_list_membership() {
    let store = CountingStore::new();
    let id = store.upsert_subject(&subject(None, "Physics", 4.0)).unwrap();
    let task_id = store.upsert_task(&task(id, "Problem set")).unwrap();

    let model = SubjectModel::new(store.clone(), id, &ScreenSettings::default());
    let mut sub = model.subscribe();
    sub.wait_for(|s| s.upcoming_tasks.len() == 1).await.unwrap();

    let original = store.task_by_id(task_id).unwrap().unwrap();
    model
        .on_event(SubjectEvent::TaskCompletionToggled(original.clone()))
        .await;
    let snap = sub.wait_for(|s| s.completed_tasks.len() == 1).await.unwrap();
    assert!(snap.upcoming_tasks.is_empty());

    model
        .on_event(SubjectEvent::TaskCompletionToggled(snap.completed_tasks[0].clone()))
        .await;
    let snap = sub.wait_for(|s| s.upcoming_tasks.len() == 1).await.unwrap();
    assert!(snap.completed_tasks.is_empty());
    assert_eq!(snap.upcoming_tasks[0], original);
}

#[tokio::test]
async fn test_dashboard_tracks_writes_from_other_screens() {
    let store = CountingStore::new();
    let settings = ScreenSettings::default();
    let dashboard = DashboardModel::new(store.clone(), &settings);
    let sessions = SessionModel::new(store.clone(), &settings);
    let mut sub = dashboard.subscribe();

    dashboard
        .on_event(DashboardEvent::SubjectNameChanged("History".into()))
        .await;
    dashboard
        .on_event(DashboardEvent::GoalHoursChanged("2".into()))
        .await;
    dashboard.on_event(DashboardEvent::SaveSubject).await;

    let snap = sub.wait_for(|s| s.subjects.len() == 1).await.unwrap();
    sessions
        .on_event(SessionEvent::RelatedSubjectChanged(snap.subjects[0].clone()))
        .await;
    sessions.on_event(SessionEvent::SaveSession(3_600)).await;

    let snap = sub
        .wait_for(|s| s.total_studied_hours == 1.0)
        .await
        .unwrap();
    assert_eq!(snap.total_goal_hours, 2.0);
    assert_eq!(snap.recent_sessions.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_screen_reactivates_after_grace_period() {
    let store = CountingStore::new();
    let settings = ScreenSettings::with_stop_timeout(Duration::from_millis(5000));
    let dashboard = DashboardModel::new(store.clone(), &settings);

    let sub = dashboard.subscribe();
    drop(sub);
    tokio::time::sleep(Duration::from_millis(2000)).await;
    let sub = dashboard.subscribe();
    drop(sub);
    assert_eq!(dashboard.aggregator().activations(), 1);

    tokio::time::sleep(Duration::from_millis(6000)).await;
    assert!(!dashboard.aggregator().is_active());

    store.upsert_subject(&subject(None, "Art", 1.0)).unwrap();
    let mut sub = dashboard.subscribe();
    let snap = sub.wait_for(|s| s.total_subject_count == 1).await.unwrap();
    assert_eq!(snap.subjects[0].name, "Art");
    assert_eq!(dashboard.aggregator().activations(), 2);
}

fn save_once(duration: i64) -> (Vec<UiEvent>, usize, i64) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    rt.block_on(async {
        let store = CountingStore::new();
        let id = store.upsert_subject(&subject(None, "Physics", 1.0)).unwrap();
        let baseline = store.writes();
        let model = SessionModel::new(store.clone(), &ScreenSettings::default());
        model
            .on_event(SessionEvent::SetSubject {
                related_to_subject: Some("Physics".into()),
                subject_id: Some(id),
            })
            .await;
        let mut events = model.events();
        model.on_event(SessionEvent::SaveSession(duration)).await;
        let total = store.total_duration().fetch().unwrap();
        (drain(&mut events), store.writes() - baseline, total)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn short_sessions_never_reach_store(duration in -1_000i64..36) {
        let (events, writes, total) = save_once(duration);
        prop_assert_eq!(writes, 0);
        prop_assert_eq!(total, 0);
        prop_assert_eq!(
            events,
            vec![UiEvent::message("Single session can not be less than 36 seconds")]
        );
    }

    #[test]
    fn long_enough_sessions_persist_exactly(duration in 36i64..1_000_000) {
        let (events, writes, total) = save_once(duration);
        prop_assert_eq!(writes, 1);
        prop_assert_eq!(total, duration);
        prop_assert_eq!(events, vec![UiEvent::message("Session saved successfully")]);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_toggled_task_is_never_in_both_lists() {
    let store = CountingStore::new();
    let id = store.upsert_subject(&subject(None, "Physics", 4.0)).unwrap();
    let task_id = store.upsert_task(&task(id, "Problem set")).unwrap();

    let model = SubjectModel::new(store.clone(), id, &ScreenSettings::default());
    let mut sub = model.subscribe();

    let writer_store = store.clone();
    let writer = tokio::task::spawn_blocking(move || {
        let mut toggled = writer_store.task_by_id(task_id).unwrap().unwrap();
        for round in 0..100 {
            toggled.is_complete = round % 2 == 0;
            writer_store.upsert_task(&toggled).unwrap();
        }
    });

    let check = async {
        while let Some(snap) = sub.changed().await {
            assert_eq!(
                snap.upcoming_tasks.len() + snap.completed_tasks.len(),
                1,
                "task listed {} times",
                snap.upcoming_tasks.len() + snap.completed_tasks.len()
            );
        }
    };
    tokio::select! {
        _ = check => {}
        done = writer => done.unwrap(),
    }

    let snap = sub.wait_for(|s| s.upcoming_tasks.len() == 1).await.unwrap();
    assert!(snap.completed_tasks.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_dashboard_subject_totals_match_subject_list() {
    let store = CountingStore::new();
    let dashboard = DashboardModel::new(store.clone(), &ScreenSettings::default());
    let mut sub = dashboard.subscribe();

    let writer_store = store.clone();
    let writer = tokio::task::spawn_blocking(move || {
        for n in 0..50 {
            writer_store
                .upsert_subject(&subject(None, &format!("Subject {n}"), 1.0))
                .unwrap();
        }
    });

    let check = async {
        while let Some(snap) = sub.changed().await {
            assert_eq!(snap.total_subject_count as usize, snap.subjects.len());
            assert_eq!(snap.total_goal_hours, snap.subjects.len() as f32);
        }
    };
    tokio::select! {
        _ = check => {}
        done = writer => done.unwrap(),
    }

    let snap = sub.wait_for(|s| s.subjects.len() == 50).await.unwrap();
    assert_eq!(snap.total_subject_count, 50);
    assert_eq!(snap.total_goal_hours, 50.0);
}
