//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use studymaestro_core::error::StoreResult;
use studymaestro_core::{
    Database, Query, Session, SessionRepository, Subject, SubjectRepository, Task, TaskRepository,
    UiEvent,
};
use tokio::sync::broadcast;

/// In-memory database that counts the writes it receives.
pub struct CountingStore {
    pub db: Database,
    writes: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            db: Database::open_memory().unwrap(),
            writes: AtomicUsize::new(0),
        })
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl SubjectRepository for CountingStore {
    fn upsert_subject(&self, subject: &Subject) -> StoreResult<i64> {
        self.count();
        self.db.upsert_subject(subject)
    }
    fn delete_subject(&self, subject_id: i64) -> StoreResult<()> {
        self.count();
        self.db.delete_subject(subject_id)
    }
    fn subject_by_id(&self, subject_id: i64) -> StoreResult<Option<Subject>> {
        self.db.subject_by_id(subject_id)
    }
    fn all_subjects(&self) -> Query<Vec<Subject>> {
        self.db.all_subjects()
    }
    fn subject_count(&self) -> Query<i64> {
        self.db.subject_count()
    }
    fn total_goal_hours(&self) -> Query<f32> {
        self.db.total_goal_hours()
    }
}

impl TaskRepository for CountingStore {
    fn upsert_task(&self, task: &Task) -> StoreResult<i64> {
        self.count();
        self.db.upsert_task(task)
    }
    fn delete_task(&self, task_id: i64) -> StoreResult<()> {
        self.count();
        self.db.delete_task(task_id)
    }
    fn task_by_id(&self, task_id: i64) -> StoreResult<Option<Task>> {
        self.db.task_by_id(task_id)
    }
    fn tasks_for_subject(&self, subject_id: i64) -> Query<Vec<Task>> {
        self.db.tasks_for_subject(subject_id)
    }
    fn all_tasks(&self) -> Query<Vec<Task>> {
        self.db.all_tasks()
    }
}

impl SessionRepository for CountingStore {
    fn insert_session(&self, session: &Session) -> StoreResult<i64> {
        self.count();
        self.db.insert_session(session)
    }
    fn delete_session(&self, session_id: i64) -> StoreResult<()> {
        self.count();
        self.db.delete_session(session_id)
    }
    fn session_by_id(&self, session_id: i64) -> StoreResult<Option<Session>> {
        self.db.session_by_id(session_id)
    }
    fn all_sessions(&self) -> Query<Vec<Session>> {
        self.db.all_sessions()
    }
    fn sessions_for_subject(&self, subject_id: i64) -> Query<Vec<Session>> {
        self.db.sessions_for_subject(subject_id)
    }
    fn recent_sessions(&self, limit: usize) -> Query<Vec<Session>> {
        self.db.recent_sessions(limit)
    }
    fn recent_sessions_for_subject(&self, subject_id: i64, limit: usize) -> Query<Vec<Session>> {
        self.db.recent_sessions_for_subject(subject_id, limit)
    }
    fn total_duration(&self) -> Query<i64> {
        self.db.total_duration()
    }
    fn total_duration_for_subject(&self, subject_id: i64) -> Query<i64> {
        self.db.total_duration_for_subject(subject_id)
    }
}

pub fn subject(id: Option<i64>, name: &str, goal_hours: f32) -> Subject {
    Subject {
        id,
        name: name.into(),
        goal_hours,
        colors: vec![0xFF_67C6E3, 0xFF_378CE7],
    }
}

pub fn drain(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
