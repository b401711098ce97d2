//! Screen models.
//!
//! Each screen pairs an [`Aggregator`](crate::reactive::Aggregator) with a
//! command surface. Commands run their store calls on the blocking pool and
//! report every outcome as a [`UiEvent`] on the screen's event channel.

pub mod dashboard;
pub mod session;
pub mod subject;
pub mod task;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{info, trace, warn};

use crate::error::{StoreError, StoreResult};
use crate::events::UiEvent;
use crate::model::{Session, Task};
use crate::storage::{Config, StudyStore};

pub use dashboard::{DashboardEvent, DashboardModel, DashboardSnapshot};
pub use session::{SessionEvent, SessionModel, SessionSnapshot};
pub use subject::{SubjectEvent, SubjectModel, SubjectSnapshot};
pub use task::{TaskEvent, TaskModel, TaskSnapshot};

const EVENT_CAPACITY: usize = 64;

/// Knobs shared by every screen model.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSettings {
    pub stop_timeout: Duration,
    pub dashboard_recent_sessions: usize,
    pub subject_recent_sessions: usize,
    pub min_session_secs: i64,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for ScreenSettings {
    fn from(config: &Config) -> Self {
        Self {
            stop_timeout: config.stop_timeout(),
            dashboard_recent_sessions: config.screens.dashboard_recent_sessions,
            subject_recent_sessions: config.screens.subject_recent_sessions,
            min_session_secs: config.sessions.min_duration_secs,
        }
    }
}

impl ScreenSettings {
    /// Defaults with a different teardown grace period.
    pub fn with_stop_timeout(stop_timeout: Duration) -> Self {
        Self {
            stop_timeout,
            ..Self::default()
        }
    }
}

/// Fan-out for a screen's UI events.
///
/// Sending with no receiver attached is not an error; the event is dropped.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: broadcast::Sender<UiEvent>,
}

impl EventSink {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub(crate) fn emit(&self, event: UiEvent) {
        trace!(?event, "ui event");
        let _ = self.tx.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }
}

/// Run a store call on the blocking pool.
pub(crate) async fn blocking<T, F>(call: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(StoreError::from)?
}

/// Flip a task's completion flag and persist it.
pub(crate) async fn toggle_task_completion(
    store: &Arc<dyn StudyStore>,
    events: &EventSink,
    task: Task,
) {
    let was_complete = task.is_complete;
    let toggled = task.toggled();
    let store = Arc::clone(store);
    match blocking(move || store.upsert_task(&toggled)).await {
        Ok(task_id) => {
            info!(task_id, is_complete = !was_complete, "task completion toggled");
            events.emit(UiEvent::message(if was_complete {
                "Saved in upcoming tasks."
            } else {
                "Saved in Completed tasks."
            }));
        }
        Err(err) => {
            warn!(error = %err, "task toggle failed");
            events.emit(UiEvent::failure("Couldn't update task status.", err));
        }
    }
}

/// Delete the session picked for deletion, if any. Returns whether a session
/// was deleted.
pub(crate) async fn delete_selected_session(
    store: &Arc<dyn StudyStore>,
    events: &EventSink,
    selected: Option<Session>,
) -> bool {
    let Some(session) = selected else {
        return false;
    };
    let Some(session_id) = session.id else {
        events.emit(UiEvent::message("No Session to delete"));
        return false;
    };
    let store = Arc::clone(store);
    match blocking(move || store.delete_session(session_id)).await {
        Ok(()) => {
            info!(session_id, "session deleted");
            events.emit(UiEvent::message("Session deleted successfully"));
            true
        }
        Err(err) => {
            warn!(error = %err, "session delete failed");
            events.emit(UiEvent::failure("Couldn't delete session.", err));
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store double that wraps an in-memory database and can be told to fail.

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::error::{StoreError, StoreResult};
    use crate::events::UiEvent;
    use crate::model::{Session, Subject, Task};
    use crate::reactive::Query;
    use crate::storage::{Database, SessionRepository, SubjectRepository, TaskRepository};
    use tokio::sync::broadcast;

    pub struct FlakyStore {
        db: Database,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    impl FlakyStore {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                db: Database::open_memory().unwrap(),
                fail_writes: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
            })
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Write calls that reached the store, failed ones included.
        pub fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        fn write<T>(&self, op: impl FnOnce(&Database) -> StoreResult<T>) -> StoreResult<T> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Locked);
            }
            op(&self.db)
        }
    }

    impl SubjectRepository for FlakyStore {
        fn upsert_subject(&self, subject: &Subject) -> StoreResult<i64> {
            self.write(|db| db.upsert_subject(subject))
        }
        fn delete_subject(&self, subject_id: i64) -> StoreResult<()> {
            self.write(|db| db.delete_subject(subject_id))
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

    impl TaskRepository for FlakyStore {
        fn upsert_task(&self, task: &Task) -> StoreResult<i64> {
            self.write(|db| db.upsert_task(task))
        }
        fn delete_task(&self, task_id: i64) -> StoreResult<()> {
            self.write(|db| db.delete_task(task_id))
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

    impl SessionRepository for FlakyStore {
        fn insert_session(&self, session: &Session) -> StoreResult<i64> {
            self.write(|db| db.insert_session(session))
        }
        fn delete_session(&self, session_id: i64) -> StoreResult<()> {
            self.write(|db| db.delete_session(session_id))
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

    /// Everything queued on `rx` right now.
    pub fn drain(rx: &mut broadcast::Receiver<UiEvent>) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}
