//! Store contracts the screens depend on.
//!
//! Writes are plain blocking calls; the screens move them off the async
//! executor. Every read that a screen displays is a [`Query`], re-emitting its
//! full result set whenever the table behind it changes.

use crate::error::StoreResult;
use crate::model::{Session, Subject, Task};
use crate::reactive::Query;

pub trait SubjectRepository: Send + Sync {
    /// Insert when `subject.id` is `None`, otherwise update. Returns the id.
    fn upsert_subject(&self, subject: &Subject) -> StoreResult<i64>;

    /// Delete a subject together with its tasks and sessions.
    fn delete_subject(&self, subject_id: i64) -> StoreResult<()>;

    fn subject_by_id(&self, subject_id: i64) -> StoreResult<Option<Subject>>;

    fn all_subjects(&self) -> Query<Vec<Subject>>;

    fn subject_count(&self) -> Query<i64>;

    fn total_goal_hours(&self) -> Query<f32>;
}

pub trait TaskRepository: Send + Sync {
    /// Insert when `task.id` is `None`, otherwise update. Returns the id.
    fn upsert_task(&self, task: &Task) -> StoreResult<i64>;

    fn delete_task(&self, task_id: i64) -> StoreResult<()>;

    fn task_by_id(&self, task_id: i64) -> StoreResult<Option<Task>>;

    fn tasks_for_subject(&self, subject_id: i64) -> Query<Vec<Task>>;

    fn all_tasks(&self) -> Query<Vec<Task>>;
}

pub trait SessionRepository: Send + Sync {
    fn insert_session(&self, session: &Session) -> StoreResult<i64>;

    fn delete_session(&self, session_id: i64) -> StoreResult<()>;

    fn session_by_id(&self, session_id: i64) -> StoreResult<Option<Session>>;

    /// Newest first.
    fn all_sessions(&self) -> Query<Vec<Session>>;

    /// Newest first.
    fn sessions_for_subject(&self, subject_id: i64) -> Query<Vec<Session>>;

    /// The `limit` newest sessions.
    fn recent_sessions(&self, limit: usize) -> Query<Vec<Session>>;

    fn recent_sessions_for_subject(&self, subject_id: i64, limit: usize) -> Query<Vec<Session>>;

    /// Sum of all session durations, seconds.
    fn total_duration(&self) -> Query<i64>;

    fn total_duration_for_subject(&self, subject_id: i64) -> Query<i64>;
}

/// A store that holds every entity kind.
pub trait StudyStore: SubjectRepository + TaskRepository + SessionRepository {}

impl<T: SubjectRepository + TaskRepository + SessionRepository> StudyStore for T {}
