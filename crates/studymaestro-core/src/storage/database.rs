//! SQLite-backed store for subjects, tasks and sessions.
//!
//! Every write bumps the revision counter of the tables it touched. Queries
//! handed out by [`Database`] carry the matching counter, so screens observing
//! them re-read after each write.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::watch;
use tracing::{debug, info};

use super::data_dir;
use super::migrations;
use super::repository::{SessionRepository, SubjectRepository, TaskRepository};
use crate::error::{StoreError, StoreResult};
use crate::model::{Priority, Session, Subject, Task};
use crate::reactive::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Subjects,
    Tasks,
    Sessions,
}

struct Inner {
    conn: Mutex<Connection>,
    subjects: watch::Sender<u64>,
    tasks: watch::Sender<u64>,
    sessions: watch::Sender<u64>,
}

/// SQLite database for study data.
///
/// Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

const SUBJECT_COLUMNS: &str = "id, name, goal_hours, colors";
const TASK_COLUMNS: &str =
    "id, title, description, due_date, priority, related_to_subject, is_complete, subject_id";
const SESSION_COLUMNS: &str = "id, subject_id, related_to_subject, date, duration";

fn row_to_subject(row: &Row) -> rusqlite::Result<Subject> {
    let colors_json: String = row.get(3)?;
    let colors = serde_json::from_str(&colors_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
        goal_hours: row.get::<_, f64>(2)? as f32,
        colors,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        priority: Priority::from_value(row.get(4)?),
        related_to_subject: row.get(5)?,
        is_complete: row.get(6)?,
        subject_id: row.get(7)?,
    })
}

fn row_to_session(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        related_to_subject: row.get(2)?,
        date: row.get(3)?,
        duration: row.get(4)?,
    })
}

impl Database {
    /// Open the database at `~/.config/studymaestro/studymaestro.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> StoreResult<Self> {
        let dir = data_dir().map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        Self::open_at(&dir.join("studymaestro.db"))
    }

    pub fn open_at(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "database opened");
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(Inner {
                conn: Mutex::new(conn),
                subjects: watch::channel(0).0,
                tasks: watch::channel(0).0,
                sessions: watch::channel(0).0,
            }),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.inner
            .conn
            .lock()
            .map_err(|_| StoreError::QueryFailed("connection mutex poisoned".into()))
    }

    fn revision(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Subjects => &self.inner.subjects,
            Table::Tasks => &self.inner.tasks,
            Table::Sessions => &self.inner.sessions,
        }
    }

    /// Run a write and bump the revisions of `tables` before the connection
    /// is released, so readers never see new rows under an old revision.
    fn write<T>(
        &self,
        tables: &[Table],
        op: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let mut conn = self.conn()?;
        let out = op(&mut conn)?;
        for table in tables {
            self.revision(*table).send_modify(|rev| *rev += 1);
        }
        Ok(out)
    }

    /// Build an observable query over `table`.
    fn query<T, F>(&self, table: Table, read: F) -> Query<T>
    where
        T: Send + 'static,
        F: Fn(&Connection) -> rusqlite::Result<T> + Send + Sync + 'static,
    {
        let db = self.clone();
        Query::new(self.revision(table).subscribe(), move || {
            let conn = db.conn()?;
            Ok(read(&conn)?)
        })
    }
}

fn collect<T>(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
    map: fn(&Row) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, map)?;
    rows.collect()
}

impl SubjectRepository for Database {
    fn upsert_subject(&self, subject: &Subject) -> StoreResult<i64> {
        let colors_json = serde_json::to_string(&subject.colors)
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;
        let id = self.write(&[Table::Subjects], |conn| {
            let id = match subject.id {
                Some(id) => {
                    conn.execute(
                        "INSERT INTO subjects (id, name, goal_hours, colors)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(id) DO UPDATE SET
                            name = excluded.name,
                            goal_hours = excluded.goal_hours,
                            colors = excluded.colors",
                        params![id, subject.name, subject.goal_hours as f64, colors_json],
                    )?;
                    id
                }
                None => {
                    conn.execute(
                        "INSERT INTO subjects (name, goal_hours, colors) VALUES (?1, ?2, ?3)",
                        params![subject.name, subject.goal_hours as f64, colors_json],
                    )?;
                    conn.last_insert_rowid()
                }
            };
            Ok(id)
        })?;
        debug!(subject_id = id, "subject upserted");
        Ok(id)
    }

    fn delete_subject(&self, subject_id: i64) -> StoreResult<()> {
        self.write(&[Table::Subjects, Table::Tasks, Table::Sessions], |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM tasks WHERE subject_id = ?1", params![subject_id])?;
            tx.execute(
                "DELETE FROM sessions WHERE subject_id = ?1",
                params![subject_id],
            )?;
            tx.execute("DELETE FROM subjects WHERE id = ?1", params![subject_id])?;
            tx.commit()
        })?;
        debug!(subject_id, "subject deleted with its tasks and sessions");
        Ok(())
    }

    fn subject_by_id(&self, subject_id: i64) -> StoreResult<Option<Subject>> {
        let conn = self.conn()?;
        let subject = conn
            .query_row(
                &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE id = ?1"),
                params![subject_id],
                row_to_subject,
            )
            .optional()?;
        Ok(subject)
    }

    fn all_subjects(&self) -> Query<Vec<Subject>> {
        self.query(Table::Subjects, |conn| {
            collect(
                conn,
                &format!("SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY id"),
                [],
                row_to_subject,
            )
        })
    }

    fn subject_count(&self) -> Query<i64> {
        self.query(Table::Subjects, |conn| {
            conn.query_row("SELECT COUNT(*) FROM subjects", [], |row| row.get(0))
        })
    }

    fn total_goal_hours(&self) -> Query<f32> {
        self.query(Table::Subjects, |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(goal_hours), 0.0) FROM subjects",
                [],
                |row| row.get::<_, f64>(0),
            )
            .map(|h| h as f32)
        })
    }
}

impl TaskRepository for Database {
    fn upsert_task(&self, task: &Task) -> StoreResult<i64> {
        let id = self.write(&[Table::Tasks], |conn| {
            let id = match task.id {
                Some(id) => {
                    conn.execute(
                        "INSERT INTO tasks (id, title, description, due_date, priority,
                                            related_to_subject, is_complete, subject_id)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT(id) DO UPDATE SET
                            title = excluded.title,
                            description = excluded.description,
                            due_date = excluded.due_date,
                            priority = excluded.priority,
                            related_to_subject = excluded.related_to_subject,
                            is_complete = excluded.is_complete,
                            subject_id = excluded.subject_id",
                        params![
                            id,
                            task.title,
                            task.description,
                            task.due_date,
                            task.priority.value(),
                            task.related_to_subject,
                            task.is_complete,
                            task.subject_id,
                        ],
                    )?;
                    id
                }
                None => {
                    conn.execute(
                        "INSERT INTO tasks (title, description, due_date, priority,
                                            related_to_subject, is_complete, subject_id)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                        params![
                            task.title,
                            task.description,
                            task.due_date,
                            task.priority.value(),
                            task.related_to_subject,
                            task.is_complete,
                            task.subject_id,
                        ],
                    )?;
                    conn.last_insert_rowid()
                }
            };
            Ok(id)
        })?;
        debug!(task_id = id, "task upserted");
        Ok(id)
    }

    fn delete_task(&self, task_id: i64) -> StoreResult<()> {
        self.write(&[Table::Tasks], |conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])
        })?;
        debug!(task_id, "task deleted");
        Ok(())
    }

    fn task_by_id(&self, task_id: i64) -> StoreResult<Option<Task>> {
        let conn = self.conn()?;
        let task = conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![task_id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    fn tasks_for_subject(&self, subject_id: i64) -> Query<Vec<Task>> {
        self.query(Table::Tasks, move |conn| {
            collect(
                conn,
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE subject_id = ?1"),
                params![subject_id],
                row_to_task,
            )
        })
    }

    fn all_tasks(&self) -> Query<Vec<Task>> {
        self.query(Table::Tasks, |conn| {
            collect(
                conn,
                &format!("SELECT {TASK_COLUMNS} FROM tasks"),
                [],
                row_to_task,
            )
        })
    }
}

impl SessionRepository for Database {
    fn insert_session(&self, session: &Session) -> StoreResult<i64> {
        let id = self.write(&[Table::Sessions], |conn| {
            conn.execute(
                "INSERT INTO sessions (subject_id, related_to_subject, date, duration)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.subject_id,
                    session.related_to_subject,
                    session.date,
                    session.duration,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;
        debug!(session_id = id, duration = session.duration, "session inserted");
        Ok(id)
    }

    fn delete_session(&self, session_id: i64) -> StoreResult<()> {
        self.write(&[Table::Sessions], |conn| {
            conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
        })?;
        debug!(session_id, "session deleted");
        Ok(())
    }

    fn session_by_id(&self, session_id: i64) -> StoreResult<Option<Session>> {
        let conn = self.conn()?;
        let session = conn
            .query_row(
                &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1"),
                params![session_id],
                row_to_session,
            )
            .optional()?;
        Ok(session)
    }

    fn all_sessions(&self) -> Query<Vec<Session>> {
        self.query(Table::Sessions, |conn| {
            collect(
                conn,
                &format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY date DESC, id DESC"),
                [],
                row_to_session,
            )
        })
    }

    fn sessions_for_subject(&self, subject_id: i64) -> Query<Vec<Session>> {
        self.query(Table::Sessions, move |conn| {
            collect(
                conn,
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE subject_id = ?1
                     ORDER BY date DESC, id DESC"
                ),
                params![subject_id],
                row_to_session,
            )
        })
    }

    fn recent_sessions(&self, limit: usize) -> Query<Vec<Session>> {
        let limit = limit as i64;
        self.query(Table::Sessions, move |conn| {
            collect(
                conn,
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY date DESC, id DESC LIMIT ?1"
                ),
                params![limit],
                row_to_session,
            )
        })
    }

    fn recent_sessions_for_subject(&self, subject_id: i64, limit: usize) -> Query<Vec<Session>> {
        let limit = limit as i64;
        self.query(Table::Sessions, move |conn| {
            collect(
                conn,
                &format!(
                    "SELECT {SESSION_COLUMNS} FROM sessions WHERE subject_id = ?1
                     ORDER BY date DESC, id DESC LIMIT ?2"
                ),
                params![subject_id, limit],
                row_to_session,
            )
        })
    }

    fn total_duration(&self) -> Query<i64> {
        self.query(Table::Sessions, |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(duration), 0) FROM sessions",
                [],
                |row| row.get(0),
            )
        })
    }

    fn total_duration_for_subject(&self, subject_id: i64) -> Query<i64> {
        self.query(Table::Sessions, move |conn| {
            conn.query_row(
                "SELECT COALESCE(SUM(duration), 0) FROM sessions WHERE subject_id = ?1",
                params![subject_id],
                |row| row.get(0),
            )
        })
    }
}
