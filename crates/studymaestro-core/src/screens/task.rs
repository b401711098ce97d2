//! Task editor: create, edit or delete one task.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{blocking, EventSink, ScreenSettings};
use crate::error::{StoreResult, ValidationError};
use crate::events::UiEvent;
use crate::model::{Priority, Subject, Task};
use crate::reactive::{Aggregator, Screen, Source, Subscription};
use crate::storage::StudyStore;

const TITLE_MIN_CHARS: usize = 4;
const TITLE_MAX_CHARS: usize = 30;

/// Check a task title the way the editor does before saving.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let chars = title.chars().count();
    if title.trim().is_empty() {
        Err(ValidationError::BlankTitle)
    } else if chars < TITLE_MIN_CHARS {
        Err(ValidationError::TitleTooShort)
    } else if chars > TITLE_MAX_CHARS {
        Err(ValidationError::TitleTooLong)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    /// Epoch milliseconds. `None` saves as today.
    pub due_date: Option<i64>,
    pub priority: Priority,
    pub is_complete: bool,
    pub related_to_subject: Option<String>,
    pub subject_id: Option<i64>,
    pub current_task_id: Option<i64>,
}

impl TaskDraft {
    fn from_task(task: Task) -> Self {
        Self {
            title: task.title,
            description: task.description,
            due_date: Some(task.due_date),
            priority: task.priority,
            is_complete: task.is_complete,
            related_to_subject: Some(task.related_to_subject),
            subject_id: Some(task.subject_id),
            current_task_id: task.id,
        }
    }

    /// Validate and turn the draft into a storable task.
    pub fn to_task(&self, now_ms: i64) -> Result<Task, ValidationError> {
        validate_title(&self.title)?;
        let (Some(subject_id), Some(related)) = (self.subject_id, &self.related_to_subject) else {
            return Err(ValidationError::TaskWithoutSubject);
        };
        Ok(Task {
            id: self.current_task_id,
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date.unwrap_or(now_ms),
            priority: self.priority,
            related_to_subject: related.clone(),
            is_complete: self.is_complete,
            subject_id,
        })
    }
}

#[derive(Debug, Default)]
pub struct TaskInputs {
    subjects: Vec<Subject>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskSnapshot {
    pub draft: TaskDraft,
    pub subjects: Vec<Subject>,
    /// Why the current title would be rejected, if it would.
    pub title_error: Option<String>,
}

pub struct TaskScreen;

impl Screen for TaskScreen {
    type Draft = TaskDraft;
    type Inputs = TaskInputs;
    type Snapshot = TaskSnapshot;

    fn combine(draft: &TaskDraft, inputs: &TaskInputs) -> TaskSnapshot {
        TaskSnapshot {
            draft: draft.clone(),
            subjects: inputs.subjects.clone(),
            title_error: validate_title(&draft.title).err().map(|e| e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    TitleChanged(String),
    DescriptionChanged(String),
    DueDateChanged(Option<i64>),
    PriorityChanged(Priority),
    CompletionToggled,
    RelatedSubjectSelected(Subject),
    SaveTask,
    DeleteTask,
}

pub struct TaskModel {
    store: Arc<dyn StudyStore>,
    aggregator: Aggregator<TaskScreen>,
    events: EventSink,
}

impl TaskModel {
    pub fn new(store: Arc<dyn StudyStore>, settings: &ScreenSettings) -> Self {
        let sources = vec![Source::new(
            "subjects",
            store.all_subjects(),
            |i: &mut TaskInputs, v| i.subjects = v,
        )];
        Self {
            store,
            aggregator: Aggregator::new("task", sources, settings.stop_timeout),
            events: EventSink::new(),
        }
    }

    pub fn subscribe(&self) -> Subscription<TaskScreen> {
        self.aggregator.subscribe()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        self.aggregator.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn aggregator(&self) -> &Aggregator<TaskScreen> {
        &self.aggregator
    }

    /// Prefill the editor.
    ///
    /// An existing task wins over the subject. With only a subject, the new
    /// task is attached to it.
    pub async fn load(&self, task_id: Option<i64>, subject_id: Option<i64>) {
        let store = Arc::clone(&self.store);
        let loaded: StoreResult<(Option<Task>, Option<Subject>)> = blocking(move || {
            if let Some(task) = task_id.map(|id| store.task_by_id(id)).transpose()?.flatten() {
                return Ok((Some(task), None));
            }
            let subject = subject_id
                .map(|id| store.subject_by_id(id))
                .transpose()?
                .flatten();
            Ok((None, subject))
        })
        .await;

        match loaded {
            Ok((Some(task), _)) => {
                debug!(task_id = ?task.id, "task loaded");
                self.aggregator.update_draft(|d| *d = TaskDraft::from_task(task));
            }
            Ok((None, Some(subject))) => {
                self.aggregator.update_draft(|d| {
                    d.related_to_subject = Some(subject.name);
                    d.subject_id = subject.id;
                });
            }
            Ok((None, None)) => debug!(?task_id, ?subject_id, "nothing to prefill"),
            Err(err) => {
                warn!(error = %err, "task load failed");
                self.events.emit(UiEvent::failure("Couldn't load task.", err));
            }
        }
    }

    pub async fn on_event(&self, event: TaskEvent) {
        match event {
            TaskEvent::TitleChanged(title) => self.aggregator.update_draft(|d| d.title = title),
            TaskEvent::DescriptionChanged(text) => {
                self.aggregator.update_draft(|d| d.description = text)
            }
            TaskEvent::DueDateChanged(due) => self.aggregator.update_draft(|d| d.due_date = due),
            TaskEvent::PriorityChanged(priority) => {
                self.aggregator.update_draft(|d| d.priority = priority)
            }
            TaskEvent::CompletionToggled => {
                self.aggregator.update_draft(|d| d.is_complete = !d.is_complete)
            }
            TaskEvent::RelatedSubjectSelected(subject) => self.aggregator.update_draft(|d| {
                d.related_to_subject = Some(subject.name);
                d.subject_id = subject.id;
            }),
            TaskEvent::SaveTask => self.save_task().await,
            TaskEvent::DeleteTask => self.delete_task().await,
        }
    }

    async fn save_task(&self) {
        let task = match self
            .aggregator
            .draft()
            .to_task(Utc::now().timestamp_millis())
        {
            Ok(task) => task,
            Err(invalid) => {
                self.events.emit(UiEvent::message(invalid.to_string()));
                return;
            }
        };
        let store = Arc::clone(&self.store);
        match blocking(move || store.upsert_task(&task)).await {
            Ok(task_id) => {
                info!(task_id, "task saved");
                self.aggregator
                    .update_draft(|d| d.current_task_id = Some(task_id));
                self.events.emit(UiEvent::message("Task Saved Successfully."));
                self.events.emit(UiEvent::NavigateUp);
            }
            Err(err) => {
                warn!(error = %err, "task save failed");
                self.events.emit(UiEvent::failure("Couldn't save task.", err));
            }
        }
    }

    async fn delete_task(&self) {
        let Some(task_id) = self.aggregator.draft().current_task_id else {
            self.events.emit(UiEvent::message("No Task to delete"));
            return;
        };
        let store = Arc::clone(&self.store);
        match blocking(move || store.delete_task(task_id)).await {
            Ok(()) => {
                info!(task_id, "task deleted");
                self.events.emit(UiEvent::message("Task deleted successfully."));
                self.events.emit(UiEvent::NavigateUp);
            }
            Err(err) => {
                warn!(task_id, error = %err, "task delete failed");
                self.events.emit(UiEvent::failure("Couldn't delete task.", err));
            }
        }
    }
}
