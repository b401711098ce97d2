//! One subject: its goal, progress, tasks and recent sessions.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{blocking, delete_selected_session, toggle_task_completion, EventSink, ScreenSettings};
use crate::events::UiEvent;
use crate::metrics::{parse_goal_hours, partition_tasks, progress_ratio, seconds_to_hours};
use crate::model::{Session, Subject, Task};
use crate::reactive::{Aggregator, Screen, Source, Subscription};
use crate::storage::StudyStore;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectDraft {
    pub subject_name: String,
    /// Raw text of the goal field.
    pub goal_hours: String,
    pub colors: Vec<u32>,
    pub current_subject_id: Option<i64>,
    pub session: Option<Session>,
}

#[derive(Debug, Default)]
pub struct SubjectInputs {
    upcoming_tasks: Vec<Task>,
    completed_tasks: Vec<Task>,
    recent_sessions: Vec<Session>,
    total_duration_secs: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectSnapshot {
    pub current_subject_id: Option<i64>,
    pub subject_name: String,
    pub goal_hours: String,
    pub colors: Vec<u32>,
    pub studied_hours: f32,
    /// Studied share of the goal in `0.0..=1.0`.
    pub progress: f32,
    pub upcoming_tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub recent_sessions: Vec<Session>,
    pub session: Option<Session>,
}

pub struct SubjectScreen;

impl Screen for SubjectScreen {
    type Draft = SubjectDraft;
    type Inputs = SubjectInputs;
    type Snapshot = SubjectSnapshot;

    fn combine(draft: &SubjectDraft, inputs: &SubjectInputs) -> SubjectSnapshot {
        let studied_hours = seconds_to_hours(inputs.total_duration_secs);
        let goal = parse_goal_hours(&draft.goal_hours).unwrap_or(1.0);
        SubjectSnapshot {
            current_subject_id: draft.current_subject_id,
            subject_name: draft.subject_name.clone(),
            goal_hours: draft.goal_hours.clone(),
            colors: draft.colors.clone(),
            studied_hours,
            progress: progress_ratio(studied_hours, goal),
            upcoming_tasks: inputs.upcoming_tasks.clone(),
            completed_tasks: inputs.completed_tasks.clone(),
            recent_sessions: inputs.recent_sessions.clone(),
            session: draft.session.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubjectEvent {
    NameChanged(String),
    GoalHoursChanged(String),
    ColorsChanged(Vec<u32>),
    UpdateSubject,
    DeleteSubject,
    TaskCompletionToggled(Task),
    DeleteSessionClicked(Session),
    DeleteSession,
    /// Progress is always derived; this only forces a recompute.
    UpdateProgress,
}

/// Screen model bound to one subject id.
pub struct SubjectModel {
    subject_id: i64,
    store: Arc<dyn StudyStore>,
    aggregator: Aggregator<SubjectScreen>,
    events: EventSink,
}

impl SubjectModel {
    pub fn new(store: Arc<dyn StudyStore>, subject_id: i64, settings: &ScreenSettings) -> Self {
        let sources = vec![
            // Both lists come from one read so a toggled task is never in both.
            Source::new(
                "tasks",
                store.tasks_for_subject(subject_id).map(partition_tasks),
                |i: &mut SubjectInputs, (upcoming, completed)| {
                    i.upcoming_tasks = upcoming;
                    i.completed_tasks = completed;
                },
            ),
            Source::new(
                "recent_sessions",
                store.recent_sessions_for_subject(subject_id, settings.subject_recent_sessions),
                |i: &mut SubjectInputs, v| i.recent_sessions = v,
            ),
            Source::new(
                "total_duration",
                store.total_duration_for_subject(subject_id),
                |i: &mut SubjectInputs, v| i.total_duration_secs = v,
            ),
        ];
        Self {
            subject_id,
            store,
            aggregator: Aggregator::new("subject", sources, settings.stop_timeout),
            events: EventSink::new(),
        }
    }

    pub fn subject_id(&self) -> i64 {
        self.subject_id
    }

    pub fn subscribe(&self) -> Subscription<SubjectScreen> {
        self.aggregator.subscribe()
    }

    pub fn snapshot(&self) -> SubjectSnapshot {
        self.aggregator.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn aggregator(&self) -> &Aggregator<SubjectScreen> {
        &self.aggregator
    }

    /// Fill the draft from the stored subject.
    pub async fn load(&self) {
        let store = Arc::clone(&self.store);
        let subject_id = self.subject_id;
        match blocking(move || store.subject_by_id(subject_id)).await {
            Ok(Some(subject)) => {
                debug!(subject_id, "subject loaded");
                self.aggregator.update_draft(|d| {
                    d.subject_name = subject.name;
                    d.goal_hours = subject.goal_hours.to_string();
                    d.colors = subject.colors;
                    d.current_subject_id = subject.id;
                });
            }
            Ok(None) => self.events.emit(UiEvent::message("Subject not found.")),
            Err(err) => {
                warn!(subject_id, error = %err, "subject load failed");
                self.events.emit(UiEvent::failure("Couldn't load subject.", err));
            }
        }
    }

    pub async fn on_event(&self, event: SubjectEvent) {
        match event {
            SubjectEvent::NameChanged(name) => {
                self.aggregator.update_draft(|d| d.subject_name = name)
            }
            SubjectEvent::GoalHoursChanged(hours) => {
                self.aggregator.update_draft(|d| d.goal_hours = hours)
            }
            SubjectEvent::ColorsChanged(colors) => {
                self.aggregator.update_draft(|d| d.colors = colors)
            }
            SubjectEvent::UpdateSubject => self.update_subject().await,
            SubjectEvent::DeleteSubject => self.delete_subject().await,
            SubjectEvent::TaskCompletionToggled(task) => {
                toggle_task_completion(&self.store, &self.events, task).await
            }
            SubjectEvent::DeleteSessionClicked(session) => {
                self.aggregator.update_draft(|d| d.session = Some(session))
            }
            SubjectEvent::DeleteSession => {
                let selected = self.aggregator.draft().session;
                if delete_selected_session(&self.store, &self.events, selected).await {
                    self.aggregator.update_draft(|d| d.session = None);
                }
            }
            SubjectEvent::UpdateProgress => self.aggregator.update_draft(|_| {}),
        }
    }

    async fn update_subject(&self) {
        let draft = self.aggregator.draft();
        let subject = Subject {
            id: draft.current_subject_id,
            name: draft.subject_name,
            goal_hours: parse_goal_hours(&draft.goal_hours).unwrap_or(1.0),
            colors: draft.colors,
        };
        let store = Arc::clone(&self.store);
        match blocking(move || store.upsert_subject(&subject)).await {
            Ok(subject_id) => {
                info!(subject_id, "subject updated");
                self.events.emit(UiEvent::message("Subject updated successfully."));
            }
            Err(err) => {
                warn!(error = %err, "subject update failed");
                self.events.emit(UiEvent::failure("Couldn't update subject.", err));
            }
        }
    }

    async fn delete_subject(&self) {
        let Some(subject_id) = self.aggregator.draft().current_subject_id else {
            self.events.emit(UiEvent::message("No Subject to delete"));
            return;
        };
        let store = Arc::clone(&self.store);
        match blocking(move || store.delete_subject(subject_id)).await {
            Ok(()) => {
                info!(subject_id, "subject deleted");
                self.events.emit(UiEvent::message("Subject deleted successfully"));
                self.events.emit(UiEvent::NavigateUp);
            }
            Err(err) => {
                warn!(subject_id, error = %err, "subject delete failed");
                self.events.emit(UiEvent::failure("Couldn't delete subject.", err));
            }
        }
    }
}
