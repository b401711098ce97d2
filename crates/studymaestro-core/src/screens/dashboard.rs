//! Overview of every subject, the upcoming tasks and the latest sessions.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{blocking, delete_selected_session, toggle_task_completion, EventSink, ScreenSettings};
use crate::events::UiEvent;
use crate::metrics::{parse_goal_hours, seconds_to_hours, upcoming_tasks};
use crate::model::{Session, Subject, Task};
use crate::reactive::{Aggregator, Screen, Source, Subscription};
use crate::storage::StudyStore;

/// Unsaved edits of the "add subject" form plus the session picked for deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardDraft {
    pub subject_name: String,
    pub goal_hours: String,
    pub colors: Vec<u32>,
    pub session: Option<Session>,
}

impl Default for DashboardDraft {
    fn default() -> Self {
        Self {
            subject_name: String::new(),
            goal_hours: String::new(),
            colors: Subject::random_colors(),
            session: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct DashboardInputs {
    subject_count: i64,
    total_goal_hours: f32,
    subjects: Vec<Subject>,
    total_duration_secs: i64,
    upcoming_tasks: Vec<Task>,
    recent_sessions: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardSnapshot {
    pub total_subject_count: i64,
    pub total_studied_hours: f32,
    pub total_goal_hours: f32,
    pub subjects: Vec<Subject>,
    pub subject_name: String,
    pub goal_hours: String,
    pub colors: Vec<u32>,
    pub session: Option<Session>,
    pub upcoming_tasks: Vec<Task>,
    pub recent_sessions: Vec<Session>,
}

pub struct DashboardScreen;

impl Screen for DashboardScreen {
    type Draft = DashboardDraft;
    type Inputs = DashboardInputs;
    type Snapshot = DashboardSnapshot;

    fn combine(draft: &DashboardDraft, inputs: &DashboardInputs) -> DashboardSnapshot {
        DashboardSnapshot {
            total_subject_count: inputs.subject_count,
            total_studied_hours: seconds_to_hours(inputs.total_duration_secs),
            total_goal_hours: inputs.total_goal_hours,
            subjects: inputs.subjects.clone(),
            subject_name: draft.subject_name.clone(),
            goal_hours: draft.goal_hours.clone(),
            colors: draft.colors.clone(),
            session: draft.session.clone(),
            upcoming_tasks: inputs.upcoming_tasks.clone(),
            recent_sessions: inputs.recent_sessions.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    SubjectNameChanged(String),
    GoalHoursChanged(String),
    ColorsChanged(Vec<u32>),
    SaveSubject,
    TaskCompletionToggled(Task),
    DeleteSessionClicked(Session),
    DeleteSession,
}

pub struct DashboardModel {
    store: Arc<dyn StudyStore>,
    aggregator: Aggregator<DashboardScreen>,
    events: EventSink,
}

impl DashboardModel {
    pub fn new(store: Arc<dyn StudyStore>, settings: &ScreenSettings) -> Self {
        let sources = vec![
            Source::new("subject_count", store.subject_count(), |i: &mut DashboardInputs, v| {
                i.subject_count = v
            }),
            Source::new("total_goal_hours", store.total_goal_hours(), |i: &mut DashboardInputs, v| {
                i.total_goal_hours = v
            }),
            Source::new("subjects", store.all_subjects(), |i: &mut DashboardInputs, v| {
                i.subjects = v
            }),
            Source::new("total_duration", store.total_duration(), |i: &mut DashboardInputs, v| {
                i.total_duration_secs = v
            }),
            Source::new(
                "upcoming_tasks",
                store.all_tasks().map(|tasks| upcoming_tasks(tasks)),
                |i: &mut DashboardInputs, v| i.upcoming_tasks = v,
            ),
            Source::new(
                "recent_sessions",
                store.recent_sessions(settings.dashboard_recent_sessions),
                |i: &mut DashboardInputs, v| i.recent_sessions = v,
            ),
        ];
        Self {
            store,
            aggregator: Aggregator::new("dashboard", sources, settings.stop_timeout),
            events: EventSink::new(),
        }
    }

    pub fn subscribe(&self) -> Subscription<DashboardScreen> {
        self.aggregator.subscribe()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.aggregator.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn aggregator(&self) -> &Aggregator<DashboardScreen> {
        &self.aggregator
    }

    pub async fn on_event(&self, event: DashboardEvent) {
        match event {
            DashboardEvent::SubjectNameChanged(name) => {
                self.aggregator.update_draft(|d| d.subject_name = name)
            }
            DashboardEvent::GoalHoursChanged(hours) => {
                self.aggregator.update_draft(|d| d.goal_hours = hours)
            }
            DashboardEvent::ColorsChanged(colors) => {
                self.aggregator.update_draft(|d| d.colors = colors)
            }
            DashboardEvent::SaveSubject => self.save_subject().await,
            DashboardEvent::TaskCompletionToggled(task) => {
                toggle_task_completion(&self.store, &self.events, task).await
            }
            DashboardEvent::DeleteSessionClicked(session) => {
                self.aggregator.update_draft(|d| d.session = Some(session))
            }
            DashboardEvent::DeleteSession => {
                let selected = self.aggregator.draft().session;
                if delete_selected_session(&self.store, &self.events, selected).await {
                    self.aggregator.update_draft(|d| d.session = None);
                }
            }
        }
    }

    async fn save_subject(&self) {
        let draft = self.aggregator.draft();
        let subject = Subject::new(
            draft.subject_name,
            parse_goal_hours(&draft.goal_hours).unwrap_or(1.0),
            draft.colors,
        );
        let store = Arc::clone(&self.store);
        match blocking(move || store.upsert_subject(&subject)).await {
            Ok(subject_id) => {
                info!(subject_id, "subject saved");
                self.aggregator.update_draft(|d| {
                    d.subject_name.clear();
                    d.goal_hours.clear();
                    d.colors = Subject::random_colors();
                });
                self.events.emit(UiEvent::message("Subject Saved Successfully."));
            }
            Err(err) => {
                warn!(error = %err, "subject save failed");
                self.events.emit(UiEvent::failure("Couldn't Save Subject.", err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MessageDuration;
    use crate::model::Priority;
    use crate::screens::testing::{drain, FlakyStore};
    use crate::storage::{SessionRepository, SubjectRepository, TaskRepository};

    fn model(store: &Arc<FlakyStore>) -> DashboardModel {
        DashboardModel::new(store.clone(), &ScreenSettings::default())
    }

    fn task(subject_id: i64, due_date: i64, is_complete: bool) -> Task {
        Task {
            id: None,
            title: format!("Due {due_date}"),
            description: String::new(),
            due_date,
            priority: Priority::Low,
            related_to_subject: "Physics".into(),
            is_complete,
            subject_id,
        }
    }

    #[tokio::test]
    async fn totals_follow_the_store() {
        let store = FlakyStore::new();
        let physics = store
            .upsert_subject(&Subject::new("Physics", 10.0, vec![]))
            .unwrap();
        store
            .insert_session(&Session {
                id: None,
                subject_id: physics,
                related_to_subject: "Physics".into(),
                date: 1,
                duration: 18_000,
            })
            .unwrap();
        store.upsert_task(&task(physics, 20, false)).unwrap();
        store.upsert_task(&task(physics, 10, false)).unwrap();
        store.upsert_task(&task(physics, 5, true)).unwrap();

        let dashboard = model(&store);
        let mut sub = dashboard.subscribe();
        let snap = sub
            .wait_for(|s| s.total_subject_count == 1 && s.upcoming_tasks.len() == 2)
            .await
            .unwrap();
        assert_eq!(snap.total_studied_hours, 5.0);
        assert_eq!(snap.total_goal_hours, 10.0);
        assert_eq!(snap.recent_sessions.len(), 1);
        let due: Vec<_> = snap.upcoming_tasks.iter().map(|t| t.due_date).collect();
        assert_eq!(due, vec![10, 20]);
    }

    #[tokio::test]
    async fn save_subject_resets_form() {
        let store = FlakyStore::new();
        let dashboard = model(&store);
        let mut events = dashboard.events();
        let mut sub = dashboard.subscribe();

        dashboard
            .on_event(DashboardEvent::SubjectNameChanged("Chemistry".into()))
            .await;
        dashboard
            .on_event(DashboardEvent::GoalHoursChanged("12".into()))
            .await;
        dashboard.on_event(DashboardEvent::SaveSubject).await;

        assert_eq!(
            drain(&mut events),
            vec![UiEvent::message("Subject Saved Successfully.")]
        );
        let snap = sub
            .wait_for(|s| s.total_subject_count == 1 && s.subject_name.is_empty())
            .await
            .unwrap();
        assert_eq!(snap.goal_hours, "");
        assert_eq!(snap.subjects[0].name, "Chemistry");
        assert_eq!(snap.subjects[0].goal_hours, 12.0);
    }

    #[tokio::test]
    async fn unparseable_goal_saves_one_hour() {
        let store = FlakyStore::new();
        let dashboard = model(&store);
        dashboard
            .on_event(DashboardEvent::SubjectNameChanged("Art".into()))
            .await;
        dashboard
            .on_event(DashboardEvent::GoalHoursChanged("lots".into()))
            .await;
        dashboard.on_event(DashboardEvent::SaveSubject).await;

        let subjects = store.all_subjects().fetch().unwrap();
        assert_eq!(subjects[0].goal_hours, 1.0);
    }

    #[tokio::test]
    async fn failed_save_keeps_draft() {
        let store = FlakyStore::new();
        store.fail_writes(true);
        let dashboard = model(&store);
        let mut events = dashboard.events();

        dashboard
            .on_event(DashboardEvent::SubjectNameChanged("Biology".into()))
            .await;
        dashboard
            .on_event(DashboardEvent::GoalHoursChanged("4".into()))
            .await;
        let colors_before = dashboard.aggregator().draft().colors;
        dashboard.on_event(DashboardEvent::SaveSubject).await;

        let draft = dashboard.aggregator().draft();
        assert_eq!(draft.subject_name, "Biology");
        assert_eq!(draft.goal_hours, "4");
        assert_eq!(draft.colors, colors_before);
        assert_eq!(
            drain(&mut events),
            vec![UiEvent::ShowMessage {
                message: "Couldn't Save Subject. Database is locked".into(),
                duration: MessageDuration::Long,
            }]
        );
    }

    #[tokio::test]
    async fn delete_without_selection_is_silent() {
        let store = FlakyStore::new();
        let dashboard = model(&store);
        let mut events = dashboard.events();
        dashboard.on_event(DashboardEvent::DeleteSession).await;
        assert!(drain(&mut events).is_empty());
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn delete_unsaved_session_skips_the_store() {
        let store = FlakyStore::new();
        let dashboard = model(&store);
        let mut events = dashboard.events();
        let unsaved = Session {
            id: None,
            subject_id: 1,
            related_to_subject: "Physics".into(),
            date: 1,
            duration: 60,
        };

        dashboard
            .on_event(DashboardEvent::DeleteSessionClicked(unsaved.clone()))
            .await;
        dashboard.on_event(DashboardEvent::DeleteSession).await;

        assert_eq!(
            drain(&mut events),
            vec![UiEvent::ShowMessage {
                message: "No Session to delete".into(),
                duration: MessageDuration::Short,
            }]
        );
        assert_eq!(store.writes(), 0);
        assert_eq!(dashboard.aggregator().draft().session, Some(unsaved));
    }

    #[tokio::test]
    async fn delete_selected_session() {
        let store = FlakyStore::new();
        let id = store
            .insert_session(&Session {
                id: None,
                subject_id: 1,
                related_to_subject: "Physics".into(),
                date: 1,
                duration: 60,
            })
            .unwrap();
        let session = store.session_by_id(id).unwrap().unwrap();
        let dashboard = model(&store);
        let mut events = dashboard.events();

        dashboard
            .on_event(DashboardEvent::DeleteSessionClicked(session))
            .await;
        dashboard.on_event(DashboardEvent::DeleteSession).await;

        assert_eq!(
            drain(&mut events),
            vec![UiEvent::message("Session deleted successfully")]
        );
        assert!(store.session_by_id(id).unwrap().is_none());
        assert!(dashboard.aggregator().draft().session.is_none());
    }
}
