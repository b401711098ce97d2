//! Study session screen: pick a subject, run the stopwatch, save the result.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{blocking, delete_selected_session, EventSink, ScreenSettings};
use crate::error::ValidationError;
use crate::events::UiEvent;
use crate::model::{Session, Subject};
use crate::reactive::{Aggregator, Screen, Source, Subscription};
use crate::storage::StudyStore;
use crate::timer::TimerHandle;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionDraft {
    pub related_to_subject: Option<String>,
    pub subject_id: Option<i64>,
    pub session: Option<Session>,
}

impl SessionDraft {
    /// Validate a finished session of `duration_secs` against this draft.
    pub fn to_session(
        &self,
        duration_secs: i64,
        min_secs: i64,
        now_ms: i64,
    ) -> Result<Session, ValidationError> {
        if duration_secs < min_secs {
            return Err(ValidationError::SessionTooShort {
                duration_secs,
                min_secs,
            });
        }
        let (Some(subject_id), Some(related)) = (self.subject_id, &self.related_to_subject) else {
            return Err(ValidationError::SessionWithoutSubject);
        };
        Ok(Session {
            id: None,
            subject_id,
            related_to_subject: related.clone(),
            date: now_ms,
            duration: duration_secs,
        })
    }
}

#[derive(Debug, Default)]
pub struct SessionInputs {
    subjects: Vec<Subject>,
    sessions: Vec<Session>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub subjects: Vec<Subject>,
    /// Newest first.
    pub sessions: Vec<Session>,
    pub related_to_subject: Option<String>,
    pub subject_id: Option<i64>,
    pub session: Option<Session>,
}

pub struct SessionScreen;

impl Screen for SessionScreen {
    type Draft = SessionDraft;
    type Inputs = SessionInputs;
    type Snapshot = SessionSnapshot;

    fn combine(draft: &SessionDraft, inputs: &SessionInputs) -> SessionSnapshot {
        SessionSnapshot {
            subjects: inputs.subjects.clone(),
            sessions: inputs.sessions.clone(),
            related_to_subject: draft.related_to_subject.clone(),
            subject_id: draft.subject_id,
            session: draft.session.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    RelatedSubjectChanged(Subject),
    /// Restore the selection, e.g. from a running timer.
    SetSubject {
        related_to_subject: Option<String>,
        subject_id: Option<i64>,
    },
    NotifyToUpdateSubject,
    /// Persist a finished session of this many seconds.
    SaveSession(i64),
    DeleteSessionClicked(Session),
    DeleteSession,
}

pub struct SessionModel {
    store: Arc<dyn StudyStore>,
    aggregator: Aggregator<SessionScreen>,
    events: EventSink,
    min_session_secs: i64,
}

impl SessionModel {
    pub fn new(store: Arc<dyn StudyStore>, settings: &ScreenSettings) -> Self {
        let sources = vec![
            Source::new("subjects", store.all_subjects(), |i: &mut SessionInputs, v| {
                i.subjects = v
            }),
            Source::new("sessions", store.all_sessions(), |i: &mut SessionInputs, v| {
                i.sessions = v
            }),
        ];
        Self {
            store,
            aggregator: Aggregator::new("session", sources, settings.stop_timeout),
            events: EventSink::new(),
            min_session_secs: settings.min_session_secs,
        }
    }

    pub fn subscribe(&self) -> Subscription<SessionScreen> {
        self.aggregator.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.aggregator.snapshot()
    }

    pub fn events(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    pub fn aggregator(&self) -> &Aggregator<SessionScreen> {
        &self.aggregator
    }

    pub async fn on_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::RelatedSubjectChanged(subject) => self.aggregator.update_draft(|d| {
                d.related_to_subject = Some(subject.name);
                d.subject_id = subject.id;
            }),
            SessionEvent::SetSubject {
                related_to_subject,
                subject_id,
            } => self.aggregator.update_draft(|d| {
                d.related_to_subject = related_to_subject;
                d.subject_id = subject_id;
            }),
            SessionEvent::NotifyToUpdateSubject => {
                let draft = self.aggregator.draft();
                if draft.subject_id.is_none() || draft.related_to_subject.is_none() {
                    self.events
                        .emit(UiEvent::message(ValidationError::SessionWithoutSubject.to_string()));
                }
            }
            SessionEvent::SaveSession(duration_secs) => self.save_session(duration_secs).await,
            SessionEvent::DeleteSessionClicked(session) => {
                self.aggregator.update_draft(|d| d.session = Some(session))
            }
            SessionEvent::DeleteSession => {
                let selected = self.aggregator.draft().session;
                if delete_selected_session(&self.store, &self.events, selected).await {
                    self.aggregator.update_draft(|d| d.session = None);
                }
            }
        }
    }

    /// Save whatever the stopwatch has counted so far. The timer is not reset.
    pub async fn save_from_timer(&self, timer: &TimerHandle) {
        let elapsed = i64::try_from(timer.elapsed_secs()).unwrap_or(i64::MAX);
        self.save_session(elapsed).await;
    }

    async fn save_session(&self, duration_secs: i64) {
        let draft = self.aggregator.draft();
        let session = match draft.to_session(
            duration_secs,
            self.min_session_secs,
            Utc::now().timestamp_millis(),
        ) {
            Ok(session) => session,
            Err(invalid) => {
                self.events.emit(UiEvent::message(invalid.to_string()));
                return;
            }
        };
        let store = Arc::clone(&self.store);
        match blocking(move || store.insert_session(&session)).await {
            Ok(session_id) => {
                info!(session_id, duration_secs, "session saved");
                self.events.emit(UiEvent::message("Session saved successfully"));
            }
            Err(err) => {
                warn!(error = %err, "session save failed");
                self.events.emit(UiEvent::failure("Couldn't save session.", err));
            }
        }
    }
}
