use clap::Subcommand;
use studymaestro_core::metrics::{format_date, TimeParts};
use studymaestro_core::{
    DashboardEvent, DashboardModel, SessionEvent, SessionModel, SessionRepository,
    SubjectRepository,
};

use super::{print_json, report, CliResult, Context};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List sessions, newest first
    List {
        /// Only sessions of this subject
        #[arg(long)]
        subject: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Record a finished session
    Save {
        #[arg(long)]
        subject: i64,
        /// Session length in seconds
        #[arg(long)]
        seconds: i64,
    },
    /// Delete a session
    Delete { id: i64 },
}

pub async fn run(action: SessionAction) -> CliResult {
    let ctx = Context::open()?;
    match action {
        SessionAction::List { subject, json } => {
            let query = match subject {
                Some(id) => ctx.db.sessions_for_subject(id),
                None => ctx.db.all_sessions(),
            };
            let sessions = query.fetch_async().await?;
            if json {
                return print_json(&sessions);
            }
            for session in &sessions {
                println!(
                    "{:>4}  {}  {}  {:<24}",
                    session.id.unwrap_or_default(),
                    format_date(Some(session.date)),
                    TimeParts::from_secs(session.duration.max(0) as u64),
                    session.related_to_subject
                );
            }
        }
        SessionAction::Save { subject, seconds } => {
            let found = ctx.db.subject_by_id(subject)?;
            let model = SessionModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model
                .on_event(SessionEvent::SetSubject {
                    related_to_subject: found.as_ref().map(|s| s.name.clone()),
                    subject_id: found.and_then(|s| s.id),
                })
                .await;
            model.on_event(SessionEvent::SaveSession(seconds)).await;
            report(&mut events, &["Session saved successfully"])?;
        }
        SessionAction::Delete { id } => {
            let session = ctx
                .db
                .session_by_id(id)?
                .ok_or_else(|| format!("session {id} not found"))?;
            let model = DashboardModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model
                .on_event(DashboardEvent::DeleteSessionClicked(session))
                .await;
            model.on_event(DashboardEvent::DeleteSession).await;
            report(&mut events, &["Session deleted successfully"])?;
        }
    }
    Ok(())
}
