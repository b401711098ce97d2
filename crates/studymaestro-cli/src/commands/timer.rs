use std::io::Write;
use std::sync::Arc;

use clap::Subcommand;
use studymaestro_core::{
    SessionAnnouncer, SessionEvent, SessionModel, SubjectRepository, TimerService,
};

use super::{report, CliResult, Context};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the stopwatch for a subject, then save the session
    Run {
        #[arg(long)]
        subject: i64,
        /// Stop automatically after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

/// Redraws the elapsed time on one terminal line.
struct TerminalAnnouncer;

impl SessionAnnouncer for TerminalAnnouncer {
    fn on_tick(&self, hours: &str, minutes: &str, seconds: &str) {
        let mut err = std::io::stderr();
        let _ = write!(err, "\r{hours}:{minutes}:{seconds}");
        let _ = err.flush();
    }

    fn dismiss(&self) {
        eprintln!();
    }
}

pub async fn run(action: TimerAction) -> CliResult {
    let ctx = Context::open()?;
    match action {
        TimerAction::Run { subject, seconds } => {
            let found = ctx
                .db
                .subject_by_id(subject)?
                .ok_or_else(|| format!("subject {subject} not found"))?;

            let timer = TimerService::spawn(Arc::new(TerminalAnnouncer), ctx.config.tick_interval());
            timer.set_subject(found.id).await?;
            timer.start().await?;
            eprintln!("studying {} (Ctrl-C to stop)", found.name);

            let mut ticks = timer.subscribe();
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = ticks.wait_for(|s| seconds.is_some_and(|limit| s.elapsed_secs >= limit)) => {}
            }
            let stopped = timer.stop().await?;
            eprintln!();

            let model = SessionModel::new(ctx.store(), &ctx.settings);
            let mut events = model.events();
            model
                .on_event(SessionEvent::SetSubject {
                    related_to_subject: Some(found.name),
                    subject_id: stopped.subject_id,
                })
                .await;
            model.save_from_timer(&timer).await;
            report(&mut events, &["Session saved successfully"])?;
        }
    }
    Ok(())
}
