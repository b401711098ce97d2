//! Subcommand handlers.
//!
//! Every mutating command drives a screen model the way a UI would and
//! prints the messages the model reports.

pub mod config;
pub mod dashboard;
pub mod session;
pub mod subject;
pub mod task;
pub mod timer;

use std::sync::Arc;

use studymaestro_core::reactive::{Screen, Subscription};
use studymaestro_core::{Config, Database, ScreenSettings, StudyStore, UiEvent};
use tokio::sync::broadcast;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Store and settings shared by one command invocation.
pub struct Context {
    pub db: Arc<Database>,
    pub config: Config,
    pub settings: ScreenSettings,
}

impl Context {
    pub fn open() -> CliResult<Self> {
        let config = Config::load_or_default();
        let settings = ScreenSettings::from(&config);
        let db = Database::open()?;
        tracing::debug!(min_session_secs = settings.min_session_secs, "store opened");
        Ok(Self {
            db: Arc::new(db),
            config,
            settings,
        })
    }

    pub fn store(&self) -> Arc<dyn StudyStore> {
        self.db.clone()
    }
}

/// Print every queued message. Succeeds if one of them is in `success`.
pub fn report(events: &mut broadcast::Receiver<UiEvent>, success: &[&str]) -> CliResult {
    let mut last = None;
    let mut ok = false;
    while let Ok(event) = events.try_recv() {
        if let Some(text) = event.text() {
            println!("{text}");
            ok |= success.contains(&text);
            last = Some(text.to_string());
        }
    }
    if ok {
        Ok(())
    } else {
        Err(last.unwrap_or_else(|| "no response".into()).into())
    }
}

/// First snapshot published after the screen's sources have been read.
pub async fn first_snapshot<S: Screen>(sub: &mut Subscription<S>) -> CliResult<S::Snapshot> {
    sub.changed()
        .await
        .ok_or_else(|| "screen closed before publishing".into())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
