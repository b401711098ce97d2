//! Consumers of stopwatch ticks.

use std::sync::Mutex;

use tracing::trace;

/// Receives the formatted elapsed time on every tick.
///
/// Called from the timer task, so implementations must return quickly.
pub trait SessionAnnouncer: Send + Sync {
    fn on_tick(&self, hours: &str, minutes: &str, seconds: &str);

    /// The session was cancelled; clear whatever status is showing.
    fn dismiss(&self) {}
}

/// Announcer that only logs at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAnnouncer;

impl SessionAnnouncer for NoopAnnouncer {
    fn on_tick(&self, hours: &str, minutes: &str, seconds: &str) {
        trace!("{hours}:{minutes}:{seconds}");
    }
}

/// Announcer that remembers what it was told. Handy for tests and headless runs.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    ticks: Mutex<Vec<String>>,
    dismissals: Mutex<usize>,
}

impl RecordingAnnouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every tick so far, formatted `hh:mm:ss`.
    pub fn ticks(&self) -> Vec<String> {
        self.ticks
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    pub fn dismissals(&self) -> usize {
        self.dismissals.lock().map(|d| *d).unwrap_or_default()
    }
}

impl SessionAnnouncer for RecordingAnnouncer {
    fn on_tick(&self, hours: &str, minutes: &str, seconds: &str) {
        if let Ok(mut ticks) = self.ticks.lock() {
            ticks.push(format!("{hours}:{minutes}:{seconds}"));
        }
    }

    fn dismiss(&self) {
        if let Ok(mut count) = self.dismissals.lock() {
            *count += 1;
        }
    }
}
