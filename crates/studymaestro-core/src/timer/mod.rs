mod announcer;
mod engine;
mod service;

pub use announcer::{NoopAnnouncer, RecordingAnnouncer, SessionAnnouncer};
pub use engine::{StopwatchEngine, StopwatchEvent, StopwatchPhase, TimerSnapshot};
pub use service::{TimerHandle, TimerService, DEFAULT_TICK_INTERVAL};
