//! Stopwatch engine.
//!
//! A tick-driven state machine. It owns no clock: the caller feeds it one
//! `tick()` per elapsed second and it counts them.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Stopped -> Running -> ...
//!   ^                   |
//!   +----- cancel ------+
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = StopwatchEngine::new();
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::Ticked) while running
//! ```

use serde::{Deserialize, Serialize};

use crate::metrics::TimeParts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopwatchPhase {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// What a command or tick changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StopwatchEvent {
    Started { elapsed_secs: u64 },
    Ticked { elapsed_secs: u64, parts: TimeParts },
    Stopped { elapsed_secs: u64 },
    Cancelled,
}

/// Published view of the stopwatch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub elapsed_secs: u64,
    pub phase: StopwatchPhase,
    pub subject_id: Option<i64>,
    /// Zero-padded, at least two digits.
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
}

impl TimerSnapshot {
    pub fn display(&self) -> String {
        format!("{}:{}:{}", self.hours, self.minutes, self.seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopwatchEngine {
    phase: StopwatchPhase,
    elapsed_secs: u64,
    subject_id: Option<i64>,
}

impl StopwatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> StopwatchPhase {
        self.phase
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn subject_id(&self) -> Option<i64> {
        self.subject_id
    }

    pub fn parts(&self) -> TimeParts {
        TimeParts::from_secs(self.elapsed_secs)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        let (hours, minutes, seconds) = self.parts().padded();
        TimerSnapshot {
            elapsed_secs: self.elapsed_secs,
            phase: self.phase,
            subject_id: self.subject_id,
            hours,
            minutes,
            seconds,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<StopwatchEvent> {
        match self.phase {
            StopwatchPhase::Idle | StopwatchPhase::Stopped => {
                self.phase = StopwatchPhase::Running;
                Some(StopwatchEvent::Started {
                    elapsed_secs: self.elapsed_secs,
                })
            }
            StopwatchPhase::Running => None, // Already running.
        }
    }

    /// Keeps the elapsed count. A second stop does nothing.
    pub fn stop(&mut self) -> Option<StopwatchEvent> {
        match self.phase {
            StopwatchPhase::Running => {
                self.phase = StopwatchPhase::Stopped;
                Some(StopwatchEvent::Stopped {
                    elapsed_secs: self.elapsed_secs,
                })
            }
            _ => None,
        }
    }

    /// Stop and zero the count, from any phase.
    pub fn cancel(&mut self) -> StopwatchEvent {
        self.phase = StopwatchPhase::Idle;
        self.elapsed_secs = 0;
        StopwatchEvent::Cancelled
    }

    pub fn set_subject(&mut self, subject_id: Option<i64>) {
        self.subject_id = subject_id;
    }

    /// Count one second. Ignored unless running.
    pub fn tick(&mut self) -> Option<StopwatchEvent> {
        if self.phase != StopwatchPhase::Running {
            return None;
        }
        self.elapsed_secs += 1;
        Some(StopwatchEvent::Ticked {
            elapsed_secs: self.elapsed_secs,
            parts: self.parts(),
        })
    }
}
