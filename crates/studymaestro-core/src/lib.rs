//! # StudyMaestro Core Library
//!
//! This library holds the business logic of the StudyMaestro study tracker.
//! Front ends (the bundled CLI, or any UI) drive it through screen models and
//! render the snapshots those models publish.
//!
//! ## Architecture
//!
//! - **Storage**: repository traits with observable queries, a SQLite
//!   implementation and TOML-based configuration
//! - **Reactive**: the aggregation engine that folds several queries and a
//!   draft into one snapshot per screen
//! - **Screens**: dashboard, subject, task and session models with their
//!   commands
//! - **Timer**: a stopwatch on its own task, reporting ticks to an announcer
//! - **Metrics**: pure derived values (hours, progress, task order, dates)
//!
//! ## Key Components
//!
//! - [`Aggregator`]: per-screen snapshot engine
//! - [`TimerService`]: stopwatch task and its [`TimerHandle`]
//! - [`Database`]: SQLite store implementing every repository
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod metrics;
pub mod model;
pub mod reactive;
pub mod screens;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::{MessageDuration, UiEvent};
pub use model::{Priority, Session, Subject, Task};
pub use reactive::{Aggregator, Query, Screen, Source, Subscription};
pub use screens::{
    DashboardEvent, DashboardModel, ScreenSettings, SessionEvent, SessionModel, SubjectEvent,
    SubjectModel, TaskEvent, TaskModel,
};
pub use storage::{Config, Database, SessionRepository, StudyStore, SubjectRepository, TaskRepository};
pub use timer::{
    NoopAnnouncer, SessionAnnouncer, StopwatchPhase, TimerHandle, TimerService, TimerSnapshot,
};
