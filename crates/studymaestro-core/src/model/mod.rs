//! Persisted entities: subjects, tasks and study sessions.
//!
//! Ids are assigned by the store on first persistence. An entity with
//! `id: None` is a create, one with `id: Some(_)` an update.

mod session;
mod subject;
mod task;

pub use session::Session;
pub use subject::{Subject, SUBJECT_CARD_COLORS};
pub use task::{Priority, Task};
