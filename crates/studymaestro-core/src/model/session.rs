use serde::{Deserialize, Serialize};

/// A finished study session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Option<i64>,
    pub subject_id: i64,
    /// Subject name, denormalized so the session list survives renames.
    pub related_to_subject: String,
    /// Start of the session, epoch milliseconds.
    pub date: i64,
    /// Length in seconds.
    pub duration: i64,
}
