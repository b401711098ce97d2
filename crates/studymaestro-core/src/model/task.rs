use serde::{Deserialize, Serialize};
use std::fmt;

/// Task priority. Stored as its ordinal (0..=2).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn value(self) -> i32 {
        match self {
            Priority::Low => 0,
            Priority::Medium => 1,
            Priority::High => 2,
        }
    }

    /// Unknown ordinals fall back to `Medium`.
    pub fn from_value(value: i32) -> Self {
        Self::ALL
            .into_iter()
            .find(|p| p.value() == value)
            .unwrap_or(Priority::Medium)
    }

    pub fn title(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A task belonging to one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    /// Due date, epoch milliseconds.
    pub due_date: i64,
    pub priority: Priority,
    /// Subject name, denormalized for display.
    pub related_to_subject: String,
    pub is_complete: bool,
    pub subject_id: i64,
}

impl Task {
    /// Same task with its completion flag flipped.
    pub fn toggled(&self) -> Self {
        Self {
            is_complete: !self.is_complete,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_round_trips_through_ordinal() {
        for p in Priority::ALL {
            assert_eq!(Priority::from_value(p.value()), p);
        }
        assert_eq!(Priority::from_value(7), Priority::Medium);
        assert_eq!(Priority::from_value(-1), Priority::Medium);
    }

    #[test]
    fn new_tasks_default_to_low_priority() {
        assert_eq!(Priority::default(), Priority::Low);
    }

    #[test]
    fn priority_orders_low_to_high() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn toggled_twice_is_identity() {
        let task = Task {
            id: Some(3),
            title: "Math homework".into(),
            description: "Page 52".into(),
            due_date: 1_700_000_000_000,
            priority: Priority::High,
            related_to_subject: "Mathematics".into(),
            is_complete: false,
            subject_id: 1,
        };
        assert!(task.toggled().is_complete);
        assert_eq!(task.toggled().toggled(), task);
    }
}
