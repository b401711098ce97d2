//! Pure derived values shown on the screens.
//!
//! Nothing in here touches the store or the clock, except the date helpers
//! that default an absent timestamp to today.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::model::Task;

const SECS_PER_HOUR: f64 = 3600.0;

/// Seconds to hours, rounded to two decimals.
///
/// The value goes through its two-decimal text form, so a stored result
/// converts back to itself.
pub fn seconds_to_hours(seconds: i64) -> f32 {
    round_hours(seconds as f64 / SECS_PER_HOUR)
}

/// Round an hour value to two decimals the same way [`seconds_to_hours`] does.
pub fn round_hours(hours: f64) -> f32 {
    format!("{hours:.2}").parse::<f32>().unwrap_or(0.0)
}

/// Studied share of the goal, clamped to `0.0..=1.0`.
///
/// A goal of zero or less is already met. A goal that is not a number at all
/// counts as one hour.
pub fn progress_ratio(studied_hours: f32, goal_hours: f32) -> f32 {
    let goal = if goal_hours.is_finite() { goal_hours } else { 1.0 };
    if goal <= 0.0 {
        return 1.0;
    }
    let ratio = studied_hours / goal;
    if ratio.is_nan() {
        return 0.0;
    }
    ratio.clamp(0.0, 1.0)
}

/// Parse the goal-hours text field. Unparseable input gives `None`.
pub fn parse_goal_hours(text: &str) -> Option<f32> {
    text.trim().parse::<f32>().ok().filter(|h| h.is_finite())
}

/// Sort tasks by due date, earliest first, then by priority, highest first.
///
/// The sort is stable, so tasks equal on both keys keep their input order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| b.priority.cmp(&a.priority))
    });
}

/// Split tasks into `(upcoming, completed)`, each sorted with [`sort_tasks`].
pub fn partition_tasks(tasks: impl IntoIterator<Item = Task>) -> (Vec<Task>, Vec<Task>) {
    let (mut completed, mut upcoming): (Vec<Task>, Vec<Task>) =
        tasks.into_iter().partition(|t| t.is_complete);
    sort_tasks(&mut upcoming);
    sort_tasks(&mut completed);
    (upcoming, completed)
}

/// Incomplete tasks only, sorted.
pub fn upcoming_tasks(tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
    partition_tasks(tasks).0
}

/// Format epoch milliseconds as `DD Mon, YYYY` in the local time zone.
///
/// `None` formats today's date.
pub fn format_date(millis: Option<i64>) -> String {
    format_date_in(&Local, millis)
}

/// Like [`format_date`], in an explicit time zone.
pub fn format_date_in<Tz: TimeZone>(tz: &Tz, millis: Option<i64>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let at: DateTime<Tz> = millis
        .and_then(|ms| tz.timestamp_millis_opt(ms).single())
        .unwrap_or_else(|| chrono::Utc::now().with_timezone(tz));
    at.format("%d %b, %Y").to_string()
}

/// Zero-pad to at least two digits.
pub fn pad(value: u64) -> String {
    format!("{value:02}")
}

/// An elapsed duration split for display. Hours are unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeParts {
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

impl TimeParts {
    pub fn from_secs(total: u64) -> Self {
        Self {
            hours: total / 3600,
            minutes: (total % 3600) / 60,
            seconds: total % 60,
        }
    }

    /// `(hh, mm, ss)`, each zero-padded.
    pub fn padded(&self) -> (String, String, String) {
        (pad(self.hours), pad(self.minutes), pad(self.seconds))
    }
}

impl std::fmt::Display for TimeParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h, m, s) = self.padded();
        write!(f, "{h}:{m}:{s}")
    }
}
