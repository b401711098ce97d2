use serde::{Deserialize, Serialize};

/// How long a message should stay on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDuration {
    #[default]
    Short,
    Long,
}

/// Every screen command reports its outcome as a UiEvent.
///
/// Delivery is fire-and-forget over a broadcast channel. A consumer that
/// reattaches may see an event twice, so handling must be idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    ShowMessage {
        message: String,
        duration: MessageDuration,
    },
    /// The screen's subject of interest is gone; go back to the parent view.
    NavigateUp,
}

impl UiEvent {
    pub fn message(message: impl Into<String>) -> Self {
        UiEvent::ShowMessage {
            message: message.into(),
            duration: MessageDuration::Short,
        }
    }

    /// Failure report: generic prefix plus the underlying detail.
    pub fn failure(prefix: &str, detail: impl std::fmt::Display) -> Self {
        UiEvent::ShowMessage {
            message: format!("{prefix} {detail}"),
            duration: MessageDuration::Long,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            UiEvent::ShowMessage { message, .. } => Some(message),
            UiEvent::NavigateUp => None,
        }
    }
}
