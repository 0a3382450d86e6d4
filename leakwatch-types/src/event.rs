//! Lifecycle notifications emitted while tracking leaks.

use alloc::string::String;

use crate::{EpochMillis, Severity};

/// What happened to a leak on a given reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LeakEventKind {
    /// A new record was written.
    Created,
    /// The open record was refreshed.
    Updated,
    /// The open record was closed.
    Resolved,
    /// The leak cleared before reaching the reporting threshold.
    Discarded,
    /// Persistence failed; the reading will be retried on the next tick.
    Failed,
}

/// A single lifecycle notification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LeakEvent {
    pub asset_id: String,
    pub kind: LeakEventKind,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub record_id: Option<String>,

    pub severity: Severity,

    pub at: EpochMillis,

    /// Error text for `Failed` events.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub message: Option<String>,
}

impl LeakEvent {
    /// Create an event without a message.
    pub fn new(
        asset_id: impl Into<String>,
        kind: LeakEventKind,
        record_id: Option<String>,
        severity: Severity,
        at: EpochMillis,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            kind,
            record_id,
            severity,
            at,
            message: None,
        }
    }

    /// Attach an explanatory message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_message() {
        let event = LeakEvent::new(
            "A1",
            LeakEventKind::Failed,
            None,
            Severity::Moderate,
            EpochMillis::from_millis(5),
        )
        .with_message("store unavailable");
        assert_eq!(event.message.as_deref(), Some("store unavailable"));
        assert_eq!(event.kind, LeakEventKind::Failed);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_shape() {
        let event = LeakEvent::new(
            "A1",
            LeakEventKind::Created,
            Some("rec-1".into()),
            Severity::Critical,
            EpochMillis::from_millis(5),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "created");
        assert_eq!(json["recordId"], "rec-1");
        assert_eq!(json["severity"], "critical");
        assert!(json.get("message").is_none());
    }
}
