//! Lifecycle of a single leak occurrence.
//!
//! ```text
//!   NotReported ──activate(id)──▶ Active(id) ──resolve()──▶ Resolved(id)
//!        ▲                                                     │
//!        └──────────────────────restart()──────────────────────┘
//! ```
//!
//! `NotReported → Active` happens once the leak crosses the reporting
//! threshold and a record exists. `Active → Resolved` is driven by the
//! caller when the physical leak clears.

use alloc::string::String;
use core::fmt;

/// Where a leak occurrence is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "state", rename_all = "snake_case"))]
pub enum LeakState {
    /// Leaking (or idle) but no record has been written yet.
    #[default]
    NotReported,
    /// A record exists and is open.
    Active { record_id: String },
    /// The record has been closed.
    Resolved { record_id: String },
}

impl LeakState {
    /// Record the leak as persisted under `record_id`.
    ///
    /// Re-activating with the same id is a no-op.
    pub fn activate(self, record_id: impl Into<String>) -> Result<Self, TransitionError> {
        let record_id = record_id.into();
        match self {
            LeakState::NotReported => Ok(LeakState::Active { record_id }),
            LeakState::Active { record_id: current } if current == record_id => {
                Ok(LeakState::Active { record_id: current })
            }
            LeakState::Active { record_id: current } => Err(TransitionError::RecordMismatch {
                current,
                requested: record_id,
            }),
            LeakState::Resolved { .. } => Err(TransitionError::Invalid {
                from: "resolved",
                action: "activate",
            }),
        }
    }

    /// Close the active record.
    pub fn resolve(self) -> Result<Self, TransitionError> {
        match self {
            LeakState::Active { record_id } => Ok(LeakState::Resolved { record_id }),
            other => Err(TransitionError::Invalid {
                from: other.name(),
                action: "resolve",
            }),
        }
    }

    /// Start tracking a new occurrence after a resolved one.
    pub fn restart(self) -> Result<Self, TransitionError> {
        match self {
            LeakState::Resolved { .. } | LeakState::NotReported => Ok(LeakState::NotReported),
            LeakState::Active { .. } => Err(TransitionError::Invalid {
                from: "active",
                action: "restart",
            }),
        }
    }

    /// Identifier of the open record, if any.
    pub fn active_record(&self) -> Option<&str> {
        match self {
            LeakState::Active { record_id } => Some(record_id),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LeakState::Active { .. })
    }

    /// Short name used in errors and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            LeakState::NotReported => "not_reported",
            LeakState::Active { .. } => "active",
            LeakState::Resolved { .. } => "resolved",
        }
    }
}

/// A lifecycle transition that is not allowed from the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The action makes no sense in this state.
    Invalid {
        from: &'static str,
        action: &'static str,
    },
    /// Activation with a different record than the one already open.
    RecordMismatch { current: String, requested: String },
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Invalid { from, action } => {
                write!(f, "cannot {} a leak in state {}", action, from)
            }
            TransitionError::RecordMismatch { current, requested } => write!(
                f,
                "leak already active as record {}, refusing to activate {}",
                current, requested
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransitionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle() {
        let state = LeakState::default();
        assert_eq!(state, LeakState::NotReported);

        let state = state.activate("rec-1").unwrap();
        assert_eq!(state.active_record(), Some("rec-1"));

        let state = state.resolve().unwrap();
        assert_eq!(
            state,
            LeakState::Resolved {
                record_id: "rec-1".into()
            }
        );

        let state = state.restart().unwrap();
        assert_eq!(state, LeakState::NotReported);
    }

    #[test]
    fn activate_same_record_is_idempotent() {
        let state = LeakState::NotReported.activate("rec-1").unwrap();
        let again = state.clone().activate("rec-1").unwrap();
        assert_eq!(state, again);
    }

    #[test]
    fn activate_different_record_is_rejected() {
        let state = LeakState::NotReported.activate("rec-1").unwrap();
        let err = state.activate("rec-2").unwrap_err();
        assert_eq!(
            err,
            TransitionError::RecordMismatch {
                current: "rec-1".into(),
                requested: "rec-2".into()
            }
        );
    }

    #[test]
    fn resolve_requires_active() {
        assert!(LeakState::NotReported.resolve().is_err());
        let resolved = LeakState::Resolved {
            record_id: "rec-1".into(),
        };
        assert!(resolved.resolve().is_err());
    }

    #[test]
    fn activate_from_resolved_is_rejected() {
        let resolved = LeakState::Resolved {
            record_id: "rec-1".into(),
        };
        let err = resolved.activate("rec-2").unwrap_err();
        assert_eq!(err.to_string(), "cannot activate a leak in state resolved");
    }

    #[test]
    fn restart_while_active_is_rejected() {
        let active = LeakState::NotReported.activate("rec-1").unwrap();
        assert!(active.restart().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_string(&LeakState::Active {
            record_id: "r".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"state":"active","record_id":"r"}"#);
    }
}
