//! Persisted leak records and the partial updates applied to them.

use alloc::string::String;

use crate::{EpochMillis, LeakStatus, Severity};

/// A persisted leak occurrence.
///
/// Exactly one active record exists per leaking asset. It is created the
/// first time the leak crosses the reporting threshold, updated on each
/// later observation, and closed by an explicit resolve.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LeakRecord {
    pub asset_id: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub asset_name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub network_id: String,

    pub start_time: EpochMillis,

    #[cfg_attr(feature = "serde", serde(default))]
    pub current_lpm: f64,

    #[cfg_attr(feature = "serde", serde(default))]
    pub current_pressure: f64,

    /// Estimated cost of the leak per hour of operation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cost_per_hour: f64,

    /// Whole minutes the leak had been running at the last observation.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_minutes: u64,

    pub status: LeakStatus,

    pub severity: Severity,

    pub created_at: EpochMillis,

    pub last_update: EpochMillis,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub end_time: Option<EpochMillis>,
}

impl LeakRecord {
    /// Whether the record is still open.
    pub fn is_active(&self) -> bool {
        self.status == LeakStatus::Active
    }

    /// Cost accrued so far, assuming a constant hourly rate since `start_time`.
    ///
    /// Resolved records stop accruing at `end_time`; active ones accrue
    /// until `now`.
    pub fn accrued_cost(&self, now: EpochMillis) -> f64 {
        let end = self.end_time.unwrap_or(now);
        let hours = self.start_time.elapsed_until(end).as_secs_f64() / 3600.0;
        self.cost_per_hour * hours
    }
}

/// Fields rewritten on every observation of an active leak.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LeakUpdate {
    pub duration_minutes: u64,
    pub current_pressure: f64,
    pub severity: Severity,
    pub current_lpm: f64,
    pub cost_per_hour: f64,
    pub last_update: EpochMillis,
}

/// Fields written when a leak is resolved.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LeakResolution {
    pub status: LeakStatus,
    pub end_time: EpochMillis,
    pub last_update: EpochMillis,
}

impl LeakResolution {
    /// Resolution stamped at `at`.
    pub fn at(at: EpochMillis) -> Self {
        Self {
            status: LeakStatus::Resolved,
            end_time: at,
            last_update: at,
        }
    }
}
