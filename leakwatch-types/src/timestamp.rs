//! Wall-clock timestamps for serialization.
//!
//! Timestamps are milliseconds since the Unix epoch, the unit device
//! gateways and the hosted document store both speak.

use core::time::Duration;

/// Milliseconds since the Unix epoch.
///
/// Arithmetic saturates: a start time in the future yields a zero elapsed
/// duration rather than underflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EpochMillis(pub u64);

impl EpochMillis {
    /// Create from milliseconds since the epoch.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Create from seconds since the epoch.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1000)
    }

    /// Get the value in milliseconds.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Current wall-clock time.
    #[cfg(feature = "std")]
    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| Self(d.as_millis() as u64))
            .unwrap_or_default()
    }

    /// Time elapsed from `self` until `now`, zero if `self` is later.
    pub const fn elapsed_until(&self, now: EpochMillis) -> Duration {
        Duration::from_millis(now.0.saturating_sub(self.0))
    }

    /// Shift the timestamp back by `d`, saturating at the epoch.
    pub const fn saturating_sub(&self, d: Duration) -> Self {
        Self(self.0.saturating_sub(d.as_millis() as u64))
    }

    /// Shift the timestamp forward by `d`.
    pub const fn saturating_add(&self, d: Duration) -> Self {
        Self(self.0.saturating_add(d.as_millis() as u64))
    }
}

impl From<u64> for EpochMillis {
    fn from(millis: u64) -> Self {
        Self(millis)
    }
}

impl From<EpochMillis> for u64 {
    fn from(ts: EpochMillis) -> Self {
        ts.0
    }
}

/// Whole minutes contained in `d` (truncated).
pub const fn whole_minutes(d: Duration) -> u64 {
    d.as_secs() / 60
}
