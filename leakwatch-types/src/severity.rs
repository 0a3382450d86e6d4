//! Severity bands and record status.

use core::fmt;

/// Severity band of a leak, derived from how long it has been running.
///
/// Variants are ordered from least to most severe so that `max()` picks
/// the worst of several leaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Below the reporting threshold. Never persisted.
    #[default]
    Normal,
    Moderate,
    Critical,
    Severe,
}

impl Severity {
    /// Every band, least severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Normal,
        Severity::Moderate,
        Severity::Critical,
        Severity::Severe,
    ];

    /// Lowercase name as stored in leak records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Moderate => "moderate",
            Severity::Critical => "critical",
            Severity::Severe => "severe",
        }
    }

    /// Short symbol for log lines and reports.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Severity::Normal => "OK",
            Severity::Moderate => "MOD",
            Severity::Critical => "CRIT",
            Severity::Severe => "SEV",
        }
    }

    /// Whether a leak in this band gets a persisted record.
    pub const fn is_reportable(&self) -> bool {
        !matches!(self, Severity::Normal)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a persisted leak record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LeakStatus {
    Active,
    Resolved,
}

impl LeakStatus {
    /// Lowercase name as stored in leak records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LeakStatus::Active => "active",
            LeakStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
