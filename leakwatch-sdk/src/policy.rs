//! Severity classification and cost estimation.

use std::time::Duration;

use leakwatch_types::{sanitize_measure, Severity};
use thiserror::Error;

/// Default annual cost of one liter-per-minute of leakage.
pub const ANNUAL_COST_PER_LPM: f64 = 350.0;

/// Hours in a (non-leap) year of continuous operation.
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// Errors from an inconsistent policy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// Thresholds must be strictly increasing: moderate < critical < severe.
    #[error("thresholds must increase: moderate {moderate:?}, critical {critical:?}, severe {severe:?}")]
    NotIncreasing {
        moderate: Duration,
        critical: Duration,
        severe: Duration,
    },

    /// Cost parameters must be finite and positive.
    #[error("invalid cost parameter {name}: {value}")]
    InvalidCost { name: &'static str, value: f64 },
}

/// Thresholds and cost model for leak records.
///
/// A leak is classified by how long it has been running. The bands are
/// evaluated from the highest down and the lower bound of each band is
/// inclusive, so a leak running exactly `critical_after` is critical.
///
/// # Example
///
/// ```rust
/// use leakwatch_sdk::SeverityPolicy;
/// use leakwatch_types::Severity;
/// use std::time::Duration;
///
/// let policy = SeverityPolicy::default();
/// assert_eq!(policy.classify(Duration::from_secs(4 * 60)), Severity::Normal);
/// assert_eq!(policy.classify(Duration::from_secs(10 * 60)), Severity::Critical);
/// assert_eq!(policy.hourly_cost(10.0), 0.40);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SeverityPolicy {
    /// Minimum duration before a leak is reported at all.
    pub moderate_after: Duration,
    pub critical_after: Duration,
    pub severe_after: Duration,
    pub annual_cost_per_lpm: f64,
    pub hours_per_year: f64,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            moderate_after: Duration::from_secs(5 * 60),
            critical_after: Duration::from_secs(10 * 60),
            severe_after: Duration::from_secs(15 * 60),
            annual_cost_per_lpm: ANNUAL_COST_PER_LPM,
            hours_per_year: HOURS_PER_YEAR,
        }
    }
}

impl SeverityPolicy {
    /// Check that the thresholds and cost parameters make sense.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(self.moderate_after < self.critical_after && self.critical_after < self.severe_after) {
            return Err(PolicyError::NotIncreasing {
                moderate: self.moderate_after,
                critical: self.critical_after,
                severe: self.severe_after,
            });
        }
        for (name, value) in [
            ("annual_cost_per_lpm", self.annual_cost_per_lpm),
            ("hours_per_year", self.hours_per_year),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(PolicyError::InvalidCost { name, value });
            }
        }
        Ok(())
    }

    /// The debounce: leaks shorter than this are never persisted.
    pub fn reporting_threshold(&self) -> Duration {
        self.moderate_after
    }

    /// Severity band for a leak that has been running for `elapsed`.
    pub fn classify(&self, elapsed: Duration) -> Severity {
        if elapsed >= self.severe_after {
            Severity::Severe
        } else if elapsed >= self.critical_after {
            Severity::Critical
        } else if elapsed >= self.moderate_after {
            Severity::Moderate
        } else {
            Severity::Normal
        }
    }

    /// Estimated cost per hour of a leak flowing at `lpm`, rounded to cents.
    pub fn hourly_cost(&self, lpm: f64) -> f64 {
        round_cents(sanitize_measure(lpm) * self.annual_cost_per_lpm / self.hours_per_year)
    }
}

/// Round to two decimal places.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
