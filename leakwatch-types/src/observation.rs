//! Leak observations and raw device readings.

use alloc::string::String;

use crate::EpochMillis;

/// A single periodic report for an asset suspected of leaking.
///
/// This is the input to the synchronizer. It is not persisted as-is;
/// the synchronizer turns it into a leak record once the leak has run
/// long enough.
///
/// # Example
///
/// ```rust
/// use leakwatch_types::{EpochMillis, LeakObservation};
///
/// let obs = LeakObservation::builder("A1")
///     .asset_name("Compressor hall, line 3")
///     .network("net-7")
///     .flow_lpm(20.0)
///     .pressure(6.4)
///     .started_at(EpochMillis::from_secs(1_700_000_000))
///     .build();
///
/// assert_eq!(obs.asset_id, "A1");
/// assert!(obs.known_record_id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct LeakObservation {
    pub asset_id: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub asset_name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub network_id: String,

    /// Current flow rate in liters per minute.
    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::measure::deserialize")
    )]
    pub current_lpm: f64,

    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::measure::deserialize")
    )]
    pub current_pressure: f64,

    /// When the leak condition began.
    pub start_time: EpochMillis,

    /// Identifier of the persisted record, once there is one.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub current_db_id: Option<String>,
}

impl LeakObservation {
    /// Create a builder for an observation of `asset_id`.
    pub fn builder(asset_id: impl Into<String>) -> LeakObservationBuilder {
        LeakObservationBuilder::new(asset_id)
    }

    /// The record identifier, treating an empty string as absent.
    pub fn known_record_id(&self) -> Option<&str> {
        self.current_db_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Flow rate coerced to a finite, non-negative value.
    pub fn flow_lpm(&self) -> f64 {
        sanitize_measure(self.current_lpm)
    }

    /// Pressure coerced to a finite, non-negative value.
    pub fn pressure(&self) -> f64 {
        sanitize_measure(self.current_pressure)
    }
}

/// Builder for [`LeakObservation`].
#[derive(Debug)]
pub struct LeakObservationBuilder {
    inner: LeakObservation,
}

impl LeakObservationBuilder {
    /// Create a builder with zeroed measurements and an epoch start time.
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            inner: LeakObservation {
                asset_id: asset_id.into(),
                asset_name: String::new(),
                network_id: String::new(),
                current_lpm: 0.0,
                current_pressure: 0.0,
                start_time: EpochMillis::default(),
                current_db_id: None,
            },
        }
    }

    /// Set the display name of the asset.
    pub fn asset_name(mut self, name: impl Into<String>) -> Self {
        self.inner.asset_name = name.into();
        self
    }

    /// Set the network the asset belongs to.
    pub fn network(mut self, network_id: impl Into<String>) -> Self {
        self.inner.network_id = network_id.into();
        self
    }

    /// Set the current flow rate (liters per minute).
    pub fn flow_lpm(mut self, lpm: f64) -> Self {
        self.inner.current_lpm = lpm;
        self
    }

    /// Set the current line pressure.
    pub fn pressure(mut self, pressure: f64) -> Self {
        self.inner.current_pressure = pressure;
        self
    }

    /// Set when the leak began.
    pub fn started_at(mut self, start: EpochMillis) -> Self {
        self.inner.start_time = start;
        self
    }

    /// Attach the identifier of an already persisted record.
    pub fn record_id(mut self, id: impl Into<String>) -> Self {
        self.inner.current_db_id = Some(id.into());
        self
    }

    /// Build the observation.
    pub fn build(self) -> LeakObservation {
        self.inner
    }
}

/// A raw sample from a flow sensor gateway.
///
/// Readings arrive on every poll whether or not a leak is present. The
/// monitor turns the leaking ones into [`LeakObservation`]s.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AssetReading {
    pub asset_id: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub asset_name: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub network_id: String,

    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::measure::deserialize")
    )]
    pub flow_lpm: f64,

    #[cfg_attr(
        feature = "serde",
        serde(default, deserialize_with = "crate::measure::deserialize")
    )]
    pub pressure: f64,

    /// Whether the gateway currently flags a leak on this asset.
    #[cfg_attr(feature = "serde", serde(default))]
    pub leak_detected: bool,

    /// Leak start as reported by the device, if it tracks one.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub leak_since: Option<EpochMillis>,

    /// When the sample was taken.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub observed_at: Option<EpochMillis>,
}

impl AssetReading {
    /// A reading with no leak and zeroed measurements.
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            asset_name: String::new(),
            network_id: String::new(),
            flow_lpm: 0.0,
            pressure: 0.0,
            leak_detected: false,
            leak_since: None,
            observed_at: None,
        }
    }

    /// Mark this reading as leaking at the given flow rate.
    pub fn leaking(mut self, flow_lpm: f64) -> Self {
        self.leak_detected = true;
        self.flow_lpm = flow_lpm;
        self
    }

    /// Set the device-reported leak start.
    pub fn since(mut self, start: EpochMillis) -> Self {
        self.leak_since = Some(start);
        self
    }

    /// Set the sample time.
    pub fn at(mut self, observed_at: EpochMillis) -> Self {
        self.observed_at = Some(observed_at);
        self
    }

    /// Set the asset display name and network.
    pub fn located(mut self, asset_name: impl Into<String>, network_id: impl Into<String>) -> Self {
        self.asset_name = asset_name.into();
        self.network_id = network_id.into();
        self
    }

    /// Set the line pressure.
    pub fn with_pressure(mut self, pressure: f64) -> Self {
        self.pressure = pressure;
        self
    }

    /// Build the observation for a leak that started at `start_time`.
    pub fn to_observation(&self, start_time: EpochMillis, record_id: Option<&str>) -> LeakObservation {
        LeakObservation {
            asset_id: self.asset_id.clone(),
            asset_name: self.asset_name.clone(),
            network_id: self.network_id.clone(),
            current_lpm: sanitize_measure(self.flow_lpm),
            current_pressure: sanitize_measure(self.pressure),
            start_time,
            current_db_id: record_id.map(String::from),
        }
    }
}

/// Coerce a measured quantity to a finite, non-negative value.
///
/// Gateways occasionally report garbage (NaN, negative flow during sensor
/// recalibration). Those readings are zeroed rather than rejected.
pub fn sanitize_measure(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_every_field() {
        let obs = LeakObservation::builder("A1")
            .asset_name("Dryer")
            .network("net-1")
            .flow_lpm(12.5)
            .pressure(7.1)
            .started_at(EpochMillis::from_millis(1_000))
            .record_id("rec-9")
            .build();

        assert_eq!(obs.asset_name, "Dryer");
        assert_eq!(obs.network_id, "net-1");
        assert_eq!(obs.flow_lpm(), 12.5);
        assert_eq!(obs.pressure(), 7.1);
        assert_eq!(obs.start_time.as_millis(), 1_000);
        assert_eq!(obs.known_record_id(), Some("rec-9"));
    }

    #[test]
    fn empty_record_id_counts_as_absent() {
        let obs = LeakObservation::builder("A1").record_id("").build();
        assert!(obs.known_record_id().is_none());
    }

    #[test]
    fn garbage_measurements_are_zeroed() {
        assert_eq!(sanitize_measure(f64::NAN), 0.0);
        assert_eq!(sanitize_measure(f64::INFINITY), 0.0);
        assert_eq!(sanitize_measure(-3.0), 0.0);
        assert_eq!(sanitize_measure(4.5), 4.5);

        let obs = LeakObservation::builder("A1").flow_lpm(-1.0).build();
        assert_eq!(obs.flow_lpm(), 0.0);
    }

    #[test]
    fn reading_to_observation() {
        let reading = AssetReading::new("A2")
            .located("Booster", "net-2")
            .leaking(f64::NAN)
            .with_pressure(6.0);

        let obs = reading.to_observation(EpochMillis::from_secs(10), Some("rec-1"));
        assert_eq!(obs.asset_id, "A2");
        assert_eq!(obs.asset_name, "Booster");
        assert_eq!(obs.network_id, "net-2");
        assert_eq!(obs.current_lpm, 0.0);
        assert_eq!(obs.current_pressure, 6.0);
        assert_eq!(obs.known_record_id(), Some("rec-1"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn reading_missing_numbers_default_to_zero() {
        let json = r#"{"assetId":"A3","leakDetected":true}"#;
        let reading: AssetReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.asset_id, "A3");
        assert!(reading.leak_detected);
        assert_eq!(reading.flow_lpm, 0.0);
        assert!(reading.leak_since.is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn observation_uses_camel_case() {
        let json = r#"{"assetId":"A1","currentLpm":20,"startTime":1000,"currentDbId":null}"#;
        let obs: LeakObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.current_lpm, 20.0);
        assert_eq!(obs.start_time.as_millis(), 1000);
        assert!(obs.current_db_id.is_none());
    }
}
