//! Data source abstraction for receiving gateway readings.
//!
//! Readings arrive either by polling a JSON file that a gateway rewrites,
//! or as newline-delimited JSON on a TCP connection.

mod file;
mod stream;

pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

use leakwatch_types::AssetReading;
use serde::Deserialize;

/// Trait for receiving asset readings from various sources.
///
/// # Example
///
/// ```
/// use leakwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("readings.json");
/// if let Some(readings) = source.poll() {
///     println!("Got {} readings", readings.len());
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Poll for new readings.
    ///
    /// Returns `Some(readings)` if new data is available, `None` otherwise.
    /// This method should be non-blocking.
    fn poll(&mut self) -> Option<Vec<AssetReading>>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Returns the error from the last poll, if any.
    fn error(&self) -> Option<&str>;
}

/// One JSON payload: a single reading or a batch.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Payload {
    Batch(Vec<AssetReading>),
    Single(AssetReading),
}

impl Payload {
    pub(crate) fn into_readings(self) -> Vec<AssetReading> {
        match self {
            Payload::Batch(readings) => readings,
            Payload::Single(reading) => vec![reading],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_accepts_single_and_batch() {
        let single: Payload = serde_json::from_str(r#"{"assetId": "A1"}"#).unwrap();
        assert_eq!(single.into_readings().len(), 1);

        let batch: Payload =
            serde_json::from_str(r#"[{"assetId": "A1"}, {"assetId": "A2", "leakDetected": true}]"#)
                .unwrap();
        let readings = batch.into_readings();
        assert_eq!(readings.len(), 2);
        assert!(readings[1].leak_detected);
    }
}
