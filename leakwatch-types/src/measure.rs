//! Lenient decoding of measured quantities.
//!
//! Gateways send `null`, quoted numbers and the odd `"n/a"` in numeric
//! fields. Any of those decodes to a number (or 0.0) instead of failing the
//! whole reading.

use core::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};

use crate::sanitize_measure;

/// Deserialize an `f64`, coercing anything unusable to 0.0.
pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_any(MeasureVisitor)
        .map(sanitize_measure)
}

struct MeasureVisitor;

impl<'de> Visitor<'de> for MeasureVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a measurement")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        Ok(v.trim().parse::<f64>().unwrap_or(0.0))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(0.0)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<f64, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<f64, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(0.0)
    }
}

#[cfg(test)]
mod tests {
    use crate::{AssetReading, LeakObservation};

    #[test]
    fn null_and_text_become_zero() {
        let json = r#"{"assetId":"A2","leakDetected":true,"flowLpm":null,"pressure":"abc"}"#;
        let reading: AssetReading = serde_json::from_str(json).unwrap();
        assert!(reading.leak_detected);
        assert_eq!(reading.flow_lpm, 0.0);
        assert_eq!(reading.pressure, 0.0);
    }

    #[test]
    fn quoted_numbers_are_read() {
        let json = r#"{"assetId":"A1","flowLpm":" 12.5 ","pressure":6}"#;
        let reading: AssetReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.flow_lpm, 12.5);
        assert_eq!(reading.pressure, 6.0);
    }

    #[test]
    fn negative_and_odd_shapes_are_zeroed() {
        let json = r#"{"assetId":"A1","flowLpm":-4,"pressure":{"bar":6}}"#;
        let reading: AssetReading = serde_json::from_str(json).unwrap();
        assert_eq!(reading.flow_lpm, 0.0);
        assert_eq!(reading.pressure, 0.0);
    }

    #[test]
    fn observation_measures_are_lenient() {
        let json = r#"{"assetId":"A1","currentLpm":"NaN","currentPressure":null,"startTime":1000}"#;
        let obs: LeakObservation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.current_lpm, 0.0);
        assert_eq!(obs.current_pressure, 0.0);
    }
}
