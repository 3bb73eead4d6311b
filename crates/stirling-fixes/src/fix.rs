//! Normalized fix records
//!
//! Every optional attribute is omitted from JSON when the source entity had
//! no value for it; absent never renders as `null` or `0`. Non-finite numbers
//! (malformed source strings) do render as `null`.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

/// Magnitude above which an `f64` no longer fits in an `i64`
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

/// An angle held as whole degrees.
///
/// Serialized as a JSON integer, or `null` when the source was malformed.
/// Values too large for an integer are written as floats, unclamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WholeDegrees(f64);

impl WholeDegrees {
    /// Round to the nearest degree, halves toward positive infinity
    #[must_use]
    pub fn round(degrees: f64) -> Self {
        Self(round_half_up(degrees))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Integer value, `None` when non-finite or outside the `i64` range
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i64(self) -> Option<i64> {
        (self.0 >= -I64_LIMIT && self.0 < I64_LIMIT).then(|| self.0 as i64)
    }
}

impl Serialize for WholeDegrees {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(degrees) => serializer.serialize_i64(degrees),
            None if self.0.is_finite() => serializer.serialize_f64(self.0),
            None => serializer.serialize_none(),
        }
    }
}

/// Rounding used for every corrected value: `floor(v + 0.5)`
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Magnetic and true heading, both in [0, 360)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Heading {
    pub mag: WholeDegrees,
    /// Omitted when the fix has no usable position
    #[serde(rename = "true", skip_serializing_if = "Option::is_none")]
    pub true_heading: Option<WholeDegrees>,
}

/// One normalized telemetry sample
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fix {
    #[serde(rename = "RowKey")]
    pub row_key: String,
    #[serde(rename = "Timestamp", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Knots, one decimal place
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<Heading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<WholeDegrees>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll: Option<WholeDegrees>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windspeed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winddir: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,

    /// Numeric columns without a dedicated attribute
    #[serde(flatten)]
    pub extra: BTreeMap<String, f64>,
}

impl Fix {
    #[must_use]
    pub fn new(row_key: impl Into<String>) -> Self {
        Self {
            row_key: row_key.into(),
            ..Self::default()
        }
    }
}

/// Response body of the fixes endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixBatch {
    pub count: usize,
    pub items: Vec<Fix>,
}

impl From<Vec<Fix>> for FixBatch {
    fn from(items: Vec<Fix>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_half_up() {
        assert!((round_half_up(2.5) - 3.0).abs() < f64::EPSILON);
        assert!((round_half_up(-2.5) + 2.0).abs() < f64::EPSILON);
        assert!((round_half_up(9.6) - 10.0).abs() < f64::EPSILON);
        assert!((round_half_up(-84.6) + 85.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_whole_degrees_serialization() {
        assert_eq!(serde_json::to_value(WholeDegrees::round(10.4)).unwrap(), json!(10));
        assert_eq!(serde_json::to_value(WholeDegrees::round(f64::NAN)).unwrap(), json!(null));
        assert_eq!(WholeDegrees::round(-0.4).as_i64(), Some(0));
    }

    #[test]
    fn test_whole_degrees_beyond_integer_range() {
        let huge = WholeDegrees::round(1e20);
        assert_eq!(huge.as_i64(), None);
        assert_eq!(serde_json::to_value(huge).unwrap(), json!(1e20));

        let tiny = WholeDegrees::round(-1e20);
        assert_eq!(serde_json::to_value(tiny).unwrap(), json!(-1e20));
        assert_eq!(serde_json::to_value(WholeDegrees::round(f64::INFINITY)).unwrap(), json!(null));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let mut fix = Fix::new("2024-05-01T10:00:00.000Z");
        fix.lat = Some(47.5);
        fix.heading = Some(Heading {
            mag: WholeDegrees::round(275.0),
            true_heading: None,
        });

        let value = serde_json::to_value(&fix).unwrap();
        assert_eq!(
            value,
            json!({"RowKey": "2024-05-01T10:00:00.000Z", "lat": 47.5, "heading": {"mag": 275}})
        );
    }

    #[test]
    fn test_extra_columns_flatten() {
        let mut fix = Fix::new("r");
        fix.extra.insert("humidity".to_string(), 40.5);

        let value = serde_json::to_value(&fix).unwrap();
        assert_eq!(value["humidity"], json!(40.5));
    }

    #[test]
    fn test_batch_counts_items() {
        let batch = FixBatch::from(vec![Fix::new("a"), Fix::new("b")]);
        let value = serde_json::to_value(&batch).unwrap();

        assert_eq!(value["count"], json!(2));
        assert_eq!(value["items"][1]["RowKey"], json!("b"));
    }
}
