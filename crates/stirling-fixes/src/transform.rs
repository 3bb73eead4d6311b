//! Field transform: one raw entity in, one fix out
//!
//! | raw column | output |
//! |---|---|
//! | `Timestamp` | passed through as text |
//! | `x` | `heading.mag` = x + heading correction; `heading.true` = mag + declination |
//! | `y` | `pitch` = y + pitch correction |
//! | `z` | `roll` = z + roll correction |
//! | `velocity` | rounded to one decimal |
//! | anything else | decoded as a float, uncorrected |
//!
//! Malformed numbers decode to NaN and flow through unchanged.

use std::sync::Arc;

use stirling_common::config::FeedConfig;
use stirling_store::{RawEntity, RawValue};
use tracing::trace;

use crate::fix::{round_half_up, Fix, Heading, WholeDegrees};
use crate::geomag::{self, DeclinationModel};

/// Mounting-angle calibration, degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Corrections {
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl From<&FeedConfig> for Corrections {
    fn from(config: &FeedConfig) -> Self {
        Self {
            heading: config.heading_correction,
            pitch: config.pitch_correction,
            roll: config.roll_correction,
        }
    }
}

/// Stateless entity-to-fix mapping
#[derive(Debug, Clone)]
pub struct FieldTransform {
    corrections: Corrections,
    declination: Arc<dyn DeclinationModel>,
}

impl FieldTransform {
    #[must_use]
    pub fn new(corrections: Corrections, declination: Arc<dyn DeclinationModel>) -> Self {
        Self {
            corrections,
            declination,
        }
    }

    #[must_use]
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(Corrections::from(config), geomag::from_config(&config.declination))
    }

    /// Normalize one entity
    #[must_use]
    pub fn apply(&self, entity: &RawEntity) -> Fix {
        let mut fix = Fix::new(entity.row_key());

        for (name, value) in entity.fields() {
            if value.is_empty() {
                continue;
            }

            match name {
                "PartitionKey" | "RowKey" => {}
                "Timestamp" => fix.timestamp = Some(value.as_str().to_string()),
                "x" => fix.heading = Some(self.heading(entity, decode(value))),
                "y" => fix.pitch = Some(corrected(value, self.corrections.pitch)),
                "z" => fix.roll = Some(corrected(value, self.corrections.roll)),
                "velocity" => fix.velocity = Some(round_to_tenth(decode(value))),
                "lat" => fix.lat = Some(decode(value)),
                "lon" => fix.lon = Some(decode(value)),
                "accuracy" => fix.accuracy = Some(decode(value)),
                "temp" => fix.temp = Some(decode(value)),
                "voltage" => fix.voltage = Some(decode(value)),
                "windspeed" => fix.windspeed = Some(decode(value)),
                "winddir" => fix.winddir = Some(decode(value)),
                "depth" => fix.depth = Some(decode(value)),
                other => {
                    fix.extra.insert(other.to_string(), decode(value));
                }
            }
        }

        fix
    }

    fn heading(&self, entity: &RawEntity, sensor: f64) -> Heading {
        let mag = normalize_degrees(round_half_up(sensor + self.corrections.heading));

        let true_heading = match position(entity) {
            Some((lat, lon)) => {
                let declination = self.declination.declination_at(lat, lon);
                Some(WholeDegrees::round(normalize_degrees(round_half_up(mag + declination))))
            }
            None => {
                trace!(row_key = entity.row_key(), "No usable position, true heading omitted");
                None
            }
        };

        Heading {
            mag: WholeDegrees::round(mag),
            true_heading,
        }
    }
}

/// Fold an angle into [0, 360)
#[must_use]
pub fn normalize_degrees(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

fn corrected(value: &RawValue, correction: f64) -> WholeDegrees {
    WholeDegrees::round(decode(value) + correction)
}

fn round_to_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

fn decode(value: &RawValue) -> f64 {
    value.as_str().trim().parse().unwrap_or(f64::NAN)
}

/// Finite lat/lon of the entity itself, if both are present
fn position(entity: &RawEntity) -> Option<(f64, f64)> {
    let coordinate = |name: &str| {
        entity
            .get(name)
            .filter(|v| !v.is_empty())
            .map(decode)
            .filter(|v| v.is_finite())
    };

    Some((coordinate("lat")?, coordinate("lon")?))
}
