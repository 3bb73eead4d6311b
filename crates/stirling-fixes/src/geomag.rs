//! Geomagnetic declination
//!
//! Declination is the angle from true north to magnetic north, positive
//! east. True heading = magnetic heading + declination.

use std::fmt::Debug;
use std::sync::Arc;

use stirling_common::config::{DeclinationConfig, DeclinationModelKind};

/// Declination lookup by position
pub trait DeclinationModel: Debug + Send + Sync {
    /// Declination in degrees at a geodetic latitude/longitude in degrees
    fn declination_at(&self, lat: f64, lon: f64) -> f64;
}

/// Centred dipole field from the first-degree Gauss coefficients (nT).
///
/// Ignores the non-dipole field, so expect errors of several degrees; fine
/// for dashboards, not for navigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipoleModel {
    g10: f64,
    g11: f64,
    h11: f64,
}

impl DipoleModel {
    /// IGRF-13, epoch 2020.0
    pub const IGRF13_2020: Self = Self {
        g10: -29404.8,
        g11: -1450.9,
        h11: 4652.5,
    };
}

impl Default for DipoleModel {
    fn default() -> Self {
        Self::IGRF13_2020
    }
}

impl DeclinationModel for DipoleModel {
    fn declination_at(&self, lat: f64, lon: f64) -> f64 {
        let colatitude = (90.0 - lat).to_radians();
        let longitude = lon.to_radians();
        let (sin_t, cos_t) = colatitude.sin_cos();
        let (sin_p, cos_p) = longitude.sin_cos();

        // Horizontal components at the reference radius
        let north = -self.g10 * sin_t + (self.g11 * cos_p + self.h11 * sin_p) * cos_t;
        let east = self.g11 * sin_p - self.h11 * cos_p;

        east.atan2(north).to_degrees()
    }
}

/// Same declination everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDeclination(pub f64);

impl DeclinationModel for FixedDeclination {
    fn declination_at(&self, _lat: f64, _lon: f64) -> f64 {
        self.0
    }
}

/// Model selected by configuration
#[must_use]
pub fn from_config(config: &DeclinationConfig) -> Arc<dyn DeclinationModel> {
    match config.model {
        DeclinationModelKind::Dipole => Arc::new(DipoleModel::default()),
        DeclinationModelKind::Fixed => Arc::new(FixedDeclination(config.fixed_degrees)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dipole_at_null_island() {
        let declination = DipoleModel::default().declination_at(0.0, 0.0);
        assert!((declination + 8.99).abs() < 0.05, "got {}", declination);
    }

    #[test]
    fn test_dipole_is_bounded_everywhere() {
        let model = DipoleModel::default();
        for lat in (-85..=85).step_by(5) {
            for lon in (-180..=180).step_by(15) {
                let d = model.declination_at(f64::from(lat), f64::from(lon));
                assert!(d.is_finite());
                assert!((-180.0..=180.0).contains(&d));
            }
        }
    }

    #[test]
    fn test_dipole_is_periodic_in_longitude() {
        let model = DipoleModel::default();
        let a = model.declination_at(47.6, -122.3);
        let b = model.declination_at(47.6, 237.7);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_declination() {
        let model = FixedDeclination(15.5);
        assert!((model.declination_at(10.0, 20.0) - 15.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_config() {
        let config = DeclinationConfig {
            model: DeclinationModelKind::Fixed,
            fixed_degrees: -3.0,
        };
        let model = from_config(&config);
        assert!((model.declination_at(0.0, 0.0) + 3.0).abs() < f64::EPSILON);

        let dipole = from_config(&DeclinationConfig::default());
        assert!((dipole.declination_at(0.0, 0.0) + 8.99).abs() < 0.05);
    }
}
