//! Engine configuration
//!
//! Every section has defaults matching the conventional values used by
//! SGP4 and by common tracking software, so `EngineConfig::default()` is a
//! complete configuration. A JSON document only needs the keys it overrides:
//!
//! ```json
//! { "propagator": { "gravity": "wgs84" }, "kepler": { "max_iterations": 20 } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::keplerlib::KeplerSolver;
use crate::sgp4lib::Gravity;
use crate::time::{self, CalendarTime, JulianDate, DEFAULT_MIN_YEAR};
use crate::{Result, SatfieldError};

/// Top-level configuration for all engine components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub time: TimeConfig,
    pub kepler: KeplerSolver,
    pub propagator: PropagatorConfig,
    pub ephemeris: EphemerisConfig,
}

impl EngineConfig {
    /// Decode a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SatfieldError::Config(format!("invalid configuration JSON: {}", e)))
    }

    /// Read and decode a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SatfieldError::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_json_str(&text)
    }

    /// Validate and convert a calendar time against `time.min_year`.
    pub fn to_julian_date(&self, calendar: &CalendarTime) -> Result<JulianDate> {
        self.time.julian_date(calendar)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SatfieldError::Config(format!("cannot encode configuration: {}", e)))
    }
}

/// Calendar input limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// Earliest calendar year accepted by `to_julian_date`
    pub min_year: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        TimeConfig {
            min_year: DEFAULT_MIN_YEAR,
        }
    }
}

impl TimeConfig {
    pub fn julian_date(&self, calendar: &CalendarTime) -> Result<JulianDate> {
        time::to_julian_date(calendar, self.min_year)
    }
}

/// SGP4/SDP4 context-build settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagatorConfig {
    /// Geopotential constant set
    pub gravity: Gravity,
    /// Orbits with a period at or above this use the deep-space branch
    pub deep_space_period_minutes: f64,
    /// The semi-major axis must exceed the equatorial radius by this much
    pub min_altitude_km: f64,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        PropagatorConfig {
            gravity: Gravity::Wgs72,
            deep_space_period_minutes: 225.0,
            min_altitude_km: 100.0,
        }
    }
}

/// Sampling density for orbit previews and ground tracks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EphemerisConfig {
    pub samples_per_orbit: usize,
    /// Lower bound on the sample count regardless of revolutions requested
    pub min_samples: usize,
}

impl Default for EphemerisConfig {
    fn default() -> Self {
        EphemerisConfig {
            samples_per_orbit: 2000,
            min_samples: 300,
        }
    }
}
