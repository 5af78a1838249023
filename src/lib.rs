//! satfield: the orbital-mechanics core of a satellite tracker
//!
//! Parses NORAD two-line element sets, converts them to Keplerian elements,
//! propagates them with SGP4/SDP4, rotates the results into Earth-fixed and
//! geodetic coordinates, and works out ground-station visibility.
//!
//! Data flows one way through the modules:
//!
//! ```text
//! tlelib → elementslib → sgp4lib → framelib/toposlib → passlib
//! ```
//!
//! # Example
//!
//! ```ignore
//! use satfield::time::JulianDate;
//! use satfield::toposlib::GroundStation;
//!
//! let line1 = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
//! let line2 = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";
//!
//! let tle = satfield::parse_tle(line1, line2)?;
//! let context = satfield::build_context(&tle)?;
//! let eci = satfield::propagate(&context, tle.epoch.add_minutes(30.0))?;
//! let ecef = satfield::eci_to_ecef(&eci, eci.epoch);
//! let where_ = satfield::to_geodetic(&ecef);
//! println!("{}", where_);
//! ```

pub mod config;
pub mod constants;
pub mod elementslib;
pub mod framelib;
pub mod keplerlib;
pub mod passlib;
pub mod sgp4lib;
pub mod time;
pub mod tlelib;
pub mod toposlib;
pub mod tracklib;

use thiserror::Error;

pub use config::EngineConfig;
pub use elementslib::KeplerianElements;
pub use framelib::{Frame, StateVector};
pub use passlib::{PassSample, VisibilityWindow};
pub use sgp4lib::{DecayReason, EarthSatellite, PropagatorContext};
pub use time::JulianDate;
pub use tlelib::TleRecord;
pub use toposlib::{GeodeticPosition, GroundStation};

/// Errors produced anywhere in the engine
#[derive(Error, Debug)]
pub enum SatfieldError {
    /// A TLE line has the wrong length, line number or overall shape
    #[error("Malformed TLE: {0}")]
    MalformedTle(String),

    /// The mod-10 checksum in column 69 disagrees with the line contents
    #[error("Checksum mismatch on line {line}: column 69 says {expected}, computed {computed}")]
    ChecksumMismatch { line: u8, expected: u8, computed: u8 },

    /// A fixed-column field that must be numeric could not be decoded
    #[error("Could not parse {field} on line {line} from {text:?}")]
    FieldParseError {
        line: u8,
        field: &'static str,
        text: String,
    },

    /// Calendar input outside the valid Gregorian range
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Elements that cannot describe a physical orbit
    #[error("Invalid orbital elements: {0}")]
    InvalidElements(String),

    /// An iterative solver ran out of iterations
    #[error("Kepler solver did not converge after {iterations} iterations (residual {residual:e} rad)")]
    ConvergenceFailure { iterations: u32, residual: f64 },

    /// The orbit has decayed at the requested time
    #[error("Satellite decayed {minutes:.3} minutes from epoch: {reason}")]
    DecayedOrbit { minutes: f64, reason: DecayReason },

    /// Configuration could not be read or decoded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for satfield operations
pub type Result<T> = std::result::Result<T, SatfieldError>;

/// Parse a two-line element set.
pub fn parse_tle(line1: &str, line2: &str) -> Result<TleRecord> {
    tlelib::parse(line1, line2)
}

/// Classical Keplerian elements at the TLE epoch.
pub fn to_keplerian(tle: &TleRecord) -> Result<KeplerianElements> {
    elementslib::tle_to_keplerian(tle)
}

/// Build an SGP4/SDP4 context with the default configuration.
pub fn build_context(tle: &TleRecord) -> Result<PropagatorContext> {
    sgp4lib::build_context(tle, &EngineConfig::default())
}

/// ECI (TEME) state of the satellite at `time`.
pub fn propagate(context: &PropagatorContext, time: JulianDate) -> Result<StateVector> {
    context.propagate(time)
}

/// Rotate an inertial state into the Earth-fixed frame at `time`.
pub fn eci_to_ecef(state: &StateVector, time: JulianDate) -> StateVector {
    framelib::eci_to_ecef(state, time)
}

/// Geodetic latitude, longitude and altitude of a state on the WGS84 ellipsoid.
///
/// Inertial states are first rotated into the Earth-fixed frame at their own
/// epoch.
pub fn to_geodetic(state: &StateVector) -> GeodeticPosition {
    let ecef = match state.frame {
        Frame::Ecef => *state,
        Frame::Eci => framelib::eci_to_ecef(state, state.epoch),
    };
    toposlib::WGS84.geodetic(&ecef.position, ecef.epoch)
}

/// Pass windows of an ephemeris over a ground station.
pub fn compute_visibility(
    station: &GroundStation,
    ephemeris: &[StateVector],
) -> Vec<VisibilityWindow> {
    passlib::compute_pass(station, ephemeris)
}
