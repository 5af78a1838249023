//! Physical constants and conventional epochs
//!
//! Distances are in kilometres, angles in radians and times in days unless a
//! name says otherwise.

/// J2000 epoch as a Julian Date
pub const T0: f64 = 2_451_545.0;

/// Julian Date of 1949 December 31 00:00 UT, the origin SGP4 counts days from
pub const JD_1950: f64 = 2_433_281.5;

/// Seconds per day
pub const DAY_S: f64 = 86_400.0;

/// Minutes per day
pub const MINUTES_PER_DAY: f64 = 1_440.0;

/// Days per Julian century
pub const DAYS_PER_CENTURY: f64 = 36_525.0;

/// Earth's gravitational parameter GM in km³/s² (two-body conversions)
pub const MU_EARTH: f64 = 398_600.441_8;

/// Earth's rotation rate in rad/s
pub const EARTH_ANGVEL: f64 = 7.292_115_0e-5;

/// WGS84 equatorial radius in km
pub const WGS84_RADIUS_KM: f64 = 6_378.137;

/// WGS84 inverse flattening
pub const WGS84_INVERSE_FLATTENING: f64 = 298.257_223_563;

/// WGS72 equatorial radius in km
pub const WGS72_RADIUS_KM: f64 = 6_378.135;

/// WGS72 inverse flattening
pub const WGS72_INVERSE_FLATTENING: f64 = 298.26;
