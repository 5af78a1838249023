//! Geodetic coordinates and ground stations
//!
//! The transformation chain is:
//! ```text
//! ECI state → rotate by GMST → ECEF xyz → iterate on ellipsoid → lat/lon/alt
//! ```
//!
//! # Example
//!
//! ```ignore
//! use satfield::toposlib::{GroundStation, WGS84};
//!
//! let boston = GroundStation::from_degrees(42.3583, -71.0603, 0.043, 10.0);
//! let angles = boston.look_angles(&state);
//! println!("el {:.1}° az {:.1}°", angles.elevation.to_degrees(), angles.azimuth.to_degrees());
//! ```

use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    WGS72_INVERSE_FLATTENING, WGS72_RADIUS_KM, WGS84_INVERSE_FLATTENING, WGS84_RADIUS_KM,
};
use crate::framelib::{self, Frame, StateVector};
use crate::time::JulianDate;

/// Latitude iteration stops once a step is smaller than this (≈ 0.06 mm)
const LATITUDE_TOLERANCE: f64 = 1e-14;
const MAX_LATITUDE_ITERATIONS: usize = 20;

/// An Earth ellipsoid model used for geodetic ↔ geocentric conversion.
#[derive(Debug, Clone)]
pub struct Geoid {
    /// Name of the geoid model
    pub name: &'static str,
    /// Equatorial radius in km
    pub radius_km: f64,
    /// Inverse flattening (a / (a - b))
    pub inverse_flattening: f64,
    /// (1 - f)^2, precomputed
    one_minus_flattening_squared: f64,
}

impl Geoid {
    pub const fn new(name: &'static str, radius_km: f64, inverse_flattening: f64) -> Self {
        let f = 1.0 / inverse_flattening;
        let omf = 1.0 - f;
        Geoid {
            name,
            radius_km,
            inverse_flattening,
            one_minus_flattening_squared: omf * omf,
        }
    }

    /// First eccentricity squared, 2f − f²
    pub fn eccentricity_squared(&self) -> f64 {
        1.0 - self.one_minus_flattening_squared
    }

    /// Polar radius in km
    pub fn polar_radius_km(&self) -> f64 {
        self.radius_km * self.one_minus_flattening_squared.sqrt()
    }

    /// Earth-fixed position of a geodetic point.
    ///
    /// # Arguments
    /// * `latitude` - geodetic latitude in radians (positive north)
    /// * `longitude` - longitude in radians (positive east)
    /// * `altitude_km` - height above the ellipsoid in km
    pub fn position_km(&self, latitude: f64, longitude: f64, altitude_km: f64) -> Vector3<f64> {
        let (sinphi, cosphi) = latitude.sin_cos();

        // Radius of curvature in the prime vertical, in units of the equatorial radius
        let c =
            1.0 / (cosphi * cosphi + sinphi * sinphi * self.one_minus_flattening_squared).sqrt();
        let s = self.one_minus_flattening_squared * c;

        let xy = (self.radius_km * c + altitude_km) * cosphi;
        Vector3::new(
            xy * longitude.cos(),
            xy * longitude.sin(),
            (self.radius_km * s + altitude_km) * sinphi,
        )
    }

    /// Geodetic latitude, longitude and altitude of an Earth-fixed position.
    ///
    /// Latitude is found by fixed-point iteration on
    /// `tan φ = (z + N e² sin φ) / p`; longitude is normalized to (−π, π].
    pub fn geodetic(&self, position: &Vector3<f64>, epoch: JulianDate) -> GeodeticPosition {
        let a = self.radius_km;
        let e2 = self.eccentricity_squared();
        let p = position.x.hypot(position.y);
        let z = position.z;

        let mut longitude = position.y.atan2(position.x);
        if longitude <= -PI {
            longitude = PI;
        }

        let mut latitude = z.atan2(p * (1.0 - e2));
        for _ in 0..MAX_LATITUDE_ITERATIONS {
            let sin_lat = latitude.sin();
            let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
            let next = (z + n * e2 * sin_lat).atan2(p);
            let step = (next - latitude).abs();
            latitude = next;
            if step < LATITUDE_TOLERANCE {
                break;
            }
        }

        let (sin_lat, cos_lat) = latitude.sin_cos();
        let altitude_km =
            p * cos_lat + z * sin_lat - a * (1.0 - e2 * sin_lat * sin_lat).sqrt();

        GeodeticPosition {
            latitude,
            longitude,
            altitude_km,
            epoch,
        }
    }
}

/// WGS84 ellipsoid (GPS standard)
pub const WGS84: Geoid = Geoid::new("WGS84", WGS84_RADIUS_KM, WGS84_INVERSE_FLATTENING);

/// WGS72 ellipsoid, the one SGP4 element sets are fitted against
pub const WGS72: Geoid = Geoid::new("WGS72", WGS72_RADIUS_KM, WGS72_INVERSE_FLATTENING);

/// Geodetic position of an Earth-fixed vector on the WGS84 ellipsoid.
pub fn ecef_to_geodetic(position: &Vector3<f64>, epoch: JulianDate) -> GeodeticPosition {
    WGS84.geodetic(position, epoch)
}

/// A point relative to the reference ellipsoid at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeodeticPosition {
    /// Geodetic latitude in radians
    pub latitude: f64,
    /// Longitude in radians (−π, π]
    pub longitude: f64,
    /// Height above the ellipsoid in km
    pub altitude_km: f64,
    pub epoch: JulianDate,
}

impl GeodeticPosition {
    pub fn latitude_deg(&self) -> f64 {
        self.latitude.to_degrees()
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude.to_degrees()
    }
}

impl std::fmt::Display for GeodeticPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lat_d = self.latitude_deg();
        let lon_d = self.longitude_deg();
        let ns = if lat_d >= 0.0 { "N" } else { "S" };
        let ew = if lon_d >= 0.0 { "E" } else { "W" };
        write!(
            f,
            "{:.4}° {}, {:.4}° {}, {:.3} km",
            lat_d.abs(),
            ns,
            lon_d.abs(),
            ew,
            self.altitude_km
        )
    }
}

/// Azimuth, elevation and range of a satellite from a station.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LookAngles {
    /// Radians clockwise from north [0, 2π); 0.0 when the satellite is at the zenith
    pub azimuth: f64,
    /// Radians above the horizon [−π/2, π/2]
    pub elevation: f64,
    pub range_km: f64,
    /// Positive when the satellite is receding
    pub range_rate_km_s: f64,
}

/// An observer fixed to the Earth's surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundStation {
    /// Geodetic latitude in radians
    pub latitude: f64,
    /// Longitude in radians
    pub longitude: f64,
    /// Height above the WGS84 ellipsoid in km
    pub altitude_km: f64,
    /// Elevation a satellite must exceed to count as visible, in radians
    pub min_elevation: f64,
}

impl GroundStation {
    pub fn new(latitude: f64, longitude: f64, altitude_km: f64, min_elevation: f64) -> Self {
        GroundStation {
            latitude,
            longitude,
            altitude_km,
            min_elevation,
        }
    }

    /// Build a station from angles in degrees.
    pub fn from_degrees(
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_km: f64,
        min_elevation_deg: f64,
    ) -> Self {
        Self::new(
            latitude_deg.to_radians(),
            longitude_deg.to_radians(),
            altitude_km,
            min_elevation_deg.to_radians(),
        )
    }

    /// Earth-fixed position in km
    pub fn ecef_position(&self) -> Vector3<f64> {
        WGS84.position_km(self.latitude, self.longitude, self.altitude_km)
    }

    /// Look angles to a satellite state in either frame.
    pub fn look_angles(&self, satellite: &StateVector) -> LookAngles {
        StationFrame::new(self).look_at(satellite)
    }
}

/// A station's Earth-fixed position and horizon basis, computed once and
/// reused across many samples.
#[derive(Debug, Clone)]
pub(crate) struct StationFrame {
    ecef: Vector3<f64>,
    slat: f64,
    clat: f64,
    slon: f64,
    clon: f64,
}

impl StationFrame {
    pub(crate) fn new(station: &GroundStation) -> Self {
        let (slat, clat) = station.latitude.sin_cos();
        let (slon, clon) = station.longitude.sin_cos();
        StationFrame {
            ecef: station.ecef_position(),
            slat,
            clat,
            slon,
            clon,
        }
    }

    /// Rotate an Earth-fixed vector into the local (south, east, up) frame.
    fn to_sez(&self, v: &Vector3<f64>) -> Vector3<f64> {
        let south = self.slat * self.clon * v.x + self.slat * self.slon * v.y - self.clat * v.z;
        let east = -self.slon * v.x + self.clon * v.y;
        let up = self.clat * self.clon * v.x + self.clat * self.slon * v.y + self.slat * v.z;
        Vector3::new(south, east, up)
    }

    pub(crate) fn look_at(&self, satellite: &StateVector) -> LookAngles {
        let ecef = match satellite.frame {
            Frame::Ecef => *satellite,
            Frame::Eci => framelib::eci_to_ecef(satellite, satellite.epoch),
        };

        let relative = ecef.position - self.ecef;
        let range_km = relative.norm();
        let sez = self.to_sez(&relative);
        let (south, east, up) = (sez.x, sez.y, sez.z);

        let r_horiz = south.hypot(east);
        let elevation = up.atan2(r_horiz);

        // Azimuth: measured clockwise from north (north = −south)
        let azimuth = if r_horiz <= 1e-9 * range_km {
            0.0
        } else {
            east.atan2(-south).rem_euclid(TAU)
        };

        let range_rate_km_s = if range_km > 0.0 {
            relative.dot(&ecef.velocity) / range_km
        } else {
            0.0
        };

        LookAngles {
            azimuth,
            elevation,
            range_km,
            range_rate_km_s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn ecef_state(position: Vector3<f64>, velocity: Vector3<f64>) -> StateVector {
        StateVector::new(Frame::Ecef, position, velocity, JulianDate::J2000)
    }

    #[test]
    fn test_wgs84_constants() {
        assert_relative_eq!(WGS84.radius_km, 6_378.137);
        assert_relative_eq!(WGS84.inverse_flattening, 298.257_223_563);
        assert_relative_eq!(WGS84.polar_radius_km(), 6_356.752_314, epsilon = 1e-6);
        assert_relative_eq!(WGS84.eccentricity_squared(), 0.006_694_379_990_14, epsilon = 1e-14);
    }

    #[test]
    fn test_position_equator_prime_meridian() {
        let pos = WGS84.position_km(0.0, 0.0, 0.0);
        assert_relative_eq!(pos, Vector3::new(WGS84.radius_km, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_position_north_pole() {
        let pos = WGS84.position_km(FRAC_PI_2, 0.0, 0.0);
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pos.z, WGS84.polar_radius_km(), epsilon = 1e-9);
    }

    #[test]
    fn test_position_with_altitude() {
        let ground = WGS84.position_km(0.0, 0.0, 0.0);
        let high = WGS84.position_km(0.0, 0.0, 1.0);
        assert_relative_eq!(high.x - ground.x, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_geodetic_round_trip_sub_millimetre() {
        for &lat in &[-89.9, -60.0, -33.3, 0.0, 12.5, 45.0, 71.0, 89.99] {
            for &lon in &[-179.5, -90.0, 0.0, 37.2, 135.0, 180.0] {
                for &alt in &[-0.4, 0.0, 0.5, 420.0, 35_786.0] {
                    let (lat_r, lon_r) = (f64::to_radians(lat), f64::to_radians(lon));
                    let pos = WGS84.position_km(lat_r, lon_r, alt);
                    let geo = WGS84.geodetic(&pos, JulianDate::J2000);
                    assert_relative_eq!(geo.latitude, lat_r, epsilon = 1e-11);
                    assert_relative_eq!(geo.altitude_km, alt, epsilon = 1e-6);
                    let dlon = (geo.longitude - lon_r).rem_euclid(TAU);
                    assert!(
                        dlon < 1e-11 || TAU - dlon < 1e-11,
                        "lon {} came back as {}",
                        lon,
                        geo.longitude_deg()
                    );
                }
            }
        }
    }

    #[test]
    fn test_geodetic_poles() {
        let north = WGS84.geodetic(&Vector3::new(0.0, 0.0, 6_400.0), JulianDate::J2000);
        assert_relative_eq!(north.latitude, FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(north.altitude_km, 6_400.0 - WGS84.polar_radius_km(), epsilon = 1e-9);

        let south = WGS84.geodetic(&Vector3::new(0.0, 0.0, -6_400.0), JulianDate::J2000);
        assert_relative_eq!(south.latitude, -FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_longitude_range() {
        let west = WGS84.geodetic(&Vector3::new(-7_000.0, -0.0, 0.0), JulianDate::J2000);
        assert_relative_eq!(west.longitude, PI);

        let slightly_west = WGS84.geodetic(&Vector3::new(-7_000.0, -1.0, 0.0), JulianDate::J2000);
        assert!(slightly_west.longitude < 0.0 && slightly_west.longitude > -PI);
    }

    #[test]
    fn test_ecef_to_geodetic_uses_wgs84() {
        let pos = WGS84.position_km(0.5, 1.0, 10.0);
        let geo = ecef_to_geodetic(&pos, JulianDate(2_460_000.0));
        assert_relative_eq!(geo.altitude_km, 10.0, epsilon = 1e-9);
        assert_eq!(geo.epoch, JulianDate(2_460_000.0));
    }

    #[test]
    fn test_display() {
        let geo = WGS84.geodetic(
            &WGS84.position_km(42.3583_f64.to_radians(), (-71.0603_f64).to_radians(), 0.043),
            JulianDate::J2000,
        );
        let s = format!("{}", geo);
        assert!(s.contains("42.3583° N"), "got {}", s);
        assert!(s.contains("71.0603° W"), "got {}", s);
    }

    #[test]
    fn test_zenith_look_angles() {
        let station = GroundStation::from_degrees(30.0, -100.0, 0.2, 10.0);
        let overhead = WGS84.position_km(station.latitude, station.longitude, 500.0);
        let angles = station.look_angles(&ecef_state(overhead, Vector3::zeros()));

        assert_relative_eq!(angles.elevation, FRAC_PI_2, epsilon = 1e-9);
        assert_relative_eq!(angles.range_km, 499.8, epsilon = 1e-6);
        assert_eq!(angles.azimuth, 0.0, "zenith azimuth placeholder");
    }

    #[test]
    fn test_north_and_east_at_equator() {
        let station = GroundStation::from_degrees(0.0, 0.0, 0.0, 0.0);
        let r = WGS84.radius_km;

        let north = station.look_angles(&ecef_state(Vector3::new(r, 0.0, 1_000.0), Vector3::zeros()));
        assert_relative_eq!(north.elevation, 0.0, epsilon = 1e-12);
        assert_relative_eq!(north.azimuth, 0.0, epsilon = 1e-12);

        let east = station.look_angles(&ecef_state(Vector3::new(r, 1_000.0, 0.0), Vector3::zeros()));
        assert_relative_eq!(east.azimuth, FRAC_PI_2, epsilon = 1e-12);

        let west = station.look_angles(&ecef_state(Vector3::new(r, -1_000.0, 0.0), Vector3::zeros()));
        assert_relative_eq!(west.azimuth, 3.0 * FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_below_horizon() {
        let station = GroundStation::from_degrees(0.0, 0.0, 0.0, 0.0);
        let antipode = Vector3::new(-7_000.0, 0.0, 0.0);
        let angles = station.look_angles(&ecef_state(antipode, Vector3::zeros()));
        assert!(angles.elevation < -1.5);
    }

    #[test]
    fn test_range_rate_sign() {
        let station = GroundStation::from_degrees(0.0, 0.0, 0.0, 0.0);
        let pos = Vector3::new(WGS84.radius_km + 500.0, 0.0, 0.0);

        let receding = station.look_angles(&ecef_state(pos, Vector3::new(2.0, 0.0, 0.0)));
        assert_relative_eq!(receding.range_rate_km_s, 2.0, epsilon = 1e-12);

        let approaching = station.look_angles(&ecef_state(pos, Vector3::new(-2.0, 0.0, 0.0)));
        assert_relative_eq!(approaching.range_rate_km_s, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_eci_input_is_rotated_first() {
        let station = GroundStation::from_degrees(10.0, 20.0, 0.0, 0.0);
        let overhead = WGS84.position_km(station.latitude, station.longitude, 800.0);
        let ecef = ecef_state(overhead, Vector3::zeros());
        let eci = framelib::ecef_to_eci(&ecef, ecef.epoch);

        let angles = station.look_angles(&eci);
        assert_relative_eq!(angles.elevation, FRAC_PI_2, epsilon = 1e-9);
    }
}
