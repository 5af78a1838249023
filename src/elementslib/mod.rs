//! Classical orbital elements
//!
//! [`tle_to_keplerian`] is a direct algebraic conversion of TLE mean elements:
//! mean motion becomes a semi-major axis through Kepler's third law and the
//! mean anomaly is carried through unchanged. [`OsculatingElements`] goes the
//! other way, from a state vector to the instantaneous two-body orbit, and is
//! meant for diagnostics.
//!
//! Note that SGP4 mean elements are not osculating elements. The semi-major
//! axis from [`tle_to_keplerian`] differs from SGP4's internal (un-Kozai'd)
//! value by a few kilometres.
//!
//! # Example
//!
//! ```ignore
//! let tle = satfield::parse_tle(line1, line2)?;
//! let elements = satfield::elementslib::tle_to_keplerian(&tle)?;
//! println!("a = {:.1} km, T = {:.1} min", elements.semi_major_axis_km, elements.period_minutes());
//! ```

use std::f64::consts::TAU;
use std::fmt;

use chrono::{Datelike, Timelike};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{DAY_S, MU_EARTH};
use crate::framelib::{self, Frame, StateVector};
use crate::keplerlib::{self, KeplerSolver, TwoBodyOrbit};
use crate::time::JulianDate;
use crate::tlelib::TleRecord;
use crate::{Result, SatfieldError};

/// Two-body orbit at a reference epoch. Angles in radians, distances in km.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    /// Right ascension of the ascending node
    pub raan: f64,
    pub arg_perigee: f64,
    pub mean_anomaly: f64,
    pub true_anomaly: f64,
    pub epoch: JulianDate,
}

impl KeplerianElements {
    /// Mean motion in rad/s
    pub fn mean_motion(&self) -> f64 {
        (MU_EARTH / self.semi_major_axis_km.powi(3)).sqrt()
    }

    /// Mean motion in revolutions per day
    pub fn revs_per_day(&self) -> f64 {
        self.mean_motion() * DAY_S / TAU
    }

    pub fn period_minutes(&self) -> f64 {
        TAU / self.mean_motion() / 60.0
    }

    pub fn semi_latus_rectum_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 - self.eccentricity * self.eccentricity)
    }

    pub fn perigee_radius_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 - self.eccentricity)
    }

    pub fn apogee_radius_km(&self) -> f64 {
        self.semi_major_axis_km * (1.0 + self.eccentricity)
    }

    /// Reject orbits whose semi-major axis does not clear `radius_km +
    /// min_altitude_km`, or whose eccentricity is not elliptic.
    pub fn validate(&self, radius_km: f64, min_altitude_km: f64) -> Result<()> {
        if !(0.0..1.0).contains(&self.eccentricity) {
            return Err(SatfieldError::InvalidElements(format!(
                "eccentricity {} outside [0, 1)",
                self.eccentricity
            )));
        }
        if !(self.semi_major_axis_km > radius_km + min_altitude_km) {
            return Err(SatfieldError::InvalidElements(format!(
                "semi-major axis {:.3} km does not clear {:.3} km + {:.1} km minimum altitude",
                self.semi_major_axis_km, radius_km, min_altitude_km
            )));
        }
        Ok(())
    }

    /// The unperturbed orbit these elements describe
    pub fn two_body(&self) -> TwoBodyOrbit {
        TwoBodyOrbit::new(self.clone())
    }

    /// Elements of the osculating orbit through an inertial state.
    ///
    /// Earth-fixed states are rotated to ECI at their own epoch first.
    pub fn from_state(state: &StateVector) -> Self {
        let eci = match state.frame {
            Frame::Eci => *state,
            Frame::Ecef => framelib::ecef_to_eci(state, state.epoch),
        };
        OsculatingElements::new(eci.position, eci.velocity, MU_EARTH).to_keplerian(eci.epoch)
    }
}

impl fmt::Display for KeplerianElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KeplerianElements(a={:.3} km, e={:.7}, i={:.4}°, Ω={:.4}°, ω={:.4}°, M={:.4}°)",
            self.semi_major_axis_km,
            self.eccentricity,
            self.inclination.to_degrees(),
            self.raan.to_degrees(),
            self.arg_perigee.to_degrees(),
            self.mean_anomaly.to_degrees(),
        )
    }
}

/// Keplerian elements at the TLE epoch.
///
/// Fails with `InvalidElements` for a non-positive mean motion or an
/// eccentricity outside [0, 1), since neither has a two-body orbit.
pub fn tle_to_keplerian(tle: &TleRecord) -> Result<KeplerianElements> {
    if !(tle.mean_motion.is_finite() && tle.mean_motion > 0.0) {
        return Err(SatfieldError::InvalidElements(format!(
            "catalog #{} has mean motion {} rev/day",
            tle.catalog_number, tle.mean_motion
        )));
    }
    let n = tle.mean_motion * TAU / DAY_S;
    let semi_major_axis_km = (MU_EARTH / (n * n)).cbrt();
    let e = tle.eccentricity;
    let mean_anomaly = tle.mean_anomaly_deg.to_radians();

    let solution = KeplerSolver::default().solve(e, mean_anomaly)?;
    let true_anomaly = keplerlib::true_anomaly(e, solution.eccentric_anomaly);

    Ok(KeplerianElements {
        semi_major_axis_km,
        eccentricity: e,
        inclination: tle.inclination_deg.to_radians(),
        raan: tle.raan_deg.to_radians(),
        arg_perigee: tle.arg_perigee_deg.to_radians(),
        mean_anomaly,
        true_anomaly,
        epoch: tle.epoch,
    })
}

/// Rebuild the orbit fields of a TLE from Keplerian elements.
///
/// Identification, drag and bookkeeping fields come from `template`; the
/// epoch, angles, eccentricity and mean motion come from `elements`.
pub fn keplerian_to_tle(elements: &KeplerianElements, template: &TleRecord) -> Result<TleRecord> {
    if !(0.0..1.0).contains(&elements.eccentricity) || !(elements.semi_major_axis_km > 0.0) {
        return Err(SatfieldError::InvalidElements(format!(
            "a = {} km, e = {} is not an elliptic orbit",
            elements.semi_major_axis_km, elements.eccentricity
        )));
    }

    let dt = elements.epoch.to_datetime().ok_or_else(|| {
        SatfieldError::InvalidElements(format!("epoch {} cannot be expressed as a date", elements.epoch.value()))
    })?;
    let seconds_of_day = dt.num_seconds_from_midnight() as f64 + dt.nanosecond() as f64 / 1e9;
    let epoch_day = dt.ordinal() as f64 + seconds_of_day / DAY_S;

    let degrees = |angle: f64| angle.to_degrees().rem_euclid(360.0);

    Ok(TleRecord {
        epoch_year: dt.year(),
        epoch_day,
        epoch: elements.epoch,
        inclination_deg: elements.inclination.to_degrees(),
        raan_deg: degrees(elements.raan),
        eccentricity: elements.eccentricity,
        arg_perigee_deg: degrees(elements.arg_perigee),
        mean_anomaly_deg: degrees(elements.mean_anomaly),
        mean_motion: elements.revs_per_day(),
        ..template.clone()
    })
}

/// Osculating orbital elements computed from a state vector
///
/// Handles elliptic orbits, including the circular and equatorial limits
/// where the node or perigee is undefined (reported as zero).
#[derive(Debug, Clone)]
pub struct OsculatingElements {
    /// Specific angular momentum vector (km²/s)
    h_vec: Vector3<f64>,
    /// Eccentricity vector (dimensionless)
    e_vec: Vector3<f64>,
    /// Unit node vector, zero for equatorial orbits
    n_vec: Vector3<f64>,
    pos_km: Vector3<f64>,
    vel_km_s: Vector3<f64>,
    /// Gravitational parameter (km³/s²)
    mu: f64,
}

impl OsculatingElements {
    /// Compute osculating elements from position and velocity vectors
    ///
    /// # Arguments
    /// * `pos_km` - position in km
    /// * `vel_km_s` - velocity in km/s
    /// * `mu_km3_s2` - gravitational parameter GM in km³/s²
    pub fn new(pos_km: Vector3<f64>, vel_km_s: Vector3<f64>, mu_km3_s2: f64) -> Self {
        let h_vec = pos_km.cross(&vel_km_s);
        let e_vec = eccentricity_vector(&pos_km, &vel_km_s, mu_km3_s2);
        let n_vec = node_vector(&h_vec);

        OsculatingElements {
            h_vec,
            e_vec,
            n_vec,
            pos_km,
            vel_km_s,
            mu: mu_km3_s2,
        }
    }

    pub fn eccentricity(&self) -> f64 {
        self.e_vec.norm()
    }

    /// Inclination in radians [0, π]
    pub fn inclination(&self) -> f64 {
        angle_between(&self.h_vec, &Vector3::z())
    }

    /// Right ascension of the ascending node in radians [0, 2π)
    pub fn raan(&self) -> f64 {
        if self.n_vec.norm() < 1e-15 {
            0.0
        } else {
            self.h_vec.x.atan2(-self.h_vec.y).rem_euclid(TAU)
        }
    }

    /// Argument of perigee in radians [0, 2π)
    pub fn arg_perigee(&self) -> f64 {
        if self.eccentricity() < 1e-15 {
            return 0.0;
        }
        if self.n_vec.norm() < 1e-15 {
            // Equatorial: measure from the x axis in the direction of motion
            let angle = self.e_vec.y.atan2(self.e_vec.x).rem_euclid(TAU);
            return if self.h_vec.z >= 0.0 {
                angle
            } else {
                (-angle).rem_euclid(TAU)
            };
        }
        let angle = angle_between(&self.n_vec, &self.e_vec);
        if self.e_vec.z >= 0.0 {
            angle
        } else {
            (-angle).rem_euclid(TAU)
        }
    }

    /// True anomaly in radians [0, 2π)
    ///
    /// For circular orbits this is the argument of latitude (or the true
    /// longitude when also equatorial), since perigee is undefined.
    pub fn true_anomaly(&self) -> f64 {
        if self.eccentricity() > 1e-15 {
            let angle = angle_between(&self.e_vec, &self.pos_km);
            return if self.pos_km.dot(&self.vel_km_s) >= 0.0 {
                angle
            } else {
                (-angle).rem_euclid(TAU)
            };
        }
        if self.n_vec.norm() < 1e-15 {
            let angle = self.pos_km.y.atan2(self.pos_km.x).rem_euclid(TAU);
            return if self.h_vec.z >= 0.0 {
                angle
            } else {
                (-angle).rem_euclid(TAU)
            };
        }
        let angle = angle_between(&self.n_vec, &self.pos_km);
        if self.pos_km.z >= 0.0 {
            angle
        } else {
            (-angle).rem_euclid(TAU)
        }
    }

    /// Mean anomaly in radians [0, 2π)
    pub fn mean_anomaly(&self) -> f64 {
        keplerlib::mean_anomaly_from_true(self.eccentricity(), self.true_anomaly()).rem_euclid(TAU)
    }

    /// Semi-latus rectum p in km
    pub fn semi_latus_rectum_km(&self) -> f64 {
        self.h_vec.norm_squared() / self.mu
    }

    /// Semi-major axis from the vis-viva energy (negative when unbound)
    pub fn semi_major_axis_km(&self) -> f64 {
        let energy = self.vel_km_s.norm_squared() / 2.0 - self.mu / self.pos_km.norm();
        -self.mu / (2.0 * energy)
    }

    pub fn perigee_radius_km(&self) -> f64 {
        self.semi_latus_rectum_km() / (1.0 + self.eccentricity())
    }

    pub fn apogee_radius_km(&self) -> f64 {
        let e = self.eccentricity();
        if e < 1.0 {
            self.semi_latus_rectum_km() / (1.0 - e)
        } else {
            f64::INFINITY
        }
    }

    /// Orbital period in minutes (infinite for unbound orbits)
    pub fn period_minutes(&self) -> f64 {
        let a = self.semi_major_axis_km();
        if a > 0.0 {
            TAU * (a.powi(3) / self.mu).sqrt() / 60.0
        } else {
            f64::INFINITY
        }
    }

    /// Collect into a [`KeplerianElements`] valid at `epoch`.
    pub fn to_keplerian(&self, epoch: JulianDate) -> KeplerianElements {
        KeplerianElements {
            semi_major_axis_km: self.semi_major_axis_km(),
            eccentricity: self.eccentricity(),
            inclination: self.inclination(),
            raan: self.raan(),
            arg_perigee: self.arg_perigee(),
            mean_anomaly: self.mean_anomaly(),
            true_anomaly: self.true_anomaly(),
            epoch,
        }
    }
}

impl fmt::Display for OsculatingElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OsculatingElements(a={:.3} km, e={:.6}, i={:.2}°)",
            self.semi_major_axis_km(),
            self.eccentricity(),
            self.inclination().to_degrees(),
        )
    }
}

fn eccentricity_vector(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Vector3<f64> {
    let r = pos.norm();
    let v_sq = vel.norm_squared();
    ((v_sq - mu / r) * pos - pos.dot(vel) * vel) / mu
}

/// Unit vector along k̂ × h, or zero for an equatorial orbit
fn node_vector(h: &Vector3<f64>) -> Vector3<f64> {
    let n = Vector3::new(-h.y, h.x, 0.0);
    let len = n.norm();
    if len > 0.0 {
        n / len
    } else {
        n
    }
}

/// Angle between two vectors in radians [0, π]
fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let cos_angle = a.dot(b) / (a.norm() * b.norm());
    cos_angle.clamp(-1.0, 1.0).acos()
}
