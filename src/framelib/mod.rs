//! Inertial and Earth-fixed state vectors
//!
//! SGP4 produces states in TEME, the True Equator Mean Equinox frame, which
//! this crate calls ECI. The Earth-fixed frame is reached by a single rotation
//! about the polar axis through GMST; polar motion and the equation of the
//! equinoxes are ignored.
//!
//! Velocities are not simply rotated: the Earth-fixed velocity also loses the
//! ω × r term of the rotating frame.

use std::fmt;

use log::warn;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::constants::EARTH_ANGVEL;
use crate::time::JulianDate;

/// Reference frame of a [`StateVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// Earth-centred inertial (TEME)
    Eci,
    /// Earth-centred, Earth-fixed
    Ecef,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Eci => write!(f, "ECI"),
            Frame::Ecef => write!(f, "ECEF"),
        }
    }
}

/// Position (km) and velocity (km/s) in a named frame at an instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    pub frame: Frame,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    /// Instant at which the state is valid
    pub epoch: JulianDate,
}

impl StateVector {
    pub fn new(
        frame: Frame,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        epoch: JulianDate,
    ) -> Self {
        StateVector {
            frame,
            position,
            velocity,
            epoch,
        }
    }

    /// Geocentric distance in km
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Speed in km/s
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} r=[{:.3}, {:.3}, {:.3}] km v=[{:.6}, {:.6}, {:.6}] km/s at {}",
            self.frame,
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            self.epoch
        )
    }
}

/// Rotation matrix about the Z axis
pub(crate) fn rot_z(angle: f64) -> Matrix3<f64> {
    let (s, c) = angle.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Matrix taking ECI vectors to ECEF at `time`
pub fn eci_to_ecef_matrix(time: JulianDate) -> Matrix3<f64> {
    rot_z(time.gmst())
}

fn earth_rotation_vector() -> Vector3<f64> {
    Vector3::new(0.0, 0.0, EARTH_ANGVEL)
}

/// Rotate an inertial state into the Earth-fixed frame at `time`.
///
/// A state that is already Earth-fixed is returned unchanged.
pub fn eci_to_ecef(state: &StateVector, time: JulianDate) -> StateVector {
    if state.frame == Frame::Ecef {
        warn!("eci_to_ecef called on an ECEF state at {}; returning it unchanged", state.epoch);
        return *state;
    }

    let r = eci_to_ecef_matrix(time);
    let position = r * state.position;
    let velocity = r * state.velocity - earth_rotation_vector().cross(&position);

    StateVector::new(Frame::Ecef, position, velocity, time)
}

/// Rotate an Earth-fixed state back into the inertial frame at `time`.
///
/// A state that is already inertial is returned unchanged.
pub fn ecef_to_eci(state: &StateVector, time: JulianDate) -> StateVector {
    if state.frame == Frame::Eci {
        warn!("ecef_to_eci called on an ECI state at {}; returning it unchanged", state.epoch);
        return *state;
    }

    let rt = eci_to_ecef_matrix(time).transpose();
    let inertial_velocity = state.velocity + earth_rotation_vector().cross(&state.position);

    StateVector::new(Frame::Eci, rt * state.position, rt * inertial_velocity, time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn sample_state(epoch: JulianDate) -> StateVector {
        StateVector::new(
            Frame::Eci,
            Vector3::new(-4_400.594, 1_932.870, 4_760.712),
            Vector3::new(-5.046_7, -5.545_6, -2.402_8),
            epoch,
        )
    }

    #[test]
    fn test_rot_z_identity() {
        let result = rot_z(0.0) * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(result, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_rot_z_90_degrees() {
        let result = rot_z(FRAC_PI_2) * Vector3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(result.x, 0.0, epsilon = 1e-15);
        assert_relative_eq!(result.y, -1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_rotation_is_orthonormal() {
        let r = eci_to_ecef_matrix(JulianDate(2_460_904.68));
        assert_relative_eq!(r.determinant(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(r * r.transpose(), Matrix3::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_position_uses_gmst() {
        // At J2000 GMST is 280.46°, so the inertial x axis sits at longitude -280.46° = 79.54°
        let state = StateVector::new(
            Frame::Eci,
            Vector3::new(7_000.0, 0.0, 0.0),
            Vector3::zeros(),
            JulianDate::J2000,
        );
        let ecef = eci_to_ecef(&state, JulianDate::J2000);
        let lon = ecef.position.y.atan2(ecef.position.x).to_degrees();
        assert_relative_eq!(lon, 360.0 - 280.460_618_37, epsilon = 1e-6);
        assert_relative_eq!(ecef.position.norm(), 7_000.0, epsilon = 1e-9);
        assert_eq!(ecef.frame, Frame::Ecef);
    }

    #[test]
    fn test_velocity_subtracts_earth_rotation() {
        // A point co-rotating with the Earth has zero Earth-fixed velocity
        let epoch = JulianDate(2_460_000.3);
        let r = 42_164.0;
        let state = StateVector::new(
            Frame::Eci,
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, EARTH_ANGVEL * r, 0.0),
            epoch,
        );
        let ecef = eci_to_ecef(&state, epoch);
        assert_relative_eq!(ecef.velocity.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_trip() {
        for &jd in &[2_451_545.0, 2_444_000.123, 2_460_904.680_349_46, 2_470_000.9] {
            let epoch = JulianDate(jd);
            let eci = sample_state(epoch);
            let back = ecef_to_eci(&eci_to_ecef(&eci, epoch), epoch);
            assert_eq!(back.frame, Frame::Eci);
            assert_relative_eq!(back.position, eci.position, epsilon = 1e-9);
            assert_relative_eq!(back.velocity, eci.velocity, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wrong_frame_is_passed_through() {
        let epoch = JulianDate::J2000;
        let ecef = eci_to_ecef(&sample_state(epoch), epoch);
        let again = eci_to_ecef(&ecef, epoch.add_minutes(10.0));
        assert_eq!(again, ecef);

        let eci = sample_state(epoch);
        assert_eq!(ecef_to_eci(&eci, epoch), eci);
    }

    #[test]
    fn test_radius_and_speed_preserved_by_rotation() {
        let epoch = JulianDate(2_455_000.25);
        let eci = sample_state(epoch);
        let ecef = eci_to_ecef(&eci, epoch);
        assert_relative_eq!(ecef.radius(), eci.radius(), epsilon = 1e-9);
        assert!(ecef.speed() < eci.speed(), "prograde orbit should look slower from the ground");
    }
}
