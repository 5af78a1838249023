//! Kepler's equation and two-body orbits
//!
//! [`KeplerSolver`] carries an explicit convergence contract (residual
//! tolerance plus iteration cap) so a non-converging solve surfaces as
//! `ConvergenceFailure` instead of a silently approximate anomaly.
//! [`TwoBodyOrbit`] is the idealized unperturbed orbit used for quick
//! previews; real tracking goes through `sgp4lib`.
//!
//! # Example
//!
//! ```ignore
//! use satfield::keplerlib::KeplerSolver;
//!
//! let solution = KeplerSolver::default().solve(0.5, 1.0)?;
//! assert!(solution.residual < 1e-12);
//! ```

use std::f64::consts::{PI, TAU};

use log::trace;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::MU_EARTH;
use crate::elementslib::KeplerianElements;
use crate::framelib::{Frame, StateVector};
use crate::time::JulianDate;
use crate::{Result, SatfieldError};

/// Newton-Raphson solver for M = E − e·sin(E).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeplerSolver {
    /// Converged when |M − (E − e·sin E)| falls below this (radians)
    pub tolerance: f64,
    /// Newton steps allowed before giving up
    pub max_iterations: u32,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        KeplerSolver {
            tolerance: 1e-12,
            max_iterations: 50,
        }
    }
}

/// A converged solution of Kepler's equation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly, on the same revolution as the input mean anomaly
    pub eccentric_anomaly: f64,
    /// Newton steps taken (0 when the starting guess already satisfied the tolerance)
    pub iterations: u32,
    /// Final |M − (E − e·sin E)|
    pub residual: f64,
}

impl KeplerSolver {
    pub fn new(tolerance: f64, max_iterations: u32) -> Self {
        KeplerSolver {
            tolerance,
            max_iterations,
        }
    }

    /// Solve for the eccentric anomaly of an elliptic orbit.
    ///
    /// Circular orbits return E = M exactly with zero iterations. Fails with
    /// `InvalidElements` for e outside [0, 1) or a non-finite anomaly, and
    /// with `ConvergenceFailure` if the iteration cap is reached first.
    pub fn solve(&self, e: f64, mean_anomaly: f64) -> Result<KeplerSolution> {
        if !(0.0..1.0).contains(&e) {
            return Err(SatfieldError::InvalidElements(format!(
                "eccentricity {} outside [0, 1) for Kepler's equation",
                e
            )));
        }
        if !mean_anomaly.is_finite() {
            return Err(SatfieldError::InvalidElements(format!(
                "mean anomaly {} is not finite",
                mean_anomaly
            )));
        }
        if e == 0.0 {
            return Ok(KeplerSolution {
                eccentric_anomaly: mean_anomaly,
                iterations: 0,
                residual: 0.0,
            });
        }

        // Solve on [0, π] and restore sign and revolution afterwards
        let reduced = normpi(mean_anomaly);
        let revolution = mean_anomaly - reduced;
        let sign_m = if reduced < 0.0 { -1.0 } else { 1.0 };
        let m = reduced * sign_m;

        let mut ea = if e > 0.8 { PI } else { m };
        let mut residual = ea - e * ea.sin() - m;
        let mut iterations = 0;

        while residual.abs() >= self.tolerance {
            if iterations >= self.max_iterations {
                return Err(SatfieldError::ConvergenceFailure {
                    iterations,
                    residual: residual.abs(),
                });
            }
            ea -= residual / (1.0 - e * ea.cos());
            residual = ea - e * ea.sin() - m;
            iterations += 1;
        }

        trace!(
            "Kepler solve e={} M={} converged in {} iterations",
            e,
            mean_anomaly,
            iterations
        );

        Ok(KeplerSolution {
            eccentric_anomaly: ea * sign_m + revolution,
            iterations,
            residual: residual.abs(),
        })
    }
}

/// Normalize angle to [-π, π]
pub(crate) fn normpi(m: f64) -> f64 {
    let mut x = m % TAU;
    if x > PI {
        x -= TAU;
    }
    if x < -PI {
        x += TAU;
    }
    x
}

/// True anomaly from eccentric anomaly for closed (elliptic) orbits
pub fn true_anomaly(e: f64, ea: f64) -> f64 {
    let (sin_half, cos_half) = (ea / 2.0).sin_cos();
    2.0 * ((1.0 + e).sqrt() * sin_half).atan2((1.0 - e).sqrt() * cos_half)
}

/// Mean anomaly from true anomaly for closed (elliptic) orbits
pub fn mean_anomaly_from_true(e: f64, nu: f64) -> f64 {
    let (sin_half, cos_half) = (nu / 2.0).sin_cos();
    let ea = 2.0 * ((1.0 - e).sqrt() * sin_half).atan2((1.0 + e).sqrt() * cos_half);
    ea - e * ea.sin()
}

/// Position and velocity from classical elements.
///
/// The perifocal state is rotated through Rz(Ω)·Rx(i)·Rz(ω) into the frame
/// the elements are referred to.
///
/// # Arguments
/// * `p` - semi-latus rectum (km)
/// * `e` - eccentricity
/// * `i` - inclination (radians)
/// * `om` - right ascension of the ascending node Ω (radians)
/// * `w` - argument of perigee ω (radians)
/// * `v` - true anomaly ν (radians)
/// * `mu` - gravitational parameter (km³/s²)
pub fn perifocal_to_eci(
    p: f64,
    e: f64,
    i: f64,
    om: f64,
    w: f64,
    v: f64,
    mu: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let r = p / (1.0 + e * v.cos());
    let h = (p * mu).sqrt();
    let u = v + w;

    let (sin_om, cos_om) = om.sin_cos();
    let (sin_u, cos_u) = u.sin_cos();
    let (sin_i, cos_i) = i.sin_cos();

    let x = r * (cos_om * cos_u - sin_om * sin_u * cos_i);
    let y = r * (sin_om * cos_u + cos_om * sin_u * cos_i);
    let z = r * (sin_i * sin_u);

    let he_rp = h * e / (r * p) * v.sin();
    let h_r = h / r;

    let x_dot = x * he_rp - h_r * (cos_om * sin_u + sin_om * cos_u * cos_i);
    let y_dot = y * he_rp - h_r * (sin_om * sin_u - cos_om * cos_u * cos_i);
    let z_dot = z * he_rp + h_r * sin_i * cos_u;

    (Vector3::new(x, y, z), Vector3::new(x_dot, y_dot, z_dot))
}

/// An unperturbed Earth orbit.
#[derive(Debug, Clone)]
pub struct TwoBodyOrbit {
    pub elements: KeplerianElements,
    /// Gravitational parameter in km³/s²
    pub mu: f64,
    pub solver: KeplerSolver,
}

impl TwoBodyOrbit {
    pub fn new(elements: KeplerianElements) -> Self {
        TwoBodyOrbit {
            elements,
            mu: MU_EARTH,
            solver: KeplerSolver::default(),
        }
    }

    pub fn with_solver(mut self, solver: KeplerSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Mean motion in rad/s
    pub fn mean_motion(&self) -> f64 {
        (self.mu / self.elements.semi_major_axis_km.powi(3)).sqrt()
    }

    /// Orbital period in minutes
    pub fn period_minutes(&self) -> f64 {
        TAU / self.mean_motion() / 60.0
    }

    /// Inertial state at `time`, advancing the mean anomaly linearly from the
    /// element epoch.
    pub fn state_at(&self, time: JulianDate) -> Result<StateVector> {
        let el = &self.elements;
        let dt_seconds = time.minutes_since(el.epoch) * 60.0;
        let m = el.mean_anomaly + self.mean_motion() * dt_seconds;

        let solution = self.solver.solve(el.eccentricity, m)?;
        let nu = true_anomaly(el.eccentricity, solution.eccentric_anomaly);
        let p = el.semi_major_axis_km * (1.0 - el.eccentricity * el.eccentricity);

        let (position, velocity) = perifocal_to_eci(
            p,
            el.eccentricity,
            el.inclination,
            el.raan,
            el.arg_perigee,
            nu,
            self.mu,
        );
        Ok(StateVector::new(Frame::Eci, position, velocity, time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn residual(e: f64, ea: f64, m: f64) -> f64 {
        (ea - e * ea.sin() - m).abs()
    }

    fn circular_leo() -> KeplerianElements {
        KeplerianElements {
            semi_major_axis_km: 7000.0,
            eccentricity: 0.0,
            inclination: 0.0,
            raan: 0.0,
            arg_perigee: 0.0,
            mean_anomaly: 0.0,
            true_anomaly: 0.0,
            epoch: JulianDate::J2000,
        }
    }

    #[test]
    fn test_circular_orbit_is_exact() {
        let solver = KeplerSolver::default();
        for &m in &[0.0, 1.0, -2.5, 7.0, 100.0] {
            let s = solver.solve(0.0, m).unwrap();
            assert_eq!(s.eccentric_anomaly, m, "E must equal M for e = 0");
            assert_eq!(s.iterations, 0);
        }
    }

    #[test]
    fn test_moderate_eccentricity() {
        let s = KeplerSolver::default().solve(0.5, 1.0).unwrap();
        assert!(s.residual < 1e-12, "Kepler residual = {}", s.residual);
        assert_relative_eq!(s.eccentric_anomaly, 1.498_701_133_517_848, epsilon = 1e-10);
    }

    #[test]
    fn test_eccentricity_sweep_converges() {
        let solver = KeplerSolver::default();
        let eccentricities = [0.0001, 0.001, 0.01, 0.1, 0.3, 0.5, 0.7, 0.8, 0.9, 0.95, 0.99];
        for &e in &eccentricities {
            for k in -12..=12 {
                let m = k as f64 * 0.27;
                let s = solver
                    .solve(e, m)
                    .unwrap_or_else(|err| panic!("e={} M={} failed: {}", e, m, err));
                assert!(
                    residual(e, s.eccentric_anomaly, m) < 1e-12,
                    "e={} M={} residual {}",
                    e,
                    m,
                    residual(e, s.eccentric_anomaly, m)
                );
                assert!(s.iterations <= solver.max_iterations);
            }
        }
    }

    #[test]
    fn test_keeps_revolution_of_input() {
        let m = 4.0 * TAU + 0.3;
        let s = KeplerSolver::default().solve(0.2, m).unwrap();
        assert!(residual(0.2, s.eccentric_anomaly, m) < 1e-11);
        assert!((s.eccentric_anomaly - m).abs() < 0.5);
    }

    #[test]
    fn test_iteration_cap_reports_failure() {
        let solver = KeplerSolver::new(1e-12, 1);
        match solver.solve(0.9, 0.5) {
            Err(SatfieldError::ConvergenceFailure {
                iterations,
                residual,
            }) => {
                assert_eq!(iterations, 1);
                assert!(residual > 1e-12);
            }
            other => panic!("expected ConvergenceFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_open_orbits() {
        let solver = KeplerSolver::default();
        assert!(matches!(
            solver.solve(1.0, 0.5),
            Err(SatfieldError::InvalidElements(_))
        ));
        assert!(matches!(
            solver.solve(-0.1, 0.5),
            Err(SatfieldError::InvalidElements(_))
        ));
        assert!(solver.solve(0.1, f64::NAN).is_err());
    }

    #[test]
    fn test_normpi() {
        assert_relative_eq!(normpi(0.0), 0.0);
        assert_relative_eq!(normpi(3.0 * PI / 2.0), -PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normpi(-3.0 * PI / 2.0), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(normpi(TAU + 0.1), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_true_anomaly_at_apsides() {
        assert_relative_eq!(true_anomaly(0.3, 0.0), 0.0);
        assert_relative_eq!(true_anomaly(0.3, PI).abs(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_mean_true_anomaly_inverse() {
        let solver = KeplerSolver::default();
        for &e in &[0.01, 0.3, 0.7] {
            for &m in &[0.2, 1.5, 3.0, -2.0] {
                let ea = solver.solve(e, m).unwrap().eccentric_anomaly;
                let nu = true_anomaly(e, ea);
                assert_relative_eq!(mean_anomaly_from_true(e, nu), m, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_perifocal_circular_speed() {
        let a = 7000.0;
        let (pos, vel) = perifocal_to_eci(a, 0.0, 0.0, 0.0, 0.0, 0.0, MU_EARTH);
        assert_relative_eq!(pos, Vector3::new(a, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(vel.norm(), (MU_EARTH / a).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(vel.y, (MU_EARTH / a).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_perifocal_apsides_of_eccentric_orbit() {
        let (a, e) = (10_000.0, 0.25);
        let p = a * (1.0 - e * e);
        let (peri, _) = perifocal_to_eci(p, e, 0.7, 1.1, 0.4, 0.0, MU_EARTH);
        let (apo, _) = perifocal_to_eci(p, e, 0.7, 1.1, 0.4, PI, MU_EARTH);
        assert_relative_eq!(peri.norm(), a * (1.0 - e), epsilon = 1e-8);
        assert_relative_eq!(apo.norm(), a * (1.0 + e), epsilon = 1e-8);
    }

    #[test]
    fn test_perifocal_polar_orbit_at_node() {
        // At the ascending node of a polar orbit the velocity is due north
        let (pos, vel) = perifocal_to_eci(7000.0, 0.0, PI / 2.0, 0.0, 0.0, 0.0, MU_EARTH);
        assert_relative_eq!(pos.z, 0.0, epsilon = 1e-9);
        assert!(vel.z > 7.0, "expected northward velocity, got {:?}", vel);
        assert_relative_eq!(vel.x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_body_half_and_full_period() {
        let orbit = TwoBodyOrbit::new(circular_leo());
        let period = orbit.period_minutes();
        assert_relative_eq!(period, 97.142, epsilon = 0.01);

        let start = orbit.state_at(JulianDate::J2000).unwrap();
        let half = orbit.state_at(JulianDate::J2000.add_minutes(period / 2.0)).unwrap();
        let full = orbit.state_at(JulianDate::J2000.add_minutes(period)).unwrap();

        assert_relative_eq!(half.position.x, -7000.0, epsilon = 1e-3);
        assert_relative_eq!(full.position, start.position, epsilon = 1e-3);
        assert_eq!(full.frame, Frame::Eci);
    }

    #[test]
    fn test_two_body_energy_conserved() {
        let mut elements = circular_leo();
        elements.eccentricity = 0.3;
        elements.semi_major_axis_km = 12_000.0;
        elements.inclination = 1.0;
        let orbit = TwoBodyOrbit::new(elements);

        let energy = |s: &StateVector| s.velocity.norm_squared() / 2.0 - MU_EARTH / s.position.norm();
        let expected = -MU_EARTH / (2.0 * 12_000.0);
        for k in 0..10 {
            let s = orbit.state_at(JulianDate::J2000.add_minutes(k as f64 * 23.0)).unwrap();
            assert_relative_eq!(energy(&s), expected, max_relative = 1e-10);
        }
    }
}
