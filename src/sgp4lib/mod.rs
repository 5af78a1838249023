//! SGP4/SDP4 satellite propagation
//!
//! A [`PropagatorContext`] holds everything derived from one TLE: the
//! un-Kozai'd mean motion, the drag and J2–J4 secular coefficients, and for
//! orbits of 225 minutes or longer the lunisolar and resonance terms of the
//! deep-space branch. The branch is chosen once when the context is built and
//! the context is never modified afterwards, so a single context can be shared
//! between threads and queried in any order.
//!
//! # Example
//!
//! ```ignore
//! use satfield::sgp4lib::EarthSatellite;
//!
//! let line1 = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
//! let line2 = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";
//!
//! let iss = EarthSatellite::from_tle(line1, line2, Some("ISS"))?;
//! let state = iss.at(iss.epoch().add_minutes(45.0))?;
//! println!("{}", state);
//! ```

mod deep;

use std::f64::consts::{PI, TAU};
use std::fmt;

use log::{debug, trace};
use nalgebra::Vector3;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::constants::{JD_1950, MINUTES_PER_DAY};
use crate::elementslib;
use crate::framelib::{self, Frame, StateVector};
use crate::keplerlib::KeplerSolver;
use crate::passlib::{self, VisibilityWindow};
use crate::time::JulianDate;
use crate::tlelib::{self, TleRecord};
use crate::toposlib::{GeodeticPosition, GroundStation, LookAngles, WGS84};
use crate::tracklib;
use crate::{Result, SatfieldError};

pub use deep::DeepSpaceTerms;
use deep::{PerturbedElements, SecularState};

/// Geopotential constant set used by SGP4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    /// WGS-72 with the historical rounded `xke`
    Wgs72Old,
    /// WGS-72, the set TLEs are generated with
    Wgs72,
    Wgs84,
}

/// Earth constants in the units SGP4 works in: earth radii and minutes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityConstants {
    /// km³/s²
    pub mu: f64,
    pub radius_km: f64,
    /// sqrt(GM) in earth radii^1.5 per minute
    pub xke: f64,
    /// Minutes per time unit, 1/xke
    pub tumin: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

impl GravityConstants {
    fn new(mu: f64, radius_km: f64, xke: f64, j2: f64, j3: f64, j4: f64) -> Self {
        GravityConstants {
            mu,
            radius_km,
            xke,
            tumin: 1.0 / xke,
            j2,
            j3,
            j4,
            j3oj2: j3 / j2,
        }
    }

    fn xke_from(mu: f64, radius_km: f64) -> f64 {
        60.0 / (radius_km.powi(3) / mu).sqrt()
    }
}

static WGS72OLD_CONSTANTS: Lazy<GravityConstants> = Lazy::new(|| {
    GravityConstants::new(
        398_600.799_64,
        6_378.135,
        0.074_366_916_1,
        0.001_082_616,
        -0.000_002_538_81,
        -0.000_001_655_97,
    )
});

static WGS72_CONSTANTS: Lazy<GravityConstants> = Lazy::new(|| {
    let (mu, radius_km) = (398_600.8, 6_378.135);
    GravityConstants::new(
        mu,
        radius_km,
        GravityConstants::xke_from(mu, radius_km),
        0.001_082_616,
        -0.000_002_538_81,
        -0.000_001_655_97,
    )
});

static WGS84_CONSTANTS: Lazy<GravityConstants> = Lazy::new(|| {
    let (mu, radius_km) = (398_600.5, 6_378.137);
    GravityConstants::new(
        mu,
        radius_km,
        GravityConstants::xke_from(mu, radius_km),
        0.001_082_629_989_05,
        -0.000_002_532_153_06,
        -0.000_001_610_987_61,
    )
});

impl Gravity {
    pub fn constants(self) -> &'static GravityConstants {
        match self {
            Gravity::Wgs72Old => &WGS72OLD_CONSTANTS,
            Gravity::Wgs72 => &WGS72_CONSTANTS,
            Gravity::Wgs84 => &WGS84_CONSTANTS,
        }
    }
}

impl fmt::Display for Gravity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gravity::Wgs72Old => write!(f, "WGS-72 (old)"),
            Gravity::Wgs72 => write!(f, "WGS-72"),
            Gravity::Wgs84 => write!(f, "WGS-84"),
        }
    }
}

/// Why a propagation was rejected as a decayed orbit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecayReason {
    /// Drag has driven the mean motion to zero or below
    MeanMotionNonPositive,
    /// Mean eccentricity left [-0.001, 1)
    MeanEccentricityOutOfRange(f64),
    /// Eccentricity after lunisolar periodics left [0, 1]
    PerturbedEccentricityOutOfRange(f64),
    NegativeSemiLatusRectum(f64),
    /// The computed position is inside the Earth
    BelowSurface { radius_km: f64 },
}

impl fmt::Display for DecayReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecayReason::MeanMotionNonPositive => write!(f, "mean motion is not positive"),
            DecayReason::MeanEccentricityOutOfRange(e) => {
                write!(f, "mean eccentricity {} outside [-0.001, 1)", e)
            }
            DecayReason::PerturbedEccentricityOutOfRange(e) => {
                write!(f, "perturbed eccentricity {} outside [0, 1]", e)
            }
            DecayReason::NegativeSemiLatusRectum(p) => {
                write!(f, "semi-latus rectum {} is negative", p)
            }
            DecayReason::BelowSurface { radius_km } => {
                write!(f, "radius {:.3} km is below the surface", radius_km)
            }
        }
    }
}

/// Mean elements at epoch in radians, mean motion in rad/min (un-Kozai'd).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MeanElements {
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub no: f64,
}

/// J2/J4 secular rates in rad/min.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SecularRates {
    pub mdot: f64,
    pub argpdot: f64,
    pub nodedot: f64,
}

/// Atmospheric drag coefficients. The higher-order terms stay zero for
/// the simplified drag model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct DragTerms {
    bstar: f64,
    eta: f64,
    cc1: f64,
    cc4: f64,
    cc5: f64,
    d2: f64,
    d3: f64,
    d4: f64,
    delmo: f64,
    sinmao: f64,
    omgcof: f64,
    xmcof: f64,
    nodecf: f64,
    t2cof: f64,
    t3cof: f64,
    t4cof: f64,
    t5cof: f64,
}

/// Short-period J2 and long-period J3 coefficients that depend only on
/// inclination.
#[derive(Debug, Clone, Copy, PartialEq)]
struct InclinationTerms {
    aycof: f64,
    xlcof: f64,
    con41: f64,
    x1mth2: f64,
    x7thm1: f64,
}

impl InclinationTerms {
    fn new(inclination: f64, j3oj2: f64) -> Self {
        let (sini, cosi) = inclination.sin_cos();
        let cosisq = cosi * cosi;
        // Avoid a division by zero for i = 180°
        let denom = if (cosi + 1.0).abs() > 1.5e-12 {
            1.0 + cosi
        } else {
            1.5e-12
        };
        InclinationTerms {
            aycof: -0.5 * j3oj2 * sini,
            xlcof: -0.25 * j3oj2 * sini * (3.0 + 5.0 * cosi) / denom,
            con41: 3.0 * cosisq - 1.0,
            x1mth2: 1.0 - cosisq,
            x7thm1: 7.0 * cosisq - 1.0,
        }
    }
}

/// Perturbation branch, fixed for the lifetime of a context.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    /// Period under the deep-space threshold: drag and J2–J4 only
    NearEarth,
    /// Lunisolar and resonance terms added
    DeepSpace(Box<DeepSpaceTerms>),
}

impl Branch {
    pub fn name(&self) -> &'static str {
        match self {
            Branch::NearEarth => "near-Earth",
            Branch::DeepSpace(_) => "deep-space",
        }
    }
}

/// Immutable SGP4/SDP4 state for one element set.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagatorContext {
    tle: TleRecord,
    gravity: Gravity,
    constants: GravityConstants,
    solver: KeplerSolver,
    mean: MeanElements,
    rates: SecularRates,
    drag: DragTerms,
    /// Skip the higher-order drag terms (low perigee or deep space)
    simplified: bool,
    inclination: InclinationTerms,
    branch: Branch,
}

/// Build a propagation context from a parsed TLE.
///
/// Orbits that cannot be propagated are rejected here with
/// `InvalidElements`: non-positive mean motion, eccentricity outside [0, 1),
/// a semi-major axis that does not clear the configured minimum altitude, or
/// a perigee inside the Earth.
pub fn build_context(tle: &TleRecord, config: &EngineConfig) -> Result<PropagatorContext> {
    let settings = &config.propagator;
    let gravity = settings.gravity;
    let gc = *gravity.constants();

    if !(tle.mean_motion > 0.0) {
        return Err(SatfieldError::InvalidElements(format!(
            "mean motion {} rev/day must be positive",
            tle.mean_motion
        )));
    }
    elementslib::tle_to_keplerian(tle)?.validate(gc.radius_km, settings.min_altitude_km)?;

    let ecco = tle.eccentricity;
    let inclo = tle.inclination_deg.to_radians();
    let no_kozai = tle.mean_motion * TAU / MINUTES_PER_DAY;

    // Recover the original mean motion from the Kozai value
    let eccsq = ecco * ecco;
    let omeosq = 1.0 - eccsq;
    let rteosq = omeosq.sqrt();
    let (sinio, cosio) = inclo.sin_cos();
    let cosio2 = cosio * cosio;
    let ak = (gc.xke / no_kozai).powf(2.0 / 3.0);
    let d1 = 0.75 * gc.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
    let del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    let no = no_kozai / (1.0 + d1 / (adel * adel));

    let ao = (gc.xke / no).powf(2.0 / 3.0);
    let po = ao * omeosq;
    let con42 = 1.0 - 5.0 * cosio2;
    let rp = ao * (1.0 - ecco);
    let perigee_km = (rp - 1.0) * gc.radius_km;
    if rp < 1.0 {
        return Err(SatfieldError::InvalidElements(format!(
            "perigee {:.3} km below the surface",
            perigee_km
        )));
    }

    let mean = MeanElements {
        ecco,
        inclo,
        nodeo: tle.raan_deg.to_radians(),
        argpo: tle.arg_perigee_deg.to_radians(),
        mo: tle.mean_anomaly_deg.to_radians(),
        no,
    };
    let inclination = InclinationTerms::new(inclo, gc.j3oj2);

    // Atmospheric density parameters, lowered for perigees under 156 km
    let mut sfour = 78.0 / gc.radius_km + 1.0;
    let mut qzms24 = ((120.0 - 78.0) / gc.radius_km).powi(4);
    if perigee_km < 156.0 {
        let s = if perigee_km < 98.0 {
            20.0
        } else {
            perigee_km - 78.0
        };
        qzms24 = ((120.0 - s) / gc.radius_km).powi(4);
        sfour = s / gc.radius_km + 1.0;
    }

    let pinvsq = 1.0 / (po * po);
    let tsi = 1.0 / (ao - sfour);
    let eta = ao * ecco * tsi;
    let etasq = eta * eta;
    let eeta = ecco * eta;
    let psisq = (1.0 - etasq).abs();
    let coef = qzms24 * tsi.powi(4);
    let coef1 = coef / psisq.powf(3.5);
    let cc2 = coef1
        * no
        * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
            + 0.375 * gc.j2 * tsi / psisq * inclination.con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
    let bstar = tle.bstar;
    let cc1 = bstar * cc2;
    let cc3 = if ecco > 1.0e-4 {
        -2.0 * coef * tsi * gc.j3oj2 * no * sinio / ecco
    } else {
        0.0
    };
    let cc4 = 2.0
        * no
        * coef1
        * ao
        * omeosq
        * (eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
            - gc.j2 * tsi / (ao * psisq)
                * (-3.0 * inclination.con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                    + 0.75
                        * inclination.x1mth2
                        * (2.0 * etasq - eeta * (1.0 + etasq))
                        * (2.0 * mean.argpo).cos()));
    let cc5 = 2.0 * coef1 * ao * omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

    // Secular J2/J4 rates
    let cosio4 = cosio2 * cosio2;
    let temp1 = 1.5 * gc.j2 * pinvsq * no;
    let temp2 = 0.5 * temp1 * gc.j2 * pinvsq;
    let temp3 = -0.46875 * gc.j4 * pinvsq * pinvsq * no;
    let xhdot1 = -temp1 * cosio;
    let rates = SecularRates {
        mdot: no
            + 0.5 * temp1 * rteosq * inclination.con41
            + 0.0625 * temp2 * rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4),
        argpdot: -0.5 * temp1 * con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4),
        nodedot: xhdot1
            + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio,
    };

    let delmo = (1.0 + eta * mean.mo.cos()).powi(3);
    let mut drag = DragTerms {
        bstar,
        eta,
        cc1,
        cc4,
        cc5,
        delmo,
        sinmao: mean.mo.sin(),
        omgcof: bstar * cc3 * mean.argpo.cos(),
        xmcof: if ecco > 1.0e-4 {
            -2.0 / 3.0 * coef * bstar / eeta
        } else {
            0.0
        },
        nodecf: 3.5 * omeosq * xhdot1 * cc1,
        t2cof: 1.5 * cc1,
        ..DragTerms::default()
    };

    let period_minutes = TAU / no;
    let branch = if period_minutes >= settings.deep_space_period_minutes {
        let gsto = tle.epoch.gmst();
        let epoch_days = tle.epoch.value() - JD_1950;
        Branch::DeepSpace(Box::new(DeepSpaceTerms::new(
            epoch_days, &mean, &rates, gsto, gc.xke,
        )))
    } else {
        Branch::NearEarth
    };

    let simplified = rp < 220.0 / gc.radius_km + 1.0 || matches!(branch, Branch::DeepSpace(_));
    if !simplified {
        let cc1sq = cc1 * cc1;
        drag.d2 = 4.0 * ao * tsi * cc1sq;
        let temp = drag.d2 * tsi * cc1 / 3.0;
        drag.d3 = (17.0 * ao + sfour) * temp;
        drag.d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * cc1;
        drag.t3cof = drag.d2 + 2.0 * cc1sq;
        drag.t4cof = 0.25 * (3.0 * drag.d3 + cc1 * (12.0 * drag.d2 + 10.0 * cc1sq));
        drag.t5cof = 0.2
            * (3.0 * drag.d4
                + 12.0 * cc1 * drag.d3
                + 6.0 * drag.d2 * drag.d2
                + 15.0 * cc1sq * (2.0 * drag.d2 + cc1sq));
    }

    debug!(
        "SGP4 context for #{}: {} branch, period {:.3} min, perigee {:.1} km, resonance {}, simplified drag {}, {}",
        tle.catalog_number,
        branch.name(),
        period_minutes,
        perigee_km,
        match &branch {
            Branch::DeepSpace(terms) => terms.resonance.label(),
            Branch::NearEarth => "none",
        },
        simplified,
        gravity
    );

    let context = PropagatorContext {
        tle: tle.clone(),
        gravity,
        constants: gc,
        solver: config.kepler,
        mean,
        rates,
        drag,
        simplified,
        inclination,
        branch,
    };

    // An element set that is already degenerate at its own epoch is unusable
    match context.propagate_minutes(0.0) {
        Err(SatfieldError::DecayedOrbit { reason, .. }) => Err(SatfieldError::InvalidElements(
            format!("orbit is degenerate at epoch: {}", reason),
        )),
        Err(e) => Err(e),
        Ok(_) => Ok(context),
    }
}

impl PropagatorContext {
    pub fn tle(&self) -> &TleRecord {
        &self.tle
    }

    pub fn epoch(&self) -> JulianDate {
        self.tle.epoch
    }

    pub fn gravity(&self) -> Gravity {
        self.gravity
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    pub fn is_deep_space(&self) -> bool {
        matches!(self.branch, Branch::DeepSpace(_))
    }

    /// Whether the higher-order drag terms are skipped
    pub fn uses_simplified_drag(&self) -> bool {
        self.simplified
    }

    /// Un-Kozai'd mean motion in rad/min
    pub fn mean_motion(&self) -> f64 {
        self.mean.no
    }

    /// Nodal period in minutes from the un-Kozai'd mean motion
    pub fn period_minutes(&self) -> f64 {
        TAU / self.mean.no
    }

    /// ECI (TEME) state at `time`.
    pub fn propagate(&self, time: JulianDate) -> Result<StateVector> {
        self.state_at(time.minutes_since(self.tle.epoch), time)
    }

    /// ECI (TEME) state `minutes` after the TLE epoch.
    pub fn propagate_minutes(&self, minutes: f64) -> Result<StateVector> {
        self.state_at(minutes, self.tle.epoch.add_minutes(minutes))
    }

    fn state_at(&self, t: f64, time: JulianDate) -> Result<StateVector> {
        if !t.is_finite() {
            return Err(SatfieldError::InvalidTime(format!(
                "{} minutes from epoch is not a finite offset",
                t
            )));
        }
        let decayed = |reason| SatfieldError::DecayedOrbit { minutes: t, reason };
        let gc = &self.constants;
        let mean = &self.mean;
        let drag = &self.drag;

        // Secular gravity and drag
        let xmdf = mean.mo + self.rates.mdot * t;
        let argpdf = mean.argpo + self.rates.argpdot * t;
        let nodedf = mean.nodeo + self.rates.nodedot * t;
        let t2 = t * t;
        let mut argpm = argpdf;
        let mut mm = xmdf;
        let mut nodem = nodedf + drag.nodecf * t2;
        let mut tempa = 1.0 - drag.cc1 * t;
        let mut tempe = drag.bstar * drag.cc4 * t;
        let mut templ = drag.t2cof * t2;

        if !self.simplified {
            let delomg = drag.omgcof * t;
            let delm = drag.xmcof * ((1.0 + drag.eta * xmdf.cos()).powi(3) - drag.delmo);
            let temp = delomg + delm;
            mm = xmdf + temp;
            argpm = argpdf - temp;
            let t3 = t2 * t;
            let t4 = t3 * t;
            tempa -= drag.d2 * t2 + drag.d3 * t3 + drag.d4 * t4;
            tempe += drag.bstar * drag.cc5 * (mm.sin() - drag.sinmao);
            templ += drag.t3cof * t3 + t4 * (drag.t4cof + t * drag.t5cof);
        }

        let mut nm = mean.no;
        let mut em = mean.ecco;
        let mut inclm = mean.inclo;
        if let Branch::DeepSpace(terms) = &self.branch {
            let s = terms.secular(
                t,
                SecularState {
                    em,
                    argpm,
                    inclm,
                    mm,
                    nodem,
                    nm,
                },
            );
            em = s.em;
            argpm = s.argpm;
            inclm = s.inclm;
            mm = s.mm;
            nodem = s.nodem;
            nm = s.nm;
        }

        if nm <= 0.0 {
            return Err(decayed(DecayReason::MeanMotionNonPositive));
        }
        let am = (gc.xke / nm).powf(2.0 / 3.0) * tempa * tempa;
        nm = gc.xke / am.powf(1.5);
        em -= tempe;
        if !(-0.001..1.0).contains(&em) {
            return Err(decayed(DecayReason::MeanEccentricityOutOfRange(em)));
        }
        em = em.max(1.0e-6);

        mm += mean.no * templ;
        let xlm = (mm + argpm + nodem) % TAU;
        nodem %= TAU;
        argpm %= TAU;
        mm = (xlm - argpm - nodem) % TAU;

        let mut p = PerturbedElements {
            ep: em,
            inclp: inclm,
            nodep: nodem,
            argpp: argpm,
            mp: mm,
        };
        let mut incl_terms = self.inclination;
        if let Branch::DeepSpace(terms) = &self.branch {
            p = terms.periodics(t, p);
            if p.inclp < 0.0 {
                p.inclp = -p.inclp;
                p.nodep += PI;
                p.argpp -= PI;
            }
            if !(0.0..=1.0).contains(&p.ep) {
                return Err(decayed(DecayReason::PerturbedEccentricityOutOfRange(p.ep)));
            }
            incl_terms = InclinationTerms::new(p.inclp, gc.j3oj2);
        }
        let (sinip, cosip) = p.inclp.sin_cos();

        // Long-period periodics
        let axnl = p.ep * p.argpp.cos();
        let temp = 1.0 / (am * (1.0 - p.ep * p.ep));
        let aynl = p.ep * p.argpp.sin() + temp * incl_terms.aycof;
        let xl = p.mp + p.argpp + p.nodep + temp * incl_terms.xlcof * axnl;

        // Kepler's equation in equinoctial form
        let u = (xl - p.nodep) % TAU;
        let eo1 = self.solve_kepler(u, axnl, aynl)?;
        let (sineo1, coseo1) = eo1.sin_cos();

        let ecose = axnl * coseo1 + aynl * sineo1;
        let esine = axnl * sineo1 - aynl * coseo1;
        let el2 = axnl * axnl + aynl * aynl;
        let pl = am * (1.0 - el2);
        if pl < 0.0 {
            return Err(decayed(DecayReason::NegativeSemiLatusRectum(pl)));
        }

        let rl = am * (1.0 - ecose);
        let rdotl = am.sqrt() * esine / rl;
        let rvdotl = pl.sqrt() / rl;
        let betal = (1.0 - el2).sqrt();
        let temp = esine / (1.0 + betal);
        let sinu = am / rl * (sineo1 - aynl - axnl * temp);
        let cosu = am / rl * (coseo1 - axnl + aynl * temp);
        let su = sinu.atan2(cosu);
        let sin2u = (cosu + cosu) * sinu;
        let cos2u = 1.0 - 2.0 * sinu * sinu;
        let temp = 1.0 / pl;
        let temp1 = 0.5 * gc.j2 * temp;
        let temp2 = temp1 * temp;

        // Short-period periodics
        let mrt = rl * (1.0 - 1.5 * temp2 * betal * incl_terms.con41)
            + 0.5 * temp1 * incl_terms.x1mth2 * cos2u;
        let su = su - 0.25 * temp2 * incl_terms.x7thm1 * sin2u;
        let xnode = p.nodep + 1.5 * temp2 * cosip * sin2u;
        let xinc = p.inclp + 1.5 * temp2 * cosip * sinip * cos2u;
        let mvt = rdotl - nm * temp1 * incl_terms.x1mth2 * sin2u / gc.xke;
        let rvdot = rvdotl + nm * temp1 * (incl_terms.x1mth2 * cos2u + 1.5 * incl_terms.con41) / gc.xke;

        if mrt < 1.0 {
            return Err(decayed(DecayReason::BelowSurface {
                radius_km: mrt * gc.radius_km,
            }));
        }

        // Orientation vectors
        let (sinsu, cossu) = su.sin_cos();
        let (snod, cnod) = xnode.sin_cos();
        let (sini, cosi) = xinc.sin_cos();
        let xmx = -snod * cosi;
        let xmy = cnod * cosi;
        let u_hat = Vector3::new(xmx * sinsu + cnod * cossu, xmy * sinsu + snod * cossu, sini * sinsu);
        let v_hat = Vector3::new(xmx * cossu - cnod * sinsu, xmy * cossu - snod * sinsu, sini * cossu);

        let vkmpersec = gc.radius_km * gc.xke / 60.0;
        let position = u_hat * (mrt * gc.radius_km);
        let velocity = (u_hat * mvt + v_hat * rvdot) * vkmpersec;

        Ok(StateVector::new(Frame::Eci, position, velocity, time))
    }

    /// Newton iteration on u = E + aynl·cos E − axnl·sin E, with steps
    /// limited to 0.95 rad.
    fn solve_kepler(&self, u: f64, axnl: f64, aynl: f64) -> Result<f64> {
        let mut eo1 = u;
        let mut iterations = 0;
        loop {
            let (sineo1, coseo1) = eo1.sin_cos();
            let residual = u - aynl * coseo1 + axnl * sineo1 - eo1;
            if residual.abs() < self.solver.tolerance {
                trace!("SGP4 Kepler solve converged in {} iterations", iterations);
                return Ok(eo1);
            }
            if iterations >= self.solver.max_iterations {
                return Err(SatfieldError::ConvergenceFailure {
                    iterations,
                    residual: residual.abs(),
                });
            }
            let step = residual / (1.0 - coseo1 * axnl - sineo1 * aynl);
            eo1 += step.clamp(-0.95, 0.95);
            iterations += 1;
        }
    }
}

/// A named satellite with a ready-to-use propagation context.
#[derive(Debug, Clone)]
pub struct EarthSatellite {
    /// Object name, from a title line or supplied by the caller
    pub name: Option<String>,
    context: PropagatorContext,
    config: EngineConfig,
}

impl EarthSatellite {
    /// Parse two TLE lines and build a context with the default configuration.
    pub fn from_tle(line1: &str, line2: &str, name: Option<&str>) -> Result<Self> {
        Self::from_tle_with_config(line1, line2, name, &EngineConfig::default())
    }

    pub fn from_tle_with_config(
        line1: &str,
        line2: &str,
        name: Option<&str>,
        config: &EngineConfig,
    ) -> Result<Self> {
        let mut record = tlelib::parse(line1, line2)?;
        if let Some(name) = name {
            record = record.with_name(name);
        }
        Self::from_record(record, config)
    }

    pub fn from_record(record: TleRecord, config: &EngineConfig) -> Result<Self> {
        let context = build_context(&record, config)?;
        Ok(EarthSatellite {
            name: record.name.clone(),
            context,
            config: config.clone(),
        })
    }

    /// Build a satellite for every element set in a TLE file.
    pub fn load_all(text: &str, config: &EngineConfig) -> Result<Vec<Self>> {
        tlelib::parse_tle_file(text)?
            .into_iter()
            .map(|record| Self::from_record(record, config))
            .collect()
    }

    /// Replace the element set.
    ///
    /// The context is only rebuilt when the new record has a different epoch
    /// or element-set number. Returns whether a rebuild happened.
    pub fn update_tle(&mut self, record: TleRecord) -> Result<bool> {
        let current = self.context.tle();
        if record.catalog_number != current.catalog_number {
            return Err(SatfieldError::InvalidElements(format!(
                "update for catalog #{} applied to #{}",
                record.catalog_number, current.catalog_number
            )));
        }
        if record.epoch == current.epoch && record.element_set_number == current.element_set_number
        {
            debug!(
                "TLE for #{} unchanged (epoch {}, set {}), keeping context",
                record.catalog_number, record.epoch, record.element_set_number
            );
            return Ok(false);
        }

        self.context = build_context(&record, &self.config)?;
        if record.name.is_some() {
            self.name = record.name;
        }
        Ok(true)
    }

    pub fn context(&self) -> &PropagatorContext {
        &self.context
    }

    pub fn tle(&self) -> &TleRecord {
        self.context.tle()
    }

    pub fn catalog_number(&self) -> u32 {
        self.context.tle().catalog_number
    }

    pub fn epoch(&self) -> JulianDate {
        self.context.epoch()
    }

    /// ECI (TEME) state at `time`
    pub fn at(&self, time: JulianDate) -> Result<StateVector> {
        self.context.propagate(time)
    }

    /// Earth-fixed state at `time`
    pub fn ecef_at(&self, time: JulianDate) -> Result<StateVector> {
        Ok(framelib::eci_to_ecef(&self.at(time)?, time))
    }

    /// Sub-satellite point and altitude on the WGS84 ellipsoid
    pub fn geodetic_at(&self, time: JulianDate) -> Result<GeodeticPosition> {
        let ecef = self.ecef_at(time)?;
        Ok(WGS84.geodetic(&ecef.position, time))
    }

    /// Azimuth, elevation and range from a ground station
    pub fn look_angles(&self, station: &GroundStation, time: JulianDate) -> Result<LookAngles> {
        Ok(station.look_angles(&self.at(time)?))
    }

    /// Pass windows over `station` between `start` and `end`, sampling every
    /// `step_minutes`.
    pub fn passes(
        &self,
        station: &GroundStation,
        start: JulianDate,
        end: JulianDate,
        step_minutes: f64,
    ) -> Result<Vec<VisibilityWindow>> {
        let ephemeris = tracklib::sample_ephemeris(&self.context, start, end, step_minutes)?;
        Ok(passlib::compute_pass(station, &ephemeris))
    }

    /// Format: `"NAME catalog #NORAD epoch YYYY-MM-DD HH:MM:SS UTC"`
    pub fn target_name(&self) -> String {
        let epoch_str = self
            .epoch()
            .to_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        match &self.name {
            Some(n) => format!("{} catalog #{} epoch {}", n, self.catalog_number(), epoch_str),
            None => format!("catalog #{} epoch {}", self.catalog_number(), epoch_str),
        }
    }
}

impl fmt::Display for EarthSatellite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_name())
    }
}
