//! SDP4 deep-space terms
//!
//! Orbits with periods of 225 minutes or more pick up lunar and solar
//! perturbations, and orbits near the 12 h and 24 h commensurabilities also
//! feel the Earth's tesseral harmonics. The coefficients for both are fixed
//! when the context is built. The resonance integrator is re-run from the
//! epoch on every call so propagation never writes to the context.

use std::f64::consts::{PI, TAU};

use log::trace;

use super::{MeanElements, SecularRates};

/// Sidereal rotation rate of the Earth in rad/min
const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

/// Fixed integrator step in minutes
const STEP: f64 = 720.0;
const STEP2: f64 = STEP * STEP * 0.5;

/// Inclinations closer than this to 0 or π drop the nodal lunisolar terms
const NEAR_EQUATORIAL: f64 = 5.235_987_7e-2;

/// Mean motion and orbit geometry of one perturbing body.
#[derive(Debug, Clone, Copy)]
struct Body {
    /// Mean motion in rad/min
    rate: f64,
    /// Orbital eccentricity
    eccentricity: f64,
    /// Gravitational coupling constant
    coupling: f64,
}

const SUN: Body = Body {
    rate: 1.194_59e-5,
    eccentricity: 0.016_75,
    coupling: 2.986_479_7e-6,
};

const MOON: Body = Body {
    rate: 1.583_521_8e-4,
    eccentricity: 0.054_90,
    coupling: 4.796_806_5e-7,
};

/// Orientation of a perturbing body's orbit relative to the equator.
struct BodyOrientation {
    cos_g: f64,
    sin_g: f64,
    cos_i: f64,
    sin_i: f64,
    cos_h: f64,
    sin_h: f64,
}

/// Geometry factors coupling the satellite orbit to one body.
#[derive(Debug, Clone, Copy)]
struct Coupling {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
    s6: f64,
    s7: f64,
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

/// Satellite orbit quantities shared by both bodies.
struct OrbitGeometry {
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    xnoi: f64,
}

impl Coupling {
    fn new(orbit: &OrbitGeometry, body: &BodyOrientation, coupling: f64) -> Self {
        let a1 = body.cos_g * body.cos_h + body.sin_g * body.cos_i * body.sin_h;
        let a3 = -body.sin_g * body.cos_h + body.cos_g * body.cos_i * body.sin_h;
        let a7 = -body.cos_g * body.sin_h + body.sin_g * body.cos_i * body.cos_h;
        let a8 = body.sin_g * body.sin_i;
        let a9 = body.sin_g * body.sin_h + body.cos_g * body.cos_i * body.cos_h;
        let a10 = body.cos_g * body.sin_i;
        let a2 = orbit.cosim * a7 + orbit.sinim * a8;
        let a4 = orbit.cosim * a9 + orbit.sinim * a10;
        let a5 = -orbit.sinim * a7 + orbit.cosim * a8;
        let a6 = -orbit.sinim * a9 + orbit.cosim * a10;

        let x1 = a1 * orbit.cosomm + a2 * orbit.sinomm;
        let x2 = a3 * orbit.cosomm + a4 * orbit.sinomm;
        let x3 = -a1 * orbit.sinomm + a2 * orbit.cosomm;
        let x4 = -a3 * orbit.sinomm + a4 * orbit.cosomm;
        let x5 = a5 * orbit.sinomm;
        let x6 = a6 * orbit.sinomm;
        let x7 = a5 * orbit.cosomm;
        let x8 = a6 * orbit.cosomm;

        let emsq = orbit.emsq;
        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);

        let s3 = coupling * orbit.xnoi;
        let s2 = -0.5 * s3 / orbit.rtemsq;
        let s4 = s3 * orbit.rtemsq;

        Coupling {
            s1: -15.0 * orbit.em * s4,
            s2,
            s3,
            s4,
            s5: x1 * x3 + x2 * x4,
            s6: x2 * x3 + x1 * x4,
            s7: x2 * x4 - x1 * x3,
            z1: z1 + z1 + orbit.betasq * z31,
            z2: z2 + z2 + orbit.betasq * z32,
            z3: z3 + z3 + orbit.betasq * z33,
            z11,
            z12,
            z13,
            z21,
            z22,
            z23,
            z31,
            z32,
            z33,
        }
    }

    /// Amplitudes of the periodic terms this body raises.
    fn periodic(&self, body: &Body, emsq: f64, mean_anomaly: f64) -> PeriodicTerms {
        PeriodicTerms {
            e2: 2.0 * self.s1 * self.s6,
            e3: 2.0 * self.s1 * self.s7,
            i2: 2.0 * self.s2 * self.z12,
            i3: 2.0 * self.s2 * (self.z13 - self.z11),
            l2: -2.0 * self.s3 * self.z2,
            l3: -2.0 * self.s3 * (self.z3 - self.z1),
            l4: -2.0 * self.s3 * (-21.0 - 9.0 * emsq) * body.eccentricity,
            gh2: 2.0 * self.s4 * self.z32,
            gh3: 2.0 * self.s4 * (self.z33 - self.z31),
            gh4: -18.0 * self.s4 * body.eccentricity,
            h2: -2.0 * self.s2 * self.z22,
            h3: -2.0 * self.s2 * (self.z23 - self.z21),
            mean_anomaly,
            rate: body.rate,
            eccentricity: body.eccentricity,
        }
    }

    /// Secular rates of e, i, M, ω and Ω·sin i this body raises, in rad/min.
    fn secular(&self, body: &Body, emsq: f64, near_equatorial: bool) -> [f64; 5] {
        let n = body.rate;
        let dh = if near_equatorial {
            0.0
        } else {
            -n * self.s2 * (self.z21 + self.z23)
        };
        [
            self.s1 * n * self.s5,
            self.s2 * n * (self.z11 + self.z13),
            -n * self.s3 * (self.z1 + self.z3 - 14.0 - 6.0 * emsq),
            self.s4 * n * (self.z31 + self.z33 - 6.0),
            dh,
        ]
    }
}

/// Long-period lunar or solar terms.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PeriodicTerms {
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
    /// Body mean anomaly at epoch
    mean_anomaly: f64,
    rate: f64,
    eccentricity: f64,
}

impl PeriodicTerms {
    /// Perturbations of (e, i, L, ω, Ω) `t` minutes after epoch.
    fn at(&self, t: f64) -> [f64; 5] {
        let zm = self.mean_anomaly + self.rate * t;
        let zf = zm + 2.0 * self.eccentricity * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        [
            self.e2 * f2 + self.e3 * f3,
            self.i2 * f2 + self.i3 * f3,
            self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            self.h2 * f2 + self.h3 * f3,
        ]
    }
}

/// Tesseral resonance class of the orbit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resonance {
    None,
    /// 24 h, geosynchronous
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
        xfact: f64,
        xlamo: f64,
    },
    /// 12 h, Molniya-type
    HalfDay {
        d: HalfDayCoefficients,
        xfact: f64,
        xlamo: f64,
    },
}

impl Resonance {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            Resonance::None => "none",
            Resonance::Synchronous { .. } => "24 h",
            Resonance::HalfDay { .. } => "12 h",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HalfDayCoefficients {
    d2201: f64,
    d2211: f64,
    d3210: f64,
    d3222: f64,
    d4410: f64,
    d4422: f64,
    d5220: f64,
    d5232: f64,
    d5421: f64,
    d5433: f64,
}

/// Mean elements after the deep-space secular and resonance updates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SecularState {
    pub em: f64,
    pub argpm: f64,
    pub inclm: f64,
    pub mm: f64,
    pub nodem: f64,
    pub nm: f64,
}

/// Elements after the lunisolar periodic corrections.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PerturbedElements {
    pub ep: f64,
    pub inclp: f64,
    pub nodep: f64,
    pub argpp: f64,
    pub mp: f64,
}

/// Everything the deep-space branch needs, computed once at context build.
#[derive(Debug, Clone, PartialEq)]
pub struct DeepSpaceTerms {
    solar: PeriodicTerms,
    lunar: PeriodicTerms,
    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,
    pub(crate) resonance: Resonance,
    /// Greenwich sidereal angle at epoch
    gsto: f64,
    /// Un-Kozai'd mean motion, rad/min
    no: f64,
    argpo: f64,
    argpdot: f64,
}

impl DeepSpaceTerms {
    /// Lunisolar coefficients and resonance set-up for a deep-space orbit.
    ///
    /// `epoch_days` counts days from 1949 December 31 00:00 UT.
    pub(crate) fn new(
        epoch_days: f64,
        mean: &MeanElements,
        rates: &SecularRates,
        gsto: f64,
        xke: f64,
    ) -> Self {
        let (snodm, cnodm) = mean.nodeo.sin_cos();
        let (sinomm, cosomm) = mean.argpo.sin_cos();
        let (sinim, cosim) = mean.inclo.sin_cos();
        let emsq = mean.ecco * mean.ecco;
        let betasq = 1.0 - emsq;
        let orbit = OrbitGeometry {
            sinim,
            cosim,
            sinomm,
            cosomm,
            em: mean.ecco,
            emsq,
            betasq,
            rtemsq: betasq.sqrt(),
            xnoi: 1.0 / mean.no,
        };

        // Lunar orbit orientation at epoch
        let day = epoch_days + 18_261.5;
        let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % TAU;
        let (stem, ctem) = xnodce.sin_cos();
        let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089_683_511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.835_151_4 + 0.001_944_368_0 * day;
        let zx = 0.397_854_16 * stem / zsinil;
        let zy = zcoshl * ctem + 0.917_448_67 * zsinhl * stem;
        let zx = gam + zx.atan2(zy) - xnodce;

        let sun = BodyOrientation {
            cos_g: 0.194_590_5,
            sin_g: -0.980_884_58,
            cos_i: 0.917_448_67,
            sin_i: 0.397_854_16,
            cos_h: cnodm,
            sin_h: snodm,
        };
        let moon = BodyOrientation {
            cos_g: zx.cos(),
            sin_g: zx.sin(),
            cos_i: zcosil,
            sin_i: zsinil,
            cos_h: zcoshl * cnodm + zsinhl * snodm,
            sin_h: snodm * zcoshl - cnodm * zsinhl,
        };

        let solar_coupling = Coupling::new(&orbit, &sun, SUN.coupling);
        let lunar_coupling = Coupling::new(&orbit, &moon, MOON.coupling);

        let zmos = (6.256_583_7 + 0.017_201_977 * day) % TAU;
        let zmol = (4.719_967_2 + 0.229_971_50 * day - gam) % TAU;
        let solar = solar_coupling.periodic(&SUN, emsq, zmos);
        let lunar = lunar_coupling.periodic(&MOON, emsq, zmol);

        let near_equatorial =
            mean.inclo < NEAR_EQUATORIAL || mean.inclo > PI - NEAR_EQUATORIAL;
        let [ses, sis, sls, sghs, mut shs] = solar_coupling.secular(&SUN, emsq, near_equatorial);
        let [sel, sil, sll, sghl, shll] = lunar_coupling.secular(&MOON, emsq, near_equatorial);

        if sinim != 0.0 {
            shs /= sinim;
        }
        let dedt = ses + sel;
        let didt = sis + sil;
        let dmdt = sls + sll;
        let mut domdt = sghs - cosim * shs + sghl;
        let mut dnodt = shs;
        if sinim != 0.0 {
            domdt -= cosim / sinim * shll;
            dnodt += shll / sinim;
        }

        let theta = gsto % TAU;
        let nm = mean.no;
        let aonv = (nm / xke).powf(2.0 / 3.0);

        let resonance = if nm > 0.003_490_658_5 && nm < 0.005_235_987_7 {
            let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
            let g310 = 1.0 + 2.0 * emsq;
            let g300 = 1.0 + emsq * (-6.0 + 6.609_37 * emsq);
            let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
            let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
            let f330 = 1.875 * (1.0 + cosim).powi(3);
            let del = 3.0 * nm * nm * aonv * aonv;
            Resonance::Synchronous {
                del1: del * f311 * g310 * 2.146_074_8e-6 * aonv,
                del2: 2.0 * del * f220 * g200 * 1.789_167_9e-6,
                del3: 3.0 * del * f330 * g300 * 2.212_301_5e-7 * aonv,
                xfact: rates.mdot + rates.argpdot + rates.nodedot - RPTIM + dmdt + domdt + dnodt
                    - mean.no,
                xlamo: (mean.mo + mean.nodeo + mean.argpo - theta) % TAU,
            }
        } else if (8.26e-3..=9.24e-3).contains(&nm) && mean.ecco >= 0.5 {
            Resonance::HalfDay {
                d: HalfDayCoefficients::new(mean.ecco, sinim, cosim, nm, aonv),
                xfact: rates.mdot + dmdt + 2.0 * (rates.nodedot + dnodt - RPTIM) - mean.no,
                xlamo: (mean.mo + mean.nodeo + mean.nodeo - theta - theta) % TAU,
            }
        } else {
            Resonance::None
        };

        DeepSpaceTerms {
            solar,
            lunar,
            dedt,
            didt,
            dmdt,
            dnodt,
            domdt,
            resonance,
            gsto,
            no: mean.no,
            argpo: mean.argpo,
            argpdot: rates.argpdot,
        }
    }

    /// Apply the lunisolar secular rates and integrate the resonance terms
    /// from epoch to `t` minutes.
    pub(crate) fn secular(&self, t: f64, mut s: SecularState) -> SecularState {
        s.em += self.dedt * t;
        s.inclm += self.didt * t;
        s.argpm += self.domdt * t;
        s.nodem += self.dnodt * t;
        s.mm += self.dmdt * t;

        let (xfact, xlamo) = match &self.resonance {
            Resonance::None => return s,
            Resonance::Synchronous { xfact, xlamo, .. } | Resonance::HalfDay { xfact, xlamo, .. } => {
                (*xfact, *xlamo)
            }
        };

        let theta = (self.gsto + t * RPTIM) % TAU;
        let delt = if t > 0.0 { STEP } else { -STEP };
        let mut atime = 0.0;
        let mut xli = xlamo;
        let mut xni = self.no;
        let mut steps = 0u32;

        let (xndt, xldot, xnddt, ft) = loop {
            let (xndt, xnddt) = self.resonance_rates(xli, atime);
            let xldot = xni + xfact;
            let xnddt = xnddt * xldot;

            if (t - atime).abs() < STEP {
                break (xndt, xldot, xnddt, t - atime);
            }
            xli += xldot * delt + xndt * STEP2;
            xni += xndt * delt + xnddt * STEP2;
            atime += delt;
            steps += 1;
        };
        trace!("Resonance integrator took {} steps to reach {} min", steps, t);

        s.nm = xni + xndt * ft + xnddt * ft * ft * 0.5;
        let xl = xli + xldot * ft + xndt * ft * ft * 0.5;
        s.mm = match self.resonance {
            Resonance::Synchronous { .. } => xl - s.nodem - s.argpm + theta,
            _ => xl - 2.0 * s.nodem + 2.0 * theta,
        };
        s
    }

    /// dn/dt and d²n/dt² / (dλ/dt) of the resonance at longitude `xli`.
    fn resonance_rates(&self, xli: f64, atime: f64) -> (f64, f64) {
        const FASX2: f64 = 0.131_309_08;
        const FASX4: f64 = 2.884_319_8;
        const FASX6: f64 = 0.374_480_87;
        const G22: f64 = 5.768_639_6;
        const G32: f64 = 0.952_408_98;
        const G44: f64 = 1.801_499_8;
        const G52: f64 = 1.050_833_0;
        const G54: f64 = 4.410_889_8;

        match &self.resonance {
            Resonance::None => (0.0, 0.0),
            Resonance::Synchronous {
                del1, del2, del3, ..
            } => {
                let xndt = del1 * (xli - FASX2).sin()
                    + del2 * (2.0 * (xli - FASX4)).sin()
                    + del3 * (3.0 * (xli - FASX6)).sin();
                let xnddt = del1 * (xli - FASX2).cos()
                    + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                    + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
                (xndt, xnddt)
            }
            Resonance::HalfDay { d, .. } => {
                let xomi = self.argpo + self.argpdot * atime;
                let x2omi = xomi + xomi;
                let x2li = xli + xli;
                let xndt = d.d2201 * (x2omi + xli - G22).sin()
                    + d.d2211 * (xli - G22).sin()
                    + d.d3210 * (xomi + xli - G32).sin()
                    + d.d3222 * (-xomi + xli - G32).sin()
                    + d.d4410 * (x2omi + x2li - G44).sin()
                    + d.d4422 * (x2li - G44).sin()
                    + d.d5220 * (xomi + xli - G52).sin()
                    + d.d5232 * (-xomi + xli - G52).sin()
                    + d.d5421 * (xomi + x2li - G54).sin()
                    + d.d5433 * (-xomi + x2li - G54).sin();
                let xnddt = d.d2201 * (x2omi + xli - G22).cos()
                    + d.d2211 * (xli - G22).cos()
                    + d.d3210 * (xomi + xli - G32).cos()
                    + d.d3222 * (-xomi + xli - G32).cos()
                    + d.d5220 * (xomi + xli - G52).cos()
                    + d.d5232 * (-xomi + xli - G52).cos()
                    + 2.0
                        * (d.d4410 * (x2omi + x2li - G44).cos()
                            + d.d4422 * (x2li - G44).cos()
                            + d.d5421 * (xomi + x2li - G54).cos()
                            + d.d5433 * (-xomi + x2li - G54).cos());
                (xndt, xnddt)
            }
        }
    }

    /// Add the lunisolar periodic terms at `t` minutes.
    ///
    /// Below 0.2 rad inclination the node and perigee corrections are applied
    /// through the Lyddane modification to avoid dividing by sin i.
    pub(crate) fn periodics(&self, t: f64, mut p: PerturbedElements) -> PerturbedElements {
        let sun = self.solar.at(t);
        let moon = self.lunar.at(t);
        let pe = sun[0] + moon[0];
        let pinc = sun[1] + moon[1];
        let pl = sun[2] + moon[2];
        let pgh = sun[3] + moon[3];
        let ph = sun[4] + moon[4];

        p.inclp += pinc;
        p.ep += pe;
        let (sinip, cosip) = p.inclp.sin_cos();

        if p.inclp >= 0.2 {
            let ph = ph / sinip;
            p.argpp += pgh - cosip * ph;
            p.nodep += ph;
            p.mp += pl;
        } else {
            let (sinop, cosop) = p.nodep.sin_cos();
            let alfdp = sinip * sinop + ph * cosop + pinc * cosip * sinop;
            let betdp = sinip * cosop - ph * sinop + pinc * cosip * cosop;
            p.nodep %= TAU;
            let xls = p.mp + p.argpp + pl + pgh + (cosip - pinc * sinip) * p.nodep;
            let xnoh = p.nodep;
            p.nodep = alfdp.atan2(betdp);
            if (xnoh - p.nodep).abs() > PI {
                if p.nodep < xnoh {
                    p.nodep += TAU;
                } else {
                    p.nodep -= TAU;
                }
            }
            p.mp += pl;
            p.argpp = xls - p.mp - cosip * p.nodep;
        }
        p
    }
}

impl HalfDayCoefficients {
    fn new(em: f64, sinim: f64, cosim: f64, nm: f64, aonv: f64) -> Self {
        const ROOT22: f64 = 1.789_167_9e-6;
        const ROOT32: f64 = 3.739_379_2e-7;
        const ROOT44: f64 = 7.363_695_3e-9;
        const ROOT52: f64 = 1.142_863_9e-7;
        const ROOT54: f64 = 2.176_580_3e-9;

        let emsq = em * em;
        let eoc = em * emsq;
        let cosisq = cosim * cosim;

        let g201 = -0.306 - (em - 0.64) * 0.440;
        let (g211, g310, g322, g410, g422, g520) = if em <= 0.65 {
            (
                3.616 - 13.2470 * em + 16.2900 * emsq,
                -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc,
                -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc,
                -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc,
                -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc,
                -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc,
            )
        } else {
            let g520 = if em > 0.715 {
                -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
            } else {
                1464.74 - 4664.75 * em + 3763.64 * emsq
            };
            (
                -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc,
                -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc,
                -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc,
                -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc,
                -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc,
                g520,
            )
        };
        let (g533, g521, g532) = if em < 0.7 {
            (
                -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc,
                -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc,
                -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc,
            )
        } else {
            (
                -37995.78 + 161616.52 * em - 229838.2 * emsq + 109377.94 * eoc,
                -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc,
                -40023.88 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc,
            )
        };

        let sini2 = sinim * sinim;
        let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
        let f221 = 1.5 * sini2;
        let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
        let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
        let f441 = 35.0 * sini2 * f220;
        let f442 = 39.375 * sini2 * sini2;
        let f522 = 9.84375
            * sinim
            * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
                + 1.0 / 3.0 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
        let f523 = sinim
            * (4.921_875_12 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
                + 6.562_500_12 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
        let f542 = 29.53125
            * sinim
            * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
        let f543 = 29.53125
            * sinim
            * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

        let xno2 = nm * nm;
        let ainv2 = aonv * aonv;
        let mut temp1 = 3.0 * xno2 * ainv2;
        let temp = temp1 * ROOT22;
        let d2201 = temp * f220 * g201;
        let d2211 = temp * f221 * g211;
        temp1 *= aonv;
        let temp = temp1 * ROOT32;
        let d3210 = temp * f321 * g310;
        let d3222 = temp * f322 * g322;
        temp1 *= aonv;
        let temp = 2.0 * temp1 * ROOT44;
        let d4410 = temp * f441 * g410;
        let d4422 = temp * f442 * g422;
        temp1 *= aonv;
        let temp = temp1 * ROOT52;
        let d5220 = temp * f522 * g520;
        let d5232 = temp * f523 * g532;
        let temp = 2.0 * temp1 * ROOT54;

        HalfDayCoefficients {
            d2201,
            d2211,
            d3210,
            d3222,
            d4410,
            d4422,
            d5220,
            d5232,
            d5421: temp * f542 * g521,
            d5433: temp * f543 * g533,
        }
    }
}
