//! Ground-station visibility windows
//!
//! [`compute_pass`] walks an ordered ephemeris once, computing look angles
//! from a station whose Earth-fixed position and horizon basis are set up a
//! single time. A window opens when the elevation rises to the station's
//! minimum elevation and closes when it falls below again. The crossing
//! instants are found by linear interpolation between the bracketing samples,
//! so the ephemeris only needs to be dense enough that no pass fits between
//! two samples.

use std::f64::consts::{PI, TAU};
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::constants::MINUTES_PER_DAY;
use crate::framelib::StateVector;
use crate::time::JulianDate;
use crate::toposlib::{GroundStation, LookAngles, StationFrame};

/// The satellite as seen from the station at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassSample {
    pub time: JulianDate,
    /// Radians clockwise from north
    pub azimuth: f64,
    /// Radians above the horizon
    pub elevation: f64,
    pub range_km: f64,
}

impl PassSample {
    fn new(time: JulianDate, look: &LookAngles) -> Self {
        PassSample {
            time,
            azimuth: look.azimuth,
            elevation: look.elevation,
            range_km: look.range_km,
        }
    }
}

/// One continuous interval above the station's minimum elevation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityWindow {
    /// Acquisition of signal
    pub start: JulianDate,
    /// Loss of signal
    pub end: JulianDate,
    /// Highest elevation among the samples, in radians
    pub max_elevation: f64,
    pub max_elevation_time: JulianDate,
    /// Entry crossing, the samples above the threshold, then the exit crossing
    pub samples: Vec<PassSample>,
    /// The satellite was already visible at the first ephemeris sample
    pub clipped_start: bool,
    /// The satellite was still visible at the last ephemeris sample
    pub clipped_end: bool,
}

impl VisibilityWindow {
    pub fn duration_minutes(&self) -> f64 {
        (self.end.0 - self.start.0) * MINUTES_PER_DAY
    }

    /// Whether `time` falls inside the window, endpoints included
    pub fn contains(&self, time: JulianDate) -> bool {
        self.start <= time && time <= self.end
    }

    /// Azimuth at acquisition
    pub fn aos_azimuth(&self) -> Option<f64> {
        self.samples.first().map(|s| s.azimuth)
    }

    /// Azimuth at loss of signal
    pub fn los_azimuth(&self) -> Option<f64> {
        self.samples.last().map(|s| s.azimuth)
    }
}

impl fmt::Display for VisibilityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} ({:.1} min, max elevation {:.1}°)",
            self.start,
            self.end,
            self.duration_minutes(),
            self.max_elevation.to_degrees()
        )
    }
}

/// Window under construction
struct OpenWindow {
    samples: Vec<PassSample>,
    clipped_start: bool,
}

impl OpenWindow {
    fn close(self, clipped_end: bool) -> Option<VisibilityWindow> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let peak = self
            .samples
            .iter()
            .max_by(|a, b| a.elevation.total_cmp(&b.elevation))?;

        Some(VisibilityWindow {
            start: first.time,
            end: last.time,
            max_elevation: peak.elevation,
            max_elevation_time: peak.time,
            clipped_start: self.clipped_start,
            clipped_end,
            samples: self.samples,
        })
    }
}

/// Shortest-way interpolation of an azimuth across the 0/2π seam.
fn interpolate_azimuth(a0: f64, a1: f64, fraction: f64) -> f64 {
    let delta = (a1 - a0 + PI).rem_euclid(TAU) - PI;
    (a0 + fraction * delta).rem_euclid(TAU)
}

/// The sample where the elevation equals `threshold` between `a` and `b`.
fn crossing(a: &PassSample, b: &PassSample, threshold: f64) -> PassSample {
    let span = b.elevation - a.elevation;
    let fraction = if span == 0.0 {
        0.0
    } else {
        ((threshold - a.elevation) / span).clamp(0.0, 1.0)
    };

    PassSample {
        time: JulianDate(a.time.0 + fraction * (b.time.0 - a.time.0)),
        azimuth: interpolate_azimuth(a.azimuth, b.azimuth, fraction),
        elevation: threshold,
        range_km: a.range_km + fraction * (b.range_km - a.range_km),
    }
}

/// Visibility windows of an ephemeris over `station`.
///
/// Samples must be in increasing time order. States may be ECI or ECEF;
/// inertial states are rotated at their own epochs. An ephemeris that never
/// reaches the minimum elevation yields an empty list.
pub fn compute_pass(station: &GroundStation, ephemeris: &[StateVector]) -> Vec<VisibilityWindow> {
    let frame = StationFrame::new(station);
    let threshold = station.min_elevation;

    let mut windows = Vec::new();
    let mut open: Option<OpenWindow> = None;
    let mut previous: Option<PassSample> = None;

    for state in ephemeris {
        let sample = PassSample::new(state.epoch, &frame.look_at(state));
        if let Some(prev) = &previous {
            if sample.time <= prev.time {
                warn!(
                    "ephemeris is not increasing in time at {} (previous {})",
                    sample.time, prev.time
                );
            }
        }
        let visible = sample.elevation >= threshold;

        open = match (open.take(), visible) {
            (None, true) => {
                let mut samples = Vec::new();
                let clipped_start = match &previous {
                    Some(prev) => {
                        samples.push(crossing(prev, &sample, threshold));
                        false
                    }
                    None => true,
                };
                samples.push(sample);
                Some(OpenWindow {
                    samples,
                    clipped_start,
                })
            }
            (Some(mut window), true) => {
                window.samples.push(sample);
                Some(window)
            }
            (Some(mut window), false) => {
                if let Some(prev) = &previous {
                    window.samples.push(crossing(prev, &sample, threshold));
                }
                windows.extend(window.close(false));
                None
            }
            (None, false) => None,
        };
        previous = Some(sample);
    }

    if let Some(window) = open {
        windows.extend(window.close(true));
    }

    debug!(
        "{} visibility windows in {} samples above {:.1}°",
        windows.len(),
        ephemeris.len(),
        threshold.to_degrees()
    );
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WGS84_RADIUS_KM;
    use crate::framelib::Frame;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// ECEF samples over the equator/prime-meridian station, one per minute,
    /// at geocentric angles `from..=to` degrees in the x-z plane.
    fn overhead_arc(from: i32, to: i32) -> Vec<StateVector> {
        let r = WGS84_RADIUS_KM + 500.0;
        (from..=to)
            .enumerate()
            .map(|(i, deg)| {
                let theta = (deg as f64).to_radians();
                StateVector::new(
                    Frame::Ecef,
                    Vector3::new(r * theta.cos(), 0.0, r * theta.sin()),
                    Vector3::new(-7.6 * theta.sin(), 0.0, 7.6 * theta.cos()),
                    JulianDate::J2000.add_minutes(i as f64),
                )
            })
            .collect()
    }

    fn station() -> GroundStation {
        GroundStation::from_degrees(0.0, 0.0, 0.0, 10.0)
    }

    #[test]
    fn test_zenith_pass_single_window() {
        let ephemeris = overhead_arc(-40, 40);
        let windows = compute_pass(&station(), &ephemeris);
        assert_eq!(windows.len(), 1, "expected exactly one window");

        let w = &windows[0];
        assert_relative_eq!(w.max_elevation.to_degrees(), 90.0, epsilon = 1e-9);
        assert_eq!(w.max_elevation_time, ephemeris[40].epoch);
        assert!(w.contains(ephemeris[40].epoch), "zenith sample outside window");
        assert!(!w.clipped_start && !w.clipped_end);

        let zenith = w
            .samples
            .iter()
            .find(|s| s.time == ephemeris[40].epoch)
            .expect("zenith sample kept");
        assert_eq!(zenith.azimuth, 0.0, "azimuth placeholder at the zenith");
    }

    #[test]
    fn test_crossings_are_interpolated() {
        let ephemeris = overhead_arc(-40, 40);
        let w = &compute_pass(&station(), &ephemeris)[0];
        let entry = w.samples.first().unwrap();
        let exit = w.samples.last().unwrap();

        assert_relative_eq!(entry.elevation, 10f64.to_radians());
        assert_relative_eq!(exit.elevation, 10f64.to_radians());

        // Entry lies strictly between two ephemeris samples
        let before = ephemeris.iter().filter(|s| s.epoch < entry.time).count();
        assert!(before > 0 && before < ephemeris.len());
        assert!(ephemeris.iter().all(|s| s.epoch != entry.time));

        // Symmetric arc, symmetric window
        let mid = ephemeris[40].epoch.0;
        assert_relative_eq!(mid - entry.time.0, exit.time.0 - mid, epsilon = 1e-9);
        assert_relative_eq!(entry.range_km, exit.range_km, epsilon = 1e-6);
        assert_relative_eq!(entry.azimuth, PI, epsilon = 1e-9);
        assert_relative_eq!(exit.azimuth, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_never_visible_is_empty() {
        let low = GroundStation::from_degrees(0.0, 180.0, 0.0, 10.0);
        assert!(compute_pass(&low, &overhead_arc(-40, 40)).is_empty());
        assert!(compute_pass(&station(), &[]).is_empty());
    }

    #[test]
    fn test_window_clipped_at_ephemeris_edges() {
        let windows = compute_pass(&station(), &overhead_arc(-5, 5));
        assert_eq!(windows.len(), 1);
        let w = &windows[0];
        assert!(w.clipped_start && w.clipped_end);
        assert_eq!(w.samples.len(), 11);
        assert_relative_eq!(w.duration_minutes(), 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_two_separate_passes() {
        let mut ephemeris = overhead_arc(-40, 40);
        let gap = ephemeris.len() as f64;
        ephemeris.extend(overhead_arc(-40, 40).into_iter().map(|mut s| {
            s.epoch = s.epoch.add_minutes(gap);
            s
        }));
        let windows = compute_pass(&station(), &ephemeris);
        assert_eq!(windows.len(), 2);
        assert!(windows[0].end < windows[1].start);
    }

    #[test]
    fn test_azimuth_interpolation_wraps() {
        let a = interpolate_azimuth(350f64.to_radians(), 10f64.to_radians(), 0.5);
        assert!(a < 1e-9 || (TAU - a) < 1e-9, "got {}", a.to_degrees());
        let b = interpolate_azimuth(10f64.to_radians(), 350f64.to_radians(), 0.25);
        assert_relative_eq!(b.to_degrees(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_display() {
        let w = &compute_pass(&station(), &overhead_arc(-40, 40))[0];
        let text = w.to_string();
        assert!(text.contains("max elevation 90.0°"), "{}", text);
    }
}
