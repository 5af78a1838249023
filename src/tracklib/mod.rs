//! Ephemeris sampling and ground tracks
//!
//! Helpers that turn a [`PropagatorContext`] into ordered lists of states,
//! the input expected by [`crate::passlib::compute_pass`], and reduce those
//! states to geodetic ground tracks ready for drawing on a map.

use log::trace;

use crate::config::EphemerisConfig;
use crate::constants::MINUTES_PER_DAY;
use crate::framelib::StateVector;
use crate::sgp4lib::PropagatorContext;
use crate::time::JulianDate;
use crate::toposlib::GeodeticPosition;
use crate::{to_geodetic, Result, SatfieldError};

use std::f64::consts::PI;

/// Julian dates near the present carry about 1e-6 min of rounding
const TIME_SLOP_MINUTES: f64 = 1e-5;

/// Upper bound on the states one ephemeris request may allocate
pub const MAX_EPHEMERIS_SAMPLES: usize = 10_000_000;

/// `count` evenly spaced ECI states from `start` over `span_minutes`,
/// both ends included.
fn evenly_spaced(
    ctx: &PropagatorContext,
    start: JulianDate,
    span_minutes: f64,
    count: usize,
) -> Result<Vec<StateVector>> {
    if count > MAX_EPHEMERIS_SAMPLES {
        return Err(SatfieldError::InvalidTime(format!(
            "{} samples requested, at most {} allowed",
            count, MAX_EPHEMERIS_SAMPLES
        )));
    }
    let count = count.max(2);
    let step = span_minutes / (count - 1) as f64;
    trace!(
        "sampling {} states over {:.3} min from {}",
        count,
        span_minutes,
        start
    );
    (0..count)
        .map(|i| ctx.propagate(start.add_minutes(step * i as f64)))
        .collect()
}

/// ECI states from `start` to `end` every `step_minutes`.
///
/// The final sample lands exactly on `end` even when the span is not a
/// whole number of steps.
pub fn sample_ephemeris(
    ctx: &PropagatorContext,
    start: JulianDate,
    end: JulianDate,
    step_minutes: f64,
) -> Result<Vec<StateVector>> {
    if !(step_minutes.is_finite() && step_minutes > 0.0) {
        return Err(SatfieldError::InvalidTime(format!(
            "ephemeris step must be positive, got {} min",
            step_minutes
        )));
    }
    if !(start.0.is_finite() && end.0.is_finite()) || end < start {
        return Err(SatfieldError::InvalidTime(format!(
            "ephemeris span {} to {} is not increasing",
            start, end
        )));
    }

    let span = (end.0 - start.0) * MINUTES_PER_DAY;
    let steps = ((span + TIME_SLOP_MINUTES) / step_minutes).floor();
    if !steps.is_finite() || steps >= MAX_EPHEMERIS_SAMPLES as f64 {
        return Err(SatfieldError::InvalidTime(format!(
            "{:.3} min at {} min steps needs more than {} samples",
            span, step_minutes, MAX_EPHEMERIS_SAMPLES
        )));
    }
    let whole_steps = steps as usize;

    let mut states = Vec::with_capacity(whole_steps + 2);
    for i in 0..=whole_steps {
        states.push(ctx.propagate(start.add_minutes(step_minutes * i as f64))?);
    }
    if span - whole_steps as f64 * step_minutes > TIME_SLOP_MINUTES {
        states.push(ctx.propagate(end)?);
    }

    trace!("{} ephemeris samples at {} min", states.len(), step_minutes);
    Ok(states)
}

/// States covering `revolutions` orbital periods from `start`.
///
/// The sample count scales with the number of revolutions but never drops
/// below the configured minimum.
pub fn sample_revolutions(
    ctx: &PropagatorContext,
    start: JulianDate,
    revolutions: f64,
    config: &EphemerisConfig,
) -> Result<Vec<StateVector>> {
    if !(revolutions.is_finite() && revolutions > 0.0) {
        return Err(SatfieldError::InvalidTime(format!(
            "revolution count must be positive, got {}",
            revolutions
        )));
    }

    let scaled = (config.samples_per_orbit as f64 * revolutions).ceil();
    if scaled > MAX_EPHEMERIS_SAMPLES as f64 {
        return Err(SatfieldError::InvalidTime(format!(
            "{} revolutions at {} samples per orbit exceeds {} samples",
            revolutions, config.samples_per_orbit, MAX_EPHEMERIS_SAMPLES
        )));
    }
    let count = (scaled as usize).max(config.min_samples);
    evenly_spaced(ctx, start, ctx.period_minutes() * revolutions, count)
}

/// One revolution of states centred on `now`.
pub fn live_window(
    ctx: &PropagatorContext,
    now: JulianDate,
    samples: usize,
) -> Result<Vec<StateVector>> {
    let period = ctx.period_minutes();
    evenly_spaced(ctx, now.add_minutes(-period / 2.0), period, samples)
}

/// Sub-satellite points of an ephemeris on the WGS84 ellipsoid.
pub fn ground_track(states: &[StateVector]) -> Vec<GeodeticPosition> {
    states.iter().map(to_geodetic).collect()
}

/// Break a ground track into segments that never cross the ±180° meridian.
///
/// A new segment starts wherever consecutive longitudes differ by more than
/// π, so a line drawn through each segment stays on the map.
pub fn split_at_antimeridian(track: &[GeodeticPosition]) -> Vec<Vec<GeodeticPosition>> {
    let mut segments: Vec<Vec<GeodeticPosition>> = Vec::new();
    let mut current: Vec<GeodeticPosition> = Vec::new();

    for point in track {
        if let Some(last) = current.last() {
            if (point.longitude - last.longitude).abs() > PI {
                segments.push(std::mem::take(&mut current));
            }
        }
        current.push(*point);
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}
