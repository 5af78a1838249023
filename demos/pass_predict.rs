//! Pass prediction for a ground station
//!
//! Loads one or more TLEs, lists every visibility window over the station in
//! the requested span, and prints a ground-track summary for the first
//! satellite.
//!
//! Run with: cargo run --example pass_predict -- --lat 47.6 --lon -122.3
//! Set RUST_LOG=debug to see context-build details.

use std::path::PathBuf;

use chrono::{Datelike, NaiveDateTime, Timelike};
use clap::Parser;
use satfield::sgp4lib::EarthSatellite;
use satfield::time::{CalendarTime, JulianDate};
use satfield::toposlib::GroundStation;
use satfield::tracklib;
use satfield::EngineConfig;

// ISS element set from August 2025
const ISS_LINE1: &str = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
const ISS_LINE2: &str = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";

#[derive(Parser)]
#[command(name = "pass_predict")]
#[command(about = "Predict satellite passes over a ground station")]
struct Args {
    /// Station geodetic latitude in degrees
    #[arg(long, default_value = "47.6062", allow_hyphen_values = true)]
    lat: f64,

    /// Station longitude in degrees, east positive
    #[arg(long, default_value = "-122.3321", allow_hyphen_values = true)]
    lon: f64,

    /// Station height above the ellipsoid in km
    #[arg(long, default_value = "0.05")]
    alt_km: f64,

    /// Minimum elevation in degrees
    #[arg(long, default_value = "10.0")]
    min_elevation: f64,

    /// Search start as "YYYY-MM-DD HH:MM:SS" UTC; the element-set epoch otherwise
    #[arg(long)]
    start: Option<String>,

    /// Hours to search from the start
    #[arg(long, default_value = "24.0")]
    hours: f64,

    /// Sampling step in minutes
    #[arg(long, default_value = "0.5")]
    step: f64,

    /// TLE file (two- or three-line format); the built-in ISS set otherwise
    #[arg(long)]
    tle: Option<PathBuf>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print windows as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };

    let satellites = match &args.tle {
        Some(path) => EarthSatellite::load_all(&std::fs::read_to_string(path)?, &config)?,
        None => vec![EarthSatellite::from_tle_with_config(
            ISS_LINE1,
            ISS_LINE2,
            Some("ISS (ZARYA)"),
            &config,
        )?],
    };

    let start = match &args.start {
        Some(text) => {
            let dt = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")?;
            Some(config.to_julian_date(&CalendarTime::new(
                dt.year(),
                dt.month(),
                dt.day(),
                dt.hour(),
                dt.minute(),
                dt.second() as f64,
            ))?)
        }
        None => None,
    };

    let station = GroundStation::from_degrees(args.lat, args.lon, args.alt_km, args.min_elevation);

    for sat in &satellites {
        let start = start.unwrap_or_else(|| sat.epoch());
        let end = start.add_minutes(args.hours * 60.0);
        let windows = sat.passes(&station, start, end, args.step)?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&windows)?);
            continue;
        }

        println!("=== {} ===", sat);
        println!(
            "Branch: {}  period {:.1} min",
            sat.context().branch().name(),
            sat.context().period_minutes()
        );
        if windows.is_empty() {
            println!("  no passes above {:.1}°", args.min_elevation);
        }
        for w in &windows {
            println!(
                "  {}  {:5.1} min  max el {:5.1}°  az {:5.1}° → {:5.1}°",
                w.start,
                w.duration_minutes(),
                w.max_elevation.to_degrees(),
                w.aos_azimuth().unwrap_or(0.0).to_degrees(),
                w.los_azimuth().unwrap_or(0.0).to_degrees()
            );
        }
        println!();
    }

    if let Some(first) = satellites.first() {
        let now: JulianDate = first.epoch();
        let states = tracklib::live_window(first.context(), now, 120)?;
        let segments = tracklib::split_at_antimeridian(&tracklib::ground_track(&states));
        println!("Ground track around epoch: {} segment(s)", segments.len());
        for segment in &segments {
            if let (Some(a), Some(b)) = (segment.first(), segment.last()) {
                println!(
                    "  ({:7.2}°, {:8.2}°) → ({:7.2}°, {:8.2}°)",
                    a.latitude_deg(),
                    a.longitude_deg(),
                    b.latitude_deg(),
                    b.longitude_deg()
                );
            }
        }
    }

    Ok(())
}
