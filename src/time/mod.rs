//! Julian Dates, civil calendar input and sidereal time
//!
//! All engine times are UTC Julian Dates held in a [`JulianDate`]. UT1 − UTC
//! is ignored, which moves the Earth rotation angle by at most ~0.9 s of
//! rotation (a few hundred metres on the ground track).

mod calendar;

use std::f64::consts::TAU;
use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DAYS_PER_CENTURY, DAY_S, MINUTES_PER_DAY, T0};
use crate::{Result, SatfieldError};

pub(crate) use calendar::{days_in_month, julian_day_number};

/// Earliest calendar year accepted when no configuration is supplied
pub const DEFAULT_MIN_YEAR: i32 = 1900;

/// A UTC Julian Date.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct JulianDate(pub f64);

impl JulianDate {
    /// 2000 January 1 12:00
    pub const J2000: JulianDate = JulianDate(T0);

    pub fn new(jd: f64) -> Self {
        JulianDate(jd)
    }

    /// The raw Julian Date
    pub fn value(self) -> f64 {
        self.0
    }

    /// Validate and convert a calendar time using [`DEFAULT_MIN_YEAR`].
    pub fn from_calendar(calendar: &CalendarTime) -> Result<Self> {
        to_julian_date(calendar, DEFAULT_MIN_YEAR)
    }

    /// Convert a chrono UTC timestamp.
    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        calendar_to_jd(&CalendarTime::from(dt))
    }

    /// Epoch of a TLE: a four-digit year and a fractional day of year, where
    /// 1.0 is January 1 00:00.
    pub fn from_tle_epoch(year: i32, day_of_year: f64) -> Self {
        let day = day_of_year.floor();
        let jdn = julian_day_number(year, 1, day as i32);
        JulianDate(jdn as f64 - 0.5 + (day_of_year - day))
    }

    /// Convert back to a chrono timestamp (microsecond resolution).
    ///
    /// Returns `None` outside chrono's representable range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let shifted = self.0 + 0.5;
        let jdn = shifted.floor();
        let (year, month, day) = calendar::calendar_date(jdn as i64);
        let micros = ((shifted - jdn) * DAY_S * 1e6).round() as i64;
        let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
        Some(Utc.from_utc_datetime(&(midnight + Duration::microseconds(micros))))
    }

    pub fn add_days(self, days: f64) -> Self {
        JulianDate(self.0 + days)
    }

    pub fn add_minutes(self, minutes: f64) -> Self {
        JulianDate(self.0 + minutes / MINUTES_PER_DAY)
    }

    pub fn add_seconds(self, seconds: f64) -> Self {
        JulianDate(self.0 + seconds / DAY_S)
    }

    /// Minutes elapsed since `epoch` (negative before it)
    pub fn minutes_since(self, epoch: JulianDate) -> f64 {
        (self.0 - epoch.0) * MINUTES_PER_DAY
    }

    /// Greenwich Mean Sidereal Time in radians [0, 2π)
    pub fn gmst(self) -> f64 {
        julian_date_to_gmst(self)
    }
}

impl fmt::Display for JulianDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{} UTC", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "JD {:.6}", self.0),
        }
    }
}

/// A civil UTC date and time of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

impl CalendarTime {
    pub fn new(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: f64) -> Self {
        CalendarTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Midnight at the start of a date
    pub fn date(year: i32, month: u32, day: u32) -> Self {
        Self::new(year, month, day, 0, 0, 0.0)
    }

    /// Check every component against the Gregorian calendar.
    pub fn validate(&self, min_year: i32) -> Result<()> {
        if self.year < min_year {
            return Err(SatfieldError::InvalidTime(format!(
                "year {} is before the minimum year {}",
                self.year, min_year
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(SatfieldError::InvalidTime(format!(
                "month {} outside 1-12",
                self.month
            )));
        }
        let month_length = days_in_month(self.year, self.month);
        if self.day < 1 || self.day > month_length {
            return Err(SatfieldError::InvalidTime(format!(
                "day {} outside 1-{} for {:04}-{:02}",
                self.day, month_length, self.year, self.month
            )));
        }
        if self.hour > 23 {
            return Err(SatfieldError::InvalidTime(format!(
                "hour {} outside 0-23",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(SatfieldError::InvalidTime(format!(
                "minute {} outside 0-59",
                self.minute
            )));
        }
        if !(0.0..60.0).contains(&self.second) {
            return Err(SatfieldError::InvalidTime(format!(
                "second {} outside [0, 60)",
                self.second
            )));
        }
        Ok(())
    }
}

impl From<&DateTime<Utc>> for CalendarTime {
    fn from(dt: &DateTime<Utc>) -> Self {
        CalendarTime {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second() as f64 + dt.nanosecond() as f64 / 1e9,
        }
    }
}

/// Convert a validated calendar time to a Julian Date.
///
/// Fails with `InvalidTime` if any component is out of range or the year is
/// before `min_year`.
pub fn to_julian_date(calendar: &CalendarTime, min_year: i32) -> Result<JulianDate> {
    calendar.validate(min_year)?;
    Ok(calendar_to_jd(calendar))
}

fn calendar_to_jd(calendar: &CalendarTime) -> JulianDate {
    let jdn = julian_day_number(calendar.year, calendar.month as i32, calendar.day as i32);
    let day_fraction = (calendar.hour as f64
        + (calendar.minute as f64 + calendar.second / 60.0) / 60.0)
        / 24.0;
    JulianDate(jdn as f64 - 0.5 + day_fraction)
}

/// Greenwich Mean Sidereal Time (IAU 1982) in radians [0, 2π).
pub fn julian_date_to_gmst(jd: JulianDate) -> f64 {
    let whole = jd.0.floor();
    gmst1982(whole, jd.0 - whole).0
}

/// Greenwich Mean Sidereal Time, 1982 formulation
///
/// Returns (theta, theta_dot) where:
/// - theta is the GMST angle in radians [0, 2π)
/// - theta_dot is the angular velocity in radians/day
///
/// Splitting the date into whole and fractional parts keeps the fractional
/// day at full precision.
pub fn gmst1982(jd_ut1: f64, frac_ut1: f64) -> (f64, f64) {
    let t = (jd_ut1 - T0 + frac_ut1) / DAYS_PER_CENTURY;

    // Seconds of time
    let g = 67310.54841 + (8640184.812866 + (0.093104 + (-6.2e-6) * t) * t) * t;
    let dg = 8640184.812866 + (0.093104 * 2.0 + (-6.2e-6 * 3.0) * t) * t;

    let theta = ((jd_ut1 % 1.0 + frac_ut1 + g / DAY_S) % 1.0).rem_euclid(1.0) * TAU;
    let theta_dot = (1.0 + dg / (DAY_S * DAYS_PER_CENTURY)) * TAU;

    (theta, theta_dot)
}

/// Days elapsed from `epoch` to `jd` (negative before the epoch).
pub fn days_since_epoch(jd: JulianDate, epoch: JulianDate) -> f64 {
    jd.0 - epoch.0
}
