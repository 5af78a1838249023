//! Gregorian calendar arithmetic on integer Julian day numbers

/// Julian day number (noon-based) of a proleptic Gregorian date.
///
/// The day may be zero or exceed the month length; the result is linear in
/// `day`, which the TLE day-of-year epoch relies on.
pub(crate) fn julian_day_number(year: i32, month: i32, day: i32) -> i64 {
    let (year, month, day) = (year as i64, month as i64, day as i64);
    let janfeb = if month < 3 { 1 } else { 0 };
    1461 * (year + 4800 - janfeb) / 4 + 367 * (month - 2 + 12 * janfeb) / 12
        - 3 * ((year + 4900 - janfeb) / 100) / 4
        - 32075
        + day
}

/// Calendar date (year, month, day) of a Julian day number.
///
/// Explanatory Supplement to the Astronomical Almanac, 15.11.
pub(crate) fn calendar_date(jdn: i64) -> (i32, u32, u32) {
    let f = jdn + 1401 + ((4 * jdn + 274_277) / 146_097 * 3 / 4 - 38);
    let e = 4 * f + 3;
    let g = (e % 1461) / 4;
    let h = 5 * g + 2;
    let day = (h % 153) / 5 + 1;
    let month = (h / 153 + 2) % 12 + 1;
    let year = e / 1461 - 4716 + (12 + 2 - month) / 12;
    (year as i32, month as u32, day as u32)
}

pub(crate) fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}
