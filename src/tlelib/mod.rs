//! NORAD two-line element sets
//!
//! Parsing is strictly column-positional: TLE fields may touch without a
//! separating blank, so nothing here splits on whitespace. Exponent fields
//! (second derivative of mean motion and the drag term) carry an implied
//! leading decimal point and a signed single-digit power of ten, and are
//! decoded by hand rather than handed to the float parser.
//!
//! # Example
//!
//! ```ignore
//! use satfield::tlelib;
//!
//! let line1 = "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
//! let line2 = "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";
//!
//! let tle = tlelib::parse(line1, line2)?;
//! assert_eq!(tle.catalog_number, 25544);
//! assert_eq!(tle.to_lines()?, (line1.to_string(), line2.to_string()));
//! ```

use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::time::JulianDate;
use crate::{Result, SatfieldError};

/// Length of each TLE line including the checksum column
pub const TLE_LINE_LENGTH: usize = 69;

/// Two-digit epoch years below this belong to the 2000s
const YEAR_PIVOT: u32 = 57;

/// One parsed element set. Angles stay in degrees, as written in the TLE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TleRecord {
    /// Object name from a preceding title line, if any
    pub name: Option<String>,
    pub catalog_number: u32,
    pub classification: char,
    /// Launch year, launch number and piece, e.g. `98067A`
    pub international_designator: String,
    /// Four-digit epoch year
    pub epoch_year: i32,
    /// Fractional day of year, 1.0 being January 1 00:00
    pub epoch_day: f64,
    /// Epoch as a UTC Julian Date
    pub epoch: JulianDate,
    /// First derivative of mean motion divided by two (rev/day²)
    pub mean_motion_dot: f64,
    /// Second derivative of mean motion divided by six (rev/day³)
    pub mean_motion_ddot: f64,
    /// Drag term (1/earth radii)
    pub bstar: f64,
    pub ephemeris_type: u8,
    pub element_set_number: u32,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub eccentricity: f64,
    pub arg_perigee_deg: f64,
    pub mean_anomaly_deg: f64,
    /// Mean motion (rev/day)
    pub mean_motion: f64,
    pub revolution_number: u32,
    pub checksum1: u8,
    pub checksum2: u8,
}

impl TleRecord {
    /// Attach an object name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Encode back into the two NORAD lines, recomputing both checksums.
    ///
    /// Fails with `InvalidElements` if a field cannot be represented in its
    /// fixed-width column (for example a mean motion of 100 rev/day or more).
    pub fn to_lines(&self) -> Result<(String, String)> {
        if self.international_designator.len() > 8 {
            return Err(SatfieldError::InvalidElements(format!(
                "international designator {:?} is wider than 8 columns",
                self.international_designator
            )));
        }

        let body1 = format!(
            "1 {:05}{} {:<8} {:02}{:012.8} {} {} {} {} {:>4}",
            self.catalog_number,
            self.classification,
            self.international_designator,
            self.epoch_year.rem_euclid(100),
            self.epoch_day,
            encode_decimal_field(self.mean_motion_dot, "mean motion derivative")?,
            encode_exponent_field(self.mean_motion_ddot, "mean motion second derivative")?,
            encode_exponent_field(self.bstar, "drag term")?,
            self.ephemeris_type,
            self.element_set_number,
        );

        let scaled_ecc = (self.eccentricity * 1e7).round();
        if !(0.0..1e7).contains(&scaled_ecc) {
            return Err(SatfieldError::InvalidElements(format!(
                "eccentricity {} cannot be written as seven implied-decimal digits",
                self.eccentricity
            )));
        }
        let body2 = format!(
            "2 {:05} {:8.4} {:8.4} {:07} {:8.4} {:8.4} {:11.8}{:5}",
            self.catalog_number,
            self.inclination_deg,
            self.raan_deg,
            scaled_ecc as u32,
            self.arg_perigee_deg,
            self.mean_anomaly_deg,
            self.mean_motion,
            self.revolution_number % 100_000,
        );

        for (number, body) in [(1, &body1), (2, &body2)] {
            if body.len() != TLE_LINE_LENGTH - 1 {
                return Err(SatfieldError::InvalidElements(format!(
                    "line {} fields do not fit the column layout: {:?}",
                    number, body
                )));
            }
        }

        let line1 = format!("{}{}", body1, checksum(&body1));
        let line2 = format!("{}{}", body2, checksum(&body2));
        Ok((line1, line2))
    }
}

/// Mod-10 checksum of the first 68 columns: the sum of the digits plus one
/// for each minus sign.
pub fn checksum(line: &str) -> u8 {
    let sum: u32 = line
        .chars()
        .take(TLE_LINE_LENGTH - 1)
        .map(|c| match c {
            '0'..='9' => c as u32 - '0' as u32,
            '-' => 1,
            _ => 0,
        })
        .sum();
    (sum % 10) as u8
}

/// Parse a two-line element set.
pub fn parse(line1: &str, line2: &str) -> Result<TleRecord> {
    let line1 = check_line(line1, 1)?;
    let line2 = check_line(line2, 2)?;

    let catalog_number: u32 = parse_number(line1, 1, 2..7, "catalog number")?;
    let catalog_number2: u32 = parse_number(line2, 2, 2..7, "catalog number")?;
    if catalog_number != catalog_number2 {
        return Err(SatfieldError::MalformedTle(format!(
            "catalog numbers differ between lines: {} and {}",
            catalog_number, catalog_number2
        )));
    }

    let classification = line1[7..8].chars().next().unwrap_or('U');
    let international_designator = line1[9..17].trim().to_string();

    let two_digit_year: u32 = parse_number(line1, 1, 18..20, "epoch year")?;
    let epoch_year = if two_digit_year < YEAR_PIVOT {
        2000 + two_digit_year as i32
    } else {
        1900 + two_digit_year as i32
    };
    let epoch_day: f64 = parse_number(line1, 1, 20..32, "epoch day")?;
    if !(1.0..367.0).contains(&epoch_day) {
        return Err(SatfieldError::MalformedTle(format!(
            "epoch day {} outside 1-366",
            epoch_day
        )));
    }

    let mean_motion_dot: f64 = parse_number(line1, 1, 33..43, "mean motion derivative")?;
    let mean_motion_ddot = decode_exponent_field(line1, 1, 44..52, "mean motion second derivative")?;
    let bstar = decode_exponent_field(line1, 1, 53..61, "drag term")?;
    let ephemeris_type: u8 = parse_optional(line1, 1, 62..63, "ephemeris type")?;
    let element_set_number: u32 = parse_optional(line1, 1, 64..68, "element set number")?;

    let inclination_deg: f64 = parse_number(line2, 2, 8..16, "inclination")?;
    if !(0.0..=180.0).contains(&inclination_deg) {
        return Err(SatfieldError::MalformedTle(format!(
            "inclination {} deg outside 0-180",
            inclination_deg
        )));
    }
    let raan_deg: f64 = parse_number(line2, 2, 17..25, "right ascension of ascending node")?;
    let eccentricity = decode_implied_decimal(line2, 2, 26..33, "eccentricity")?;
    let arg_perigee_deg: f64 = parse_number(line2, 2, 34..42, "argument of perigee")?;
    let mean_anomaly_deg: f64 = parse_number(line2, 2, 43..51, "mean anomaly")?;
    let mean_motion: f64 = parse_number(line2, 2, 52..63, "mean motion")?;
    let revolution_number: u32 = parse_optional(line2, 2, 63..68, "revolution number")?;

    let record = TleRecord {
        name: None,
        catalog_number,
        classification,
        international_designator,
        epoch_year,
        epoch_day,
        epoch: JulianDate::from_tle_epoch(epoch_year, epoch_day),
        mean_motion_dot,
        mean_motion_ddot,
        bstar,
        ephemeris_type,
        element_set_number,
        inclination_deg,
        raan_deg,
        eccentricity,
        arg_perigee_deg,
        mean_anomaly_deg,
        mean_motion,
        revolution_number,
        checksum1: checksum(line1),
        checksum2: checksum(line2),
    };

    debug!(
        "parsed TLE #{} epoch {} (n = {} rev/day, e = {})",
        record.catalog_number, record.epoch, record.mean_motion, record.eccentricity
    );

    Ok(record)
}

/// Parse every element set in a block of text.
///
/// Accepts three-line records (a title line followed by the two element
/// lines, with or without the `0 ` title prefix) and bare two-line records,
/// mixed freely. Blank lines are ignored.
pub fn parse_tle_file(text: &str) -> Result<Vec<TleRecord>> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    let mut records = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (name, first) = if lines[i].starts_with("1 ") {
            (None, i)
        } else {
            let title = lines[i].strip_prefix("0 ").unwrap_or(lines[i]).trim();
            (Some(title), i + 1)
        };

        if first + 1 >= lines.len() {
            return Err(SatfieldError::MalformedTle(format!(
                "incomplete element set starting at {:?}",
                lines[i]
            )));
        }

        let mut record = parse(lines[first], lines[first + 1])?;
        if let Some(title) = name {
            record = record.with_name(title);
        }
        records.push(record);
        i = first + 2;
    }

    Ok(records)
}

fn check_line(line: &str, number: u8) -> Result<&str> {
    let line = line.trim_end();
    if !line.is_ascii() {
        return Err(SatfieldError::MalformedTle(format!(
            "line {} contains non-ASCII characters",
            number
        )));
    }
    if line.len() != TLE_LINE_LENGTH {
        return Err(SatfieldError::MalformedTle(format!(
            "line {} has {} characters, expected {}",
            number,
            line.len(),
            TLE_LINE_LENGTH
        )));
    }
    let marker = (b'0' + number) as char;
    if !line.starts_with(marker) {
        return Err(SatfieldError::MalformedTle(format!(
            "line {} must start with '{}', found {:?}",
            number,
            marker,
            &line[..1]
        )));
    }

    let expected = line[68..]
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(|| SatfieldError::FieldParseError {
            line: number,
            field: "checksum",
            text: line[68..].to_string(),
        })? as u8;
    let computed = checksum(line);
    if expected != computed {
        return Err(SatfieldError::ChecksumMismatch {
            line: number,
            expected,
            computed,
        });
    }

    Ok(line)
}

fn field_error(line: u8, field: &'static str, text: &str) -> SatfieldError {
    SatfieldError::FieldParseError {
        line,
        field,
        text: text.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(
    line: &str,
    number: u8,
    columns: Range<usize>,
    field: &'static str,
) -> Result<T> {
    let text = &line[columns];
    // Rust's float parser also accepts `inf` and `NaN`
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b' '))
    {
        return Err(field_error(number, field, text));
    }
    text.trim()
        .parse()
        .map_err(|_| field_error(number, field, text))
}

/// Like `parse_number`, but a blank field reads as zero.
fn parse_optional<T: std::str::FromStr + Default>(
    line: &str,
    number: u8,
    columns: Range<usize>,
    field: &'static str,
) -> Result<T> {
    if line[columns.clone()].trim().is_empty() {
        Ok(T::default())
    } else {
        parse_number(line, number, columns, field)
    }
}

/// Digits with an implied leading `0.`, e.g. `0003499` → 0.0003499
fn decode_implied_decimal(
    line: &str,
    number: u8,
    columns: Range<usize>,
    field: &'static str,
) -> Result<f64> {
    let text = &line[columns];
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(field_error(number, field, text));
    }
    format!("0.{}", digits)
        .parse()
        .map_err(|_| field_error(number, field, text))
}

/// Decode an exponent field such as ` 17645-3` (0.17645e-3) or `-11606-4`.
///
/// A blank field reads as zero.
fn decode_exponent_field(
    line: &str,
    number: u8,
    columns: Range<usize>,
    field: &'static str,
) -> Result<f64> {
    let text = &line[columns];
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let (sign, rest) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, &trimmed[1..]),
        b'+' => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    if rest.len() < 3 {
        return Err(field_error(number, field, text));
    }

    let (mantissa, exponent) = rest.split_at(rest.len() - 2);
    let exponent_sign = match exponent.as_bytes()[0] {
        b'-' => -1,
        b'+' | b' ' => 1,
        _ => return Err(field_error(number, field, text)),
    };
    let exponent_digit = exponent[1..]
        .parse::<i32>()
        .map_err(|_| field_error(number, field, text))?;
    if !mantissa.bytes().all(|b| b.is_ascii_digit()) {
        return Err(field_error(number, field, text));
    }

    let mantissa: f64 = format!("0.{}", mantissa)
        .parse()
        .map_err(|_| field_error(number, field, text))?;
    Ok(sign * mantissa * 10f64.powi(exponent_sign * exponent_digit))
}

/// Ten columns: sign or blank, then `.dddddddd`
fn encode_decimal_field(value: f64, field: &str) -> Result<String> {
    let digits = format!("{:.8}", value.abs());
    match digits.strip_prefix('0') {
        Some(fraction) => Ok(format!("{}{}", if value < 0.0 { '-' } else { ' ' }, fraction)),
        None => Err(SatfieldError::InvalidElements(format!(
            "{} {} must be smaller than 1 in magnitude",
            field, value
        ))),
    }
}

/// Eight columns: sign or blank, five mantissa digits, signed exponent
fn encode_exponent_field(value: f64, field: &str) -> Result<String> {
    if value == 0.0 {
        return Ok(" 00000-0".to_string());
    }

    let magnitude = value.abs();
    let mut exponent = magnitude.log10().floor() as i32 + 1;
    let mut mantissa = (magnitude / 10f64.powi(exponent) * 1e5).round() as u32;
    if mantissa >= 100_000 {
        mantissa /= 10;
        exponent += 1;
    }
    if !(-9..=9).contains(&exponent) {
        return Err(SatfieldError::InvalidElements(format!(
            "{} {} is out of range for an exponent field",
            field, value
        )));
    }

    Ok(format!(
        "{}{:05}{}{}",
        if value < 0.0 { '-' } else { ' ' },
        mantissa,
        if exponent < 0 { '-' } else { '+' },
        exponent.abs()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const ISS_LINE1: &str =
        "1 25544U 98067A   25229.18034946  .00009619  00000-0  17645-3 0  9996";
    const ISS_LINE2: &str =
        "2 25544  51.6356   4.7550 0003499 229.5075 130.5609 15.49975761524621";

    const VANGUARD_LINE1: &str =
        "1 00005U 58002B   00179.78495062  .00000023  00000-0  28098-4 0  4753";
    const VANGUARD_LINE2: &str =
        "2 00005  34.2682 348.7242 1859667 331.7664  19.3264 10.82419157413667";

    const MOLNIYA_LINE1: &str =
        "1 11801U          80230.29629788  .01431103  00000-0  14311-1      13";
    const MOLNIYA_LINE2: &str =
        "2 11801  46.7916 230.4354 7318036  47.4722  10.4117  2.28537848    13";

    /// Replace the checksum digit of a line
    fn with_checksum(line: &str, digit: u8) -> String {
        format!("{}{}", &line[..68], digit)
    }

    #[test]
    fn test_parse_iss() {
        let tle = parse(ISS_LINE1, ISS_LINE2).expect("Failed to parse TLE");

        assert_eq!(tle.catalog_number, 25544);
        assert_eq!(tle.classification, 'U');
        assert_eq!(tle.international_designator, "98067A");
        assert_eq!(tle.epoch_year, 2025);
        assert_relative_eq!(tle.epoch_day, 229.180_349_46);
        assert_relative_eq!(tle.epoch.value(), 2_460_904.680_349_46, epsilon = 1e-8);
        assert_relative_eq!(tle.mean_motion_dot, 0.000_096_19);
        assert_relative_eq!(tle.mean_motion_ddot, 0.0);
        assert_relative_eq!(tle.bstar, 0.176_45e-3, max_relative = 1e-12);
        assert_eq!(tle.ephemeris_type, 0);
        assert_eq!(tle.element_set_number, 999);
        assert_relative_eq!(tle.inclination_deg, 51.6356);
        assert_relative_eq!(tle.raan_deg, 4.755);
        assert_relative_eq!(tle.eccentricity, 0.000_349_9);
        assert_relative_eq!(tle.arg_perigee_deg, 229.5075);
        assert_relative_eq!(tle.mean_anomaly_deg, 130.5609);
        assert_relative_eq!(tle.mean_motion, 15.499_757_61);
        assert_eq!(tle.revolution_number, 52462);
        assert_eq!(tle.checksum1, 6);
        assert_eq!(tle.checksum2, 1);
        assert_eq!(tle.name, None);
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(ISS_LINE1), 6);
        assert_eq!(checksum(ISS_LINE2), 1);
        assert_eq!(checksum(VANGUARD_LINE1), 3);
        // Minus signs count as one
        assert_eq!(checksum("1 -- "), 3);
    }

    #[test]
    fn test_corrupted_checksum_is_rejected() {
        for digit in 0..10u8 {
            if digit == 6 {
                continue;
            }
            let bad = with_checksum(ISS_LINE1, digit);
            match parse(&bad, ISS_LINE2) {
                Err(SatfieldError::ChecksumMismatch {
                    line,
                    expected,
                    computed,
                }) => {
                    assert_eq!(line, 1);
                    assert_eq!(expected, digit);
                    assert_eq!(computed, 6);
                }
                other => panic!("expected ChecksumMismatch, got {:?}", other),
            }
        }

        let bad = with_checksum(ISS_LINE2, 2);
        assert!(matches!(
            parse(ISS_LINE1, &bad),
            Err(SatfieldError::ChecksumMismatch { line: 2, .. })
        ));
    }

    #[test]
    fn test_corrupted_field_breaks_checksum() {
        // Change the inclination without updating column 69
        let bad = ISS_LINE2.replace("51.6356", "51.6357");
        assert!(matches!(
            parse(ISS_LINE1, &bad),
            Err(SatfieldError::ChecksumMismatch { line: 2, .. })
        ));
    }

    #[test]
    fn test_wrong_length_is_malformed() {
        let short = &ISS_LINE1[..68];
        assert!(matches!(
            parse(short, ISS_LINE2),
            Err(SatfieldError::MalformedTle(_))
        ));

        let long = format!("{}0", ISS_LINE2);
        assert!(matches!(
            parse(ISS_LINE1, &long),
            Err(SatfieldError::MalformedTle(_))
        ));
    }

    #[test]
    fn test_trailing_whitespace_is_ignored() {
        let l1 = format!("{}  \r", ISS_LINE1);
        let tle = parse(&l1, ISS_LINE2).expect("trailing whitespace should be trimmed");
        assert_eq!(tle.catalog_number, 25544);
    }

    #[test]
    fn test_swapped_lines_are_malformed() {
        assert!(matches!(
            parse(ISS_LINE2, ISS_LINE1),
            Err(SatfieldError::MalformedTle(_))
        ));
    }

    #[test]
    fn test_mismatched_catalog_numbers() {
        assert!(matches!(
            parse(ISS_LINE1, VANGUARD_LINE2),
            Err(SatfieldError::MalformedTle(_))
        ));
    }

    #[test]
    fn test_non_numeric_field() {
        // Letter in the inclination, checksum recomputed so parsing reaches the field
        let body = ISS_LINE2[..68].replace("51.6356", "51.6a56");
        let line2 = format!("{}{}", body, checksum(&body));
        match parse(ISS_LINE1, &line2) {
            Err(SatfieldError::FieldParseError { line, field, text }) => {
                assert_eq!(line, 2);
                assert_eq!(field, "inclination");
                assert_eq!(text, " 51.6a56");
            }
            other => panic!("expected FieldParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_fields_are_rejected() {
        let with_field = |line: &str, columns: Range<usize>, text: &str| {
            let mut body = line[..68].to_string();
            body.replace_range(columns, text);
            format!("{}{}", body, checksum(&body))
        };

        for text in ["     inf", "     NaN", "infinity"] {
            let line2 = with_field(ISS_LINE2, 17..25, text);
            match parse(ISS_LINE1, &line2) {
                Err(SatfieldError::FieldParseError { line: 2, field, .. }) => {
                    assert_eq!(field, "right ascension of ascending node")
                }
                other => panic!("RAAN {:?} should not parse, got {:?}", text, other),
            }
        }

        for text in ["       NaN", "      -inf"] {
            let line1 = with_field(ISS_LINE1, 33..43, text);
            match parse(&line1, ISS_LINE2) {
                Err(SatfieldError::FieldParseError { line: 1, field, .. }) => {
                    assert_eq!(field, "mean motion derivative")
                }
                other => panic!("mean motion derivative {:?} should not parse, got {:?}", text, other),
            }
        }
    }

    #[test]
    fn test_bad_exponent_field() {
        let body = ISS_LINE1[..68].replace(" 17645-3", " 17645x3");
        let line1 = format!("{}{}", body, checksum(&body));
        assert!(matches!(
            parse(&line1, ISS_LINE2),
            Err(SatfieldError::FieldParseError {
                line: 1,
                field: "drag term",
                ..
            })
        ));
    }

    #[test]
    fn test_exponent_field_decoding() {
        let decode = |text: &str| decode_exponent_field(text, 1, 0..text.len(), "test").unwrap();
        assert_relative_eq!(decode(" 17645-3"), 1.7645e-4, max_relative = 1e-12);
        assert_relative_eq!(decode("-11606-4"), -1.1606e-5, max_relative = 1e-12);
        assert_relative_eq!(decode(" 12345+1"), 1.2345, max_relative = 1e-12);
        assert_relative_eq!(decode(" 00000-0"), 0.0);
        assert_relative_eq!(decode("        "), 0.0);
    }

    #[test]
    fn test_exponent_field_encoding() {
        assert_eq!(encode_exponent_field(1.7645e-4, "x").unwrap(), " 17645-3");
        assert_eq!(encode_exponent_field(-1.1606e-5, "x").unwrap(), "-11606-4");
        assert_eq!(encode_exponent_field(0.0, "x").unwrap(), " 00000-0");
        assert_eq!(encode_exponent_field(0.5, "x").unwrap(), " 50000+0");
        // Rounds up into the next decade
        assert_eq!(encode_exponent_field(9.999_999e-5, "x").unwrap(), " 10000-3");
        assert!(encode_exponent_field(1e12, "x").is_err());
    }

    #[test]
    fn test_year_window() {
        let tle = parse(VANGUARD_LINE1, VANGUARD_LINE2).unwrap();
        assert_eq!(tle.epoch_year, 2000);

        let tle = parse(MOLNIYA_LINE1, MOLNIYA_LINE2).unwrap();
        assert_eq!(tle.epoch_year, 1980);
    }

    #[test]
    fn test_blank_optional_fields() {
        let tle = parse(MOLNIYA_LINE1, MOLNIYA_LINE2).expect("Failed to parse TLE");
        assert_eq!(tle.international_designator, "");
        assert_eq!(tle.ephemeris_type, 0);
        assert_eq!(tle.element_set_number, 1);
        assert_eq!(tle.revolution_number, 1);
        assert_relative_eq!(tle.eccentricity, 0.731_803_6);
        assert_relative_eq!(tle.bstar, 0.014_311, max_relative = 1e-12);
    }

    #[test]
    fn test_encode_reproduces_lines() {
        for (l1, l2) in [(ISS_LINE1, ISS_LINE2), (VANGUARD_LINE1, VANGUARD_LINE2)] {
            let tle = parse(l1, l2).unwrap();
            let (e1, e2) = tle.to_lines().expect("encodable");
            assert_eq!(e1, l1);
            assert_eq!(e2, l2);
        }
    }

    #[test]
    fn test_encode_rejects_unrepresentable_fields() {
        let mut tle = parse(ISS_LINE1, ISS_LINE2).unwrap();
        tle.mean_motion = 123.0;
        assert!(matches!(
            tle.to_lines(),
            Err(SatfieldError::InvalidElements(_))
        ));

        let mut tle = parse(ISS_LINE1, ISS_LINE2).unwrap();
        tle.mean_motion_dot = 1.5;
        assert!(matches!(
            tle.to_lines(),
            Err(SatfieldError::InvalidElements(_))
        ));
    }

    #[test]
    fn test_parse_tle_file_mixed_formats() {
        let text = format!(
            "ISS (ZARYA)\n{}\n{}\n\n{}\n{}\n0 MOLNIYA\n{}\n{}\n",
            ISS_LINE1, ISS_LINE2, VANGUARD_LINE1, VANGUARD_LINE2, MOLNIYA_LINE1, MOLNIYA_LINE2
        );
        let records = parse_tle_file(&text).expect("Failed to parse file");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name.as_deref(), Some("ISS (ZARYA)"));
        assert_eq!(records[0].catalog_number, 25544);
        assert_eq!(records[1].name, None);
        assert_eq!(records[1].catalog_number, 5);
        assert_eq!(records[2].name.as_deref(), Some("MOLNIYA"));
        assert_eq!(records[2].catalog_number, 11801);
    }

    #[test]
    fn test_parse_tle_file_truncated() {
        let text = format!("ISS (ZARYA)\n{}\n", ISS_LINE1);
        assert!(matches!(
            parse_tle_file(&text),
            Err(SatfieldError::MalformedTle(_))
        ));
    }
}
