//! Cell-level parsing for nullable text and numeric fields.
//!
//! Missing cells follow the usual dataframe conventions: an empty cell or
//! one of the common not-available markers (`NA`, `NaN`, `null`, ...)
//! is treated as absent.

use thiserror::Error;

/// Cell contents treated as "no value".
const NA_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A cell that was present but could not be read as a number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid numeric value '{value}'")]
pub struct InvalidNumber {
    /// The raw cell contents.
    pub value: String,
}

fn is_missing(trimmed: &str) -> bool {
    NA_MARKERS.contains(&trimmed)
}

/// Parses a text cell. Returns `None` for missing cells.
#[must_use]
pub fn parse_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses a nullable floating-point cell.
///
/// Any spelling of NaN counts as missing, whatever its case or sign.
///
/// # Errors
///
/// Returns [`InvalidNumber`] if the cell is present but not a finite
/// number.
pub fn parse_nullable_f64(raw: &str) -> Result<Option<f64>, InvalidNumber> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return Ok(None);
    }
    let invalid = || InvalidNumber {
        value: trimmed.to_string(),
    };
    let value = trimmed.parse::<f64>().map_err(|_| invalid())?;
    if value.is_nan() {
        Ok(None)
    } else if value.is_infinite() {
        Err(invalid())
    } else {
        Ok(Some(value))
    }
}

/// Parses a nullable count such as killed or wounded.
///
/// # Errors
///
/// Returns [`InvalidNumber`] if the cell is present but not a finite,
/// non-negative number.
pub fn parse_nullable_measure(raw: &str) -> Result<Option<f64>, InvalidNumber> {
    match parse_nullable_f64(raw)? {
        Some(value) if value < 0.0 => Err(InvalidNumber {
            value: raw.trim().to_string(),
        }),
        parsed => Ok(parsed),
    }
}

/// Parses a nullable non-negative integer code.
///
/// Accepts whole-number floats (`"3.0"`) because integer columns with
/// missing values are frequently exported as floats.
///
/// # Errors
///
/// Returns [`InvalidNumber`] if the cell is present but not a
/// non-negative whole number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_nullable_code(raw: &str) -> Result<Option<u32>, InvalidNumber> {
    let Some(value) = parse_nullable_f64(raw)? else {
        return Ok(None);
    };
    if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) {
        Ok(Some(value as u32))
    } else {
        Err(InvalidNumber {
            value: raw.trim().to_string(),
        })
    }
}

/// Parses a year cell. Returns `None` when missing or not a whole number.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }
    let value = parse_nullable_f64(trimmed).ok()??;
    if value.fract() == 0.0 && (f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value) {
        Some(value as i32)
    } else {
        None
    }
}
