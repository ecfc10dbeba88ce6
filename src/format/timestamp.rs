//! Epoch timestamp normalization and calendar rendering.
//!
//! Two conventions coexist: the date-only filter reads epoch milliseconds,
//! the date-and-time filter reads epoch seconds.

use super::{FormatError, value_kind};
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde_json::Value;

/// Largest absolute epoch offset accepted, in milliseconds (100,000,000 days)
pub const MAX_EPOCH_MILLIS: i64 = 8_640_000_000_000_000;

const MONTH_DAY_PATTERN: &str = "%B %d";
const CLOCK_PATTERN: &str = "%I:%M";

/// Which calendar fields a filter renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// `<Month> <DD> <YYYY>`
    Date,
    /// `<Month> <DD> <YYYY> <hh>:<mm>`, twelve-hour clock without a suffix
    DateTime,
}

/// Timestamp input after type normalization
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampInput {
    /// A JSON number
    Numeric(f64),
    /// Text expected to hold a number, possibly with `,` separators
    Text(String),
}

impl TimestampInput {
    pub fn from_value(value: &Value) -> Result<Self, FormatError> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Numeric)
                .ok_or_else(|| FormatError::NotANumber {
                    text: n.to_string(),
                }),
            Value::String(s) => Ok(Self::Text(s.clone())),
            other => Err(FormatError::UnsupportedInput {
                kind: value_kind(other),
            }),
        }
    }

    /// Interpret as epoch milliseconds. Text has its commas removed and is
    /// read as a leading base-10 integer.
    pub fn epoch_millis(&self) -> Result<i64, FormatError> {
        match self {
            Self::Numeric(n) => float_to_millis(*n),
            Self::Text(s) => {
                let stripped: String = s.chars().filter(|c| *c != ',').collect();
                parse_int_prefix(&stripped)
            }
        }
    }

    /// Interpret as epoch seconds, converted to milliseconds. Text must be
    /// a plain decimal number.
    pub fn epoch_seconds_as_millis(&self) -> Result<i64, FormatError> {
        let seconds = match self {
            Self::Numeric(n) => *n,
            Self::Text(s) => parse_decimal(s)?,
        };
        float_to_millis(seconds * 1000.0)
    }
}

pub(crate) fn try_timestamp_to_date(value: &Value, tz: &Tz) -> Result<String, FormatError> {
    let millis = TimestampInput::from_value(value)?.epoch_millis()?;
    render(millis, tz, Layout::Date)
}

pub(crate) fn try_timestamp_to_date_time(value: &Value, tz: &Tz) -> Result<String, FormatError> {
    let millis = TimestampInput::from_value(value)?.epoch_seconds_as_millis()?;
    render(millis, tz, Layout::DateTime)
}

fn render(millis: i64, tz: &Tz, layout: Layout) -> Result<String, FormatError> {
    if millis.checked_abs().is_none_or(|m| m > MAX_EPOCH_MILLIS) {
        return Err(out_of_range(millis));
    }
    let instant: DateTime<Utc> =
        DateTime::from_timestamp_millis(millis).ok_or_else(|| out_of_range(millis))?;
    let local = instant.with_timezone(tz);
    let date = format!(
        "{} {}",
        local.format(MONTH_DAY_PATTERN),
        era_year(local.year_ce())
    );
    Ok(match layout {
        Layout::Date => date,
        Layout::DateTime => format!("{} {}", date, local.format(CLOCK_PATTERN)),
    })
}

/// Year of era, unsigned and padded to at least four digits. Years before
/// 1 CE count backwards from 1 (year 0 is 1 BCE).
fn era_year((_, year): (bool, u32)) -> String {
    format!("{:04}", year)
}

fn out_of_range(millis: i64) -> FormatError {
    FormatError::OutOfRange {
        value: millis.to_string(),
    }
}

fn float_to_millis(n: f64) -> Result<i64, FormatError> {
    if !n.is_finite() {
        return Err(FormatError::NotANumber {
            text: n.to_string(),
        });
    }
    let truncated = n.trunc();
    if truncated.abs() > MAX_EPOCH_MILLIS as f64 {
        return Err(FormatError::OutOfRange {
            value: truncated.to_string(),
        });
    }
    Ok(truncated as i64)
}

/// Leading integer of `text`: optional whitespace and sign, then the longest
/// run of ASCII digits. Anything after the digits is ignored.
fn parse_int_prefix(text: &str) -> Result<i64, FormatError> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return Err(FormatError::NotANumber {
            text: text.to_string(),
        });
    }

    let magnitude: i64 = digits.parse().map_err(|_| FormatError::OutOfRange {
        value: digits.to_string(),
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_decimal(text: &str) -> Result<f64, FormatError> {
    let trimmed = text.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| FormatError::NotANumber {
            text: text.to_string(),
        })
}
