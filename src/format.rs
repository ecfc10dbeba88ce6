//! Display formatting for the portal's rendering layer
//!
//! Pure value-to-string transforms used as template filters. Every public
//! entry point is total: inputs that cannot be formatted collapse to a safe
//! default (the empty string, or the value passed through unchanged) and
//! the failure is reported on the `format` logger instead of propagating.
//!
//! Inputs are `serde_json::Value`s, the dynamic value type templates hand
//! to filters.

use crate::config::Config;
use crate::error::Result;
use crate::logging::get_logger;
use chrono_tz::Tz;
use serde_json::Value;
use thiserror::Error;

pub mod registry;
pub mod specimen;
pub mod status;
pub mod timestamp;

pub use registry::{FilterFn, FilterRegistry};
pub use timestamp::TimestampInput;

/// Why a value could not be formatted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The value's type has no meaning for this transform
    #[error("unsupported input type: {kind}")]
    UnsupportedInput { kind: &'static str },

    /// Text that does not hold a number
    #[error("not a number: '{text}'")]
    NotANumber { text: String },

    /// A number outside the representable calendar range
    #[error("instant out of range: {value}")]
    OutOfRange { value: String },

    /// Identifier with nothing left after normalization
    #[error("no canonical form for '{text}'")]
    NoCanonicalForm { text: String },
}

/// Filter implementations bound to a display time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFormatter {
    tz: Tz,
}

impl Default for DisplayFormatter {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl DisplayFormatter {
    /// Create a formatter rendering calendar values in `tz`
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Create a formatter for the configured display time zone
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.display_timezone()?))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Canonical specimen number, or the identifier unmodified
    pub fn specimen_number(&self, value: &Value) -> String {
        collapse(
            registry::SPECIMEN_NUMBER,
            value,
            specimen::try_specimen_number(value),
            || display_text(value),
        )
    }

    /// Customer-facing label for a specimen status code
    pub fn customer_specimen_status(&self, value: &Value) -> String {
        match value {
            Value::String(code) => status::customer_status_label(code).to_string(),
            other => display_text(other),
        }
    }

    /// `"<Month> <DD> <YYYY>"` from epoch milliseconds, or `""`
    pub fn timestamp_to_date(&self, value: &Value) -> String {
        collapse(
            registry::TIMESTAMP_TO_DATE,
            value,
            timestamp::try_timestamp_to_date(value, &self.tz),
            String::new,
        )
    }

    /// `"<Month> <DD> <YYYY> <hh>:<mm>"` from epoch seconds, or `""`
    pub fn timestamp_to_date_time(&self, value: &Value) -> String {
        collapse(
            registry::TIMESTAMP_TO_DATE_TIME,
            value,
            timestamp::try_timestamp_to_date_time(value, &self.tz),
            String::new,
        )
    }
}

pub fn format_specimen_number(value: &Value) -> String {
    DisplayFormatter::default().specimen_number(value)
}

pub fn format_customer_specimen_status(value: &Value) -> String {
    DisplayFormatter::default().customer_specimen_status(value)
}

/// Date-only rendering in UTC. See [`DisplayFormatter::timestamp_to_date`].
pub fn format_timestamp_to_date(value: &Value) -> String {
    DisplayFormatter::default().timestamp_to_date(value)
}

/// Date and time rendering in UTC. See [`DisplayFormatter::timestamp_to_date_time`].
pub fn format_timestamp_to_date_time(value: &Value) -> String {
    DisplayFormatter::default().timestamp_to_date_time(value)
}

/// Collapse an internal result to a display string, logging the failure branch
fn collapse<F>(
    filter: &str,
    value: &Value,
    result: std::result::Result<String, FormatError>,
    fallback: F,
) -> String
where
    F: FnOnce() -> String,
{
    match result {
        Ok(s) => s,
        Err(e) => {
            get_logger("format")
                .with_field("filter", filter)
                .with_field("value", value.to_string())
                .warn(&format!("Formatting failed: {}", e));
            fallback()
        }
    }
}

/// Plain text of a value as a template would print it
pub(crate) fn display_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_passes_through_unknown_codes() {
        assert_eq!(
            format_customer_specimen_status(&json!("Received")),
            "Received by Lab"
        );
        for code in ["Registered", "Arrived", "received", "Received ", "", "ResultReady"] {
            assert_eq!(format_customer_specimen_status(&json!(code)), code);
        }
    }

    #[test]
    fn status_non_strings_render_as_text() {
        assert_eq!(format_customer_specimen_status(&Value::Null), "");
        assert_eq!(format_customer_specimen_status(&json!(3)), "3");
    }

    #[test]
    fn date_accepts_comma_separated_strings() {
        let plain = format_timestamp_to_date(&json!(1_700_000_000_000_i64));
        assert_eq!(plain, "November 14 2023");
        assert_eq!(format_timestamp_to_date(&json!("1,700,000,000,000")), plain);
        assert_eq!(format_timestamp_to_date(&json!("1700000000000")), plain);
    }

    #[test]
    fn date_pads_day_of_month() {
        // 2024-03-05T12:00:00Z
        assert_eq!(
            format_timestamp_to_date(&json!(1_709_640_000_000_i64)),
            "March 05 2024"
        );
    }

    #[test]
    fn malformed_timestamps_become_empty() {
        for v in [json!("not-a-date"), Value::Null, json!({}), json!([1]), json!(true)] {
            assert_eq!(format_timestamp_to_date(&v), "");
            assert_eq!(format_timestamp_to_date_time(&v), "");
        }
    }

    #[test]
    fn date_time_uses_twelve_hour_clock() {
        // 2023-11-14T22:13:20Z
        assert_eq!(
            format_timestamp_to_date_time(&json!(1_700_000_000)),
            "November 14 2023 10:13"
        );
        // Midnight renders as 12
        assert_eq!(
            format_timestamp_to_date_time(&json!(0)),
            "January 01 1970 12:00"
        );
    }

    #[test]
    fn time_zone_shifts_calendar_date() {
        let fmt = DisplayFormatter::new(chrono_tz::Asia::Tokyo);
        // 2023-11-14T22:13:20Z is already the 15th in Tokyo
        assert_eq!(
            fmt.timestamp_to_date(&json!(1_700_000_000_000_i64)),
            "November 15 2023"
        );
        assert_eq!(
            fmt.timestamp_to_date_time(&json!(1_700_000_000)),
            "November 15 2023 07:13"
        );
    }

    #[test]
    fn from_config_rejects_unknown_zone() {
        let mut config = Config::default();
        config.display.timezone = "Nowhere/Special".to_string();
        assert!(DisplayFormatter::from_config(&config).is_err());

        config.display.timezone = "Europe/Berlin".to_string();
        let fmt = DisplayFormatter::from_config(&config).unwrap();
        assert_eq!(fmt.timezone(), chrono_tz::Europe::Berlin);
    }

    #[test]
    fn specimen_number_degrades_to_identity() {
        assert_eq!(format_specimen_number(&json!("--")), "--");
        assert_eq!(format_specimen_number(&Value::Null), "");
        assert_eq!(format_specimen_number(&json!(["a"])), "[\"a\"]");
    }
}
