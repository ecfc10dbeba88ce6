//! # Labportal - lab customer portal bootstrap and display filters
//!
//! The startup half of the lab customer portal: it registers error telemetry
//! and analytics, publishes the display filters the rendering layer uses for
//! specimen numbers, status labels and timestamps, runs the session and
//! wallet initialization steps in order, and mounts the application.
//!
//! ## Architecture
//!
//! - `format`: Display formatters and the named filter registry
//! - `bootstrap`: Ordered startup sequence and the mounted `App`
//! - `telemetry`: Optional error reporting, keyed by a DSN
//! - `analytics`: Event tracking, keyed by a project token
//! - `countdown`: Countdown timers and tick streams
//! - `config`: YAML configuration with environment overrides
//! - `logging`: Structured logging and tracing
//! - `error`: Crate-wide error type

pub mod analytics;
pub mod bootstrap;
pub mod config;
pub mod countdown;
pub mod error;
pub mod format;
pub mod logging;
pub mod telemetry;


// Re-export commonly used types
pub use bootstrap::{App, Bootstrap, InitStep};
pub use config::Config;
pub use error::{PortalError, Result};
pub use format::{DisplayFormatter, FilterRegistry};
