//! Error telemetry for Labportal
//!
//! The reporter exists only when an endpoint DSN is configured. Captured
//! events are buffered and delivered on [`TelemetryReporter::flush`]; actual
//! HTTP delivery requires the `telemetry` feature.

use crate::config::TelemetryConfig;
use crate::error::{PortalError, Result};
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

mod dsn;

pub use dsn::Dsn;

/// Release identifier attached to every event
pub const RELEASE: &str = env!("APP_RELEASE");

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

/// A single captured event
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    #[serde(serialize_with = "serialize_simple_uuid")]
    pub event_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub level: EventLevel,
    pub message: String,
    pub environment: String,
    pub release: String,
    pub platform: &'static str,
    /// Whether this event participates in trace sampling
    pub sampled: bool,
}

fn serialize_simple_uuid<S: serde::Serializer>(id: &Uuid, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.collect_str(&id.simple())
}

/// Where outgoing requests may carry trace headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TracingOrigin {
    /// Exact host name
    Host(String),
    /// Relative path prefix
    PathPrefix(String),
}

impl TracingOrigin {
    pub fn parse(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.starts_with('/') {
            Self::PathPrefix(entry.to_string())
        } else {
            Self::Host(entry.to_ascii_lowercase())
        }
    }

    fn matches(&self, url: &str) -> bool {
        match self {
            Self::PathPrefix(prefix) => url.starts_with('/') && url.starts_with(prefix.as_str()),
            Self::Host(host) => url_host(url).is_some_and(|h| h.eq_ignore_ascii_case(host)),
        }
    }
}

/// Host portion of an absolute URL
fn url_host(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host_port.split(':').next()?;
    (!host.is_empty()).then_some(host)
}

/// Buffered error reporter
pub struct TelemetryReporter {
    dsn: Dsn,
    environment: String,
    traces_sample_rate: f64,
    origins: Vec<TracingOrigin>,
    buffer: Mutex<VecDeque<TelemetryEvent>>,
    logger: StructuredLogger,
}

impl TelemetryReporter {
    /// Build a reporter, or `None` when no DSN is configured
    pub fn from_config(config: &TelemetryConfig) -> Result<Option<Self>> {
        let Some(raw) = config.dsn.as_deref().filter(|d| !d.trim().is_empty()) else {
            return Ok(None);
        };
        if !(0.0..=1.0).contains(&config.traces_sample_rate) {
            return Err(PortalError::validation(
                "telemetry.traces_sample_rate",
                "Must be between 0.0 and 1.0",
            ));
        }

        let dsn = Dsn::parse(raw)?;
        let logger = get_logger("telemetry").with_field("host", dsn.host());
        Ok(Some(Self {
            dsn,
            environment: config.environment.clone(),
            traces_sample_rate: config.traces_sample_rate,
            origins: config
                .tracing_origins
                .iter()
                .map(|o| TracingOrigin::parse(o))
                .collect(),
            buffer: Mutex::new(VecDeque::new()),
            logger,
        }))
    }

    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// Buffer a message event and return its id
    pub async fn capture_message(&self, level: EventLevel, message: &str) -> Uuid {
        let event_id = Uuid::new_v4();
        let event = TelemetryEvent {
            event_id,
            timestamp: Utc::now(),
            level,
            message: message.to_string(),
            environment: self.environment.clone(),
            release: RELEASE.to_string(),
            platform: "native",
            sampled: self.traces_sampled(event_id),
        };
        self.buffer.lock().await.push_back(event);
        self.logger
            .debug(&format!("Captured {:?} event {}", level, event_id.simple()));
        event_id
    }

    /// Buffer an error event
    pub async fn capture_error(&self, err: &PortalError) -> Uuid {
        self.capture_message(EventLevel::Error, &err.to_string()).await
    }

    /// Deterministic sampling decision for an event id
    pub fn traces_sampled(&self, event_id: Uuid) -> bool {
        if self.traces_sample_rate >= 1.0 {
            return true;
        }
        if self.traces_sample_rate <= 0.0 {
            return false;
        }
        let position = event_id.as_u128() as f64 / u128::MAX as f64;
        position < self.traces_sample_rate
    }

    /// Whether a request to `url` should carry trace headers
    pub fn should_trace(&self, url: &str) -> bool {
        self.origins.iter().any(|o| o.matches(url))
    }

    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Snapshot of buffered events
    pub async fn pending_events(&self) -> Vec<TelemetryEvent> {
        self.buffer.lock().await.iter().cloned().collect()
    }

    /// Deliver and drain buffered events oldest first, returning how many
    /// were drained. On a delivery failure the failed event and everything
    /// after it stay buffered.
    pub async fn flush(&self) -> Result<usize> {
        let mut drained = 0;
        loop {
            let Some(event) = self.buffer.lock().await.pop_front() else {
                break;
            };
            if let Err(e) = self.deliver(&event).await {
                self.buffer.lock().await.push_front(event);
                self.logger.warn(&format!(
                    "Flush stopped after {} event(s); {} still pending",
                    drained,
                    self.pending().await
                ));
                return Err(e);
            }
            drained += 1;
        }
        Ok(drained)
    }

    /// Send one event. A rejection by the endpoint is final and only
    /// logged; transport failures are errors.
    #[cfg(feature = "telemetry")]
    async fn deliver(&self, event: &TelemetryEvent) -> Result<()> {
        use reqwest::header::{CONTENT_TYPE, USER_AGENT};

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        let auth = format!(
            "Sentry sentry_version=7, sentry_key={}, sentry_client=labportal/{}",
            self.dsn.public_key(),
            env!("CARGO_PKG_VERSION")
        );
        let resp = client
            .post(self.dsn.store_url())
            .header("X-Sentry-Auth", auth.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, format!("labportal/{}", env!("CARGO_PKG_VERSION")))
            .json(event)
            .send()
            .await
            .map_err(|e| {
                PortalError::telemetry(format!(
                    "event {} not delivered: {}",
                    event.event_id.simple(),
                    e
                ))
            })?;
        if !resp.status().is_success() {
            self.logger.error(&format!(
                "Telemetry endpoint rejected event {}: {}",
                event.event_id.simple(),
                resp.status()
            ));
        }
        Ok(())
    }

    #[cfg(not(feature = "telemetry"))]
    async fn deliver(&self, event: &TelemetryEvent) -> Result<()> {
        self.logger.debug(&format!(
            "Telemetry delivery disabled; dropping event {}",
            event.event_id.simple()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(dsn: &str) -> TelemetryConfig {
        TelemetryConfig {
            dsn: Some(dsn.to_string()),
            ..TelemetryConfig::default()
        }
    }

    #[test]
    fn absent_dsn_disables_registration() {
        let cfg = TelemetryConfig::default();
        assert!(TelemetryReporter::from_config(&cfg).unwrap().is_none());

        let blank = config_with("  ");
        assert!(TelemetryReporter::from_config(&blank).unwrap().is_none());
    }

    #[test]
    fn malformed_dsn_is_a_config_error() {
        let err = TelemetryReporter::from_config(&config_with("nope"))
            .err()
            .unwrap();
        assert!(matches!(err, PortalError::Config { .. }));
    }

    #[test]
    fn origins_match_hosts_and_paths() {
        let mut cfg = config_with("https://k@ingest.example.io/1");
        cfg.tracing_origins = vec!["localhost".into(), "app.example.org".into(), "/api".into()];
        let reporter = TelemetryReporter::from_config(&cfg).unwrap().unwrap();

        assert!(reporter.should_trace("http://localhost:8080/x"));
        assert!(reporter.should_trace("https://APP.example.org/orders?id=1"));
        assert!(reporter.should_trace("/api/specimens"));
        assert!(!reporter.should_trace("/static/app.js"));
        assert!(!reporter.should_trace("https://evil.example.com/"));
        assert!(!reporter.should_trace("https://user@app.example.org.evil.io/"));
    }

    #[test]
    fn sampling_respects_bounds() {
        let mut cfg = config_with("https://k@ingest.example.io/1");
        cfg.traces_sample_rate = 0.0;
        let none = TelemetryReporter::from_config(&cfg).unwrap().unwrap();
        cfg.traces_sample_rate = 1.0;
        let all = TelemetryReporter::from_config(&cfg).unwrap().unwrap();

        for _ in 0..32 {
            let id = Uuid::new_v4();
            assert!(!none.traces_sampled(id));
            assert!(all.traces_sampled(id));
        }
    }

    #[tokio::test]
    async fn captured_events_are_buffered_until_flush() {
        let reporter = TelemetryReporter::from_config(&config_with("https://k@ingest.example.io/1"))
            .unwrap()
            .unwrap();
        let id = reporter
            .capture_error(&PortalError::init("step 'wallet' failed"))
            .await;
        assert_eq!(reporter.pending().await, 1);

        let events = reporter.pending_events().await;
        assert_eq!(events[0].event_id, id);
        assert_eq!(events[0].level, EventLevel::Error);
        assert!(events[0].message.contains("wallet"));

        let json = serde_json::to_value(&events[0]).unwrap();
        assert_eq!(json["level"], "error");
        assert_eq!(json["event_id"].as_str().map(str::len), Some(32));
    }

    #[cfg(not(feature = "telemetry"))]
    #[tokio::test]
    async fn flush_drains_without_network() {
        let reporter = TelemetryReporter::from_config(&config_with("https://k@ingest.example.io/1"))
            .unwrap()
            .unwrap();
        reporter.capture_message(EventLevel::Info, "one").await;
        reporter.capture_message(EventLevel::Warning, "two").await;
        assert_eq!(reporter.flush().await.unwrap(), 2);
        assert_eq!(reporter.pending().await, 0);
        assert_eq!(reporter.flush().await.unwrap(), 0);
    }

    #[cfg(feature = "telemetry")]
    #[tokio::test]
    async fn failed_delivery_keeps_events_buffered() {
        // Nothing listens on the discard port
        let reporter = TelemetryReporter::from_config(&config_with("http://k@127.0.0.1:9/1"))
            .unwrap()
            .unwrap();
        let first = reporter.capture_message(EventLevel::Error, "one").await;
        reporter.capture_message(EventLevel::Error, "two").await;

        let err = reporter.flush().await.err().unwrap();
        assert!(matches!(err, PortalError::Telemetry { .. }));
        assert_eq!(reporter.pending().await, 2);
        assert_eq!(reporter.pending_events().await[0].event_id, first);
    }
}
