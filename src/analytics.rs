//! Product analytics client
//!
//! Tracks named events against a project token. Without a token the client
//! is inert and every call is a no-op.

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Identity used before [`AnalyticsClient::identify`] is called
pub const ANONYMOUS_ID: &str = "anonymous";

/// One tracked event in ingestion-API shape
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub event: String,
    pub properties: Map<String, Value>,
}

impl AnalyticsEvent {
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Buffered analytics client
pub struct AnalyticsClient {
    token: Option<String>,
    api_host: String,
    distinct_id: Mutex<String>,
    buffer: Mutex<Vec<AnalyticsEvent>>,
    logger: StructuredLogger,
}

impl AnalyticsClient {
    pub fn new(config: &AnalyticsConfig) -> Self {
        let token = config
            .token
            .as_ref()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let logger = get_logger("analytics");
        if token.is_none() {
            logger.info("No analytics token configured; tracking disabled");
        }
        Self {
            token,
            api_host: config.api_host.trim_end_matches('/').to_string(),
            distinct_id: Mutex::new(ANONYMOUS_ID.to_string()),
            buffer: Mutex::new(Vec::new()),
            logger,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    /// Attribute subsequent events to `distinct_id`
    pub async fn identify(&self, distinct_id: &str) {
        *self.distinct_id.lock().await = distinct_id.to_string();
    }

    /// Buffer an event. Returns `false` when tracking is disabled.
    pub async fn track(&self, event: &str, properties: Map<String, Value>) -> bool {
        let Some(token) = self.token.as_ref() else {
            self.logger
                .debug(&format!("Dropping event '{}': tracking disabled", event));
            return false;
        };

        let mut props = properties;
        props.insert("token".to_string(), Value::from(token.as_str()));
        props.insert(
            "distinct_id".to_string(),
            Value::from(self.distinct_id.lock().await.as_str()),
        );
        props.insert("time".to_string(), Value::from(Utc::now().timestamp()));
        props.insert(
            "$insert_id".to_string(),
            Value::from(Uuid::new_v4().simple().to_string()),
        );

        self.buffer.lock().await.push(AnalyticsEvent {
            event: event.to_string(),
            properties: props,
        });
        true
    }

    pub async fn pending(&self) -> usize {
        self.buffer.lock().await.len()
    }

    /// Snapshot of buffered events
    pub async fn pending_events(&self) -> Vec<AnalyticsEvent> {
        self.buffer.lock().await.clone()
    }

    /// Endpoint batches are posted to
    pub fn track_url(&self) -> String {
        format!("{}/track", self.api_host)
    }

    /// Deliver and drain buffered events, returning how many were drained.
    /// A batch that fails to deliver goes back in front of anything tracked
    /// meanwhile.
    pub async fn flush(&self) -> Result<usize> {
        let events: Vec<AnalyticsEvent> = std::mem::take(&mut *self.buffer.lock().await);
        if events.is_empty() {
            return Ok(0);
        }
        if let Err(e) = self.deliver(&events).await {
            let mut buffer = self.buffer.lock().await;
            let newer = std::mem::replace(&mut *buffer, events);
            buffer.extend(newer);
            return Err(e);
        }
        Ok(events.len())
    }

    #[cfg(feature = "analytics")]
    async fn deliver(&self, events: &[AnalyticsEvent]) -> Result<()> {
        use crate::error::PortalError;
        use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        let resp = client
            .post(self.track_url())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/plain")
            .header(USER_AGENT, format!("labportal/{}", env!("CARGO_PKG_VERSION")))
            .json(events)
            .send()
            .await?;
        if !resp.status().is_success() {
            self.logger
                .error(&format!("Analytics API error: {}", resp.status()));
            return Err(PortalError::analytics(format!(
                "batch of {} rejected with {}",
                events.len(),
                resp.status()
            )));
        }
        Ok(())
    }

    #[cfg(not(feature = "analytics"))]
    async fn deliver(&self, events: &[AnalyticsEvent]) -> Result<()> {
        self.logger.debug(&format!(
            "Analytics delivery disabled; dropping {} event(s)",
            events.len()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enabled() -> AnalyticsClient {
        AnalyticsClient::new(&AnalyticsConfig {
            token: Some("tok-abc".to_string()),
            api_host: "https://api.example.com/".to_string(),
        })
    }

    #[tokio::test]
    async fn disabled_without_token() {
        let client = AnalyticsClient::new(&AnalyticsConfig::default());
        assert!(!client.is_enabled());
        assert!(!client.track("Page Viewed", Map::new()).await);
        assert_eq!(client.pending().await, 0);
    }

    #[tokio::test]
    async fn blank_token_counts_as_absent() {
        let client = AnalyticsClient::new(&AnalyticsConfig {
            token: Some("   ".to_string()),
            ..AnalyticsConfig::default()
        });
        assert!(!client.is_enabled());
    }

    #[tokio::test]
    async fn events_carry_token_and_identity() {
        let client = enabled();
        assert_eq!(client.track_url(), "https://api.example.com/track");

        client.track("App Mounted", Map::new()).await;
        client.identify("0xabc").await;
        let mut props = Map::new();
        props.insert("specimen".to_string(), json!("AB12-CD34"));
        assert!(client.track("Order Viewed", props).await);

        let events = client.pending_events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].property("distinct_id"), Some(&json!(ANONYMOUS_ID)));
        assert_eq!(events[1].property("distinct_id"), Some(&json!("0xabc")));
        assert_eq!(events[1].property("token"), Some(&json!("tok-abc")));
        assert_eq!(events[1].property("specimen"), Some(&json!("AB12-CD34")));
        assert!(events[1].property("time").and_then(Value::as_i64).is_some());
    }

    #[cfg(not(feature = "analytics"))]
    #[tokio::test]
    async fn flush_drains_buffer() {
        let client = enabled();
        client.track("A", Map::new()).await;
        assert_eq!(client.flush().await.unwrap(), 1);
        assert_eq!(client.pending().await, 0);
    }

    #[cfg(feature = "analytics")]
    #[tokio::test]
    async fn failed_batch_is_kept() {
        let client = AnalyticsClient::new(&AnalyticsConfig {
            token: Some("tok-abc".to_string()),
            api_host: "http://127.0.0.1:9".to_string(),
        });
        client.track("A", Map::new()).await;
        client.track("B", Map::new()).await;

        assert!(client.flush().await.is_err());
        let events = client.pending_events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, "A");
    }
}
