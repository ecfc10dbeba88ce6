//! Application startup sequence
//!
//! Registers the ambient clients and display filters, runs the session step
//! and then the wallet step (each awaited under the configured timeout),
//! spawns the contracts step in the background, and mounts the [`App`].

use crate::analytics::AnalyticsClient;
use crate::config::Config;
use crate::error::{PortalError, Result};
use crate::format::{DisplayFormatter, FilterRegistry};
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::telemetry::TelemetryReporter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// One asynchronous initialization step owned by an external collaborator
#[async_trait]
pub trait InitStep: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<()>;
}

/// A step that completes immediately
#[derive(Debug, Clone)]
pub struct ReadyStep {
    name: String,
}

impl ReadyStep {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl InitStep for ReadyStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<()> {
        Ok(())
    }
}

/// Builder for the startup sequence
pub struct Bootstrap {
    config: Config,
    session: Option<Box<dyn InitStep>>,
    wallet: Option<Box<dyn InitStep>>,
    contracts: Option<Arc<dyn InitStep>>,
    telemetry: Option<Arc<TelemetryReporter>>,
    logger: StructuredLogger,
}

impl Bootstrap {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: None,
            wallet: None,
            contracts: None,
            telemetry: None,
            logger: get_logger("bootstrap"),
        }
    }

    /// Authentication/session initialization, run first
    pub fn session(mut self, step: impl InitStep + 'static) -> Self {
        self.session = Some(Box::new(step));
        self
    }

    /// Wallet provider initialization, run after the session step
    pub fn wallet(mut self, step: impl InitStep + 'static) -> Self {
        self.wallet = Some(Box::new(step));
        self
    }

    /// Contract bindings, started after the wallet step and not awaited
    pub fn contracts(mut self, step: impl InitStep + 'static) -> Self {
        self.contracts = Some(Arc::new(step));
        self
    }

    /// Use an existing reporter instead of building one from the config
    pub fn telemetry(mut self, reporter: Arc<TelemetryReporter>) -> Self {
        self.telemetry = Some(reporter);
        self
    }

    /// Run the sequence and mount the application. A failed session or
    /// wallet step is captured and flushed to telemetry before the error is
    /// returned.
    pub async fn run(self) -> Result<App> {
        let Bootstrap {
            config,
            session,
            wallet,
            contracts,
            telemetry,
            logger,
        } = self;

        let session = session.ok_or_else(|| PortalError::config("No session step configured"))?;
        let wallet = wallet.ok_or_else(|| PortalError::config("No wallet step configured"))?;
        config.validate()?;

        let telemetry = match telemetry {
            Some(reporter) => Some(reporter),
            None => TelemetryReporter::from_config(&config.telemetry)?.map(Arc::new),
        };
        match telemetry.as_ref() {
            Some(t) => logger.info(&format!("Telemetry registered for {}", t.dsn().host())),
            None => logger.info("No telemetry DSN configured; telemetry not registered"),
        }
        let analytics = Arc::new(AnalyticsClient::new(&config.analytics));

        let formatter = DisplayFormatter::from_config(&config)?;
        let filters = FilterRegistry::with_display_filters(formatter);
        logger.debug(&format!("Registered filters: {}", filters.names().join(", ")));

        let timeout = Duration::from_millis(config.startup.step_timeout_ms);
        for step in [&*session, &*wallet] {
            if let Err(e) = run_step(step, timeout).await {
                logger.error(&e.to_string());
                if let Some(t) = telemetry.as_ref() {
                    t.capture_error(&e).await;
                    if let Err(flush_err) = t.flush().await {
                        logger.warn(&format!("Telemetry flush failed: {}", flush_err));
                    }
                }
                return Err(e);
            }
        }

        let contracts_task = contracts.map(|step| {
            let telemetry = telemetry.clone();
            tokio::spawn(async move {
                let result = run_step(&*step, timeout).await;
                if let (Err(e), Some(t)) = (result.as_ref(), telemetry.as_ref()) {
                    t.capture_error(e).await;
                }
                result
            })
        });

        logger.info("Application mounted");
        Ok(App {
            config,
            filters,
            telemetry,
            analytics,
            contracts_task,
        })
    }
}

async fn run_step(step: &dyn InitStep, timeout: Duration) -> Result<()> {
    let logger = get_logger_with_context(LogContext::new("bootstrap").with_step(step.name()));
    logger.debug("Starting");
    match tokio::time::timeout(timeout, step.run()).await {
        Ok(Ok(())) => {
            logger.info("Completed");
            Ok(())
        }
        Ok(Err(e)) => Err(PortalError::init(format!(
            "step '{}' failed: {}",
            step.name(),
            e
        ))),
        Err(_) => Err(PortalError::timeout(format!(
            "step '{}' timed out after {} ms",
            step.name(),
            timeout.as_millis()
        ))),
    }
}

/// A mounted application: configuration, filter table and ambient clients
pub struct App {
    config: Config,
    filters: FilterRegistry,
    telemetry: Option<Arc<TelemetryReporter>>,
    analytics: Arc<AnalyticsClient>,
    contracts_task: Option<JoinHandle<Result<()>>>,
}

impl App {
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Filter table handed to the rendering layer
    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Apply a named filter
    pub fn render(&self, filter: &str, value: &Value) -> Result<String> {
        self.filters.apply(filter, value)
    }

    /// Error reporter, present only when a DSN was configured
    pub fn telemetry(&self) -> Option<&Arc<TelemetryReporter>> {
        self.telemetry.as_ref()
    }

    pub fn analytics(&self) -> &Arc<AnalyticsClient> {
        &self.analytics
    }

    /// Wait for the background contracts step, if one was started and not
    /// yet joined
    pub async fn join_contracts(&mut self) -> Option<Result<()>> {
        let handle = self.contracts_task.take()?;
        Some(
            handle
                .await
                .unwrap_or_else(|e| Err(PortalError::init(format!("contracts task aborted: {}", e)))),
        )
    }

    /// Flush buffered telemetry and analytics and stop background work
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.contracts_task.take()
            && !handle.is_finished()
        {
            handle.abort();
        }

        let logger = get_logger("bootstrap");
        if let Some(t) = self.telemetry.as_ref()
            && let Err(e) = t.flush().await
        {
            logger.warn(&format!("Telemetry flush failed: {}", e));
        }
        if let Err(e) = self.analytics.flush().await {
            logger.warn(&format!("Analytics flush failed: {}", e));
        }
    }
}
