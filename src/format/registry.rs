//! Named filter table consulted by the rendering layer.

use super::DisplayFormatter;
use crate::error::{PortalError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub const CUSTOMER_SPECIMEN_STATUS: &str = "customerSpecimenStatus";
pub const SPECIMEN_NUMBER: &str = "specimenNumber";
pub const TIMESTAMP_TO_DATE: &str = "timestampToDate";
pub const TIMESTAMP_TO_DATE_TIME: &str = "timestampToDateTime";

/// A display transform: one value in, one string out, never fails
pub type FilterFn = dyn Fn(&Value) -> String + Send + Sync;

/// Mapping from filter name to transform
#[derive(Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, Arc<FilterFn>>,
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("filters", &self.names())
            .finish()
    }
}

impl FilterRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry publishing the four display filters bound to `formatter`
    pub fn with_display_filters(formatter: DisplayFormatter) -> Self {
        let mut registry = Self::new();
        registry.register(CUSTOMER_SPECIMEN_STATUS, move |v| {
            formatter.customer_specimen_status(v)
        });
        registry.register(SPECIMEN_NUMBER, move |v| formatter.specimen_number(v));
        registry.register(TIMESTAMP_TO_DATE, move |v| formatter.timestamp_to_date(v));
        registry.register(TIMESTAMP_TO_DATE_TIME, move |v| {
            formatter.timestamp_to_date_time(v)
        });
        registry
    }

    /// Register `filter` under `name`, returning any filter it replaces
    pub fn register<F>(&mut self, name: impl Into<String>, filter: F) -> Option<Arc<FilterFn>>
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(filter))
    }

    pub fn get(&self, name: &str) -> Option<Arc<FilterFn>> {
        self.filters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Apply the filter registered as `name` to `value`
    pub fn apply(&self, name: &str, value: &Value) -> Result<String> {
        let filter = self
            .filters
            .get(name)
            .ok_or_else(|| PortalError::filter(format!("unknown filter '{}'", name)))?;
        Ok(filter(value))
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Evaluate a `filter value` expression. The value is read as JSON and
    /// falls back to a string of the raw text; a bare name applies to null.
    pub fn render_expression(&self, expression: &str) -> Result<String> {
        let expression = expression.trim();
        let (name, raw) = expression
            .split_once(char::is_whitespace)
            .map_or((expression, ""), |(n, r)| (n, r.trim()));

        let value = if raw.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
        };
        self.apply(name, &value)
    }
}
