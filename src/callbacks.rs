// src/callbacks.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{HeadroomError, HeadroomResult};
use crate::report::ResourceReport;
use crate::types::{MetricQuery, RawSample};

/// Context provided to callbacks with additional information
#[derive(Debug, Clone)]
pub struct CallbackContext {
    /// Observation instant of the run the callback belongs to
    pub observed_at: DateTime<Utc>,
    /// Any additional metadata from the analyzer
    pub metadata: HashMap<String, String>,
}

impl CallbackContext {
    pub fn new(observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

/// Supplies raw datapoints from a monitoring backend
///
/// Implement this to connect the analyzer to CloudWatch, Prometheus or any
/// other store that can answer a summed, fixed-resolution range query.
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch datapoints for one sub-window
    ///
    /// # Arguments
    /// * `query` - Dimension, metric, window, resolution and statistic
    /// * `context` - Additional context for the callback
    ///
    /// # Returns
    /// * `Ok(samples)` - Datapoints in the window, possibly none
    /// * `Err(error)` - The backend failed; the resource is skipped for this run
    async fn fetch_metric(
        &self,
        query: &MetricQuery,
        context: &CallbackContext,
    ) -> HeadroomResult<Vec<RawSample>>;
}

/// Lists the server groups that exist in a region
#[async_trait]
pub trait FleetDiscovery: Send + Sync {
    async fn list_groups(&self, region: &str, context: &CallbackContext) -> HeadroomResult<Vec<String>>;
}

/// Turns a report bundle into an artifact (image, document, ...)
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    /// File extension of the rendered artifact
    fn format(&self) -> &str;

    async fn render(&self, report: &ResourceReport, context: &CallbackContext) -> HeadroomResult<Vec<u8>>;
}

/// Persists rendered artifacts
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>, context: &CallbackContext) -> HeadroomResult<()>;
}

/// Trait for receiving analysis outcomes
///
/// Implement this to deliver recommendations by email, chat, logs, etc.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Called when a resource gets an actionable recommendation
    async fn on_recommendation(
        &self,
        _report: &ResourceReport,
        _message: &str,
        _context: &CallbackContext,
    ) -> HeadroomResult<()> {
        // Default implementation: do nothing
        Ok(())
    }

    /// Called when a resource is abandoned for this run
    async fn on_resource_skipped(
        &self,
        _resource_id: &str,
        _error: &HeadroomError,
        _context: &CallbackContext,
    ) -> HeadroomResult<()> {
        // Default implementation: do nothing
        Ok(())
    }
}

/// Combine all collaborators into a single struct for easier management
///
/// Only the metric source is mandatory. Everything else is an optional
/// capability that is skipped when not wired in.
#[derive(Clone)]
pub struct AnalysisCallbacks {
    pub metric_source: Arc<dyn MetricSource>,
    pub fleet_discovery: Option<Arc<dyn FleetDiscovery>>,
    pub renderer: Option<Arc<dyn ReportRenderer>>,
    pub artifact_store: Option<Arc<dyn ArtifactStore>>,
    pub notifiers: Vec<Arc<dyn Notifier>>,
}

impl AnalysisCallbacks {
    /// Create a new callback configuration
    pub fn new(metric_source: Arc<dyn MetricSource>) -> Self {
        Self {
            metric_source,
            fleet_discovery: None,
            renderer: None,
            artifact_store: None,
            notifiers: Vec::new(),
        }
    }

    pub fn with_fleet_discovery(mut self, discovery: Arc<dyn FleetDiscovery>) -> Self {
        self.fleet_discovery = Some(discovery);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ReportRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_artifact_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.artifact_store = Some(store);
        self
    }

    /// Add a notifier to receive recommendations
    pub fn add_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifiers.push(notifier);
        self
    }
}
