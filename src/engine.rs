// src/engine.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::aggregator::{BucketAggregator, Period};
use crate::aligner::{align, ResourceSeries};
use crate::callbacks::{AnalysisCallbacks, CallbackContext};
use crate::classifier::CapacityClassifier;
use crate::config::{HeadroomConfig, MetricSpec, ReportMode};
use crate::error::{HeadroomError, HeadroomResult};
use crate::fleet::{targets_from_groups, StackTarget};
use crate::report::{ReportAssembler, ResourceReport};
use crate::types::{ResourceId, Series};

/// A resource that produced no report in a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedResource {
    pub resource_id: ResourceId,
    pub reason: String,
    /// `true` for expected data-shape outcomes (no data, empty join)
    pub expected: bool,
}

/// Outcome of one batch across the fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub observed_at: DateTime<Utc>,
    pub reports: Vec<ResourceReport>,
    pub skipped: Vec<SkippedResource>,
    /// Recommendation text for every report that calls for a change
    pub recommendations: Vec<String>,
}

impl BatchSummary {
    fn new(observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            reports: Vec::new(),
            skipped: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    fn record_report(&mut self, report: ResourceReport) {
        if let Some(message) = report.recommendation_message() {
            self.recommendations.push(message);
        }
        self.reports.push(report);
    }

    fn record_skip(&mut self, resource_id: ResourceId, error: &HeadroomError) {
        self.skipped.push(SkippedResource {
            resource_id,
            reason: error.to_string(),
            expected: error.is_skippable(),
        });
    }

    pub fn report_for(&self, resource_id: &str) -> Option<&ResourceReport> {
        self.reports.iter().find(|r| r.resource_id == resource_id)
    }

    pub fn analyzed(&self) -> usize {
        self.reports.len()
    }
}

/// Runs the capacity pipeline over a fleet, one independent task per resource
pub struct CapacityAnalyzer {
    config: Arc<HeadroomConfig>,
    callbacks: AnalysisCallbacks,
}

impl CapacityAnalyzer {
    /// Create a new analyzer, rejecting unusable configuration up front
    pub fn new(config: HeadroomConfig, callbacks: AnalysisCallbacks) -> HeadroomResult<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            callbacks,
        })
    }

    pub fn config(&self) -> &HeadroomConfig {
        &self.config
    }

    /// Discover the fleet and analyze every group that follows the naming convention
    pub async fn run(&self) -> HeadroomResult<BatchSummary> {
        let discovery = self
            .callbacks
            .fleet_discovery
            .as_ref()
            .ok_or_else(|| HeadroomError::config("no fleet discovery configured"))?;

        let observed_at = Utc::now();
        let context = CallbackContext::new(observed_at).with_metadata("region", &self.config.region);
        let groups = discovery.list_groups(&self.config.region, &context).await?;
        let targets = targets_from_groups(&groups, &self.config.fleet);
        info!(groups = groups.len(), targets = targets.len(), region = %self.config.region, "Fleet discovered");

        Ok(self.run_batch_at(targets, observed_at).await)
    }

    /// Analyze `targets` against the current instant
    pub async fn run_batch(&self, targets: Vec<StackTarget>) -> BatchSummary {
        self.run_batch_at(targets, Utc::now()).await
    }

    /// Analyze `targets` concurrently against one observation instant.
    ///
    /// Completes once every task has finished. A failed resource is recorded
    /// as skipped and never affects its siblings.
    pub async fn run_batch_at(&self, targets: Vec<StackTarget>, observed_at: DateTime<Utc>) -> BatchSummary {
        info!(resources = targets.len(), %observed_at, "Capacity analysis batch starting");

        let (resource_ids, handles): (Vec<_>, Vec<_>) = targets
            .into_iter()
            .map(|target| {
                let resource_id = target.stack_name.clone();
                let unit = self.unit(target, observed_at);
                (resource_id, tokio::spawn(unit.execute()))
            })
            .unzip();

        let results = join_all(handles).await;

        let mut summary = BatchSummary::new(observed_at);
        for (resource_id, joined) in resource_ids.into_iter().zip(results) {
            match joined.map_err(HeadroomError::from).and_then(|outcome| outcome) {
                Ok(report) => summary.record_report(report),
                Err(e) => {
                    if matches!(e, HeadroomError::TaskFailed { .. }) {
                        error!(resource = %resource_id, "Analysis task failed: {}", e);
                    }
                    summary.record_skip(resource_id, &e);
                }
            }
        }

        info!(
            analyzed = summary.analyzed(),
            skipped = summary.skipped.len(),
            recommendations = summary.recommendations.len(),
            "Capacity analysis batch finished"
        );
        summary
    }

    /// Run the pipeline for a single resource on the current task
    pub async fn analyze_target(&self, target: StackTarget, observed_at: DateTime<Utc>) -> HeadroomResult<ResourceReport> {
        self.unit(target, observed_at).execute().await
    }

    fn unit(&self, target: StackTarget, observed_at: DateTime<Utc>) -> ResourceUnit {
        ResourceUnit {
            config: Arc::clone(&self.config),
            callbacks: self.callbacks.clone(),
            target,
            observed_at,
        }
    }
}

/// One resource's unit of work. Owns everything it touches.
struct ResourceUnit {
    config: Arc<HeadroomConfig>,
    callbacks: AnalysisCallbacks,
    target: StackTarget,
    observed_at: DateTime<Utc>,
}

impl ResourceUnit {
    async fn execute(self) -> HeadroomResult<ResourceReport> {
        let context = CallbackContext::new(self.observed_at)
            .with_metadata("resource", &self.target.stack_name)
            .with_metadata("region", &self.config.region);

        match self.analyze(&context).await {
            Ok(report) => {
                self.notify_recommendation(&report, &context).await;
                Ok(report)
            }
            Err(e) => {
                if e.is_skippable() {
                    debug!(resource = %self.target.stack_name, "Skipping resource: {}", e);
                } else {
                    warn!(resource = %self.target.stack_name, "Failed to analyze resource: {}", e);
                }
                self.notify_skipped(&e, &context).await;
                Err(e)
            }
        }
    }

    async fn analyze(&self, context: &CallbackContext) -> HeadroomResult<ResourceReport> {
        let series = self.fetch_series(context).await?;

        let extension = match &self.callbacks.renderer {
            Some(renderer) => renderer.format().to_string(),
            None => self.config.image_format.clone(),
        };
        let assembler = ReportAssembler::new(&self.config, &extension);

        let report = match assembler.mode() {
            ReportMode::Histogram => {
                assembler.histogram(&self.target, self.observed_at, &series.cpu_utilization)
            }
            ReportMode::Scatter => {
                let aligned = align(&series);
                let classifier = CapacityClassifier::new(self.config.thresholds);
                let assessment = classifier.assess(&self.target.stack_name, &aligned)?;
                debug!(
                    resource = %self.target.stack_name,
                    points = assessment.point_count,
                    mean_utilization = assessment.classification.mean_utilization,
                    "Resource assessed"
                );
                assembler.scatter(&self.target, self.observed_at, aligned, &assessment)
            }
        };

        self.deliver(&report, context).await?;
        Ok(report)
    }

    async fn fetch_series(&self, context: &CallbackContext) -> HeadroomResult<ResourceSeries> {
        let aggregator = BucketAggregator::new(self.observed_at);
        let period = Period::from_config(&self.config);
        let catalog = &self.config.metrics;

        Ok(ResourceSeries {
            requests: self.fetch(&aggregator, &period, &catalog.requests, context).await?,
            cpu_cores: self.fetch(&aggregator, &period, &catalog.cpu_cores, context).await?,
            cpu_utilization: self.fetch(&aggregator, &period, &catalog.cpu_utilization, context).await?,
            rds_utilization: self.fetch(&aggregator, &period, &catalog.rds_utilization, context).await?,
        })
    }

    async fn fetch(
        &self,
        aggregator: &BucketAggregator,
        period: &Period,
        spec: &MetricSpec,
        context: &CallbackContext,
    ) -> HeadroomResult<Series> {
        let dimension = self.target.dimension_for(spec);
        let source = self.callbacks.metric_source.as_ref();
        match aggregator.collect(source, spec, &dimension, period, context).await {
            Err(HeadroomError::NoDataPoints { .. }) if !spec.required => {
                debug!(
                    resource = %self.target.stack_name,
                    metric = %spec.metric_name,
                    "Optional metric has no data, treating as empty"
                );
                Ok(Series::new())
            }
            other => other,
        }
    }

    async fn deliver(&self, report: &ResourceReport, context: &CallbackContext) -> HeadroomResult<()> {
        let Some(renderer) = &self.callbacks.renderer else {
            return Ok(());
        };
        let body = renderer.render(report, context).await?;

        match &self.callbacks.artifact_store {
            Some(store) => store.put(&report.artifact_key, body, context).await,
            None => {
                debug!(resource = %report.resource_id, "No artifact store wired, rendered report dropped");
                Ok(())
            }
        }
    }

    async fn notify_recommendation(&self, report: &ResourceReport, context: &CallbackContext) {
        let Some(message) = report.recommendation_message() else {
            return;
        };
        info!(resource = %report.resource_id, "{}", message);

        let results = join_all(
            self.callbacks
                .notifiers
                .iter()
                .map(|notifier| notifier.on_recommendation(report, &message, context)),
        )
        .await;
        for result in results {
            if let Err(e) = result {
                warn!("Notifier error on recommendation: {}", e);
            }
        }
    }

    async fn notify_skipped(&self, error: &HeadroomError, context: &CallbackContext) {
        let resource_id = self.target.stack_name.as_str();
        let results = join_all(
            self.callbacks
                .notifiers
                .iter()
                .map(|notifier| notifier.on_resource_skipped(resource_id, error, context)),
        )
        .await;
        for result in results {
            if let Err(e) = result {
                warn!("Notifier error on resource skipped: {}", e);
            }
        }
    }
}
