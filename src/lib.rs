//! # Headroom - Load vs. CPU Capacity Analysis
//!
//! Headroom pulls per-resource time series (request rate, CPU core count,
//! compute CPU utilization, database CPU utilization) for a fleet of server
//! groups, lines them up on a common minute axis, fits request-to-CPU lines
//! and tells you which groups look over- or under-provisioned.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────┐   ┌────────────────┐   ┌────────────────┐
//! │ MetricSource  │──▶│ BucketAggregator│──▶│     align()    │
//! │ (your backend)│   │ minute buckets │   │ inner/outer join│
//! └───────────────┘   └────────────────┘   └───────┬────────┘
//!                                                  │
//!                       ┌──────────────────────────▼──────────────┐
//!                       │ CapacityClassifier                      │
//!                       │ • least-squares lines (LinearModel)     │
//!                       │ • mean / stddev / centroid (stats)      │
//!                       │ • UPSCALE / DOWNSCALE / NONE            │
//!                       │ • break-even request rate               │
//!                       └──────────────────────────┬──────────────┘
//!                                                  │
//!                       ┌──────────────────────────▼──────────────┐
//!                       │ ReportAssembler → ReportRenderer        │
//!                       │               → ArtifactStore           │
//!                       │               → Notifier(s)             │
//!                       └─────────────────────────────────────────┘
//! ```
//!
//! Every resource is analyzed in its own task. A resource with no data, or
//! whose CPU and core count series never overlap, is skipped without
//! affecting the rest of the batch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use headroom::{
//!     AnalysisCallbacks, CallbackContext, CapacityAnalyzer, HeadroomConfig, HeadroomResult,
//!     MetricQuery, MetricSource, RawSample, StackTarget, TracingNotifier,
//! };
//! use std::sync::Arc;
//!
//! struct MyBackend;
//! #[async_trait::async_trait]
//! impl MetricSource for MyBackend {
//!     async fn fetch_metric(
//!         &self,
//!         _query: &MetricQuery,
//!         _context: &CallbackContext,
//!     ) -> HeadroomResult<Vec<RawSample>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> HeadroomResult<()> {
//!     let config = HeadroomConfig::builder()
//!         .region("ap-southeast-2")
//!         .window_days(7.0)
//!         .build();
//!
//!     let callbacks = AnalysisCallbacks::new(Arc::new(MyBackend))
//!         .add_notifier(Arc::new(TracingNotifier));
//!
//!     let analyzer = CapacityAnalyzer::new(config, callbacks)?;
//!     let summary = analyzer
//!         .run_batch(vec![StackTarget::new(
//!             "shop-api-prod-WebServerGroup-1A2B",
//!             "shop.api.prod.web",
//!             "shop-api-prod",
//!         )])
//!         .await;
//!
//!     for line in &summary.recommendations {
//!         println!("{}", line);
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod aligner;
pub mod callbacks;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod outputs;
pub mod regression;
pub mod report;
pub mod stats;
pub mod types;
pub mod utils;


// Re-export common types for convenience
pub use types::{
    AlignedPoint, BucketKey, ClassificationResult, LinearModel, MetricQuery, MetricValue,
    PointSet, RawSample, Recommendation, ResourceDimension, ResourceId, Series,
};

pub use config::{
    ClassifierThresholds, DimensionSource, FleetConfig, HeadroomConfig, HeadroomConfigBuilder,
    MetricCatalog, MetricSpec, ReportMode,
};

pub use error::{HeadroomError, HeadroomResult};

pub use aggregator::{BucketAggregator, Period, TimeWindow};
pub use aligner::{align, AlignedSeries, ResourceSeries};
pub use classifier::{recommendation_message, CapacityAssessment, CapacityClassifier};
pub use fleet::{targets_from_groups, StackTarget};
pub use report::{ReportAssembler, ReportBody, ResourceReport};
pub use stats::Summary;

pub use callbacks::{
    AnalysisCallbacks, ArtifactStore, CallbackContext, FleetDiscovery, MetricSource, Notifier,
    ReportRenderer,
};

pub use engine::{BatchSummary, CapacityAnalyzer, SkippedResource};

pub use outputs::{JsonReportRenderer, LocalDirectoryStore, TracingNotifier};
