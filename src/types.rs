// src/types.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a resource (e.g., "sssites.ssorg.prod.web")
pub type ResourceId = String;

/// A metric value (request count, CPU %, core count)
pub type MetricValue = f64;

/// Whole minutes elapsed between a sample's timestamp and the observation instant
pub type BucketKey = u64;

/// Statistic requested from the metric source. Samples sharing a bucket are added.
pub const SUM_STATISTIC: &str = "Sum";

/// A raw datapoint as returned by the metric source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// When the datapoint was recorded
    pub timestamp: DateTime<Utc>,
    /// The summed value for that period
    pub value: MetricValue,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, value: MetricValue) -> Self {
        Self { timestamp, value }
    }
}

/// A sparse, bucket-keyed series for one metric of one resource.
///
/// Keys are unique. Values landing in an existing bucket are added to it,
/// never overwritten. Iteration is in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    buckets: BTreeMap<BucketKey, MetricValue>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `value` into the bucket at `key`, creating it if absent
    pub fn accumulate(&mut self, key: BucketKey, value: MetricValue) {
        *self.buckets.entry(key).or_insert(0.0) += value;
    }

    /// Fold every bucket of `other` into this series
    pub fn get(&self, key: BucketKey) -> Option<MetricValue> {
        self.buckets.get(&key).copied()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BucketKey, MetricValue)> + '_ {
        self.buckets.iter().map(|(k, v)| (*k, *v))
    }
}

impl FromIterator<(BucketKey, MetricValue)> for Series {
    fn from_iter<I: IntoIterator<Item = (BucketKey, MetricValue)>>(iter: I) -> Self {
        let mut series = Series::new();
        for (key, value) in iter {
            series.accumulate(key, value);
        }
        series
    }
}

/// One bucket where the compute CPU and core count series both have data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignedPoint {
    pub bucket_key: BucketKey,
    /// Requests in this bucket, 0 when the request series has no entry
    pub request: MetricValue,
    /// Summed compute CPU utilization
    pub cpu_util_pct: MetricValue,
    /// Core count, always positive since the join drops unusable counts
    pub cpu_cores: MetricValue,
    /// Database CPU utilization, 0 when the database series has no entry
    pub rds_util_pct: MetricValue,
}

impl AlignedPoint {
    /// CPU utilization normalized to a single core
    pub fn per_core_utilization(&self) -> MetricValue {
        self.cpu_util_pct / self.cpu_cores
    }
}

/// Column-oriented point set handed to regression, statistics and rendering.
///
/// `z` is only populated for the compute set, where it carries the core count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointSet {
    pub bucket_keys: Vec<BucketKey>,
    pub x: Vec<MetricValue>,
    pub y: Vec<MetricValue>,
    pub z: Vec<MetricValue>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: BucketKey, x: MetricValue, y: MetricValue) {
        self.bucket_keys.push(key);
        self.x.push(x);
        self.y.push(y);
    }

    pub fn push_xyz(&mut self, key: BucketKey, x: MetricValue, y: MetricValue, z: MetricValue) {
        self.push(key, x, y);
        self.z.push(z);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Smallest and largest x, `None` for an empty set
    pub fn x_range(&self) -> Option<(MetricValue, MetricValue)> {
        if self.x.is_empty() {
            return None;
        }
        let min = self.x.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }
}

/// A single-predictor line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub slope: f64,
    pub intercept: f64,
}

/// Scale recommendation for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    /// Mean per-core utilization is above the upscale threshold
    Upscale,
    /// Mean per-core utilization is below the downscale threshold
    Downscale,
    /// Utilization sits between the thresholds
    None,
}

impl Recommendation {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Recommendation::None)
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Recommendation::Upscale => write!(f, "upscaling"),
            Recommendation::Downscale => write!(f, "downscaling"),
            Recommendation::None => write!(f, "no change"),
        }
    }
}

/// Outcome of classifying one resource
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub mean_utilization: f64,
    pub std_dev_utilization: f64,
    pub recommendation: Recommendation,
    /// Request rate at which the compute line reaches saturation.
    /// Advisory only; `None` when the line is flat, degenerate or crosses
    /// at a negative rate.
    pub break_even_request_rate: Option<f64>,
    /// Same, for the database line
    pub rds_break_even_request_rate: Option<f64>,
}

/// Dimension filter for a metric query (e.g., `Stack = sssites.ssorg.prod.web`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDimension {
    pub name: String,
    pub value: String,
}

/// A fully resolved request against the metric source for one sub-window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub dimension: ResourceDimension,
    pub namespace: String,
    pub metric_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub resolution_seconds: u32,
    pub statistic: String,
}
