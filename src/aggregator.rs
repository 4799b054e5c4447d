//! Time-bucket aggregation of raw metric samples.
//!
//! Every sample is keyed by the whole minutes elapsed between its timestamp and
//! a single observation instant. Samples landing in the same bucket are added
//! together, matching the `Sum` statistic requested from the metric source.
//!
//! Long windows are fetched as one sub-request per day. Every sub-request of a
//! resource is bucketed against the same [`BucketAggregator`] instant, so the
//! series of that resource share one key space and can be joined later.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::callbacks::{CallbackContext, MetricSource};
use crate::config::{HeadroomConfig, MetricSpec};
use crate::error::{HeadroomError, HeadroomResult};
use crate::types::{BucketKey, MetricQuery, RawSample, ResourceDimension, Series, SUM_STATISTIC};

const DAY_MILLIS: f64 = 86_400_000.0;

/// A half-open fetch window `[start, end)` for one sub-request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The history span analyzed per resource and the resolution it is fetched at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Period {
    span: Duration,
    pub resolution_seconds: u32,
}

impl Period {
    pub fn new(span: Duration, resolution_seconds: u32) -> Self {
        Self {
            span,
            resolution_seconds,
        }
    }

    pub fn from_config(config: &HeadroomConfig) -> Self {
        Self::new(days_to_duration(config.window_days), config.resolution_seconds)
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    /// Length of the span in (possibly fractional) days
    pub fn days(&self) -> f64 {
        self.span.num_milliseconds() as f64 / DAY_MILLIS
    }

    /// Start of the sub-window `days_ago` days back, one second early so the
    /// boundary datapoint is included
    pub fn start(&self, observed_at: DateTime<Utc>, days_ago: f64) -> DateTime<Utc> {
        observed_at - days_to_duration(days_ago) - Duration::seconds(1)
    }

    /// End of the sub-window `days_ago` days back
    pub fn end(&self, observed_at: DateTime<Utc>, days_ago: f64) -> DateTime<Utc> {
        observed_at - days_to_duration((days_ago - 1.0).max(0.0))
    }

    /// One window per day, oldest first.
    ///
    /// Only the oldest window reaches one second early. Every later window
    /// starts where the previous one ended, so no datapoint is fetched twice.
    pub fn windows(&self, observed_at: DateTime<Utc>) -> Vec<TimeWindow> {
        let mut windows: Vec<TimeWindow> = Vec::new();
        let mut days_ago = self.days();
        while days_ago > 0.0 {
            let start = match windows.last() {
                Some(previous) => previous.end,
                None => self.start(observed_at, days_ago),
            };
            windows.push(TimeWindow {
                start,
                end: self.end(observed_at, days_ago),
            });
            days_ago -= 1.0;
        }
        windows
    }
}

fn days_to_duration(days: f64) -> Duration {
    Duration::milliseconds((days * DAY_MILLIS).round() as i64)
}

/// Buckets samples against one fixed observation instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketAggregator {
    observed_at: DateTime<Utc>,
}

impl BucketAggregator {
    pub fn new(observed_at: DateTime<Utc>) -> Self {
        Self { observed_at }
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Whole minutes between `timestamp` and the observation instant.
    ///
    /// Returns `None` for samples after the observation instant.
    pub fn bucket_key(&self, timestamp: DateTime<Utc>) -> Option<BucketKey> {
        let elapsed = self.observed_at.signed_duration_since(timestamp);
        if elapsed < Duration::zero() {
            return None;
        }
        Some(elapsed.num_minutes() as BucketKey)
    }

    /// Add `samples` into `series`, returning how many were dropped as future samples
    pub fn aggregate_into(&self, series: &mut Series, samples: &[RawSample]) -> usize {
        let mut dropped = 0;
        for sample in samples {
            match self.bucket_key(sample.timestamp) {
                Some(key) => series.accumulate(key, sample.value),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            warn!(
                dropped,
                observed_at = %self.observed_at,
                "Dropped samples timestamped after the observation instant"
            );
        }
        dropped
    }

    pub fn aggregate(&self, samples: &[RawSample]) -> Series {
        let mut series = Series::new();
        self.aggregate_into(&mut series, samples);
        series
    }

    /// Fetch one metric over the whole period, one sub-request per day, and
    /// fold every response into a single series.
    ///
    /// Returns [`HeadroomError::NoDataPoints`] when the whole period is empty.
    /// Source failures are returned as-is and are not retried.
    pub async fn collect(
        &self,
        source: &dyn MetricSource,
        spec: &MetricSpec,
        dimension: &ResourceDimension,
        period: &Period,
        context: &CallbackContext,
    ) -> HeadroomResult<Series> {
        let mut series = Series::new();

        for window in period.windows(self.observed_at) {
            let query = MetricQuery {
                dimension: dimension.clone(),
                namespace: spec.namespace.clone(),
                metric_name: spec.metric_name.clone(),
                start: window.start,
                end: window.end,
                resolution_seconds: period.resolution_seconds,
                statistic: SUM_STATISTIC.to_string(),
            };

            let samples = source.fetch_metric(&query, context).await?;
            debug!(
                metric = %spec.metric_name,
                dimension = %dimension.value,
                start = %window.start,
                end = %window.end,
                samples = samples.len(),
                "Fetched metric window"
            );
            self.aggregate_into(&mut series, &samples);
        }

        if series.is_empty() {
            return Err(HeadroomError::no_data_points(
                spec.metric_name.as_str(),
                dimension.value.as_str(),
            ));
        }

        Ok(series)
    }
}
