//! Report bundles handed to renderers.
//!
//! The assembler decides what is shown (series, lines, labels) but has no
//! opinion on pixels, colours or file formats.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::Period;
use crate::aligner::AlignedSeries;
use crate::classifier::{recommendation_message, CapacityAssessment};
use crate::config::{HeadroomConfig, ReportMode};
use crate::fleet::StackTarget;
use crate::stats::frequency_histogram;
use crate::types::{ClassificationResult, LinearModel, PointSet, ResourceId, Series};
use crate::utils::{artifact_key, format_optional, monthly_total, timespan_label};

/// Bin count suggested to renderers for the utilization histogram
pub const HISTOGRAM_BINS: usize = 6;

/// A straight segment between two plot coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub from: (f64, f64),
    pub to: (f64, f64),
}

impl LineSegment {
    /// `line` drawn across `x_range`, `None` when the line is undefined
    pub fn along(line: &LinearModel, x_range: Option<(f64, f64)>) -> Option<Self> {
        let (min, max) = x_range?;
        if !line.is_defined() {
            return None;
        }
        Some(Self {
            from: (min, line.predict(min)),
            to: (max, line.predict(max)),
        })
    }

    /// Horizontal segment at `y` across `x_range`
    pub fn horizontal(y: f64, x_range: Option<(f64, f64)>) -> Option<Self> {
        let (min, max) = x_range?;
        Some(Self {
            from: (min, y),
            to: (max, y),
        })
    }
}

/// A named point set as it appears in a legend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    pub name: String,
    pub points: PointSet,
}

/// Requests against utilization, with fitted lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterReport {
    pub x_label: String,
    pub y_label: String,
    pub y_range: (f64, f64),
    pub rds: NamedSeries,
    pub ec2: NamedSeries,
    pub rds_line: LinearModel,
    pub ec2_line: LinearModel,
    pub rds_segment: Option<LineSegment>,
    pub ec2_segment: Option<LineSegment>,
    /// Dashed line at saturation across the compute x-range
    pub saturation_segment: Option<LineSegment>,
    pub centroid: (f64, f64),
    pub classification: ClassificationResult,
}

/// Frequency of whole-number compute CPU utilization values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramReport {
    pub x_label: String,
    pub y_label: String,
    pub bins: usize,
    pub frequencies: BTreeMap<i64, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportBody {
    Scatter(Box<ScatterReport>),
    Histogram(HistogramReport),
}

/// Everything the renderer needs for one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub resource_id: ResourceId,
    pub group_name: String,
    pub title: String,
    pub window_start: DateTime<Utc>,
    pub observed_at: DateTime<Utc>,
    /// Summary lines, in display order
    pub labels: Vec<String>,
    pub artifact_key: String,
    pub body: ReportBody,
}

impl ResourceReport {
    pub fn classification(&self) -> Option<&ClassificationResult> {
        match &self.body {
            ReportBody::Scatter(scatter) => Some(&scatter.classification),
            ReportBody::Histogram(_) => None,
        }
    }

    /// Recommendation text when the classification calls for a change
    pub fn recommendation_message(&self) -> Option<String> {
        self.classification()
            .and_then(|result| recommendation_message(&self.resource_id, result))
    }
}

/// Builds [`ResourceReport`]s from analysis output
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    window: Duration,
    saturation: f64,
    output_prefix: String,
    extension: String,
    mode: ReportMode,
}

impl ReportAssembler {
    /// `extension` is the file type the wired renderer produces
    pub fn new(config: &HeadroomConfig, extension: &str) -> Self {
        Self {
            window: Period::from_config(config).span(),
            saturation: config.thresholds.saturation,
            output_prefix: config.output_prefix.clone(),
            extension: extension.to_string(),
            mode: config.report_mode,
        }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    fn header(&self, target: &StackTarget, observed_at: DateTime<Utc>, labels: Vec<String>, body: ReportBody) -> ResourceReport {
        ResourceReport {
            resource_id: target.stack_name.clone(),
            group_name: target.group_name.clone(),
            title: target.stack_name.clone(),
            window_start: observed_at - self.window,
            observed_at,
            labels,
            artifact_key: artifact_key(&self.output_prefix, observed_at, &target.stack_name, &self.extension),
            body,
        }
    }

    pub fn scatter(
        &self,
        target: &StackTarget,
        observed_at: DateTime<Utc>,
        aligned: AlignedSeries,
        assessment: &CapacityAssessment,
    ) -> ResourceReport {
        let classification = assessment.classification;
        let ec2_range = aligned.ec2.x_range();
        let rds_range = aligned.rds.x_range();

        let labels = vec![
            timespan_label(observed_at - self.window, observed_at),
            format!(
                "EC2 CPU mean: {:.1}%/min (stddev: {:.1})",
                assessment.utilization.mean, assessment.utilization.std_dev
            ),
            format!(
                "Mean request {:.1}/min (stddev: {:.1}) ({:.0}/mnth)",
                assessment.requests.mean,
                assessment.requests.std_dev,
                monthly_total(assessment.requests.mean)
            ),
            format!("CPU Cores mean: {:.1}", assessment.mean_cores),
            format!(
                "estimated max request per min: {} (RDS: {})",
                format_optional(classification.break_even_request_rate),
                format_optional(classification.rds_break_even_request_rate)
            ),
            format!("data points: {}", assessment.point_count),
        ];

        let body = ScatterReport {
            x_label: "reqs / min".to_string(),
            y_label: "t2 usage %".to_string(),
            y_range: (0.0, self.saturation + 1.0),
            rds_segment: LineSegment::along(&assessment.rds_line, rds_range),
            ec2_segment: LineSegment::along(&assessment.ec2_line, ec2_range),
            saturation_segment: LineSegment::horizontal(self.saturation, ec2_range),
            rds: NamedSeries {
                name: "RDS CPU".to_string(),
                points: aligned.rds,
            },
            ec2: NamedSeries {
                name: "EC2 CPU".to_string(),
                points: aligned.ec2,
            },
            rds_line: assessment.rds_line,
            ec2_line: assessment.ec2_line,
            centroid: assessment.centroid,
            classification,
        };

        self.header(target, observed_at, labels, ReportBody::Scatter(Box::new(body)))
    }

    pub fn histogram(&self, target: &StackTarget, observed_at: DateTime<Utc>, cpu_utilization: &Series) -> ResourceReport {
        let labels = vec![
            timespan_label(observed_at - self.window, observed_at),
            format!("data points: {}", cpu_utilization.len()),
        ];
        let body = HistogramReport {
            x_label: "cpu utilisation".to_string(),
            y_label: "freq".to_string(),
            bins: HISTOGRAM_BINS,
            frequencies: frequency_histogram(cpu_utilization),
        };
        self.header(target, observed_at, labels, ReportBody::Histogram(body))
    }
}
