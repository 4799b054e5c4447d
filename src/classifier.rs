//! Threshold classification of mean per-core CPU utilization.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aligner::AlignedSeries;
use crate::config::ClassifierThresholds;
use crate::error::{HeadroomError, HeadroomResult};
use crate::stats::{centroid, mean, Summary};
use crate::types::{ClassificationResult, LinearModel, Recommendation};

/// Everything derived from one resource's aligned points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAssessment {
    /// Compute line: requests → per-core CPU
    pub ec2_line: LinearModel,
    /// Database line: requests → database CPU
    pub rds_line: LinearModel,
    /// Per-core compute CPU
    pub utilization: Summary,
    pub requests: Summary,
    pub mean_cores: f64,
    /// `(mean requests, mean per-core CPU)`
    pub centroid: (f64, f64),
    pub point_count: usize,
    pub classification: ClassificationResult,
}

/// Turns aligned points into a scale recommendation
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapacityClassifier {
    thresholds: ClassifierThresholds,
}

impl CapacityClassifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    /// Strict comparisons: a mean exactly on a threshold is `None`
    pub fn recommend(&self, mean_utilization: f64) -> Recommendation {
        if mean_utilization > self.thresholds.upscale_above {
            Recommendation::Upscale
        } else if mean_utilization < self.thresholds.downscale_below {
            Recommendation::Downscale
        } else {
            Recommendation::None
        }
    }

    /// Request rate at which `line` reaches saturation.
    ///
    /// Advisory only. `None` for flat or undefined lines and for crossings at a
    /// negative request rate.
    pub fn break_even(&self, line: &LinearModel) -> Option<f64> {
        line.x_at(self.thresholds.saturation).filter(|x| *x >= 0.0)
    }

    /// Classify per-core utilization values against fitted lines
    pub fn classify(
        &self,
        utilization: &[f64],
        ec2_line: &LinearModel,
        rds_line: &LinearModel,
    ) -> ClassificationResult {
        let summary = Summary::of(utilization);
        ClassificationResult {
            mean_utilization: summary.mean,
            std_dev_utilization: summary.std_dev,
            recommendation: self.recommend(summary.mean),
            break_even_request_rate: self.break_even(ec2_line),
            rds_break_even_request_rate: self.break_even(rds_line),
        }
    }

    /// Fit both lines, summarize, and classify one resource.
    ///
    /// Fails with [`HeadroomError::JoinEmpty`] when there is nothing to assess.
    /// A degenerate fit is not an error here: the line is left undefined and
    /// its break-even rate is reported as `None`.
    pub fn assess(&self, resource: &str, aligned: &AlignedSeries) -> HeadroomResult<CapacityAssessment> {
        aligned.ensure_not_empty(resource)?;

        let ec2 = &aligned.ec2;
        let rds = &aligned.rds;

        let ec2_line = fit_or_undefined(resource, "ec2", &ec2.x, &ec2.y);
        let rds_line = fit_or_undefined(resource, "rds", &rds.x, &rds.y);

        Ok(CapacityAssessment {
            ec2_line,
            rds_line,
            utilization: Summary::of(&ec2.y),
            requests: Summary::of(&ec2.x),
            mean_cores: mean(&ec2.z),
            centroid: centroid(&ec2.x, &ec2.y),
            point_count: ec2.len(),
            classification: self.classify(&ec2.y, &ec2_line, &rds_line),
        })
    }
}

fn fit_or_undefined(resource: &str, line: &str, x: &[f64], y: &[f64]) -> LinearModel {
    match LinearModel::try_fit(x, y) {
        Ok(model) => model,
        Err(HeadroomError::DegenerateRegression { points, message }) => {
            debug!(resource, line, points, %message, "Regression is degenerate, break-even omitted");
            LinearModel::undefined()
        }
        Err(_) => LinearModel::undefined(),
    }
}

/// Operator-facing recommendation text, `None` when no change is suggested
pub fn recommendation_message(resource: &str, result: &ClassificationResult) -> Option<String> {
    if !result.recommendation.is_actionable() {
        return None;
    }
    Some(format!(
        "{} is a candidate for {}, mean CPU: {:.1}%",
        resource, result.recommendation, result.mean_utilization
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::{align, ResourceSeries};
    use crate::types::Series;

    fn classifier() -> CapacityClassifier {
        CapacityClassifier::default()
    }

    #[test]
    fn thresholds_are_strict() {
        let c = classifier();
        assert_eq!(c.recommend(71.0), Recommendation::Upscale);
        assert_eq!(c.recommend(29.9), Recommendation::Downscale);
        assert_eq!(c.recommend(50.0), Recommendation::None);
        assert_eq!(c.recommend(70.0), Recommendation::None);
        assert_eq!(c.recommend(30.0), Recommendation::None);
    }

    #[test]
    fn break_even_at_saturation() {
        let c = classifier();
        assert_eq!(c.break_even(&LinearModel::new(2.0, 1.0)), Some(49.5));
        assert_eq!(c.break_even(&LinearModel::new(0.0, 1.0)), None);
        assert_eq!(c.break_even(&LinearModel::undefined()), None);
        // already saturated at zero requests
        assert_eq!(c.break_even(&LinearModel::new(1.0, 150.0)), None);
    }

    #[test]
    fn classify_reports_mean_and_spread() {
        let result = classifier().classify(
            &[70.0, 80.0, 90.0],
            &LinearModel::new(2.0, 1.0),
            &LinearModel::new(0.5, 0.0),
        );
        assert_eq!(result.mean_utilization, 80.0);
        assert!((result.std_dev_utilization - (200.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(result.recommendation, Recommendation::Upscale);
        assert_eq!(result.break_even_request_rate, Some(49.5));
        assert_eq!(result.rds_break_even_request_rate, Some(200.0));
    }

    #[test]
    fn custom_thresholds() {
        let c = CapacityClassifier::new(ClassifierThresholds {
            upscale_above: 60.0,
            downscale_below: 10.0,
            saturation: 80.0,
        });
        assert_eq!(c.recommend(65.0), Recommendation::Upscale);
        assert_eq!(c.recommend(20.0), Recommendation::None);
        assert_eq!(c.break_even(&LinearModel::new(2.0, 0.0)), Some(40.0));
    }

    #[test]
    fn assess_aligned_points() {
        let input = ResourceSeries {
            requests: [(0, 0.0), (1, 10.0), (2, 20.0), (3, 30.0)].into_iter().collect(),
            // per-core: 10, 30, 50, 70 → y = 2x + 10
            cpu_utilization: [(0, 20.0), (1, 60.0), (2, 100.0), (3, 140.0)].into_iter().collect(),
            cpu_cores: [(0, 2.0), (1, 2.0), (2, 2.0), (3, 2.0)].into_iter().collect(),
            rds_utilization: Series::new(),
        };
        let aligned = align(&input);
        let assessment = classifier().assess("a.b.c.web", &aligned).unwrap();

        assert!((assessment.ec2_line.slope - 2.0).abs() < 1e-9);
        assert!((assessment.ec2_line.intercept - 10.0).abs() < 1e-9);
        assert_eq!(assessment.utilization.mean, 40.0);
        assert_eq!(assessment.requests.mean, 15.0);
        assert_eq!(assessment.mean_cores, 2.0);
        assert_eq!(assessment.centroid, (15.0, 40.0));
        assert_eq!(assessment.point_count, 4);
        assert_eq!(assessment.classification.recommendation, Recommendation::None);
        let break_even = assessment.classification.break_even_request_rate.unwrap();
        assert!((break_even - 45.0).abs() < 1e-9);
        // database CPU is all zero → flat line
        assert_eq!(assessment.classification.rds_break_even_request_rate, None);
    }

    #[test]
    fn assess_with_constant_requests_has_no_break_even() {
        let input = ResourceSeries {
            requests: Series::new(),
            cpu_utilization: [(0, 10.0), (1, 20.0)].into_iter().collect(),
            cpu_cores: [(0, 1.0), (1, 1.0)].into_iter().collect(),
            rds_utilization: Series::new(),
        };
        let assessment = classifier().assess("a.b.c.web", &align(&input)).unwrap();
        assert!(!assessment.ec2_line.is_defined());
        assert_eq!(assessment.classification.break_even_request_rate, None);
        assert_eq!(assessment.classification.recommendation, Recommendation::Downscale);
    }

    #[test]
    fn zero_core_bucket_does_not_poison_the_mean() {
        let input = ResourceSeries {
            requests: [(0, 10.0), (1, 20.0), (2, 30.0)].into_iter().collect(),
            cpu_utilization: [(0, 20.0), (1, 20.0), (2, 40.0)].into_iter().collect(),
            cpu_cores: [(0, 2.0), (1, 0.0), (2, 2.0)].into_iter().collect(),
            rds_utilization: Series::new(),
        };
        let assessment = classifier().assess("a.b.c.web", &align(&input)).unwrap();

        assert_eq!(assessment.point_count, 2);
        assert_eq!(assessment.classification.mean_utilization, 15.0);
        assert_eq!(assessment.classification.recommendation, Recommendation::Downscale);
        assert!(assessment.ec2_line.is_defined());
        assert_eq!(
            recommendation_message("a.b.c.web", &assessment.classification).as_deref(),
            Some("a.b.c.web is a candidate for downscaling, mean CPU: 15.0%")
        );
    }

    #[test]
    fn assess_rejects_empty_join() {
        let err = classifier().assess("a.b.c.web", &AlignedSeries::default()).unwrap_err();
        assert!(matches!(err, HeadroomError::JoinEmpty { .. }));
    }

    #[test]
    fn messages() {
        let mut result = classifier().classify(&[73.2], &LinearModel::undefined(), &LinearModel::undefined());
        assert_eq!(
            recommendation_message("a.b.c.web", &result).as_deref(),
            Some("a.b.c.web is a candidate for upscaling, mean CPU: 73.2%")
        );
        result.recommendation = Recommendation::Downscale;
        result.mean_utilization = 12.34;
        assert_eq!(
            recommendation_message("a.b.c.web", &result).as_deref(),
            Some("a.b.c.web is a candidate for downscaling, mean CPU: 12.3%")
        );
        result.recommendation = Recommendation::None;
        assert_eq!(recommendation_message("a.b.c.web", &result), None);
    }
}
