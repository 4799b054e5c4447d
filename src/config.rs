// src/config.rs

use serde::{Deserialize, Serialize};

use crate::error::{HeadroomError, HeadroomResult};

/// Which identifier derived from a server group fills a metric's dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionSource {
    /// Dotted stack name, e.g. `sssites.ssorg.prod.web`
    StackName,
    /// The raw server group name
    GroupName,
    /// Dashed database identifier, e.g. `sssites-ssorg-prod`
    DatabaseName,
}

/// How to query one metric from the metric source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub namespace: String,
    pub metric_name: String,
    /// Dimension name, e.g. "Stack" or "AutoScalingGroupName"
    pub dimension_name: String,
    pub dimension_source: DimensionSource,
    /// An empty series for a required metric abandons the resource
    pub required: bool,
}

impl MetricSpec {
    pub fn new(
        namespace: &str,
        metric_name: &str,
        dimension_name: &str,
        dimension_source: DimensionSource,
    ) -> Self {
        Self {
            namespace: namespace.to_string(),
            metric_name: metric_name.to_string(),
            dimension_name: dimension_name.to_string(),
            dimension_source,
            required: true,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// The four metrics fetched for every resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCatalog {
    pub requests: MetricSpec,
    pub cpu_cores: MetricSpec,
    pub cpu_utilization: MetricSpec,
    pub rds_utilization: MetricSpec,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        Self {
            requests: MetricSpec::new("SS", "apache.requests", "Stack", DimensionSource::StackName),
            cpu_cores: MetricSpec::new("SS", "cpu.count", "Stack", DimensionSource::StackName),
            cpu_utilization: MetricSpec::new(
                "AWS/EC2",
                "CPUUtilization",
                "AutoScalingGroupName",
                DimensionSource::GroupName,
            ),
            rds_utilization: MetricSpec::new(
                "AWS/RDS",
                "CPUUtilization",
                "DBInstanceIdentifier",
                DimensionSource::DatabaseName,
            ),
        }
    }
}

/// Mean per-core utilization thresholds, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierThresholds {
    /// Recommend upscaling when the mean is strictly above this
    pub upscale_above: f64,
    /// Recommend downscaling when the mean is strictly below this
    pub downscale_below: f64,
    /// Utilization treated as saturation for break-even rates
    pub saturation: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            upscale_above: 70.0,
            downscale_below: 30.0,
            saturation: 100.0,
        }
    }
}

/// Server group naming conventions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Only group names containing this marker are analyzed
    pub group_marker: String,
    /// Appended to the dotted stack name
    pub service_suffix: String,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            group_marker: "WebServerGroup".to_string(),
            service_suffix: "web".to_string(),
        }
    }
}

/// What the report for each resource contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportMode {
    /// Requests vs. utilization scatter with regression lines and a recommendation
    Scatter,
    /// Frequency histogram of raw compute CPU utilization, no recommendation
    Histogram,
}

/// Longest history a run may request, matching the metric retention limit
pub const MAX_WINDOW_DAYS: f64 = 455.0;

/// Main configuration for a capacity analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadroomConfig {
    /// Region the metric source and fleet discovery talk to
    pub region: String,
    /// Length of history to analyze, in days (may be fractional)
    pub window_days: f64,
    /// Metric resolution requested from the source
    pub resolution_seconds: u32,
    /// Prefix prepended to every artifact key
    pub output_prefix: String,
    /// File extension of rendered artifacts
    pub image_format: String,
    pub report_mode: ReportMode,
    pub thresholds: ClassifierThresholds,
    pub fleet: FleetConfig,
    pub metrics: MetricCatalog,
}

impl Default for HeadroomConfig {
    fn default() -> Self {
        Self {
            region: "ap-southeast-2".to_string(),
            window_days: 7.0,
            resolution_seconds: 60,
            output_prefix: String::new(),
            image_format: "png".to_string(),
            report_mode: ReportMode::Scatter,
            thresholds: ClassifierThresholds::default(),
            fleet: FleetConfig::default(),
            metrics: MetricCatalog::default(),
        }
    }
}

impl HeadroomConfig {
    pub fn builder() -> HeadroomConfigBuilder {
        HeadroomConfigBuilder::new()
    }

    /// Check the configuration is usable before any metric is fetched
    pub fn validate(&self) -> HeadroomResult<()> {
        if self.window_days <= 0.0 || !self.window_days.is_finite() {
            return Err(HeadroomError::config(format!(
                "window_days must be a positive number, got {}",
                self.window_days
            )));
        }
        if self.window_days > MAX_WINDOW_DAYS {
            return Err(HeadroomError::config(format!(
                "window_days must be at most {}, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        if self.resolution_seconds == 0 {
            return Err(HeadroomError::config("resolution_seconds must be greater than zero"));
        }
        let t = &self.thresholds;
        if t.downscale_below > t.upscale_above {
            return Err(HeadroomError::config(format!(
                "downscale threshold ({}) is above upscale threshold ({})",
                t.downscale_below, t.upscale_above
            )));
        }
        if self.image_format.is_empty() {
            return Err(HeadroomError::config("image_format must not be empty"));
        }
        Ok(())
    }

    /// Parse a configuration from TOML. Missing fields take their defaults.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(input: &str) -> HeadroomResult<Self> {
        let config: HeadroomConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "config-toml")]
    pub fn from_toml_file<P: AsRef<std::path::Path>>(path: P) -> HeadroomResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}

/// Builder for creating headroom configurations easily
#[derive(Debug)]
pub struct HeadroomConfigBuilder {
    config: HeadroomConfig,
}

impl Default for HeadroomConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadroomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HeadroomConfig::default(),
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.config.region = region.to_string();
        self
    }

    pub fn window_days(mut self, days: f64) -> Self {
        self.config.window_days = days;
        self
    }

    pub fn resolution_seconds(mut self, seconds: u32) -> Self {
        self.config.resolution_seconds = seconds;
        self
    }

    pub fn output_prefix(mut self, prefix: &str) -> Self {
        self.config.output_prefix = prefix.to_string();
        self
    }

    pub fn image_format(mut self, format: &str) -> Self {
        self.config.image_format = format.to_string();
        self
    }

    pub fn report_mode(mut self, mode: ReportMode) -> Self {
        self.config.report_mode = mode;
        self
    }

    pub fn thresholds(mut self, thresholds: ClassifierThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn fleet(mut self, fleet: FleetConfig) -> Self {
        self.config.fleet = fleet;
        self
    }

    pub fn metrics(mut self, metrics: MetricCatalog) -> Self {
        self.config.metrics = metrics;
        self
    }

    pub fn build(self) -> HeadroomConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fleet_conventions() {
        let config = HeadroomConfig::default();
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.window_days, 7.0);
        assert_eq!(config.resolution_seconds, 60);
        assert_eq!(config.thresholds.upscale_above, 70.0);
        assert_eq!(config.thresholds.downscale_below, 30.0);
        assert_eq!(config.metrics.requests.metric_name, "apache.requests");
        assert_eq!(config.metrics.rds_utilization.namespace, "AWS/RDS");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_overrides() {
        let config = HeadroomConfig::builder()
            .region("us-east-1")
            .window_days(2.0)
            .report_mode(ReportMode::Histogram)
            .output_prefix("graphs/")
            .build();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.window_days, 2.0);
        assert_eq!(config.report_mode, ReportMode::Histogram);
        assert_eq!(config.output_prefix, "graphs/");
    }

    #[test]
    fn validate_rejects_bad_values() {
        let config = HeadroomConfig::builder().window_days(0.0).build();
        assert!(matches!(config.validate(), Err(HeadroomError::Config { .. })));

        let config = HeadroomConfig::builder().window_days(1e12).build();
        assert!(matches!(config.validate(), Err(HeadroomError::Config { .. })));

        let config = HeadroomConfig::builder().window_days(MAX_WINDOW_DAYS).build();
        assert!(config.validate().is_ok());

        let config = HeadroomConfig::builder().resolution_seconds(0).build();
        assert!(matches!(config.validate(), Err(HeadroomError::Config { .. })));

        let config = HeadroomConfig::builder()
            .thresholds(ClassifierThresholds {
                upscale_above: 20.0,
                downscale_below: 40.0,
                saturation: 100.0,
            })
            .build();
        assert!(matches!(config.validate(), Err(HeadroomError::Config { .. })));
    }

    #[test]
    fn optional_metric_spec() {
        let spec = MetricSpec::new("AWS/RDS", "CPUUtilization", "DBInstanceIdentifier", DimensionSource::DatabaseName)
            .optional();
        assert!(!spec.required);
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn parses_partial_toml() {
        let config = HeadroomConfig::from_toml_str(
            r#"
            region = "eu-west-1"
            window_days = 3.0
            report_mode = "Histogram"

            [thresholds]
            upscale_above = 80.0
            downscale_below = 20.0
            saturation = 100.0
            "#,
        )
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.window_days, 3.0);
        assert_eq!(config.report_mode, ReportMode::Histogram);
        assert_eq!(config.thresholds.upscale_above, 80.0);
        assert_eq!(config.resolution_seconds, 60);
    }
}
