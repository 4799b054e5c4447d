// src/error.rs

use crate::types::ResourceId;

/// Result type used throughout the headroom library
pub type HeadroomResult<T> = Result<T, HeadroomError>;

/// All possible errors that can occur in the headroom library
#[derive(thiserror::Error, Debug)]
pub enum HeadroomError {
    /// The metric source returned nothing for the whole requested window
    #[error("No datapoints were found for '{metric_name}' on '{resource}'")]
    NoDataPoints {
        metric_name: String,
        resource: ResourceId,
    },

    /// No bucket key carried both a CPU utilization and a core count
    #[error("No aligned datapoints for '{resource}': CPU utilization and core count never overlap")]
    JoinEmpty { resource: ResourceId },

    /// Regression input cannot produce a meaningful line
    #[error("Degenerate regression over {points} point(s): {message}")]
    DegenerateRegression { points: usize, message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The metric source itself failed
    #[error("Metric source failed for '{metric_name}': {message}")]
    MetricSource { metric_name: String, message: String },

    /// Callback execution failed (renderer, store, notifier, discovery)
    #[error("Callback execution failed for '{operation}': {message}")]
    CallbackFailed { operation: String, message: String },

    /// A per-resource task panicked or was cancelled
    #[error("Analysis task failed: {message}")]
    TaskFailed { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    /// IO-related errors
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// TOML configuration parse errors
    #[cfg(feature = "config-toml")]
    #[error("TOML parse error: {source}")]
    TomlParse {
        #[from]
        source: toml::de::Error,
    },
}

/// Helper methods for creating common errors
impl HeadroomError {
    pub fn no_data_points<S: Into<String>>(metric_name: S, resource: S) -> Self {
        Self::NoDataPoints {
            metric_name: metric_name.into(),
            resource: resource.into(),
        }
    }

    pub fn join_empty<S: Into<String>>(resource: S) -> Self {
        Self::JoinEmpty {
            resource: resource.into(),
        }
    }

    pub fn degenerate_regression<S: Into<String>>(points: usize, message: S) -> Self {
        Self::DegenerateRegression {
            points,
            message: message.into(),
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn metric_source<S: Into<String>>(metric_name: S, message: S) -> Self {
        Self::MetricSource {
            metric_name: metric_name.into(),
            message: message.into(),
        }
    }

    pub fn callback_failed<S: Into<String>>(operation: S, message: S) -> Self {
        Self::CallbackFailed {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Whether this error only means "skip this resource for this run".
    ///
    /// Every error is local to one resource in a batch; this separates the
    /// expected data-shape outcomes from genuine collaborator failures so they
    /// can be logged at different levels.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::NoDataPoints { .. } | Self::JoinEmpty { .. } | Self::DegenerateRegression { .. }
        )
    }
}

/// Convert from task join errors
impl From<tokio::task::JoinError> for HeadroomError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::TaskFailed {
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skippable_errors() {
        assert!(HeadroomError::no_data_points("cpu.count", "a.b.c.web").is_skippable());
        assert!(HeadroomError::join_empty("a.b.c.web").is_skippable());
        assert!(HeadroomError::degenerate_regression(1, "too few points").is_skippable());
        assert!(!HeadroomError::metric_source("cpu.count", "throttled").is_skippable());
        assert!(!HeadroomError::config("bad window").is_skippable());
    }

    #[test]
    fn no_data_points_message_names_metric_and_resource() {
        let err = HeadroomError::no_data_points("apache.requests", "sssites.ssorg.prod.web");
        assert_eq!(
            err.to_string(),
            "No datapoints were found for 'apache.requests' on 'sssites.ssorg.prod.web'"
        );
    }
}
