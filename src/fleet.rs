//! Server group naming conventions.
//!
//! A group named `sssites-ssorg-prod-WebServerGroup-M4B333CXXJQU` is analyzed
//! as stack `sssites.ssorg.prod.web` with database `sssites-ssorg-prod`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{DimensionSource, FleetConfig, MetricSpec};
use crate::types::{ResourceDimension, ResourceId};

/// One server group and the identifiers its metrics are published under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackTarget {
    pub group_name: String,
    pub stack_name: ResourceId,
    pub database_name: String,
}

impl StackTarget {
    pub fn new(group_name: &str, stack_name: &str, database_name: &str) -> Self {
        Self {
            group_name: group_name.to_string(),
            stack_name: stack_name.to_string(),
            database_name: database_name.to_string(),
        }
    }

    /// Derive a target from a group name, `None` if it does not follow the convention
    pub fn from_group_name(group_name: &str, fleet: &FleetConfig) -> Option<Self> {
        if !group_name.contains(&fleet.group_marker) {
            return None;
        }
        let parts: Vec<&str> = group_name.split('-').collect();
        if parts.len() <= 3 {
            return None;
        }
        let (a, b, c) = (parts[0], parts[1], parts[2]);
        Some(Self {
            group_name: group_name.to_string(),
            stack_name: format!("{}.{}.{}.{}", a, b, c, fleet.service_suffix),
            database_name: format!("{}-{}-{}", a, b, c),
        })
    }

    /// The dimension a metric is filtered on for this target
    pub fn dimension_for(&self, spec: &MetricSpec) -> ResourceDimension {
        let value = match spec.dimension_source {
            DimensionSource::StackName => &self.stack_name,
            DimensionSource::GroupName => &self.group_name,
            DimensionSource::DatabaseName => &self.database_name,
        };
        ResourceDimension {
            name: spec.dimension_name.clone(),
            value: value.clone(),
        }
    }
}

/// Keep the groups that follow the naming convention
pub fn targets_from_groups<S: AsRef<str>>(groups: &[S], fleet: &FleetConfig) -> Vec<StackTarget> {
    groups
        .iter()
        .filter_map(|group| {
            let target = StackTarget::from_group_name(group.as_ref(), fleet);
            if target.is_none() {
                debug!(group = group.as_ref(), "Skipping group outside naming convention");
            }
            target
        })
        .collect()
}
