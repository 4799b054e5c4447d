//! Joins the four per-resource series onto one bucket axis.
//!
//! A bucket survives only when both the compute CPU utilization and the core
//! count are present, since per-core normalization needs both. A core count
//! that is zero, negative or not finite counts as absent. Requests and
//! database CPU are optional context and default to zero.

use serde::{Deserialize, Serialize};

use crate::error::{HeadroomError, HeadroomResult};
use crate::types::{AlignedPoint, PointSet, Series};

/// The four series fetched for one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSeries {
    pub requests: Series,
    pub cpu_utilization: Series,
    pub cpu_cores: Series,
    pub rds_utilization: Series,
}

/// Output of [`align`]: the joined points plus the two plotting sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedSeries {
    pub points: Vec<AlignedPoint>,
    /// x = requests, y = per-core compute CPU, z = cores
    pub ec2: PointSet,
    /// x = requests, y = database CPU
    pub rds: PointSet,
}

impl AlignedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fail with [`HeadroomError::JoinEmpty`] when no bucket survived the join
    pub fn ensure_not_empty(&self, resource: &str) -> HeadroomResult<()> {
        if self.is_empty() {
            return Err(HeadroomError::join_empty(resource));
        }
        Ok(())
    }
}

/// Join the series of one resource, in ascending bucket order
pub fn align(series: &ResourceSeries) -> AlignedSeries {
    let mut aligned = AlignedSeries::default();

    for (key, cpu_util_pct) in series.cpu_utilization.iter() {
        let Some(cpu_cores) = series.cpu_cores.get(key).filter(|c| c.is_finite() && *c > 0.0) else {
            continue;
        };

        let point = AlignedPoint {
            bucket_key: key,
            request: series.requests.get(key).unwrap_or(0.0),
            cpu_util_pct,
            cpu_cores,
            rds_util_pct: series.rds_utilization.get(key).unwrap_or(0.0),
        };

        aligned
            .ec2
            .push_xyz(key, point.request, point.per_core_utilization(), point.cpu_cores);
        aligned.rds.push(key, point.request, point.rds_util_pct);
        aligned.points.push(point);
    }

    aligned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(u64, f64)]) -> Series {
        pairs.iter().copied().collect()
    }

    #[test]
    fn inner_join_on_cores_outer_join_on_the_rest() {
        let input = ResourceSeries {
            requests: series(&[(0, 100.0)]),
            cpu_utilization: series(&[(0, 50.0), (1, 60.0)]),
            cpu_cores: series(&[(0, 2.0)]),
            rds_utilization: Series::new(),
        };
        let aligned = align(&input);

        assert_eq!(aligned.len(), 1);
        assert_eq!(aligned.ec2.bucket_keys, vec![0]);
        assert_eq!(aligned.ec2.x, vec![100.0]);
        assert_eq!(aligned.ec2.y, vec![25.0]);
        assert_eq!(aligned.ec2.z, vec![2.0]);
        assert_eq!(aligned.rds.bucket_keys, vec![0]);
        assert_eq!(aligned.rds.x, vec![100.0]);
        assert_eq!(aligned.rds.y, vec![0.0]);
        assert!(aligned.rds.z.is_empty());
    }

    #[test]
    fn missing_requests_default_to_zero() {
        let input = ResourceSeries {
            requests: series(&[(1, 30.0)]),
            cpu_utilization: series(&[(0, 40.0), (1, 80.0)]),
            cpu_cores: series(&[(0, 4.0), (1, 4.0)]),
            rds_utilization: series(&[(1, 12.0), (7, 99.0)]),
        };
        let aligned = align(&input);

        assert_eq!(aligned.ec2.x, vec![0.0, 30.0]);
        assert_eq!(aligned.ec2.y, vec![10.0, 20.0]);
        assert_eq!(aligned.rds.y, vec![0.0, 12.0]);
        assert_eq!(aligned.points[1].rds_util_pct, 12.0);
    }

    #[test]
    fn unusable_core_counts_drop_the_bucket() {
        let input = ResourceSeries {
            requests: Series::new(),
            cpu_utilization: series(&[(0, 20.0), (1, 20.0), (2, 0.0), (3, 20.0), (4, 20.0)]),
            cpu_cores: series(&[(0, 2.0), (1, 0.0), (2, 0.0), (3, f64::NAN), (4, -1.0)]),
            rds_utilization: Series::new(),
        };
        let aligned = align(&input);

        assert_eq!(aligned.ec2.bucket_keys, vec![0]);
        assert_eq!(aligned.ec2.y, vec![10.0]);
        assert_eq!(aligned.rds.bucket_keys, vec![0]);
    }

    #[test]
    fn only_zero_core_buckets_is_join_empty() {
        let input = ResourceSeries {
            requests: Series::new(),
            cpu_utilization: series(&[(0, 20.0), (1, 20.0)]),
            cpu_cores: series(&[(0, 0.0), (1, 0.0)]),
            rds_utilization: Series::new(),
        };
        let aligned = align(&input);
        assert!(aligned.is_empty());
        assert!(matches!(aligned.ensure_not_empty("a.b.c.web"), Err(HeadroomError::JoinEmpty { .. })));
    }

    #[test]
    fn output_is_in_ascending_bucket_order() {
        let input = ResourceSeries {
            requests: Series::new(),
            cpu_utilization: series(&[(9, 1.0), (2, 1.0), (5, 1.0)]),
            cpu_cores: series(&[(2, 1.0), (5, 1.0), (9, 1.0)]),
            rds_utilization: Series::new(),
        };
        assert_eq!(align(&input).ec2.bucket_keys, vec![2, 5, 9]);
    }

    #[test]
    fn empty_join_is_reported() {
        let input = ResourceSeries {
            requests: series(&[(0, 1.0)]),
            cpu_utilization: series(&[(0, 50.0)]),
            cpu_cores: series(&[(3, 2.0)]),
            rds_utilization: Series::new(),
        };
        let aligned = align(&input);
        assert!(aligned.is_empty());
        assert!(matches!(
            aligned.ensure_not_empty("a.b.c.web"),
            Err(HeadroomError::JoinEmpty { .. })
        ));
    }
}
