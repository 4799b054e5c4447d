// demos/fleet_report.rs
//! Fleet capacity report against a synthetic metric backend
//!
//! This example demonstrates:
//! - Implementing `MetricSource` and `FleetDiscovery` for your own backend
//! - Wiring the JSON renderer, a local artifact store and the tracing notifier
//! - Running one batch and reading the summary
//!
//! Run with: cargo run --example fleet_report -- ./headroom-reports
//! Set `RUST_LOG=headroom=debug` to see per-resource detail.

use async_trait::async_trait;
use chrono::Duration;
use headroom::{
    AnalysisCallbacks, CallbackContext, CapacityAnalyzer, FleetDiscovery, HeadroomConfig, HeadroomResult,
    JsonReportRenderer, LocalDirectoryStore, MetricQuery, MetricSource, RawSample, ReportBody, TracingNotifier,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Shape of one simulated stack: per-minute requests and per-core CPU per request
#[derive(Clone, Copy)]
struct Workload {
    base_requests: f64,
    cores: f64,
    idle_cpu: f64,
    cpu_per_request: f64,
}

/// Deterministic synthetic backend. Traffic follows a daily cycle.
struct SyntheticBackend;

impl SyntheticBackend {
    fn workload(dimension: &str) -> Option<Workload> {
        let stack = dimension.split(['.', '-']).next()?;
        match stack {
            "shop" => Some(Workload { base_requests: 400.0, cores: 2.0, idle_cpu: 30.0, cpu_per_request: 0.12 }),
            "blog" => Some(Workload { base_requests: 40.0, cores: 4.0, idle_cpu: 3.0, cpu_per_request: 0.05 }),
            "api" => Some(Workload { base_requests: 200.0, cores: 2.0, idle_cpu: 15.0, cpu_per_request: 0.15 }),
            _ => None,
        }
    }

    fn requests_at(workload: Workload, minute: i64) -> f64 {
        let phase = (minute % 1440) as f64 / 1440.0 * std::f64::consts::TAU;
        workload.base_requests * (1.0 + 0.6 * phase.sin())
    }
}

#[async_trait]
impl MetricSource for SyntheticBackend {
    async fn fetch_metric(&self, query: &MetricQuery, _context: &CallbackContext) -> HeadroomResult<Vec<RawSample>> {
        // "inventory" has no telemetry at all and gets skipped
        let Some(workload) = Self::workload(&query.dimension.value) else {
            return Ok(Vec::new());
        };

        let value_of: fn(Workload, f64) -> f64 = match (query.namespace.as_str(), query.metric_name.as_str()) {
            ("SS", "apache.requests") => |_: Workload, requests: f64| requests,
            ("SS", "cpu.count") => |w: Workload, _: f64| w.cores,
            ("AWS/EC2", "CPUUtilization") => |w: Workload, requests: f64| (w.idle_cpu + w.cpu_per_request * requests) * w.cores,
            ("AWS/RDS", "CPUUtilization") => |_: Workload, requests: f64| 4.0 + 0.02 * requests,
            _ => return Ok(Vec::new()),
        };

        let step = Duration::seconds(i64::from(query.resolution_seconds.max(1)));
        let mut samples = Vec::new();
        let mut at = query.start;
        while at < query.end {
            let requests = Self::requests_at(workload, at.timestamp() / 60);
            samples.push(RawSample::new(at, value_of(workload, requests)));
            at += step;
        }
        Ok(samples)
    }
}

struct StaticFleet;

#[async_trait]
impl FleetDiscovery for StaticFleet {
    async fn list_groups(&self, region: &str, _context: &CallbackContext) -> HeadroomResult<Vec<String>> {
        println!("🔎 Listing server groups in {}", region);
        Ok(vec![
            "shop-checkout-prod-WebServerGroup-1F2E3D".to_string(),
            "blog-content-prod-WebServerGroup-9A8B7C".to_string(),
            "api-gateway-prod-WebServerGroup-4D5E6F".to_string(),
            "inventory-sync-prod-WebServerGroup-0A0B0C".to_string(),
            "reports-batch-prod-WorkerGroup-777".to_string(),
        ])
    }
}

#[tokio::main]
async fn main() -> HeadroomResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("headroom=info")))
        .init();

    let output_dir = std::env::args().nth(1).unwrap_or_else(|| "headroom-reports".to_string());

    println!("📈 Headroom fleet report");
    println!("========================\n");

    let config = HeadroomConfig::builder()
        .region("ap-southeast-2")
        .window_days(2.0)
        .resolution_seconds(60)
        .output_prefix("graphs/")
        .build();

    let callbacks = AnalysisCallbacks::new(Arc::new(SyntheticBackend))
        .with_fleet_discovery(Arc::new(StaticFleet))
        .with_renderer(Arc::new(JsonReportRenderer))
        .with_artifact_store(Arc::new(LocalDirectoryStore::new(&output_dir)))
        .add_notifier(Arc::new(TracingNotifier));

    let analyzer = CapacityAnalyzer::new(config, callbacks)?;
    let summary = analyzer.run().await?;

    println!("\n📋 Analyzed {} stack(s), skipped {}", summary.analyzed(), summary.skipped.len());
    for report in &summary.reports {
        println!("\n🖥️  {} → {}/{}", report.resource_id, output_dir, report.artifact_key);
        for label in &report.labels {
            println!("    {}", label);
        }
        if let ReportBody::Scatter(scatter) = &report.body {
            println!("    decision: {}", scatter.classification.recommendation);
        }
    }

    for skipped in &summary.skipped {
        println!("\n⏭️  {} skipped: {}", skipped.resource_id, skipped.reason);
    }

    if !summary.recommendations.is_empty() {
        println!("\n🎯 Recommendations");
        for line in &summary.recommendations {
            println!("    {}", line);
        }
    }

    Ok(())
}
