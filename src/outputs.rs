//! Ready-made collaborators for the optional output capabilities.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::callbacks::{ArtifactStore, CallbackContext, Notifier, ReportRenderer};
use crate::error::{HeadroomError, HeadroomResult};
use crate::report::ResourceReport;

/// Renders the report bundle as pretty-printed JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportRenderer;

#[async_trait]
impl ReportRenderer for JsonReportRenderer {
    fn format(&self) -> &str {
        "json"
    }

    async fn render(&self, report: &ResourceReport, _context: &CallbackContext) -> HeadroomResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(report)?)
    }
}

/// Writes artifacts below a local directory, keyed by relative path
#[derive(Debug, Clone)]
pub struct LocalDirectoryStore {
    root: PathBuf,
}

impl LocalDirectoryStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> HeadroomResult<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty() || relative.is_absolute() || relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(HeadroomError::callback_failed(
                "artifact_store.put".to_string(),
                format!("refusing to write artifact key '{}'", key),
            ));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalDirectoryStore {
    async fn put(&self, key: &str, body: Vec<u8>, _context: &CallbackContext) -> HeadroomResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, body).await?;
        info!(path = %path.display(), "Artifact written");
        Ok(())
    }
}

/// Emits recommendations and skips through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn on_recommendation(
        &self,
        report: &ResourceReport,
        message: &str,
        _context: &CallbackContext,
    ) -> HeadroomResult<()> {
        info!(resource = %report.resource_id, "{}", message);
        Ok(())
    }

    async fn on_resource_skipped(
        &self,
        resource_id: &str,
        error: &HeadroomError,
        _context: &CallbackContext,
    ) -> HeadroomResult<()> {
        if !error.is_skippable() {
            warn!(resource = resource_id, "Failed to analyze resource: {}", error);
        }
        Ok(())
    }
}
