use crate::core::Pipeline;
use crate::domain::model::{HarvestStats, RunReport};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct HarvestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> HarvestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting airfoil harvest");

        // Extract
        let resources = self.pipeline.extract().await?;
        tracing::info!("📥 Fetch phase finished for {} links", resources.len());
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(resources).await?;
        tracing::info!("🔧 Parsed {} airfoils", result.dataset.len());
        self.monitor.log_stats("Transform");

        // Load
        let stats = result.stats.clone();
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Dataset saved to: {}", output_path);
        self.monitor.log_stats("Load");

        log_summary(&stats);
        self.monitor.log_final_stats();

        Ok(RunReport { output_path, stats })
    }
}

fn log_summary(stats: &HarvestStats) {
    tracing::info!(
        "📋 Summary: {} links, {} fetched, {} failed (404: {}, HTTP: {}, transport: {}), {} airfoils",
        stats.links,
        stats.fetched,
        stats.failed(),
        stats.not_found,
        stats.http_errors,
        stats.transport_errors,
        stats.records
    );
    if stats.empty_records > 0 || stats.overwritten > 0 || stats.parse_warnings > 0 {
        tracing::warn!(
            "⚠️ {} airfoils without coordinates, {} duplicate names overwritten, {} unparseable lines",
            stats.empty_records,
            stats.overwritten,
            stats.parse_warnings
        );
    }
    if stats.cache_failures > 0 {
        tracing::warn!(
            "⚠️ {} raw payloads could not be cached ({} cached)",
            stats.cache_failures,
            stats.cached
        );
    }
}
