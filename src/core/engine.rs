use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct LabelingEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> LabelingEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 依序執行 extract → transform → load；任何階段失敗都不會寫出結果
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting labeling run...");

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded {} records", records.len());
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(records).await?;
        tracing::info!(
            "🏷️ Labeled {} records ({} ties resolved by policy)",
            result.labeled.len(),
            result.tie_count()
        );
        for (label, count) in &result.label_counts {
            tracing::info!("  {}: {}", label, count);
        }
        self.monitor.log_stats("Transform");

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
