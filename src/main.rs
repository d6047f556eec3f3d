use airfoil_etl::core::abort::abort_on_ctrl_c;
use airfoil_etl::utils::{logger, validation::Validate};
use airfoil_etl::{CliConfig, HarvestEngine, HarvestError, HarvestPipeline, TracingDiagnostics};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose, config.log_json);

    tracing::info!("Starting airfoil-etl CLI");
    tracing::debug!("CLI config: {:?}", config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let pipeline = match HarvestPipeline::from_config(config, Arc::new(TracingDiagnostics)) {
        Ok(pipeline) => pipeline,
        Err(e) => exit_with(e),
    };
    abort_on_ctrl_c(pipeline.abort_handle());

    let engine = HarvestEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Harvest completed successfully!");
            println!("✅ Harvest completed successfully!");
            println!(
                "📁 {} airfoils saved to: {} ({} of {} files failed)",
                report.stats.records,
                report.output_path,
                report.stats.failed(),
                report.stats.links
            );
        }
        Err(e) => exit_with(e),
    }
}

fn exit_with(e: HarvestError) -> ! {
    tracing::error!(
        "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    std::process::exit(e.exit_code().max(1))
}
