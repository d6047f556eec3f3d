use airfoil_etl::core::abort::abort_on_ctrl_c;
use airfoil_etl::core::ConfigProvider;
use airfoil_etl::utils::{logger, validation::Validate};
use airfoil_etl::{HarvestEngine, HarvestPipeline, TomlConfig, TracingDiagnostics};
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-harvest")]
#[command(about = "Airfoil harvester driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "airfoil-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Fetch the listing and print candidate links without downloading or writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    logger::init_cli_logger(args.verbose, config.log_json());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let pipeline = HarvestPipeline::from_config(config, Arc::new(TracingDiagnostics))?;

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - only the listing page will be fetched");
        return perform_dry_run(&pipeline).await;
    }

    abort_on_ctrl_c(pipeline.abort_handle());
    let engine = HarvestEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Harvest completed successfully!");
            println!("✅ Harvest completed successfully!");
            println!(
                "📁 {} airfoils saved to: {}",
                report.stats.records, report.output_path
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "❌ Harvest failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    }
}

fn display_config_summary(config: &TomlConfig) {
    tracing::info!("📋 Configuration Summary:");
    tracing::info!("  Listing URL: {}", config.listing_url());
    tracing::info!("  Data suffix: {}", config.data_suffix());
    tracing::info!("  Concurrent requests: {}", config.concurrent_requests());
    tracing::info!("  Request timeout: {:?}", config.request_timeout());
    tracing::info!(
        "  Dataset: {}/{}",
        config.output_path(),
        config.dataset_file()
    );
    match config.cache_dir() {
        Some(dir) => tracing::info!("  Raw payload cache: {}", dir),
        None => tracing::info!("  Raw payload cache: disabled"),
    }
}

async fn perform_dry_run<F, S>(
    pipeline: &HarvestPipeline<F, S, TomlConfig>,
) -> anyhow::Result<()>
where
    F: airfoil_etl::core::Fetcher,
    S: airfoil_etl::core::Storage,
{
    let links = pipeline
        .discover()
        .await
        .context("Dry run could not read the listing page")?;

    for link in &links {
        println!("{}", link);
    }
    println!("🔍 {} files would be fetched", links.len());
    Ok(())
}
