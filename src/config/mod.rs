pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_LISTING_URL: &str = "https://m-selig.ae.illinois.edu/ads/coord_seligFmt/";
pub const DEFAULT_DATASET_FILE: &str = "airfoils.json";
pub const DEFAULT_CACHE_DIR: &str = ".airfoils";
pub const DEFAULT_DATA_SUFFIX: &str = ".dat";
pub const DEFAULT_CONCURRENT_REQUESTS: usize = 4;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "airfoil-etl")]
#[command(about = "Harvest airfoil coordinate files into a single JSON dataset")]
pub struct CliConfig {
    #[arg(long, default_value = DEFAULT_LISTING_URL)]
    pub listing_url: String,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_DATASET_FILE)]
    pub dataset_file: String,

    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: String,

    #[arg(long, help = "Do not save raw .dat payloads")]
    pub no_cache: bool,

    #[arg(long, default_value = DEFAULT_DATA_SUFFIX)]
    pub data_suffix: String,

    #[arg(long, default_value_t = DEFAULT_CONCURRENT_REQUESTS)]
    pub concurrent_requests: usize,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn listing_url(&self) -> &str {
        &self.listing_url
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn dataset_file(&self) -> &str {
        &self.dataset_file
    }

    fn cache_dir(&self) -> Option<&str> {
        (!self.no_cache).then_some(self.cache_dir.as_str())
    }

    fn data_suffix(&self) -> &str {
        &self.data_suffix
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)
    }
}

/// Checks shared by every configuration source.
pub fn validate_provider(config: &impl ConfigProvider) -> Result<()> {
    validation::validate_url("listing_url", config.listing_url())?;
    validation::validate_path("output_path", config.output_path())?;
    validation::validate_path("dataset_file", config.dataset_file())?;
    if let Some(cache_dir) = config.cache_dir() {
        validation::validate_path("cache_dir", cache_dir)?;
    }
    validation::validate_non_empty_string("data_suffix", config.data_suffix())?;
    validation::validate_positive_number("concurrent_requests", config.concurrent_requests(), 1)?;
    validation::validate_positive_number(
        "timeout_seconds",
        config.request_timeout().as_secs() as usize,
        1,
    )?;
    Ok(())
}
