pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::toml_config::TomlConfig;

pub use crate::core::{
    abort::AbortHandle, etl::HarvestEngine, fetcher::HttpFetcher, pipeline::HarvestPipeline,
    writer::DatasetWriter,
};
pub use crate::domain::model::{
    AirfoilDataset, AirfoilRecord, CoordinatePair, FetchOutcome, HarvestStats, RunReport,
};
pub use crate::utils::diagnostics::{MemoryDiagnostics, TracingDiagnostics};
pub use crate::utils::error::{HarvestError, Result};
