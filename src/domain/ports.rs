use crate::domain::model::{FetchOutcome, FetchedResource, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn listing_url(&self) -> &str;
    fn output_path(&self) -> &str;
    fn dataset_file(&self) -> &str;
    fn cache_dir(&self) -> Option<&str>;
    fn data_suffix(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn request_timeout(&self) -> Duration;
}

/// Sink for run diagnostics (per-item failures, skipped lines, progress).
pub trait Diagnostics: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

impl<D: Diagnostics + ?Sized> Diagnostics for Arc<D> {
    fn record(&self, level: Level, message: &str) {
        (**self).record(level, message);
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<FetchedResource>>;
    async fn transform(&self, resources: Vec<FetchedResource>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
