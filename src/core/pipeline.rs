use crate::config::cli::LocalStorage;
use crate::core::abort::AbortHandle;
use crate::core::fetcher::HttpFetcher;
use crate::core::links::{self, extract_links};
use crate::core::parser;
use crate::core::writer::DatasetWriter;
use crate::core::{ConfigProvider, Diagnostics, Fetcher, Pipeline, Storage};
use crate::domain::model::{
    AirfoilDataset, CacheStatus, FetchOutcome, FetchedResource, HarvestStats, TransformResult,
};
use crate::utils::error::{HarvestError, Result};
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use url::Url;

/// Listing page -> per-file fetch -> parse -> dataset file.
pub struct HarvestPipeline<F: Fetcher, S: Storage, C: ConfigProvider> {
    fetcher: F,
    writer: DatasetWriter<S>,
    cache: Option<S>,
    config: C,
    diagnostics: Arc<dyn Diagnostics>,
    abort: AbortHandle,
}

impl<C: ConfigProvider> HarvestPipeline<HttpFetcher, LocalStorage, C> {
    /// Wires the HTTP fetcher and local storage described by `config`.
    pub fn from_config(config: C, diagnostics: Arc<dyn Diagnostics>) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.request_timeout(), diagnostics.clone())?;
        let storage = LocalStorage::new(config.output_path());
        let cache = config.cache_dir().map(LocalStorage::new);

        let mut pipeline = Self::new(fetcher, storage, config, diagnostics);
        pipeline.cache = cache;
        Ok(pipeline)
    }
}

impl<F: Fetcher, S: Storage, C: ConfigProvider> HarvestPipeline<F, S, C> {
    pub fn new(fetcher: F, storage: S, config: C, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            fetcher,
            writer: DatasetWriter::new(storage),
            cache: None,
            config,
            diagnostics,
            abort: AbortHandle::new(),
        }
    }

    /// Saves every successfully fetched payload under its original file name.
    pub fn with_cache(mut self, cache: S) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Fetches the listing page and returns the candidate data-file URLs.
    /// Any non-success outcome is fatal.
    pub async fn discover(&self) -> Result<Vec<Url>> {
        let listing_url = self.config.listing_url();
        let base = Url::parse(listing_url).map_err(|e| HarvestError::ConfigError {
            message: format!("Invalid listing URL '{}': {}", listing_url, e),
        })?;

        if self.abort.is_aborted() {
            return Err(HarvestError::Aborted { not_issued: 0 });
        }

        tracing::info!("🌐 Fetching listing page: {}", listing_url);
        let markup = match self.fetcher.fetch(listing_url).await {
            FetchOutcome::Success(body) => String::from_utf8_lossy(&body).into_owned(),
            failure => {
                return Err(HarvestError::ListingFetch {
                    url: listing_url.to_string(),
                    reason: failure.describe(),
                })
            }
        };

        let links: Vec<Url> = extract_links(&markup, &base, self.config.data_suffix()).collect();
        tracing::info!(
            "🔗 Found {} '{}' links on listing page",
            links.len(),
            self.config.data_suffix()
        );
        Ok(links)
    }

    /// Returns `None` when an abort was requested before this fetch was issued.
    async fn fetch_resource(&self, url: Url) -> Option<FetchedResource> {
        if self.abort.is_aborted() {
            return None;
        }

        let filename = links::file_name(&url).unwrap_or_default();

        let outcome = self.fetcher.fetch(url.as_str()).await;
        let cache = match (&outcome, &self.cache) {
            (FetchOutcome::Success(body), Some(cache)) => {
                self.save_payload(cache, &filename, body).await
            }
            _ => CacheStatus::Disabled,
        };

        Some(FetchedResource {
            url: url.to_string(),
            filename,
            outcome,
            cache,
        })
    }

    async fn save_payload(&self, cache: &S, filename: &str, body: &[u8]) -> CacheStatus {
        match cache.write_file(filename, body).await {
            Ok(()) => {
                tracing::debug!("Cached {}", filename);
                CacheStatus::Saved
            }
            Err(e) => {
                self.diagnostics.record(
                    Level::WARN,
                    &format!("Failed to cache raw payload {}: {}", filename, e),
                );
                CacheStatus::Failed
            }
        }
    }

    fn name_hint<'a>(&self, resource: &'a FetchedResource) -> &'a str {
        resource
            .filename
            .strip_suffix(self.config.data_suffix())
            .filter(|stem| !stem.is_empty())
            .or(Some(resource.filename.as_str()).filter(|name| !name.is_empty()))
            .unwrap_or(&resource.url)
    }
}

#[async_trait::async_trait]
impl<F: Fetcher, S: Storage, C: ConfigProvider> Pipeline for HarvestPipeline<F, S, C> {
    async fn extract(&self) -> Result<Vec<FetchedResource>> {
        let links = self.discover().await?;

        // 保持清單順序，使重複名稱的覆寫結果與逐一處理時相同
        let attempted: Vec<Option<FetchedResource>> = stream::iter(links)
            .map(|url| self.fetch_resource(url))
            .buffered(self.config.concurrent_requests().max(1))
            .collect()
            .await;

        if self.abort.is_aborted() {
            let not_issued = attempted.iter().filter(|r| r.is_none()).count();
            tracing::warn!(
                "🛑 Abort requested; {} of {} fetches were not issued",
                not_issued,
                attempted.len()
            );
            return Err(HarvestError::Aborted { not_issued });
        }

        Ok(attempted.into_iter().flatten().collect())
    }

    async fn transform(&self, resources: Vec<FetchedResource>) -> Result<TransformResult> {
        let mut stats = HarvestStats {
            links: resources.len(),
            ..HarvestStats::default()
        };
        let mut dataset = AirfoilDataset::new();

        for resource in &resources {
            match resource.cache {
                CacheStatus::Saved => stats.cached += 1,
                CacheStatus::Failed => stats.cache_failures += 1,
                CacheStatus::Disabled => {}
            }

            let body = match &resource.outcome {
                FetchOutcome::Success(body) => {
                    stats.fetched += 1;
                    body
                }
                FetchOutcome::NotFound => {
                    stats.not_found += 1;
                    continue;
                }
                FetchOutcome::HttpError(_) => {
                    stats.http_errors += 1;
                    continue;
                }
                FetchOutcome::TransportError(_) => {
                    stats.transport_errors += 1;
                    continue;
                }
            };

            let text = String::from_utf8_lossy(body);
            let output = parser::parse(self.name_hint(resource), &text);

            stats.parse_warnings += output.diagnostics.len();
            for diagnostic in &output.diagnostics {
                self.diagnostics.record(
                    diagnostic.level,
                    &format!("{} <{}>", diagnostic.message, resource.url),
                );
            }

            let record = output.record;
            let name = record.name.clone();
            let points = record.coords.len();
            if points == 0 {
                stats.empty_records += 1;
                self.diagnostics.record(
                    Level::WARN,
                    &format!("No coordinates found for {} <{}>", name, resource.url),
                );
            }

            if dataset.insert(record).is_some() {
                stats.overwritten += 1;
                self.diagnostics.record(
                    Level::WARN,
                    &format!(
                        "Duplicate airfoil name '{}' from {}; replacing earlier entry",
                        name, resource.url
                    ),
                );
            } else {
                tracing::debug!("Parsed '{}' with {} points", name, points);
            }
        }

        stats.records = dataset.len();
        Ok(TransformResult { dataset, stats })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        if self.abort.is_aborted() {
            return Err(HarvestError::Aborted { not_issued: 0 });
        }

        let dataset_file = self.config.dataset_file();
        self.writer.write(&result.dataset, dataset_file).await?;

        let output_path = Path::new(self.config.output_path()).join(dataset_file);
        Ok(output_path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::diagnostics::MemoryDiagnostics;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::time::Duration;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fail_writes: bool,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
                fail_writes: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::new()
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn file_count(&self) -> usize {
            self.files.lock().await.len()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                HarvestError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            if self.fail_writes {
                return Err(HarvestError::IoError(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "read-only storage",
                )));
            }
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        listing_url: String,
        concurrent_requests: usize,
    }

    impl MockConfig {
        fn new(listing_url: String) -> Self {
            Self {
                listing_url,
                concurrent_requests: 3,
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn listing_url(&self) -> &str {
            &self.listing_url
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn dataset_file(&self) -> &str {
            "airfoils.json"
        }

        fn cache_dir(&self) -> Option<&str> {
            None
        }

        fn data_suffix(&self) -> &str {
            ".dat"
        }

        fn concurrent_requests(&self) -> usize {
            self.concurrent_requests
        }

        fn request_timeout(&self) -> Duration {
            Duration::from_secs(5)
        }
    }

    fn listing(files: &[&str]) -> String {
        let anchors: String = files
            .iter()
            .map(|f| format!("<a href=\"{f}\">{f}</a>\n"))
            .collect();
        format!("<html><body>{anchors}<a href=\"index.txt\">index</a></body></html>")
    }

    fn pipeline(
        server: &MockServer,
        storage: MockStorage,
    ) -> (
        HarvestPipeline<HttpFetcher, MockStorage, MockConfig>,
        Arc<MemoryDiagnostics>,
    ) {
        let sink = Arc::new(MemoryDiagnostics::new());
        let fetcher = HttpFetcher::new(Duration::from_secs(5), sink.clone()).unwrap();
        let config = MockConfig::new(server.url("/coords/"));
        (
            HarvestPipeline::new(fetcher, storage, config, sink.clone()),
            sink,
        )
    }

    #[tokio::test]
    async fn test_extract_isolates_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["a.dat", "b.dat", "c.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/a.dat");
            then.status(200).body("FOIL A\n1.0 0.0\n0.0 0.0\n");
        });
        let missing = server.mock(|when, then| {
            when.method(GET).path("/coords/b.dat");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/c.dat");
            then.status(200).body("FOIL C\n1.0 0.0\n");
        });

        let (pipeline, sink) = pipeline(&server, MockStorage::new());
        let resources = pipeline.extract().await.unwrap();

        missing.assert();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[1].outcome, FetchOutcome::NotFound);
        assert_eq!(resources[1].filename, "b.dat");

        let result = pipeline.transform(resources).await.unwrap();
        assert_eq!(result.dataset.len(), 2);
        assert!(result.dataset.get("FOIL A").is_some());
        assert!(result.dataset.get("FOIL C").is_some());
        assert_eq!(result.stats.fetched, 2);
        assert_eq!(result.stats.not_found, 1);
        assert_eq!(sink.count(Level::ERROR), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(500);
        });

        let (pipeline, _) = pipeline(&server, MockStorage::new());
        let err = pipeline.extract().await.unwrap_err();

        match err {
            HarvestError::ListingFetch { reason, .. } => assert!(reason.contains("500")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_every_failure_kind_is_counted() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(format!(
                "{}<a href=\"http://127.0.0.1:1/gone.dat\">gone</a>",
                listing(&["ok.dat", "missing.dat", "error.dat"])
            ));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/ok.dat");
            then.status(200).body("OK FOIL\n1 0\n");
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/missing.dat");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/error.dat");
            then.status(500);
        });

        let (pipeline, _) = pipeline(&server, MockStorage::new());
        let resources = pipeline.extract().await.unwrap();
        let result = pipeline.transform(resources).await.unwrap();

        assert_eq!(result.stats.links, 4);
        assert_eq!(result.stats.fetched, 1);
        assert_eq!(result.stats.not_found, 1);
        assert_eq!(result.stats.http_errors, 1);
        assert_eq!(result.stats.transport_errors, 1);
        assert_eq!(result.stats.failed(), 3);
        assert_eq!(result.dataset.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_names_last_in_listing_wins() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["first.dat", "second.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/first.dat");
            // 讓第一個檔案較晚完成
            then.status(200)
                .body("SAME\n1 1\n")
                .delay(Duration::from_millis(300));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/second.dat");
            then.status(200).body("SAME\n2 2\n");
        });

        let (pipeline, sink) = pipeline(&server, MockStorage::new());
        let resources = pipeline.extract().await.unwrap();
        let result = pipeline.transform(resources).await.unwrap();

        assert_eq!(result.dataset.len(), 1);
        let coords = result.dataset.get("SAME").unwrap();
        assert_eq!((coords[0].x, coords[0].y), (2.0, 2.0));
        assert_eq!(result.stats.overwritten, 1);
        assert!(sink
            .entries()
            .iter()
            .any(|d| d.message.contains("Duplicate airfoil name 'SAME'")));
    }

    #[tokio::test]
    async fn test_empty_and_nameless_files_are_kept() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["blank.dat", "nameless.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/blank.dat");
            then.status(200).body("BLANK\n# no points\n");
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/nameless.dat");
            then.status(200).body("\n1 0\n0.5 oops\n");
        });

        let (pipeline, sink) = pipeline(&server, MockStorage::new());
        let resources = pipeline.extract().await.unwrap();
        let result = pipeline.transform(resources).await.unwrap();

        assert_eq!(result.dataset.get("BLANK").unwrap().len(), 0);
        assert_eq!(result.dataset.get("nameless").unwrap().len(), 1);
        assert_eq!(result.stats.empty_records, 1);
        assert_eq!(result.stats.parse_warnings, 1);
        assert!(sink
            .entries()
            .iter()
            .any(|d| d.message.contains("0.5 oops") && d.message.contains("nameless.dat")));
    }

    #[tokio::test]
    async fn test_cache_saves_payloads_by_filename() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["n0012.dat", "lost.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/n0012.dat");
            then.status(200).body("NACA 0012\n1 0\n");
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/lost.dat");
            then.status(404);
        });

        let cache = MockStorage::new();
        let (pipeline, _) = pipeline(&server, MockStorage::new());
        let pipeline = pipeline.with_cache(cache.clone());

        let resources = pipeline.extract().await.unwrap();
        let result = pipeline.transform(resources).await.unwrap();

        assert_eq!(
            cache.get_file("n0012.dat").await,
            Some(b"NACA 0012\n1 0\n".to_vec())
        );
        assert_eq!(cache.file_count().await, 1);
        assert_eq!(result.stats.cached, 1);
    }

    #[tokio::test]
    async fn test_cache_uses_decoded_filename() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["naca%200012.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path_contains("0012.dat");
            then.status(200).body("\n1 0\n");
        });

        let cache = MockStorage::new();
        let (pipeline, _) = pipeline(&server, MockStorage::new());
        let pipeline = pipeline.with_cache(cache.clone());

        let resources = pipeline.extract().await.unwrap();
        assert_eq!(resources[0].filename, "naca 0012.dat");

        let result = pipeline.transform(resources).await.unwrap();
        assert!(cache.get_file("naca 0012.dat").await.is_some());
        assert!(result.dataset.get("naca 0012").is_some());
    }

    #[tokio::test]
    async fn test_cache_failure_does_not_drop_record() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["a.dat"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/coords/a.dat");
            then.status(200).body("A\n1 0\n");
        });

        let (pipeline, sink) = pipeline(&server, MockStorage::new());
        let pipeline = pipeline.with_cache(MockStorage::failing());

        let resources = pipeline.extract().await.unwrap();
        let result = pipeline.transform(resources).await.unwrap();

        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.stats.cache_failures, 1);
        assert!(sink
            .entries()
            .iter()
            .any(|d| d.level == Level::WARN && d.message.contains("Failed to cache")));
    }

    #[tokio::test]
    async fn test_abort_before_run_fetches_nothing() {
        let server = MockServer::start();
        let listing_mock = server.mock(|when, then| {
            when.method(GET).path("/coords/");
            then.status(200).body(listing(&["a.dat"]));
        });

        let (pipeline, _) = pipeline(&server, MockStorage::new());
        pipeline.abort_handle().abort();

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, HarvestError::Aborted { not_issued: 0 }));
        listing_mock.assert_hits(0);
    }

    /// Serves a fixed listing and trips `abort` once the first item fetch returns.
    struct AbortingFetcher {
        listing: String,
        abort: AbortHandle,
        requested: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl Fetcher for AbortingFetcher {
        async fn fetch(&self, url: &str) -> FetchOutcome {
            let calls = {
                let mut requested = self.requested.lock().unwrap();
                requested.push(url.to_string());
                requested.len()
            };
            match calls {
                1 => FetchOutcome::Success(self.listing.clone().into_bytes()),
                _ => {
                    self.abort.abort();
                    FetchOutcome::Success(b"A\n1 0\n".to_vec())
                }
            }
        }
    }

    #[tokio::test]
    async fn test_abort_mid_run_stops_issuing_fetches() {
        let abort = AbortHandle::new();
        let fetcher = AbortingFetcher {
            listing: listing(&["a.dat", "b.dat", "c.dat", "d.dat"]),
            abort: abort.clone(),
            requested: std::sync::Mutex::new(Vec::new()),
        };
        let storage = MockStorage::new();
        let config = MockConfig {
            listing_url: "http://stub/coords/".to_string(),
            concurrent_requests: 1,
        };
        let pipeline = HarvestPipeline::new(
            fetcher,
            storage.clone(),
            config,
            Arc::new(MemoryDiagnostics::new()),
        )
        .with_abort_handle(abort);
        let engine = crate::core::etl::HarvestEngine::new(pipeline);

        let err = engine.run().await.unwrap_err();

        match err {
            HarvestError::Aborted { not_issued } => assert_eq!(not_issued, 3),
            other => panic!("unexpected error: {:?}", other),
        }
        let requested = engine.pipeline().fetcher.requested.lock().unwrap().clone();
        assert_eq!(
            requested,
            vec!["http://stub/coords/", "http://stub/coords/a.dat"]
        );
        assert_eq!(storage.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_load_writes_dataset() {
        let storage = MockStorage::new();
        let server = MockServer::start();
        let (pipeline, _) = pipeline(&server, storage.clone());

        let mut dataset = AirfoilDataset::new();
        dataset.insert(parser::parse("x", "X\n1 0\n").record);
        let path = pipeline
            .load(TransformResult {
                dataset: dataset.clone(),
                stats: HarvestStats::default(),
            })
            .await
            .unwrap();

        assert_eq!(path, Path::new("test_output").join("airfoils.json").display().to_string());
        let written = storage.get_file("airfoils.json").await.unwrap();
        let restored: AirfoilDataset = serde_json::from_slice(&written).unwrap();
        assert_eq!(restored, dataset);
    }

    #[tokio::test]
    async fn test_load_failure_is_persistence_error() {
        let server = MockServer::start();
        let (pipeline, _) = pipeline(&server, MockStorage::failing());

        let err = pipeline
            .load(TransformResult {
                dataset: AirfoilDataset::new(),
                stats: HarvestStats::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, HarvestError::Persistence { .. }));
    }
}
