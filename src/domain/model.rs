use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One (x, y) point of an airfoil outline. Serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct CoordinatePair {
    pub x: f64,
    pub y: f64,
}

impl CoordinatePair {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for CoordinatePair {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<CoordinatePair> for [f64; 2] {
    fn from(pair: CoordinatePair) -> Self {
        [pair.x, pair.y]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirfoilRecord {
    pub name: String,
    pub coords: Vec<CoordinatePair>,
}

/// Name-keyed collection of outlines. Keys are kept sorted so the persisted
/// file is stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirfoilDataset {
    entries: BTreeMap<String, Vec<CoordinatePair>>,
}

impl AirfoilDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record, replacing any earlier record with the same name.
    /// Returns the replaced coordinates.
    pub fn insert(&mut self, record: AirfoilRecord) -> Option<Vec<CoordinatePair>> {
        self.entries.insert(record.name, record.coords)
    }

    pub fn get(&self, name: &str) -> Option<&[CoordinatePair]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[CoordinatePair])> {
        self.entries
            .iter()
            .map(|(name, coords)| (name.as_str(), coords.as_slice()))
    }
}

/// Result of a single GET. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<u8>),
    NotFound,
    HttpError(u16),
    TransportError(String),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    /// Short description used in logs and fatal-error messages.
    pub fn describe(&self) -> String {
        match self {
            FetchOutcome::Success(body) => format!("OK ({} bytes)", body.len()),
            FetchOutcome::NotFound => "404 Not Found".to_string(),
            FetchOutcome::HttpError(status) => format!("HTTP error status {status}"),
            FetchOutcome::TransportError(cause) => format!("transport error: {cause}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Disabled,
    Saved,
    Failed,
}

/// One candidate data file after the extract phase.
#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub url: String,
    pub filename: String,
    pub outcome: FetchOutcome,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HarvestStats {
    pub links: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub http_errors: usize,
    pub transport_errors: usize,
    pub records: usize,
    pub empty_records: usize,
    pub overwritten: usize,
    pub parse_warnings: usize,
    pub cached: usize,
    pub cache_failures: usize,
}

impl HarvestStats {
    pub fn failed(&self) -> usize {
        self.not_found + self.http_errors + self.transport_errors
    }
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub dataset: AirfoilDataset,
    pub stats: HarvestStats,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub output_path: String,
    pub stats: HarvestStats,
}
