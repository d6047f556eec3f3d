use crate::core::Storage;
use crate::domain::model::AirfoilDataset;
use crate::utils::error::{HarvestError, Result};

/// Persists an [`AirfoilDataset`] as pretty-printed JSON
/// (`{"name": [[x, y], ...], ...}`, keys sorted).
pub struct DatasetWriter<S: Storage> {
    storage: S,
}

impl<S: Storage> DatasetWriter<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn encode(dataset: &AirfoilDataset) -> Result<Vec<u8>> {
        let mut json = serde_json::to_vec_pretty(dataset)?;
        json.push(b'\n');
        Ok(json)
    }

    /// Serializes the whole dataset before touching `destination`; the
    /// storage then replaces the file in one step.
    pub async fn write(&self, dataset: &AirfoilDataset, destination: &str) -> Result<()> {
        let json = Self::encode(dataset)?;

        tracing::debug!(
            "Writing dataset ({} airfoils, {} bytes) to {}",
            dataset.len(),
            json.len(),
            destination
        );

        self.storage
            .write_file(destination, &json)
            .await
            .map_err(|e| match e {
                HarvestError::IoError(source) => HarvestError::Persistence {
                    path: destination.to_string(),
                    source,
                },
                other => other,
            })
    }

    pub async fn read(&self, source: &str) -> Result<AirfoilDataset> {
        let data = self.storage.read_file(source).await?;
        Ok(serde_json::from_slice(&data)?)
    }
}
