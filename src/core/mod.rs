pub mod abort;
pub mod etl;
pub mod fetcher;
pub mod links;
pub mod parser;
pub mod pipeline;
pub mod writer;

pub use crate::domain::model::{
    AirfoilDataset, AirfoilRecord, CoordinatePair, FetchOutcome, FetchedResource, HarvestStats,
    RunReport, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Diagnostics, Fetcher, Pipeline, Storage};
pub use crate::utils::error::Result;
