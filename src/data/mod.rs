//! Data module - survey loading and cleaning

mod cache;
mod loader;
mod processor;
mod record;

pub use cache::{content_key, DatasetCache};
pub use loader::{
    ColumnSchema, DataSource, Delimiter, LoadDiagnostics, LoadedDataset, LoaderConfig,
    SurveyLoader, SAMPLE_SURVEY,
};
pub use processor::{DataProcessor, TECHNOLOGY_SEPARATOR};
pub use record::{
    CleanDataset, CleanRecord, DatasetOverview, RawRecord, ResponseId, MISSING_MARKERS,
};
