//! Survey Insights - developer survey cleaning & aggregation
//!
//! Loads a delimited developer survey export, drops incomplete rows, and
//! derives the technology ranking, career scatter and per-country statistics
//! consumed by a dashboard.

pub mod cli;
pub mod data;
pub mod error;
pub mod logging;
pub mod stats;

pub use data::{
    CleanDataset, CleanRecord, DataSource, DatasetCache, Delimiter, LoadDiagnostics,
    LoadedDataset, LoaderConfig, SurveyLoader,
};
pub use error::{LoadError, LoadErrorKind, RowSkipped};
pub use stats::{resolve_iso, CareerPoint, CountryStats, StatsCalculator, TechnologyCount};
