//! Survey Record Module
//! Raw and cleaned survey rows plus the cleaned dataset container.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use polars::prelude::{CsvWriter, DataFrame, SerWriter};
use serde::Serialize;

use crate::data::processor::DataProcessor;
use crate::error::Result;

/// Placeholder values read as missing, matching the usual CSV reader defaults.
pub const MISSING_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One source row before typing, keyed by canonical column name.
///
/// Only columns named in the loader schema are retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the source, header included.
    pub line: u64,
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(line: u64) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Builder-style insert, handy for constructing rows by hand.
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.insert(column, value);
        self
    }

    /// Field value, `None` when absent, blank or a [`MISSING_MARKERS`] entry.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str).filter(|v| {
            let trimmed = v.trim();
            !trimmed.is_empty() && !MISSING_MARKERS.contains(&trimmed)
        })
    }
}

/// Respondent identifier as found in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ResponseId {
    Integer(i64),
    Text(String),
}

impl ResponseId {
    /// Integer when the text parses as one, otherwise the trimmed text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        trimmed
            .parse::<i64>()
            .map(Self::Integer)
            .unwrap_or_else(|_| Self::Text(trimmed.to_string()))
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A validated survey response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    pub response_id: ResponseId,
    pub years_experience: f64,
    pub annual_compensation: f64,
    pub country: String,
    pub languages_used: Vec<String>,
    pub developer_type: String,
    pub display_name: Option<String>,
}

/// Row and column counts shown next to a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
}

/// Ordered sequence of cleaned records.
///
/// Duplicates by `response_id` are kept as they appear in the source.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanDataset {
    columns: Vec<String>,
    records: Vec<CleanRecord>,
}

impl CleanDataset {
    pub fn new(columns: Vec<String>, records: Vec<CleanRecord>) -> Self {
        Self { columns, records }
    }

    /// Source header after alias renaming.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[CleanRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CleanRecord> {
        self.records.iter()
    }

    pub fn overview(&self) -> DatasetOverview {
        DatasetOverview {
            rows: self.records.len(),
            columns: self.columns.len(),
        }
    }

    /// Records whose display name contains `query`, ignoring case.
    ///
    /// Records without a name never match. An empty query matches everything.
    pub fn search_by_name(&self, query: &str) -> Vec<&CleanRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.records.iter().collect();
        }

        self.records
            .iter()
            .filter(|r| {
                r.display_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Tabular projection for raw browsing and export.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        Ok(DataProcessor::records_to_frame(&self.records)?)
    }

    /// Write the tabular projection as comma-separated text with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut df = self.to_dataframe()?;
        CsvWriter::new(writer)
            .include_header(true)
            .finish(&mut df)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a CleanDataset {
    type Item = &'a CleanRecord;
    type IntoIter = std::slice::Iter<'a, CleanRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
