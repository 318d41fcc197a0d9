//! Survey Data Loader Module
//! Reads a delimited survey export and produces the cleaned dataset.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data::processor::DataProcessor;
use crate::data::record::{CleanDataset, RawRecord};
use crate::error::{LoadError, Result, RowSkipped};

/// Sample survey bundled with the binary.
pub const SAMPLE_SURVEY: &[u8] = include_bytes!("../../data/sample_survey.csv");

/// Field delimiter of the source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Delimiter {
    Comma,
    Tab,
    /// Tab if the header line contains a tab, comma otherwise.
    #[default]
    Auto,
}

impl Delimiter {
    /// Tab for `.tsv`, comma for `.csv`, sniffed for anything else.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => Self::Tab,
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Comma,
            _ => Self::Auto,
        }
    }

    /// Concrete delimiter byte for the given input.
    pub fn resolve(self, input: &[u8]) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
            Self::Auto => {
                let header = input.split(|b| *b == b'\n').next().unwrap_or_default();
                if header.contains(&b'\t') {
                    b'\t'
                } else {
                    b','
                }
            }
        }
    }
}

/// Names of the survey columns the loader looks for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ColumnSchema {
    pub response_id: String,
    pub years_experience: String,
    /// Source name renamed to `years_experience` when present.
    pub years_experience_alias: Option<String>,
    pub compensation: String,
    pub country: String,
    pub technologies: String,
    pub developer_type: String,
    pub display_name: Option<String>,
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self {
            response_id: "ResponseId".to_string(),
            years_experience: "YearsCode".to_string(),
            years_experience_alias: Some("YearsCodePro".to_string()),
            compensation: "ConvertedCompYearly".to_string(),
            country: "Country".to_string(),
            technologies: "LanguageHaveWorkedWith".to_string(),
            developer_type: "DevType".to_string(),
            display_name: Some("EmployeeName".to_string()),
        }
    }
}

impl ColumnSchema {
    /// Columns that must exist in the header, after alias renaming.
    pub fn required(&self) -> [&str; 6] {
        [
            self.response_id.as_str(),
            self.years_experience.as_str(),
            self.compensation.as_str(),
            self.country.as_str(),
            self.technologies.as_str(),
            self.developer_type.as_str(),
        ]
    }
}

/// Loader settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct LoaderConfig {
    pub delimiter: Delimiter,
    pub schema: ColumnSchema,
}

impl LoaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: ColumnSchema) -> Self {
        self.schema = schema;
        self
    }
}

/// Where survey bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A named local file.
    Path(PathBuf),
    /// An uploaded byte stream.
    Bytes { name: String, bytes: Vec<u8> },
}

impl DataSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// The bundled sample survey.
    pub fn sample() -> Self {
        Self::bytes("sample_survey.csv", SAMPLE_SURVEY)
    }

    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Self::Path(path) => path.to_string_lossy(),
            Self::Bytes { name, .. } => Cow::Borrowed(name),
        }
    }

    /// Read the whole source once.
    pub fn read(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => std::fs::read(path).map(Cow::Owned).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LoadError::SourceNotFound { path: path.clone() }
                } else {
                    LoadError::SourceRead {
                        path: path.clone(),
                        source: e,
                    }
                }
            }),
            Self::Bytes { bytes, .. } => Ok(Cow::Borrowed(bytes)),
        }
    }
}

/// Non-fatal facts collected during a load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadDiagnostics {
    /// Data rows read, header excluded.
    pub total_rows: usize,
    pub admitted: usize,
    /// Well-formed rows dropped for a missing or unparsable required field.
    pub dropped_incomplete: usize,
    pub skipped_rows: Vec<RowSkipped>,
}

/// Successful load: the cleaned dataset plus its diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadedDataset {
    pub dataset: CleanDataset,
    pub diagnostics: LoadDiagnostics,
}

/// Header positions of the schema columns, keyed by schema name.
struct ColumnIndex {
    width: usize,
    positions: Vec<(String, usize)>,
    columns: Vec<String>,
}

/// Loads survey exports into a [`CleanDataset`].
#[derive(Debug, Clone, Default)]
pub struct SurveyLoader {
    config: LoaderConfig,
}

impl SurveyLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Read `source` once and clean it.
    pub fn load(&self, source: &DataSource) -> Result<LoadedDataset> {
        let bytes = source.read()?;
        debug!(source = %source.label(), bytes = bytes.len(), "Read survey source");
        self.load_bytes(&bytes)
    }

    /// Clean an in-memory table.
    pub fn load_bytes(&self, input: &[u8]) -> Result<LoadedDataset> {
        let delimiter = self.config.delimiter.resolve(input);
        debug!(delimiter = %(delimiter as char).escape_default(), "Selected delimiter");

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);

        let headers = reader
            .headers()
            .map_err(|e| LoadError::StructuralParse {
                reason: e.to_string(),
            })?
            .clone();
        let index = self.resolve_columns(&headers)?;

        let schema = &self.config.schema;
        let mut diagnostics = LoadDiagnostics::default();
        let mut records = Vec::new();

        for result in reader.records() {
            let row = result.map_err(|e| LoadError::StructuralParse {
                reason: e.to_string(),
            })?;
            diagnostics.total_rows += 1;
            let line = row
                .position()
                .map(|p| p.line())
                .unwrap_or(diagnostics.total_rows as u64 + 1);

            if row.len() != index.width {
                warn!(
                    line,
                    expected = index.width,
                    found = row.len(),
                    "Skipping row with wrong field count"
                );
                diagnostics.skipped_rows.push(RowSkipped {
                    line,
                    expected: index.width,
                    found: row.len(),
                });
                continue;
            }

            let raw = Self::raw_record(line, &row, &index);
            match DataProcessor::admit(&raw, schema) {
                Some(record) => records.push(record),
                None => diagnostics.dropped_incomplete += 1,
            }
        }

        diagnostics.admitted = records.len();
        info!(
            rows = diagnostics.total_rows,
            admitted = diagnostics.admitted,
            dropped = diagnostics.dropped_incomplete,
            skipped = diagnostics.skipped_rows.len(),
            "Loaded survey"
        );

        Ok(LoadedDataset {
            dataset: CleanDataset::new(index.columns, records),
            diagnostics,
        })
    }

    /// Map header names to positions, applying the experience alias.
    fn resolve_columns(&self, headers: &StringRecord) -> Result<ColumnIndex> {
        let schema = &self.config.schema;
        let mut columns: Vec<String> = headers
            .iter()
            .map(|h| h.trim_matches('\u{feff}').trim().to_string())
            .collect();

        if columns.iter().all(String::is_empty) {
            return Err(LoadError::StructuralParse {
                reason: "no header row".to_string(),
            });
        }
        let width = columns.len();

        let mut shadowed = None;
        let alias_pos = schema
            .years_experience_alias
            .as_deref()
            .and_then(|alias| columns.iter().position(|c| c == alias));
        if let Some(pos) = alias_pos {
            if let Some(existing) = columns.iter().position(|c| c == &schema.years_experience) {
                warn!(
                    column = %schema.years_experience,
                    "Both experience columns present, ignoring the unaliased one"
                );
                columns[existing] = String::new();
                shadowed = Some(existing);
            }
            columns[pos] = schema.years_experience.clone();
        }

        let mut positions = Vec::with_capacity(8);
        for name in schema.required() {
            let pos = columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| LoadError::SchemaMismatch {
                    column: name.to_string(),
                })?;
            positions.push((name.to_string(), pos));
        }
        if let Some(name) = schema.display_name.as_deref() {
            match columns.iter().position(|c| c == name) {
                Some(pos) => positions.push((name.to_string(), pos)),
                None => debug!(column = name, "Optional name column absent"),
            }
        }

        let columns = columns
            .into_iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != shadowed)
            .map(|(i, c)| if c.is_empty() { format!("Unnamed: {i}") } else { c })
            .collect();

        Ok(ColumnIndex {
            width,
            positions,
            columns,
        })
    }

    fn raw_record(line: u64, row: &StringRecord, index: &ColumnIndex) -> RawRecord {
        let mut raw = RawRecord::new(line);
        for (name, pos) in &index.positions {
            raw.insert(name.as_str(), row.get(*pos).unwrap_or_default());
        }
        raw
    }
}
