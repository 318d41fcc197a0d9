//! Data Processor Module
//! Handles field coercion, row admission and the tabular projection.

use polars::prelude::*;

use crate::data::loader::ColumnSchema;
use crate::data::record::{CleanRecord, RawRecord, ResponseId};

/// Separator used by multi-value technology fields.
pub const TECHNOLOGY_SEPARATOR: char = ';';

/// Stateless cleaning operations applied row by row.
pub struct DataProcessor;

impl DataProcessor {
    /// Try-parse a real number. Unparsable or non-finite text is missing, never zero.
    pub fn parse_number(raw: Option<&str>) -> Option<f64> {
        raw.and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Years of experience: a number that is not negative.
    pub fn parse_years(raw: Option<&str>) -> Option<f64> {
        Self::parse_number(raw).filter(|v| *v >= 0.0)
    }

    /// Split a semicolon-delimited technology list, dropping empty tokens.
    pub fn split_technologies(raw: &str) -> Vec<String> {
        raw.split(TECHNOLOGY_SEPARATOR)
            .filter(|token| !token.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Convert a raw row into a clean record.
    ///
    /// Returns `None` when any of years, compensation, country, technologies
    /// or developer type is missing or fails to parse.
    pub fn admit(raw: &RawRecord, schema: &ColumnSchema) -> Option<CleanRecord> {
        let years_experience = Self::parse_years(raw.get(&schema.years_experience))?;
        let annual_compensation = Self::parse_number(raw.get(&schema.compensation))?;
        let country = raw.get(&schema.country)?.trim().to_string();
        let technologies = raw.get(&schema.technologies)?;
        let developer_type = raw.get(&schema.developer_type)?.trim().to_string();

        let response_id = ResponseId::parse(raw.get(&schema.response_id).unwrap_or_default());
        let display_name = schema
            .display_name
            .as_deref()
            .and_then(|column| raw.get(column))
            .map(|name| name.trim().to_string());

        Some(CleanRecord {
            response_id,
            years_experience,
            annual_compensation,
            country,
            languages_used: Self::split_technologies(technologies),
            developer_type,
            display_name,
        })
    }

    /// Build a DataFrame with one row per record.
    ///
    /// Output columns: ["response_id", "years_experience", "annual_compensation",
    /// "country", "languages_used", "developer_type", "display_name"]
    pub fn records_to_frame(records: &[CleanRecord]) -> PolarsResult<DataFrame> {
        let mut ids: Vec<String> = Vec::with_capacity(records.len());
        let mut years: Vec<f64> = Vec::with_capacity(records.len());
        let mut compensation: Vec<f64> = Vec::with_capacity(records.len());
        let mut countries: Vec<String> = Vec::with_capacity(records.len());
        let mut languages: Vec<String> = Vec::with_capacity(records.len());
        let mut dev_types: Vec<String> = Vec::with_capacity(records.len());
        let mut names: Vec<Option<String>> = Vec::with_capacity(records.len());

        for record in records {
            ids.push(record.response_id.to_string());
            years.push(record.years_experience);
            compensation.push(record.annual_compensation);
            countries.push(record.country.clone());
            languages.push(record.languages_used.join(";"));
            dev_types.push(record.developer_type.clone());
            names.push(record.display_name.clone());
        }

        DataFrame::new(vec![
            Column::new("response_id".into(), ids),
            Column::new("years_experience".into(), years),
            Column::new("annual_compensation".into(), compensation),
            Column::new("country".into(), countries),
            Column::new("languages_used".into(), languages),
            Column::new("developer_type".into(), dev_types),
            Column::new("display_name".into(), names),
        ])
    }
}
