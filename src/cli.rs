//! Command line front end.
//!
//! Loads a survey and prints one derived view as JSON on stdout.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::data::{DataSource, Delimiter, LoadedDataset, LoaderConfig, SurveyLoader};
use crate::logging::{LogConfig, LogFormat};
use crate::stats::{CountryStats, MapMetric, StatsCalculator, DEFAULT_TOP_TECHNOLOGIES};

/// Developer survey cleaning and reporting
#[derive(Parser, Debug)]
#[command(name = "survey-insights", version, about)]
#[command(group(ArgGroup::new("source").required(true).args(["input", "sample"])))]
pub struct Cli {
    /// Survey export (CSV or TSV)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Use the bundled sample survey
    #[arg(long)]
    pub sample: bool,

    /// Field delimiter of the input [default: from the file extension]
    #[arg(long, value_enum)]
    pub delimiter: Option<DelimiterArg>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Row and column counts plus load diagnostics
    Overview,
    /// Cleaned records, optionally filtered by respondent name
    Browse {
        /// Case-insensitive name substring
        #[arg(long)]
        search: Option<String>,
    },
    /// Most used technologies
    Technologies {
        /// Number of entries to print
        #[arg(long, default_value_t = DEFAULT_TOP_TECHNOLOGIES)]
        top: usize,
    },
    /// Experience vs compensation points
    Career,
    /// Respondent count and median compensation per country
    Countries {
        /// Only countries with a resolved ISO code
        #[arg(long)]
        mappable: bool,
        /// Print one map value per country instead of the full statistics
        #[arg(long, value_enum)]
        metric: Option<MapMetric>,
    },
    /// Write the cleaned dataset as CSV
    Export {
        /// Output file
        out: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DelimiterArg {
    Comma,
    Tab,
    Auto,
}

impl From<DelimiterArg> for Delimiter {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Comma => Delimiter::Comma,
            DelimiterArg::Tab => Delimiter::Tab,
            DelimiterArg::Auto => Delimiter::Auto,
        }
    }
}

#[derive(Serialize)]
struct MapValue<'a> {
    country: &'a str,
    iso_alpha3: Option<&'a str>,
    metric: MapMetric,
    value: f64,
}

#[derive(Serialize)]
struct OverviewReport<'a> {
    rows: usize,
    columns: usize,
    diagnostics: &'a crate::data::LoadDiagnostics,
}

impl Cli {
    pub fn log_config(&self) -> LogConfig {
        LogConfig::from_verbosity(self.verbose).with_format(self.log_format)
    }

    pub fn source(&self) -> DataSource {
        match &self.input {
            Some(path) if !self.sample => DataSource::path(path),
            _ => DataSource::sample(),
        }
    }

    /// Explicit `--delimiter`, else guessed from the input file name.
    pub fn delimiter(&self) -> Delimiter {
        match (self.delimiter, &self.input) {
            (Some(arg), _) => arg.into(),
            (None, Some(path)) if !self.sample => Delimiter::from_path(path),
            (None, _) => Delimiter::Auto,
        }
    }

    pub fn loader(&self) -> SurveyLoader {
        SurveyLoader::new(LoaderConfig::new().with_delimiter(self.delimiter()))
    }
}

/// Load the survey and run the selected command.
pub fn run(cli: &Cli) -> Result<()> {
    let source = cli.source();
    let loaded = cli.loader().load(&source).map_err(|e| {
        let hint = e.hint();
        anyhow::Error::new(e).context(format!("could not load {}: {hint}", source.label()))
    })?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    execute(&cli.command, &loaded, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write the output of `command` for an already loaded survey.
pub fn execute<W: Write>(command: &Command, loaded: &LoadedDataset, out: &mut W) -> Result<()> {
    let records = loaded.dataset.records();
    match command {
        Command::Overview => {
            let overview = loaded.dataset.overview();
            write_json(
                out,
                &OverviewReport {
                    rows: overview.rows,
                    columns: overview.columns,
                    diagnostics: &loaded.diagnostics,
                },
            )
        }
        Command::Browse { search } => {
            let hits = loaded.dataset.search_by_name(search.as_deref().unwrap_or_default());
            write_json(out, &hits)
        }
        Command::Technologies { top } => {
            let ranking = StatsCalculator::technology_frequency(records);
            write_json(out, StatsCalculator::top_technologies(&ranking, *top))
        }
        Command::Career => write_json(out, &StatsCalculator::career_view(records)),
        Command::Countries { mappable, metric } => {
            let stats = StatsCalculator::country_stats(records);
            let selected: Vec<&CountryStats> = if *mappable {
                StatsCalculator::mappable(&stats)
            } else {
                stats.iter().collect()
            };
            match metric {
                Some(metric) => {
                    let values: Vec<MapValue<'_>> = selected
                        .iter()
                        .map(|s| MapValue {
                            country: &s.country,
                            iso_alpha3: s.iso_alpha3.as_deref(),
                            metric: *metric,
                            value: s.metric(*metric),
                        })
                        .collect();
                    write_json(out, &values)
                }
                None => write_json(out, &selected),
            }
        }
        Command::Export { out: path } => {
            let file =
                File::create(path).with_context(|| format!("create {}", path.display()))?;
            loaded
                .dataset
                .write_csv(BufWriter::new(file))
                .with_context(|| format!("write {}", path.display()))?;
            writeln!(out, "wrote {} records to {}", records.len(), path.display())?;
            Ok(())
        }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LoadedDataset {
        SurveyLoader::default().load(&DataSource::sample()).unwrap()
    }

    fn run_json(command: Command) -> serde_json::Value {
        let mut out = Vec::new();
        execute(&command, &sample(), &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_cli_parses_source_group() {
        let cli = Cli::try_parse_from(["survey-insights", "--sample", "career"]).unwrap();
        assert!(cli.sample);
        assert_eq!(cli.source(), DataSource::sample());

        let cli = Cli::try_parse_from([
            "survey-insights",
            "-i",
            "survey.tsv",
            "--delimiter",
            "tab",
            "technologies",
            "--top",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.source(), DataSource::path("survey.tsv"));
        assert_eq!(cli.loader().config().delimiter, Delimiter::Tab);
        assert!(matches!(cli.command, Command::Technologies { top: 5 }));

        assert!(Cli::try_parse_from(["survey-insights", "career"]).is_err());
    }

    #[test]
    fn test_cli_delimiter_defaults_from_extension() {
        let tsv = Cli::try_parse_from(["survey-insights", "-i", "survey.tsv", "career"]).unwrap();
        assert_eq!(tsv.loader().config().delimiter, Delimiter::Tab);

        let csv = Cli::try_parse_from(["survey-insights", "-i", "survey.csv", "career"]).unwrap();
        assert_eq!(csv.loader().config().delimiter, Delimiter::Comma);

        let sample = Cli::try_parse_from(["survey-insights", "--sample", "career"]).unwrap();
        assert_eq!(sample.loader().config().delimiter, Delimiter::Auto);

        let forced = Cli::try_parse_from([
            "survey-insights",
            "-i",
            "survey.tsv",
            "--delimiter",
            "comma",
            "career",
        ])
        .unwrap();
        assert_eq!(forced.loader().config().delimiter, Delimiter::Comma);
    }

    #[test]
    fn test_overview_command() {
        let value = run_json(Command::Overview);
        assert_eq!(value["rows"], 49);
        assert_eq!(value["columns"], 7);
        assert_eq!(value["diagnostics"]["skipped_rows"][0]["found"], 8);
    }

    #[test]
    fn test_technologies_command_truncates() {
        let value = run_json(Command::Technologies { top: 3 });
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["technology"], "JavaScript");
    }

    #[test]
    fn test_browse_search() {
        let value = run_json(Command::Browse {
            search: Some("smith".to_string()),
        });
        let hits = value.as_array().unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["display_name"], "James Smith");
        assert_eq!(hits[0]["response_id"], 1);
    }

    #[test]
    fn test_countries_mappable() {
        let value = run_json(Command::Countries {
            mappable: true,
            metric: None,
        });
        let entries = value.as_array().unwrap();
        assert_eq!(entries.len(), 13);
        let uk = entries
            .iter()
            .find(|e| e["country"] == "United Kingdom of Great Britain and Northern Ireland")
            .unwrap();
        assert_eq!(uk["iso_alpha3"], "GBR");
    }

    #[test]
    fn test_countries_metric() {
        let cli = Cli::try_parse_from([
            "survey-insights",
            "--sample",
            "countries",
            "--metric",
            "respondent-count",
        ])
        .unwrap();
        let mut out = Vec::new();
        execute(&cli.command, &sample(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        let usa = value
            .as_array()
            .unwrap()
            .iter()
            .find(|e| e["country"] == "United States of America")
            .unwrap();
        assert_eq!(usa["iso_alpha3"], "USA");
        assert_eq!(usa["metric"], "respondent_count");
        assert_eq!(usa["value"], 31.0);
        assert!(usa.get("median_compensation").is_none());
    }

    #[test]
    fn test_export_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean.csv");
        let mut out = Vec::new();
        execute(&Command::Export { out: path.clone() }, &sample(), &mut out).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 50);
        assert!(String::from_utf8(out).unwrap().starts_with("wrote 49 records"));
    }
}
