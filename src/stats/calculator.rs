//! Statistics Calculator Module
//! Derives the reporting views (technology ranking, career scatter, country
//! statistics) from cleaned survey records.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::data::CleanRecord;
use crate::stats::country::resolve_iso;

/// Career view keeps compensation strictly above this value.
pub const COMPENSATION_FLOOR: f64 = 1_000.0;
/// Career view keeps compensation strictly below this value.
pub const COMPENSATION_CEILING: f64 = 400_000.0;
/// Career view keeps experience up to and including this value.
pub const MAX_YEARS_EXPERIENCE: f64 = 40.0;
/// Ranking prefix shown by the bar chart.
pub const DEFAULT_TOP_TECHNOLOGIES: usize = 15;

/// Occurrences of one technology token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyCount {
    pub technology: String,
    pub count: usize,
}

/// One point of the experience/compensation scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CareerPoint {
    pub years_experience: f64,
    pub annual_compensation: f64,
    pub developer_type: String,
    /// Respondent name when known, otherwise the country.
    pub label: String,
}

/// Respondent and salary statistics for one country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryStats {
    pub country: String,
    pub respondent_count: usize,
    pub median_compensation: f64,
    pub iso_alpha3: Option<String>,
}

/// Value plotted on the choropleth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum MapMetric {
    #[default]
    MedianCompensation,
    RespondentCount,
}

impl CountryStats {
    pub fn metric(&self, metric: MapMetric) -> f64 {
        match metric {
            MapMetric::MedianCompensation => self.median_compensation,
            MapMetric::RespondentCount => self.respondent_count as f64,
        }
    }
}

/// Pure aggregations over cleaned records. Empty input gives empty output.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count technology tokens across all records.
    ///
    /// Sorted by count descending; ties keep first-encountered order.
    pub fn technology_frequency(records: &[CleanRecord]) -> Vec<TechnologyCount> {
        let mut position: HashMap<&str, usize> = HashMap::new();
        let mut ranking: Vec<TechnologyCount> = Vec::new();

        for token in records.iter().flat_map(|r| r.languages_used.iter()) {
            if token.is_empty() {
                continue;
            }
            match position.get(token.as_str()) {
                Some(&idx) => ranking[idx].count += 1,
                None => {
                    position.insert(token.as_str(), ranking.len());
                    ranking.push(TechnologyCount {
                        technology: token.clone(),
                        count: 1,
                    });
                }
            }
        }

        // stable sort keeps encounter order among ties
        ranking.sort_by(|a, b| b.count.cmp(&a.count));
        debug!(technologies = ranking.len(), "Computed technology frequency");
        ranking
    }

    /// First `n` entries of a ranking.
    pub fn top_technologies(ranking: &[TechnologyCount], n: usize) -> &[TechnologyCount] {
        &ranking[..n.min(ranking.len())]
    }

    /// Whether a record falls inside the career view bounds.
    pub fn in_career_range(record: &CleanRecord) -> bool {
        record.annual_compensation > COMPENSATION_FLOOR
            && record.annual_compensation < COMPENSATION_CEILING
            && record.years_experience <= MAX_YEARS_EXPERIENCE
    }

    /// Experience/compensation points within the plotting bounds.
    pub fn career_view(records: &[CleanRecord]) -> Vec<CareerPoint> {
        records
            .iter()
            .filter(|r| Self::in_career_range(r))
            .map(|r| CareerPoint {
                years_experience: r.years_experience,
                annual_compensation: r.annual_compensation,
                developer_type: r.developer_type.clone(),
                label: r
                    .display_name
                    .clone()
                    .unwrap_or_else(|| r.country.clone()),
            })
            .collect()
    }

    /// Per-country respondent count, median compensation and ISO code.
    ///
    /// Sorted by country name. Unresolved countries are kept with no code.
    pub fn country_stats(records: &[CleanRecord]) -> Vec<CountryStats> {
        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.country.as_str())
                .or_default()
                .push(record.annual_compensation);
        }

        let stats: Vec<CountryStats> = groups
            .into_iter()
            .map(|(country, values)| CountryStats {
                country: country.to_string(),
                respondent_count: values.len(),
                median_compensation: Self::median(&values),
                iso_alpha3: resolve_iso(country).map(str::to_string),
            })
            .collect();

        debug!(
            countries = stats.len(),
            unresolved = stats.iter().filter(|s| s.iso_alpha3.is_none()).count(),
            "Computed country statistics"
        );
        stats
    }

    /// Entries that can be drawn on a map.
    pub fn mappable(stats: &[CountryStats]) -> Vec<&CountryStats> {
        stats.iter().filter(|s| s.iso_alpha3.is_some()).collect()
    }

    /// Median, averaging the two middle values for even lengths.
    ///
    /// NaN for an empty slice.
    pub fn median(values: &[f64]) -> f64 {
        let n = values.len();
        if n == 0 {
            return f64::NAN;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ResponseId;

    fn record(id: i64, years: f64, comp: f64, country: &str, langs: &[&str]) -> CleanRecord {
        CleanRecord {
            response_id: ResponseId::Integer(id),
            years_experience: years,
            annual_compensation: comp,
            country: country.to_string(),
            languages_used: langs.iter().map(|s| s.to_string()).collect(),
            developer_type: "Developer, back-end".to_string(),
            display_name: None,
        }
    }

    #[test]
    fn test_median() {
        assert_eq!(StatsCalculator::median(&[10.0, 20.0, 30.0, 40.0]), 25.0);
        assert_eq!(StatsCalculator::median(&[30.0, 10.0, 20.0]), 20.0);
        assert_eq!(StatsCalculator::median(&[7.0]), 7.0);
        assert!(StatsCalculator::median(&[]).is_nan());
    }

    #[test]
    fn test_technology_frequency_ranking() {
        let records = vec![
            record(1, 1.0, 5000.0, "France", &["Go", "Rust"]),
            record(2, 1.0, 5000.0, "France", &["Rust", "SQL"]),
            record(3, 1.0, 5000.0, "France", &["SQL", "Rust", "C"]),
        ];
        let ranking = StatsCalculator::technology_frequency(&records);
        let pairs: Vec<(&str, usize)> = ranking
            .iter()
            .map(|t| (t.technology.as_str(), t.count))
            .collect();
        assert_eq!(pairs, vec![("Rust", 3), ("SQL", 2), ("Go", 1), ("C", 1)]);
    }

    #[test]
    fn test_top_technologies() {
        let records = vec![record(1, 1.0, 5000.0, "France", &["Go", "Rust", "C"])];
        let ranking = StatsCalculator::technology_frequency(&records);
        assert_eq!(StatsCalculator::top_technologies(&ranking, 2).len(), 2);
        assert_eq!(StatsCalculator::top_technologies(&ranking, 15).len(), 3);
    }

    #[test]
    fn test_career_view_bounds() {
        let records = vec![
            record(1, 5.0, 1_000.0, "France", &[]),
            record(2, 5.0, 1_000.5, "France", &[]),
            record(3, 5.0, 400_000.0, "France", &[]),
            record(4, 5.0, 399_999.0, "France", &[]),
            record(5, 40.0, 50_000.0, "France", &[]),
            record(6, 40.5, 50_000.0, "France", &[]),
        ];
        let view = StatsCalculator::career_view(&records);
        let comps: Vec<f64> = view.iter().map(|p| p.annual_compensation).collect();
        assert_eq!(comps, vec![1_000.5, 399_999.0, 50_000.0]);
        assert_eq!(view[2].years_experience, 40.0);
    }

    #[test]
    fn test_career_view_label_falls_back_to_country() {
        let mut named = record(1, 5.0, 50_000.0, "France", &[]);
        named.display_name = Some("Sarah Moore".to_string());
        let unnamed = record(2, 5.0, 50_000.0, "Sweden", &[]);

        let view = StatsCalculator::career_view(&[named, unnamed]);
        assert_eq!(view[0].label, "Sarah Moore");
        assert_eq!(view[1].label, "Sweden");
    }

    #[test]
    fn test_country_stats() {
        let records = vec![
            record(1, 1.0, 10.0, "Germany", &[]),
            record(2, 1.0, 40.0, "Germany", &[]),
            record(3, 1.0, 20.0, "Germany", &[]),
            record(4, 1.0, 30.0, "Germany", &[]),
            record(5, 1.0, 99.0, "Nomadic", &[]),
            record(6, 1.0, 5.0, "Russian Federation", &[]),
        ];
        let stats = StatsCalculator::country_stats(&records);

        let names: Vec<&str> = stats.iter().map(|s| s.country.as_str()).collect();
        assert_eq!(names, vec!["Germany", "Nomadic", "Russian Federation"]);

        assert_eq!(stats[0].respondent_count, 4);
        assert_eq!(stats[0].median_compensation, 25.0);
        assert_eq!(stats[0].iso_alpha3.as_deref(), Some("DEU"));
        assert_eq!(stats[1].iso_alpha3, None);
        assert_eq!(stats[2].iso_alpha3.as_deref(), Some("RUS"));

        let mappable = StatsCalculator::mappable(&stats);
        assert_eq!(mappable.len(), 2);
        assert_eq!(stats[0].metric(MapMetric::RespondentCount), 4.0);
        assert_eq!(stats[0].metric(MapMetric::MedianCompensation), 25.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(StatsCalculator::technology_frequency(&[]).is_empty());
        assert!(StatsCalculator::career_view(&[]).is_empty());
        assert!(StatsCalculator::country_stats(&[]).is_empty());
    }
}
