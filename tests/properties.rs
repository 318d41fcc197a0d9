use proptest::prelude::*;

use survey_insights::data::ResponseId;
use survey_insights::{CleanRecord, DataSource, StatsCalculator, SurveyLoader};

const COUNTRIES: &[&str] = &[
    "Germany",
    "India",
    "Russian Federation",
    "United Kingdom of Great Britain and Northern Ireland",
    "Nomadic",
];
const TECHNOLOGIES: &[&str] = &["Rust", "Go", "SQL", "Python", "C#", "Bash/Shell (all shells)"];

fn record_strategy() -> impl Strategy<Value = CleanRecord> {
    (
        0i64..10_000,
        0.0f64..60.0,
        -10_000.0f64..600_000.0,
        prop::sample::select(COUNTRIES),
        prop::collection::vec(prop::sample::select(TECHNOLOGIES), 0..5),
        prop::option::of("[a-z]{1,8}"),
    )
        .prop_map(|(id, years, comp, country, langs, name)| CleanRecord {
            response_id: ResponseId::Integer(id),
            years_experience: years,
            annual_compensation: comp,
            country: country.to_string(),
            languages_used: langs.into_iter().map(str::to_string).collect(),
            developer_type: "Developer, full-stack".to_string(),
            display_name: name,
        })
}

proptest! {
    #[test]
    fn technology_frequency_is_ranked_and_complete(
        records in prop::collection::vec(record_strategy(), 0..40)
    ) {
        let ranking = StatsCalculator::technology_frequency(&records);

        prop_assert!(ranking.windows(2).all(|w| w[0].count >= w[1].count));

        let total: usize = ranking.iter().map(|t| t.count).sum();
        let tokens: usize = records.iter().map(|r| r.languages_used.len()).sum();
        prop_assert_eq!(total, tokens);
    }

    #[test]
    fn career_view_is_exactly_the_bounded_records(
        records in prop::collection::vec(record_strategy(), 0..40)
    ) {
        let view = StatsCalculator::career_view(&records);
        for point in &view {
            prop_assert!(point.annual_compensation > 1_000.0);
            prop_assert!(point.annual_compensation < 400_000.0);
            prop_assert!(point.years_experience <= 40.0);
        }

        let expected = records
            .iter()
            .filter(|r| {
                r.annual_compensation > 1_000.0
                    && r.annual_compensation < 400_000.0
                    && r.years_experience <= 40.0
            })
            .count();
        prop_assert_eq!(view.len(), expected);
    }

    #[test]
    fn country_counts_sum_to_dataset_size(
        records in prop::collection::vec(record_strategy(), 0..40)
    ) {
        let stats = StatsCalculator::country_stats(&records);
        let total: usize = stats.iter().map(|s| s.respondent_count).sum();
        prop_assert_eq!(total, records.len());
        prop_assert!(stats.iter().all(|s| s.respondent_count >= 1));
    }

    #[test]
    fn median_lies_between_min_and_max(
        values in prop::collection::vec(-1.0e6f64..1.0e6, 1..30)
    ) {
        let median = StatsCalculator::median(&values);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(median >= min && median <= max);
    }

    #[test]
    fn loading_is_idempotent(
        rows in prop::collection::vec(
            ("[0-9]{1,2}|Less than 1 year", "[0-9]{3,6}|NA", prop::sample::select(COUNTRIES)),
            0..20,
        )
    ) {
        let mut content = String::from(
            "ResponseId,YearsCodePro,ConvertedCompYearly,Country,LanguageHaveWorkedWith,DevType\n",
        );
        for (i, (years, comp, country)) in rows.iter().enumerate() {
            content.push_str(&format!("{i},{years},{comp},\"{country}\",Rust;Go,Student\n"));
        }

        let loader = SurveyLoader::default();
        let source = DataSource::bytes("upload.csv", content);
        let first = loader.load(&source).unwrap();
        let second = loader.load(&source).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        prop_assert_eq!(
            first.dataset.len() + first.diagnostics.dropped_incomplete,
            rows.len()
        );
    }
}
