//! Property tests for the generator and analyzer invariants.

use chrono::NaiveDate;
use proptest::collection::vec;
use proptest::prelude::*;

use volunteer_threshold::analyzer::STANDARD_PERCENTILES;
use volunteer_threshold::config::{ProfileDistribution, ScoreFilter, TaskCountRange};
use volunteer_threshold::models::{Metric, VolunteerRow};
use volunteer_threshold::{DatasetGenerator, ThresholdAnalyzer};

fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}

fn volunteer_row() -> impl Strategy<Value = VolunteerRow> {
    (-60i64..=300, 1u32..=20, 100u32..=500, -100i32..=300).prop_map(
        |(total_score, tasks_completed, mark, rating)| VolunteerRow {
            name: format!("Volunteer {total_score}"),
            total_score,
            tasks_completed,
            average_mark: f64::from(mark) / 100.0,
            average_rating: f64::from(rating) / 100.0,
        },
    )
}

fn distribution() -> impl Strategy<Value = ProfileDistribution> {
    (0u32..=100, 0u32..=100).prop_map(|(a, b)| {
        let (low, high) = (a.min(b), a.max(b));
        ProfileDistribution::new(
            f64::from(low) / 100.0,
            f64::from(high - low) / 100.0,
            f64::from(100 - high) / 100.0,
        )
    })
}

proptest! {
    #[test]
    fn percentiles_are_monotonic(rows in vec(volunteer_row(), 1..80)) {
        let analyzer = ThresholdAnalyzer::with_filter(rows, ScoreFilter::All);
        for metric in Metric::ALL {
            let values: Vec<f64> = STANDARD_PERCENTILES
                .iter()
                .map(|p| analyzer.percentile(metric, *p).unwrap())
                .collect();
            for pair in values.windows(2) {
                prop_assert!(pair[0] <= pair[1], "{metric:?}: {values:?}");
            }
        }
    }

    #[test]
    fn percentile_stays_within_observed_range(rows in vec(volunteer_row(), 1..80), p in 0.0f64..=100.0) {
        let analyzer = ThresholdAnalyzer::with_filter(rows, ScoreFilter::All);
        let stats = analyzer.basic_statistics();
        let value = analyzer.percentile(Metric::TotalScore, p).unwrap();
        prop_assert!(value >= stats.total_score.min.unwrap());
        prop_assert!(value <= stats.total_score.max.unwrap());
    }

    #[test]
    fn correlation_matrix_is_symmetric(rows in vec(volunteer_row(), 0..60)) {
        let matrix = ThresholdAnalyzer::with_filter(rows, ScoreFilter::All).correlation_matrix();
        for a in Metric::ALL {
            let diagonal = matrix.get(a, a);
            prop_assert!(diagonal.is_none() || diagonal == Some(1.0));
            for b in Metric::ALL {
                prop_assert_eq!(matrix.get(a, b), matrix.get(b, a));
                if let Some(r) = matrix.get(a, b) {
                    prop_assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
    }

    #[test]
    fn score_threshold_test_is_sorted_stable_and_idempotent(
        rows in vec(volunteer_row(), 0..60),
        min_score in -60.0f64..300.0,
    ) {
        // tag rows with their input position through the name
        let rows: Vec<VolunteerRow> = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| VolunteerRow { name: format!("{i:04}"), ..row })
            .collect();
        let analyzer = ThresholdAnalyzer::with_filter(rows, ScoreFilter::All);
        let outcome = analyzer.score_threshold_test(min_score);

        for pair in outcome.qualified.windows(2) {
            prop_assert!(pair[0].total_score >= pair[1].total_score);
            if pair[0].total_score == pair[1].total_score {
                prop_assert!(pair[0].name < pair[1].name);
            }
        }
        prop_assert!(outcome.qualified.iter().all(|row| row.total_score as f64 >= min_score));
        prop_assert_eq!(analyzer.score_threshold_test(min_score), outcome);
    }

    #[test]
    fn promoted_count_matches_cutoff(rows in vec(volunteer_row(), 1..80), target in 1.0f64..=100.0) {
        let analyzer = ThresholdAnalyzer::with_filter(rows, ScoreFilter::All);
        let result = analyzer.promotion_threshold(target).unwrap();
        let expected = analyzer
            .population()
            .iter()
            .filter(|row| row.total_score as f64 >= result.threshold)
            .count();
        prop_assert_eq!(result.promoted_count, expected);
        prop_assert!(result.promoted_count >= 1);
    }

    #[test]
    fn generated_volunteers_are_consistent(
        seed in any::<u64>(),
        distribution in distribution(),
        min in 1u32..=6,
        extra in 0u32..=10,
    ) {
        let range = TaskCountRange::new(min, min + extra);
        let mut generator = DatasetGenerator::new(Some(seed)).with_reference_date(reference_date());
        let volunteers = generator.generate_population(8, &distribution, range).unwrap();
        prop_assert_eq!(volunteers.len(), 8);

        for volunteer in &volunteers {
            prop_assert!(volunteer.tasks_completed >= range.min);
            prop_assert!(volunteer.tasks_completed <= range.max);
            prop_assert_eq!(volunteer.tasks.len(), volunteer.tasks_completed as usize);

            let mut total = 0i64;
            let mut marks = 0.0;
            let mut ratings = 0.0;
            for task in &volunteer.tasks {
                prop_assert_eq!(task.score, i32::from(task.mark) * i32::from(task.rating));
                total += i64::from(task.score);
                marks += f64::from(task.mark);
                ratings += f64::from(task.rating);
            }
            let n = volunteer.tasks.len() as f64;
            prop_assert_eq!(volunteer.total_score, total);
            prop_assert!((volunteer.average_mark - marks / n).abs() <= 0.005 + 1e-9);
            prop_assert!((volunteer.average_rating - ratings / n).abs() <= 0.005 + 1e-9);
        }
    }

    #[test]
    fn seeded_generation_is_reproducible(seed in any::<u64>()) {
        let run = || {
            DatasetGenerator::new(Some(seed))
                .with_reference_date(reference_date())
                .generate_population(12, &ProfileDistribution::default(), TaskCountRange::default())
                .unwrap()
        };
        let first = serde_json::to_vec(&run()).unwrap();
        let second = serde_json::to_vec(&run()).unwrap();
        prop_assert_eq!(first, second);
    }
}
