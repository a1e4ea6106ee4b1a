use std::fmt::Write;

use crate::analyzer::{ThresholdAnalyzer, ThresholdMethod};
use crate::config::ScoreFilter;
use crate::error::Result;
use crate::models::{Metric, Volunteer};
use crate::stats;

#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub source: &'a str,
    pub target_percentile: f64,
    pub reference_percentiles: &'a [f64],
    pub test_score: f64,
    pub show_qualified: bool,
}

fn or_na(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(value) => format!("{value:.precision$}"),
        None => "n/a".to_string(),
    }
}

pub fn generation_summary(volunteers: &[Volunteer]) -> String {
    let mut output = String::new();
    let column = |f: fn(&Volunteer) -> f64| volunteers.iter().map(f).collect::<Vec<f64>>();
    let scores = column(|v| v.total_score as f64);

    let _ = writeln!(output, "=== Dataset Statistics ===");
    let _ = writeln!(output, "Total Volunteers: {}", volunteers.len());
    let _ = writeln!(output, "Average Score: {}", or_na(stats::mean(&scores), 2));
    let _ = writeln!(
        output,
        "Average Tasks per Volunteer: {}",
        or_na(stats::mean(&column(|v| f64::from(v.tasks_completed))), 2)
    );
    let _ = writeln!(
        output,
        "Average Mark: {}",
        or_na(stats::mean(&column(|v| v.average_mark)), 2)
    );
    let _ = writeln!(
        output,
        "Average Rating: {}",
        or_na(stats::mean(&column(|v| v.average_rating)), 2)
    );
    let _ = writeln!(
        output,
        "Score Range: {} - {}",
        or_na(stats::min(&scores), 0),
        or_na(stats::max(&scores), 0)
    );

    output
}

pub fn build_analysis_report(
    analyzer: &ThresholdAnalyzer,
    request: &AnalysisRequest<'_>,
) -> Result<String> {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "# Active Volunteer Promotion Analysis for {}",
        request.source
    );
    match analyzer.filter() {
        ScoreFilter::All => {
            let _ = writeln!(output, "Filter: all volunteers (no score filtering)");
        }
        ScoreFilter::Above(min_score) => {
            let _ = writeln!(output, "Filter: volunteers with score >= {min_score}");
        }
    }
    let _ = writeln!(
        output,
        "Dataset: {} volunteers selected ({}% of original {})",
        analyzer.len(),
        or_na(analyzer.retained_fraction().map(|f| f * 100.0), 1),
        analyzer.original().len()
    );

    if analyzer.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "No volunteers match the score filter. Adjust the filter or use another dataset."
        );
        return Ok(output);
    }

    let statistics = analyzer.basic_statistics();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Basic Statistics");
    let _ = writeln!(output, "Total volunteers: {}", statistics.count);
    for metric in [
        Metric::TotalScore,
        Metric::TasksCompleted,
        Metric::AverageMark,
        Metric::AverageRating,
    ] {
        let summary = statistics.summary(metric);
        let _ = writeln!(
            output,
            "- {}: mean {}, median {}, std dev {}, min {}, max {}",
            metric.column(),
            or_na(summary.mean, 2),
            or_na(summary.median, 2),
            or_na(summary.std_dev, 2),
            or_na(summary.min, 2),
            or_na(summary.max, 2)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Percentiles");
    for metric in Metric::ALL {
        let precision = match metric {
            Metric::TotalScore => 1,
            Metric::TasksCompleted => 0,
            Metric::AverageMark | Metric::AverageRating => 2,
        };
        let cells: Vec<String> = analyzer
            .percentile_table(metric)
            .iter()
            .map(|p| format!("p{}={}", p.percentile, or_na(p.value, precision)))
            .collect();
        let _ = writeln!(output, "- {}: {}", metric.column(), cells.join(", "));
    }

    let threshold = analyzer.promotion_threshold(request.target_percentile)?;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Promotion Threshold");
    let _ = writeln!(
        output,
        "Target: top {}% of volunteers",
        threshold.target_percentile
    );
    let _ = writeln!(output, "Score threshold: >= {:.0}", threshold.threshold);
    let _ = writeln!(
        output,
        "Volunteers promoted: {} ({:.1}%)",
        threshold.promoted_count, threshold.actual_percentage
    );
    let _ = writeln!(output, "Expected: ~{:.0} volunteers", threshold.expected_count);

    let comparison =
        analyzer.compare_thresholds(request.target_percentile, Some(request.reference_percentiles))?;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Threshold Comparison");
    let _ = writeln!(
        output,
        "{:<22} {:<12} {:<10} {:<12}",
        "Method", "Threshold", "Promoted", "Percentage"
    );
    for row in &comparison.rows {
        let _ = writeln!(
            output,
            "{:<22} {:<12.0} {:<10} {:.1}%",
            row.method.to_string(),
            row.threshold,
            row.promoted_count,
            row.actual_percentage
        );
    }
    for row in comparison.rows.iter().skip(1) {
        let against = match row.method {
            ThresholdMethod::Reference(p) => format!("top {p}%"),
            ThresholdMethod::Median => "the median threshold".to_string(),
            ThresholdMethod::Mean => "the mean threshold".to_string(),
            ThresholdMethod::Target(_) => continue,
        };
        let _ = match row.count_difference {
            diff if diff > 0 => writeln!(output, "- promotes {diff} MORE volunteers than {against}"),
            diff if diff < 0 => writeln!(
                output,
                "- promotes {} FEWER volunteers than {against}",
                diff.unsigned_abs()
            ),
            _ => writeln!(output, "- promotes the SAME number as {against}"),
        };
    }

    let matrix = analyzer.correlation_matrix();
    let _ = writeln!(output);
    let _ = writeln!(output, "## Correlations");
    let _ = write!(output, "{:<16}", "");
    for metric in matrix.metrics {
        let _ = write!(output, " {:>16}", metric.column());
    }
    let _ = writeln!(output);
    for (metric, values) in matrix.metrics.iter().zip(matrix.values.iter()) {
        let _ = write!(output, "{:<16}", metric.column());
        for value in values {
            let cell = value.map_or_else(|| "NaN".to_string(), |r| format!("{r:.3}"));
            let _ = write!(output, " {cell:>16}");
        }
        let _ = writeln!(output);
    }

    let outcome = analyzer.score_threshold_test(request.test_score);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Score Threshold Test");
    let _ = writeln!(output, "Criteria: score >= {}", outcome.min_score);
    let _ = writeln!(
        output,
        "Qualified volunteers: {} ({:.1}%)",
        outcome.qualified_count(),
        outcome.fraction * 100.0
    );
    if outcome.qualified.is_empty() {
        let _ = writeln!(output, "No volunteers meet this criteria.");
    } else if request.show_qualified {
        for row in &outcome.qualified {
            let _ = writeln!(output, "- {}: score {}", row.name, row.total_score);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VolunteerRow;

    fn rows() -> Vec<VolunteerRow> {
        [10, 20, 30, 40, 50]
            .iter()
            .map(|score| VolunteerRow {
                name: format!("Volunteer {score}"),
                total_score: *score,
                tasks_completed: 1,
                average_mark: 3.0,
                average_rating: 1.0,
            })
            .collect()
    }

    fn request() -> AnalysisRequest<'static> {
        AnalysisRequest {
            source: "volunteers.csv",
            target_percentile: 20.0,
            reference_percentiles: &[10.0, 25.0, 50.0],
            test_score: 40.0,
            show_qualified: true,
        }
    }

    #[test]
    fn report_contains_threshold_and_comparison() {
        let analyzer = ThresholdAnalyzer::with_filter(rows(), ScoreFilter::All);
        let report = build_analysis_report(&analyzer, &request()).unwrap();
        assert!(report.contains("Score threshold: >= 42"));
        assert!(report.contains("Volunteers promoted: 1 (20.0%)"));
        assert!(report.contains("Top 20% (target)"));
        assert!(report.contains("Median Score"));
        assert!(report.contains("FEWER volunteers than top 25%"));
        assert!(report.contains("- Volunteer 50: score 50"));
        // tasks_completed is constant, so its correlations are undefined
        assert!(report.contains("NaN"));
    }

    #[test]
    fn empty_filter_renders_notice_only() {
        let analyzer = ThresholdAnalyzer::with_filter(rows(), ScoreFilter::Above(500.0));
        let report = build_analysis_report(&analyzer, &request()).unwrap();
        assert!(report.contains("0 volunteers selected (0.0% of original 5)"));
        assert!(report.contains("No volunteers match the score filter"));
        assert!(!report.contains("## Promotion Threshold"));
    }

    #[test]
    fn summary_reports_range() {
        let summary = generation_summary(&[]);
        assert!(summary.contains("Total Volunteers: 0"));
        assert!(summary.contains("Score Range: n/a - n/a"));
    }
}
