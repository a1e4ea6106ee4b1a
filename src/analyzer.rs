use std::fmt;

use crate::config::{
    validate_percentile, AnalyzerConfig, FilterMode, ScoreFilter, DEFAULT_REFERENCE_PERCENTILES,
};
use crate::error::Result;
use crate::models::{Metric, VolunteerRow};
use crate::stats;

pub const STANDARD_PERCENTILES: [f64; 6] = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSummary {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FieldSummary {
    fn from_values(values: &[f64]) -> Self {
        Self {
            mean: stats::mean(values),
            median: stats::median(values),
            std_dev: stats::std_dev(values),
            min: stats::min(values),
            max: stats::max(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopulationStatistics {
    pub count: usize,
    pub total_score: FieldSummary,
    pub tasks_completed: FieldSummary,
    pub average_mark: FieldSummary,
    pub average_rating: FieldSummary,
}

impl PopulationStatistics {
    pub fn summary(&self, metric: Metric) -> &FieldSummary {
        match metric {
            Metric::TotalScore => &self.total_score,
            Metric::TasksCompleted => &self.tasks_completed,
            Metric::AverageMark => &self.average_mark,
            Metric::AverageRating => &self.average_rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: Option<f64>,
}

/// Cutoff for promoting the top `target_percentile` percent of the population.
///
/// `target_percentile` is what was asked for, `actual_percentage` is what the
/// cutoff really promotes once ties are counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromotionThreshold {
    pub target_percentile: f64,
    pub threshold: f64,
    pub promoted_count: usize,
    pub population_size: usize,
    pub actual_percentage: f64,
    pub expected_count: f64,
}

impl PromotionThreshold {
    /// True when there was nothing to promote from.
    pub fn is_degenerate(&self) -> bool {
        self.population_size == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdMethod {
    Target(f64),
    Reference(f64),
    Median,
    Mean,
}

impl fmt::Display for ThresholdMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThresholdMethod::Target(p) => write!(f, "Top {p}% (target)"),
            ThresholdMethod::Reference(p) => write!(f, "Top {p}%"),
            ThresholdMethod::Median => f.write_str("Median Score"),
            ThresholdMethod::Mean => f.write_str("Mean Score"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparisonRow {
    pub method: ThresholdMethod,
    pub threshold: f64,
    pub promoted_count: usize,
    pub actual_percentage: f64,
    /// Target count minus this row's count; positive means the target promotes more.
    pub count_difference: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdComparison {
    pub rows: Vec<ComparisonRow>,
}

impl ThresholdComparison {
    pub fn target(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromotionSuggestion {
    pub threshold: PromotionThreshold,
    pub comparison: ThresholdComparison,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreThresholdTest {
    pub min_score: f64,
    /// Highest score first; equal scores keep their input order.
    pub qualified: Vec<VolunteerRow>,
    pub fraction: f64,
}

impl ScoreThresholdTest {
    pub fn qualified_count(&self) -> usize {
        self.qualified.len()
    }
}

/// Pearson correlations between the numeric columns, in `Metric::ALL` order.
/// `None` marks a pair involving a constant column or too few rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub metrics: [Metric; 4],
    pub values: [[Option<f64>; 4]; 4],
}

impl CorrelationMatrix {
    pub fn get(&self, a: Metric, b: Metric) -> Option<f64> {
        let i = self.metrics.iter().position(|m| *m == a)?;
        let j = self.metrics.iter().position(|m| *m == b)?;
        self.values[i][j]
    }
}

/// Promotion threshold analysis over a loaded population.
///
/// The unfiltered population is kept next to the filtered view. An empty
/// filtered view is valid; every query then returns its degenerate answer.
#[derive(Debug, Clone)]
pub struct ThresholdAnalyzer {
    original: Vec<VolunteerRow>,
    population: Vec<VolunteerRow>,
    filter: ScoreFilter,
}

impl ThresholdAnalyzer {
    pub fn load(
        population: Vec<VolunteerRow>,
        filter_mode: FilterMode,
        min_score: Option<f64>,
    ) -> Result<Self> {
        let config = AnalyzerConfig {
            filter_mode,
            min_score,
            ..AnalyzerConfig::default()
        };
        Ok(Self::with_filter(population, config.score_filter()?))
    }

    pub fn from_config(population: Vec<VolunteerRow>, config: &AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_filter(population, config.score_filter()?))
    }

    pub fn with_filter(original: Vec<VolunteerRow>, filter: ScoreFilter) -> Self {
        let population: Vec<VolunteerRow> = original
            .iter()
            .filter(|row| filter.keeps(row.total_score))
            .cloned()
            .collect();

        if population.is_empty() {
            tracing::warn!(
                original = original.len(),
                ?filter,
                "no volunteers match the score filter"
            );
        } else {
            tracing::info!(
                retained = population.len(),
                original = original.len(),
                ?filter,
                "population loaded"
            );
        }

        Self {
            original,
            population,
            filter,
        }
    }

    pub fn filter(&self) -> ScoreFilter {
        self.filter
    }

    /// Filtered view.
    pub fn population(&self) -> &[VolunteerRow] {
        &self.population
    }

    pub fn original(&self) -> &[VolunteerRow] {
        &self.original
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    /// Share of the original population that survived the filter.
    pub fn retained_fraction(&self) -> Option<f64> {
        if self.original.is_empty() {
            return None;
        }
        Some(self.population.len() as f64 / self.original.len() as f64)
    }

    fn column(&self, metric: Metric) -> Vec<f64> {
        self.population.iter().map(|row| row.metric(metric)).collect()
    }

    pub fn basic_statistics(&self) -> PopulationStatistics {
        let summary = |metric| FieldSummary::from_values(&self.column(metric));
        PopulationStatistics {
            count: self.population.len(),
            total_score: summary(Metric::TotalScore),
            tasks_completed: summary(Metric::TasksCompleted),
            average_mark: summary(Metric::AverageMark),
            average_rating: summary(Metric::AverageRating),
        }
    }

    /// Linear-interpolation percentile of `metric`; `None` on an empty
    /// population or `p` outside `[0, 100]`.
    pub fn percentile(&self, metric: Metric, p: f64) -> Option<f64> {
        stats::percentile(&stats::sorted(&self.column(metric)), p)
    }

    pub fn percentile_table(&self, metric: Metric) -> Vec<PercentileValue> {
        let sorted = stats::sorted(&self.column(metric));
        STANDARD_PERCENTILES
            .iter()
            .map(|&percentile| PercentileValue {
                percentile,
                value: stats::percentile(&sorted, percentile),
            })
            .collect()
    }

    fn count_at_or_above(&self, cutoff: f64) -> usize {
        self.population
            .iter()
            .filter(|row| row.total_score as f64 >= cutoff)
            .count()
    }

    fn percentage_of_population(&self, count: usize) -> f64 {
        if self.population.is_empty() {
            0.0
        } else {
            count as f64 / self.population.len() as f64 * 100.0
        }
    }

    /// Cutoff at the `100 - target_percentile` percentile of total score, and
    /// how many volunteers actually reach it.
    pub fn promotion_threshold(&self, target_percentile: f64) -> Result<PromotionThreshold> {
        validate_percentile("target percentile", target_percentile)?;
        let size = self.population.len();

        let Some(threshold) = self.percentile(Metric::TotalScore, 100.0 - target_percentile)
        else {
            return Ok(PromotionThreshold {
                target_percentile,
                threshold: 0.0,
                promoted_count: 0,
                population_size: 0,
                actual_percentage: 0.0,
                expected_count: 0.0,
            });
        };

        let promoted_count = self.count_at_or_above(threshold);
        Ok(PromotionThreshold {
            target_percentile,
            threshold,
            promoted_count,
            population_size: size,
            actual_percentage: self.percentage_of_population(promoted_count),
            expected_count: size as f64 * target_percentile / 100.0,
        })
    }

    /// Target first, then references in the given order (skipping the target
    /// and repeats), then the median and mean used as literal cutoffs.
    pub fn compare_thresholds(
        &self,
        target_percentile: f64,
        reference_percentiles: Option<&[f64]>,
    ) -> Result<ThresholdComparison> {
        let references = reference_percentiles.unwrap_or(&DEFAULT_REFERENCE_PERCENTILES);
        for &reference in references {
            validate_percentile("reference percentile", reference)?;
        }

        let target = self.promotion_threshold(target_percentile)?;
        let target_count = target.promoted_count;
        let row = |method, threshold, promoted_count: usize| ComparisonRow {
            method,
            threshold,
            promoted_count,
            actual_percentage: self.percentage_of_population(promoted_count),
            count_difference: target_count as i64 - promoted_count as i64,
        };

        let mut rows = vec![row(
            ThresholdMethod::Target(target_percentile),
            target.threshold,
            target_count,
        )];

        let mut seen = vec![target_percentile];
        for &reference in references {
            if seen.contains(&reference) {
                continue;
            }
            seen.push(reference);
            let result = self.promotion_threshold(reference)?;
            rows.push(row(
                ThresholdMethod::Reference(reference),
                result.threshold,
                result.promoted_count,
            ));
        }

        let scores = self.column(Metric::TotalScore);
        for (method, cutoff) in [
            (ThresholdMethod::Median, stats::median(&scores)),
            (ThresholdMethod::Mean, stats::mean(&scores)),
        ] {
            let (threshold, count) = match cutoff {
                Some(cutoff) => (cutoff, self.count_at_or_above(cutoff)),
                None => (0.0, 0),
            };
            rows.push(row(method, threshold, count));
        }

        Ok(ThresholdComparison { rows })
    }

    pub fn suggest_promotion_criteria(&self, target_percentile: f64) -> Result<PromotionSuggestion> {
        Ok(PromotionSuggestion {
            threshold: self.promotion_threshold(target_percentile)?,
            comparison: self.compare_thresholds(target_percentile, None)?,
        })
    }

    pub fn score_threshold_test(&self, min_score: f64) -> ScoreThresholdTest {
        let mut qualified: Vec<VolunteerRow> = self
            .population
            .iter()
            .filter(|row| row.total_score as f64 >= min_score)
            .cloned()
            .collect();
        // sort_by is stable
        qualified.sort_by(|a, b| b.total_score.cmp(&a.total_score));

        let fraction = if self.population.is_empty() {
            0.0
        } else {
            qualified.len() as f64 / self.population.len() as f64
        };

        ScoreThresholdTest {
            min_score,
            qualified,
            fraction,
        }
    }

    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let metrics = Metric::ALL;
        let columns = metrics.map(|metric| self.column(metric));
        let mut values = [[None; 4]; 4];

        for i in 0..metrics.len() {
            // a column correlates perfectly with itself unless it has no variance
            values[i][i] = stats::pearson(&columns[i], &columns[i]).map(|_| 1.0);
            for j in (i + 1)..metrics.len() {
                let r = stats::pearson(&columns[i], &columns[j]);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CorrelationMatrix { metrics, values }
    }
}
