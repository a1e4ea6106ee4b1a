use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::models::Profile;

/// Allowed distance between the sum of profile weights and 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

pub const DEFAULT_REFERENCE_PERCENTILES: [f64; 3] = [10.0, 25.0, 50.0];

/// Sampling weight per performer profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileDistribution {
    pub high: f64,
    pub average: f64,
    pub low: f64,
}

impl ProfileDistribution {
    pub fn new(high: f64, average: f64, low: f64) -> Self {
        Self { high, average, low }
    }

    /// Average performers take whatever share high and low leave over.
    pub fn from_shares(high: f64, low: f64) -> Result<Self> {
        let average = 1.0 - high - low;
        if average < 0.0 {
            return Err(Error::configuration(format!(
                "high ({high}) and low ({low}) performer shares sum to more than 1.0"
            )));
        }
        Ok(Self::new(high, average, low))
    }

    pub fn weight(&self, profile: Profile) -> f64 {
        match profile {
            Profile::HighPerformer => self.high,
            Profile::AveragePerformer => self.average,
            Profile::LowPerformer => self.low,
        }
    }

    /// Weights in `Profile::ALL` order.
    pub fn weights(&self) -> [f64; 3] {
        Profile::ALL.map(|profile| self.weight(profile))
    }

    pub fn total(&self) -> f64 {
        self.weights().iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        for profile in Profile::ALL {
            let weight = self.weight(profile);
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::configuration(format!(
                    "weight for {profile} must be a non-negative number, got {weight}"
                )));
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(Error::configuration(format!(
                "profile weights must sum to 1.0 (±{WEIGHT_TOLERANCE}), got {total:.3}"
            )));
        }
        Ok(())
    }
}

impl Default for ProfileDistribution {
    fn default() -> Self {
        Self::new(0.20, 0.60, 0.20)
    }
}

/// Profiles missing from the mapping get weight zero.
impl FromIterator<(Profile, f64)> for ProfileDistribution {
    fn from_iter<I: IntoIterator<Item = (Profile, f64)>>(iter: I) -> Self {
        let mut distribution = Self::new(0.0, 0.0, 0.0);
        for (profile, weight) in iter {
            match profile {
                Profile::HighPerformer => distribution.high = weight,
                Profile::AveragePerformer => distribution.average = weight,
                Profile::LowPerformer => distribution.low = weight,
            }
        }
        distribution
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskCountRange {
    pub min: u32,
    pub max: u32,
}

impl TaskCountRange {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min < 1 {
            return Err(Error::configuration(format!(
                "minimum task count must be at least 1, got {}",
                self.min
            )));
        }
        if self.max < self.min {
            return Err(Error::configuration(format!(
                "maximum task count ({}) is below minimum ({})",
                self.max, self.min
            )));
        }
        Ok(())
    }

    /// High performers draw from the upper half, low performers from the lower
    /// half, everyone else from the full range. The lower half always spans at
    /// least `min + 1` when the range allows it.
    pub fn for_profile(&self, profile: Profile) -> RangeInclusive<u32> {
        match profile {
            Profile::HighPerformer => self.min.max(self.max / 2)..=self.max,
            Profile::LowPerformer => {
                let upper = self.min.saturating_add(1).max(self.max / 2).min(self.max);
                self.min..=upper
            }
            Profile::AveragePerformer => self.min..=self.max,
        }
    }
}

impl Default for TaskCountRange {
    fn default() -> Self {
        Self::new(3, 15)
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub population_size: usize,
    pub profile_distribution: ProfileDistribution,
    pub task_count_range: TaskCountRange,
    pub random_seed: Option<u64>,
    /// Completion dates are drawn relative to this day; today when unset.
    pub reference_date: Option<NaiveDate>,
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::configuration("population size must be greater than 0"));
        }
        self.profile_distribution.validate()?;
        self.task_count_range.validate()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            profile_distribution: ProfileDistribution::default(),
            task_count_range: TaskCountRange::default(),
            random_seed: None,
            reference_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    All,
    Above,
}

impl FromStr for FilterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(FilterMode::All),
            "above" => Ok(FilterMode::Above),
            other => Err(Error::configuration(format!(
                "filter mode must be 'all' or 'above', got '{other}'"
            ))),
        }
    }
}

/// Resolved pre-filter applied when a population is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreFilter {
    All,
    Above(f64),
}

impl ScoreFilter {
    pub fn keeps(&self, total_score: i64) -> bool {
        match self {
            ScoreFilter::All => true,
            ScoreFilter::Above(min_score) => total_score as f64 >= *min_score,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub filter_mode: FilterMode,
    pub min_score: Option<f64>,
    pub target_percentile: f64,
    pub reference_percentiles: Vec<f64>,
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        self.score_filter()?;
        validate_percentile("target percentile", self.target_percentile)?;
        for &reference in &self.reference_percentiles {
            validate_percentile("reference percentile", reference)?;
        }
        Ok(())
    }

    pub fn score_filter(&self) -> Result<ScoreFilter> {
        match (self.filter_mode, self.min_score) {
            (FilterMode::All, _) => Ok(ScoreFilter::All),
            (FilterMode::Above, Some(min_score)) if min_score.is_finite() => {
                Ok(ScoreFilter::Above(min_score))
            }
            (FilterMode::Above, Some(min_score)) => Err(Error::configuration(format!(
                "min_score must be a finite number, got {min_score}"
            ))),
            (FilterMode::Above, None) => Err(Error::configuration(
                "min_score is required when filter mode is 'above'",
            )),
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::All,
            min_score: None,
            target_percentile: 10.0,
            reference_percentiles: DEFAULT_REFERENCE_PERCENTILES.to_vec(),
        }
    }
}

/// Promotion percentiles live in (0, 100].
pub fn validate_percentile(field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "{field} must be in (0, 100], got {value}"
        )))
    }
}
