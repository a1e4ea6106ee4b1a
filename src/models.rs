use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub mark: u8,
    pub rating: i8,
    pub score: i32,
    pub task_type: TaskCategory,
    pub date_completed: NaiveDate,
}

impl Task {
    /// Builds a task; the score is always derived from mark and rating.
    pub fn new(
        task_id: String,
        mark: u8,
        rating: i8,
        task_type: TaskCategory,
        date_completed: NaiveDate,
    ) -> Self {
        Self {
            task_id,
            mark,
            rating,
            score: i32::from(mark) * i32::from(rating),
            task_type,
            date_completed,
        }
    }
}

/// Detailed volunteer record. This is the canonical form; `VolunteerRow` is
/// projected from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub name: String,
    pub total_score: i64,
    pub tasks: Vec<Task>,
    pub tasks_completed: u32,
    pub average_mark: f64,
    pub average_rating: f64,
}

impl Volunteer {
    pub fn row(&self) -> VolunteerRow {
        VolunteerRow {
            name: self.name.clone(),
            total_score: self.total_score,
            tasks_completed: self.tasks_completed,
            average_mark: self.average_mark,
            average_rating: self.average_rating,
        }
    }
}

/// Flat row as read and written in the CSV format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerRow {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Total_Score", alias = "total_score")]
    pub total_score: i64,
    #[serde(rename = "Tasks_Completed", alias = "tasks_completed")]
    pub tasks_completed: u32,
    #[serde(rename = "Average_Mark", alias = "average_mark")]
    pub average_mark: f64,
    #[serde(rename = "Average_Rating", alias = "average_rating")]
    pub average_rating: f64,
}

impl VolunteerRow {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TotalScore => self.total_score as f64,
            Metric::AverageMark => self.average_mark,
            Metric::AverageRating => self.average_rating,
            Metric::TasksCompleted => f64::from(self.tasks_completed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    HighPerformer,
    AveragePerformer,
    LowPerformer,
}

impl Profile {
    pub const ALL: [Profile; 3] = [
        Profile::HighPerformer,
        Profile::AveragePerformer,
        Profile::LowPerformer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::HighPerformer => "high_performer",
            Profile::AveragePerformer => "average_performer",
            Profile::LowPerformer => "low_performer",
        }
    }

    /// Sampling weights for marks 1..=5.
    pub fn mark_weights(&self) -> [f64; 5] {
        match self {
            Profile::HighPerformer => [0.05, 0.10, 0.25, 0.35, 0.25],
            Profile::AveragePerformer => [0.10, 0.20, 0.40, 0.20, 0.10],
            Profile::LowPerformer => [0.30, 0.35, 0.25, 0.08, 0.02],
        }
    }

    /// Sampling weights for ratings -1..=3.
    pub fn rating_weights(&self) -> [f64; 5] {
        match self {
            Profile::HighPerformer => [0.05, 0.10, 0.20, 0.35, 0.30],
            Profile::AveragePerformer => [0.10, 0.15, 0.30, 0.30, 0.15],
            Profile::LowPerformer => [0.25, 0.35, 0.25, 0.10, 0.05],
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Profile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Profile::ALL
            .into_iter()
            .find(|profile| profile.name() == s)
            .ok_or_else(|| Error::Configuration(format!("unknown profile '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskCategory {
    #[serde(rename = "Imagine & PR")]
    ImaginePr,
    #[serde(rename = "Financiar")]
    Financiar,
    #[serde(rename = "Resurse Umane")]
    ResurseUmane,
    #[serde(rename = "Tineret")]
    Tineret,
    #[serde(rename = "Educational")]
    Educational,
    #[serde(rename = "Caravana UBB")]
    CaravanaUbb,
    #[serde(rename = "UBB Festival")]
    UbbFestival,
    #[serde(rename = "FutureUp")]
    FutureUp,
    #[serde(rename = "JSU")]
    Jsu,
    #[serde(rename = "Mind Matters")]
    MindMatters,
    #[serde(rename = "Exchange National")]
    ExchangeNational,
    #[serde(rename = "Exchange International")]
    ExchangeInternational,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 12] = [
        TaskCategory::ImaginePr,
        TaskCategory::Financiar,
        TaskCategory::ResurseUmane,
        TaskCategory::Tineret,
        TaskCategory::Educational,
        TaskCategory::CaravanaUbb,
        TaskCategory::UbbFestival,
        TaskCategory::FutureUp,
        TaskCategory::Jsu,
        TaskCategory::MindMatters,
        TaskCategory::ExchangeNational,
        TaskCategory::ExchangeInternational,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TaskCategory::ImaginePr => "Imagine & PR",
            TaskCategory::Financiar => "Financiar",
            TaskCategory::ResurseUmane => "Resurse Umane",
            TaskCategory::Tineret => "Tineret",
            TaskCategory::Educational => "Educational",
            TaskCategory::CaravanaUbb => "Caravana UBB",
            TaskCategory::UbbFestival => "UBB Festival",
            TaskCategory::FutureUp => "FutureUp",
            TaskCategory::Jsu => "JSU",
            TaskCategory::MindMatters => "Mind Matters",
            TaskCategory::ExchangeNational => "Exchange National",
            TaskCategory::ExchangeInternational => "Exchange International",
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric columns of the flat row format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalScore,
    AverageMark,
    AverageRating,
    TasksCompleted,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::TotalScore,
        Metric::AverageMark,
        Metric::AverageRating,
        Metric::TasksCompleted,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Metric::TotalScore => "Total_Score",
            Metric::AverageMark => "Average_Mark",
            Metric::AverageRating => "Average_Rating",
            Metric::TasksCompleted => "Tasks_Completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_score_is_mark_times_rating() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let task = Task::new("T001".to_string(), 4, -1, TaskCategory::Jsu, date);
        assert_eq!(task.score, -4);
        let task = Task::new("T002".to_string(), 5, 3, TaskCategory::Jsu, date);
        assert_eq!(task.score, 15);
    }

    #[test]
    fn profile_weights_sum_to_one() {
        for profile in Profile::ALL {
            let marks: f64 = profile.mark_weights().iter().sum();
            let ratings: f64 = profile.rating_weights().iter().sum();
            assert!((marks - 1.0).abs() < 1e-9, "{profile} marks");
            assert!((ratings - 1.0).abs() < 1e-9, "{profile} ratings");
        }
    }

    #[test]
    fn profile_parses_from_name() {
        assert_eq!("low_performer".parse::<Profile>().unwrap(), Profile::LowPerformer);
        assert!("superstar".parse::<Profile>().is_err());
    }

    #[test]
    fn task_category_serializes_to_label() {
        let json = serde_json::to_string(&TaskCategory::ImaginePr).unwrap();
        assert_eq!(json, "\"Imagine & PR\"");
        for category in TaskCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.label()));
        }
    }

    #[test]
    fn row_projection_keeps_aggregates() {
        let volunteer = Volunteer {
            name: "Ana Popa".to_string(),
            total_score: 12,
            tasks: Vec::new(),
            tasks_completed: 3,
            average_mark: 3.33,
            average_rating: 1.0,
        };
        let row = volunteer.row();
        assert_eq!(row.name, "Ana Popa");
        assert_eq!(row.total_score, 12);
        assert_eq!(row.tasks_completed, 3);
        assert_eq!(row.metric(Metric::TasksCompleted), 3.0);
        assert_eq!(row.metric(Metric::AverageMark), 3.33);
    }
}
