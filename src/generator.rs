use chrono::{Duration, NaiveDate, Utc};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{GeneratorConfig, ProfileDistribution, TaskCountRange};
use crate::error::{Error, Result};
use crate::models::{Profile, Task, TaskCategory, Volunteer};

const MARKS: [u8; 5] = [1, 2, 3, 4, 5];
const RATINGS: [i8; 5] = [-1, 0, 1, 2, 3];

/// Completion dates fall between 1 and this many days before the reference date.
pub const COMPLETION_WINDOW_DAYS: u32 = 180;

const MALE_FIRST_NAMES: &[&str] = &[
    "Alexandru", "Andrei", "Adrian", "Bogdan", "Catalin", "Daniel", "David", "Eduard", "Florin",
    "Gabriel", "George", "Ion", "Ionut", "Marian", "Mihai", "Nicolae", "Octavian", "Paul",
    "Razvan", "Robert", "Stefan", "Teodor", "Valentin", "Victor", "Vlad", "Radu", "Cristian",
    "Liviu", "Marius", "Sergiu", "Lucian", "Cosmin", "Calin", "Darius", "Emil",
];

const FEMALE_FIRST_NAMES: &[&str] = &[
    "Alexandra", "Ana", "Andreea", "Bianca", "Carmen", "Cristina", "Dana", "Elena",
    "Florentina", "Gabriela", "Ioana", "Laura", "Maria", "Monica", "Nicoleta", "Oana", "Paula",
    "Raluca", "Roxana", "Simona", "Teodora", "Valentina", "Violeta", "Diana", "Alina", "Adina",
    "Camelia", "Daniela", "Larisa", "Mihaela", "Ramona", "Silvia", "Corina", "Denisa", "Iulia",
];

const LAST_NAMES: &[&str] = &[
    "Popescu", "Ionescu", "Popa", "Radu", "Stoica", "Stan", "Dumitrescu", "Gheorghiu",
    "Constantin", "Marin", "Tudor", "Barbu", "Nistor", "Florea", "Georgescu", "Cristea",
    "Stanciu", "Matei", "Moldovan", "Dima", "Ilie", "Andreescu", "Marinescu", "Petrescu",
    "Vasile", "Lungu", "Manea", "Ciobanu", "Dobre", "Enache", "Mihai", "Neagu", "Preda", "Sandu",
    "Toma", "Vlad", "Mocanu", "Rusu", "Petre", "Andrei", "Badea", "Calin", "Filip",
];

/// Synthetic population generator.
///
/// All randomness comes from one ChaCha stream owned by the generator, so a
/// seed plus a reference date fully determines the output. Parallel runs need
/// one generator each.
pub struct DatasetGenerator {
    rng: ChaCha8Rng,
    seed: u64,
    reference_date: NaiveDate,
}

impl DatasetGenerator {
    /// Draws a fresh seed when none is given; read it back with [`Self::seed`].
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            reference_date: Utc::now().date_naive(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        let generator = Self::new(config.random_seed);
        match config.reference_date {
            Some(date) => generator.with_reference_date(date),
            None => generator,
        }
    }

    pub fn with_reference_date(mut self, reference_date: NaiveDate) -> Self {
        self.reference_date = reference_date;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// "First Last" with the first name drawn from a randomly chosen gender.
    /// Names are not unique across a population.
    pub fn generate_name(&mut self) -> String {
        let first_names = if self.rng.random_bool(0.5) {
            MALE_FIRST_NAMES
        } else {
            FEMALE_FIRST_NAMES
        };
        let first = first_names[self.rng.random_range(0..first_names.len())];
        let last = LAST_NAMES[self.rng.random_range(0..LAST_NAMES.len())];
        format!("{first} {last}")
    }

    /// Weighted draw of a profile. Zero-weight profiles are never selected.
    pub fn assign_profile(&mut self, distribution: &ProfileDistribution) -> Result<Profile> {
        let index = weighted_index(&distribution.weights(), "profile distribution")?;
        Ok(Profile::ALL[index.sample(&mut self.rng)])
    }

    pub fn generate_task(&mut self, sampler: &TaskSampler, task_id: impl Into<String>) -> Task {
        let mark = MARKS[sampler.marks.sample(&mut self.rng)];
        let rating = RATINGS[sampler.ratings.sample(&mut self.rng)];
        let category = TaskCategory::ALL[self.rng.random_range(0..TaskCategory::ALL.len())];
        let days_ago = self.rng.random_range(1..=COMPLETION_WINDOW_DAYS);
        let date_completed = self.reference_date - Duration::days(i64::from(days_ago));

        Task::new(task_id.into(), mark, rating, category, date_completed)
    }

    pub fn generate_volunteer(
        &mut self,
        distribution: &ProfileDistribution,
        task_count_range: TaskCountRange,
    ) -> Result<Volunteer> {
        task_count_range.validate()?;

        let name = self.generate_name();
        let profile = self.assign_profile(distribution)?;
        let sampler = TaskSampler::new(profile)?;
        let task_count = self.rng.random_range(task_count_range.for_profile(profile));

        let tasks: Vec<Task> = (1..=task_count)
            .map(|i| self.generate_task(&sampler, format!("T{i:03}")))
            .collect();

        tracing::debug!(%name, %profile, task_count, "generated volunteer");
        Ok(assemble_volunteer(name, tasks))
    }

    /// Independent volunteers, validated up front: nothing is sampled when the
    /// configuration is invalid.
    pub fn generate_population(
        &mut self,
        size: usize,
        distribution: &ProfileDistribution,
        task_count_range: TaskCountRange,
    ) -> Result<Vec<Volunteer>> {
        if size == 0 {
            return Err(Error::configuration("population size must be greater than 0"));
        }
        distribution.validate()?;
        task_count_range.validate()?;

        let volunteers = (0..size)
            .map(|_| self.generate_volunteer(distribution, task_count_range))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            size,
            seed = self.seed,
            reference_date = %self.reference_date,
            "generated volunteer population"
        );
        Ok(volunteers)
    }

    pub fn generate(&mut self, config: &GeneratorConfig) -> Result<Vec<Volunteer>> {
        config.validate()?;
        self.generate_population(
            config.population_size,
            &config.profile_distribution,
            config.task_count_range,
        )
    }
}

/// Mark and rating distributions for one profile.
#[derive(Debug, Clone)]
pub struct TaskSampler {
    profile: Profile,
    marks: WeightedIndex<f64>,
    ratings: WeightedIndex<f64>,
}

impl TaskSampler {
    pub fn new(profile: Profile) -> Result<Self> {
        Ok(Self {
            profile,
            marks: weighted_index(&profile.mark_weights(), "mark weights")?,
            ratings: weighted_index(&profile.rating_weights(), "rating weights")?,
        })
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }
}

fn weighted_index(weights: &[f64], what: &str) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights)
        .map_err(|err| Error::configuration(format!("invalid {what} {weights:?}: {err}")))
}

/// Aggregates are derived from the task list and nothing else.
fn assemble_volunteer(name: String, tasks: Vec<Task>) -> Volunteer {
    let count = tasks.len();
    let total_score = tasks.iter().map(|task| i64::from(task.score)).sum();
    let mark_sum: f64 = tasks.iter().map(|task| f64::from(task.mark)).sum();
    let rating_sum: f64 = tasks.iter().map(|task| f64::from(task.rating)).sum();

    Volunteer {
        name,
        total_score,
        tasks_completed: count as u32,
        average_mark: round2(mark_sum / count as f64),
        average_rating: round2(rating_sum / count as f64),
        tasks,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
