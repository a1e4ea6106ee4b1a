use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use volunteer_threshold::config::{
    AnalyzerConfig, FilterMode, GeneratorConfig, ProfileDistribution, TaskCountRange,
};
use volunteer_threshold::dataset::{self, DatasetFormat};
use volunteer_threshold::report::{self, AnalysisRequest};
use volunteer_threshold::{DatasetGenerator, ThresholdAnalyzer};

#[derive(Parser)]
#[command(name = "volunteer-threshold")]
#[command(about = "Volunteer performance datasets and active-member promotion thresholds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic volunteer dataset
    Generate {
        #[arg(long, default_value_t = 50)]
        size: usize,
        #[arg(long, default_value_t = 0.20)]
        high_performers: f64,
        #[arg(long, default_value_t = 0.20)]
        low_performers: f64,
        #[arg(long, default_value_t = 3)]
        min_tasks: u32,
        #[arg(long, default_value_t = 15)]
        max_tasks: u32,
        /// Seed for a reproducible dataset
        #[arg(long)]
        seed: Option<u64>,
        /// Day completion dates are counted back from (defaults to today)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
        /// Output filename prefix
        #[arg(long, default_value = "volunteers")]
        output: String,
        /// Also write the detailed JSON with every task
        #[arg(long)]
        detailed: bool,
    },
    /// Analyze a dataset and suggest a promotion threshold
    Analyze {
        #[arg(default_value = "volunteers.csv")]
        dataset: PathBuf,
        /// Read the dataset as detailed JSON instead of CSV
        #[arg(long)]
        json: bool,
        /// Only analyze volunteers with total score >= SCORE
        #[arg(long, value_name = "SCORE")]
        above: Option<f64>,
        /// Share of volunteers to promote, e.g. 10 for the top 10%
        #[arg(long, value_name = "PCT", default_value_t = 10.0)]
        percentile: f64,
        /// Percentiles to compare the target against
        #[arg(long = "reference", value_delimiter = ',', default_values_t = [10.0, 25.0, 50.0])]
        references: Vec<f64>,
        /// Minimum score for the score threshold test
        #[arg(long, default_value_t = 40.0)]
        test_score: f64,
        /// List volunteers passing the score threshold test
        #[arg(long)]
        show_qualified: bool,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            size,
            high_performers,
            low_performers,
            min_tasks,
            max_tasks,
            seed,
            reference_date,
            output,
            detailed,
        } => {
            let config = GeneratorConfig {
                population_size: size,
                profile_distribution: ProfileDistribution::from_shares(
                    high_performers,
                    low_performers,
                )?,
                task_count_range: TaskCountRange::new(min_tasks, max_tasks),
                random_seed: seed,
                reference_date,
            };
            config.validate()?;

            let mut generator = DatasetGenerator::from_config(&config);
            let volunteers = generator.generate(&config)?;

            let csv_path = PathBuf::from(format!("{output}.csv"));
            dataset::write_rows_csv(&csv_path, &volunteers)
                .with_context(|| format!("failed to write {}", csv_path.display()))?;
            println!("Dataset saved to {}.", csv_path.display());

            if detailed {
                let json_path = PathBuf::from(format!("{output}_detailed.json"));
                dataset::write_detailed_json(&json_path, &volunteers)
                    .with_context(|| format!("failed to write {}", json_path.display()))?;
                println!("Detailed dataset saved to {}.", json_path.display());
            }

            println!("Seed: {}", generator.seed());
            println!();
            print!("{}", report::generation_summary(&volunteers));
        }
        Commands::Analyze {
            dataset: path,
            json,
            above,
            percentile,
            references,
            test_score,
            show_qualified,
            out,
        } => {
            let config = AnalyzerConfig {
                filter_mode: if above.is_some() {
                    FilterMode::Above
                } else {
                    FilterMode::All
                },
                min_score: above,
                target_percentile: percentile,
                reference_percentiles: references,
            };
            config.validate()?;

            if !path.exists() {
                anyhow::bail!(
                    "dataset file '{}' not found; run `volunteer-threshold generate` to create sample data",
                    path.display()
                );
            }
            let format = if json {
                DatasetFormat::Json
            } else {
                DatasetFormat::Csv
            };
            let population = dataset::load_population(&path, format).with_context(|| {
                format!(
                    "failed to load {}; required columns: Name, Total_Score, Tasks_Completed, Average_Mark, Average_Rating",
                    path.display()
                )
            })?;

            let analyzer = ThresholdAnalyzer::from_config(population, &config)?;
            let source = path.display().to_string();
            let report = report::build_analysis_report(
                &analyzer,
                &AnalysisRequest {
                    source: &source,
                    target_percentile: config.target_percentile,
                    reference_percentiles: &config.reference_percentiles,
                    test_score,
                    show_qualified,
                },
            )?;

            match out {
                Some(out) => {
                    std::fs::write(&out, report)?;
                    println!("Report written to {}.", out.display());
                }
                None => print!("{report}"),
            }
        }
    }

    Ok(())
}
