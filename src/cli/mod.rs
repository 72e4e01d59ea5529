//! Command-line interface for transforming datasets and inspecting files.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::TransformationConfig;
use crate::preprocessing::ColumnDispatcher;
use crate::transformation::DataTransformation;
use crate::utils::{summarize_columns, DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn shape(rows: usize, cols: usize) -> String {
    format!("{} rows × {} cols", rows, cols)
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "student-performance")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Preprocessing pipeline for the student performance dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the preprocessor on the training split and transform both splits
    Transform {
        /// Training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Test CSV file
        #[arg(long)]
        test: PathBuf,

        /// JSON configuration file (column groups, strategies)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Where to save the fitted preprocessor (overrides the config)
        #[arg(short, long)]
        preprocessor: Option<PathBuf>,

        /// Directory to write train_array.csv and test_array.csv into
        #[arg(long)]
        arrays_dir: Option<PathBuf>,
    },

    /// Transform a dataset with a previously saved preprocessor
    Apply {
        /// Saved preprocessor file
        #[arg(short, long)]
        preprocessor: PathBuf,

        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show column types, missing values and distinct counts
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Transform { train, test, config, preprocessor, arrays_dir } => {
            cmd_transform(&train, &test, config.as_deref(), preprocessor, arrays_dir.as_deref())
        }
        Commands::Apply { preprocessor, data, output } => {
            cmd_apply(&preprocessor, &data, &output)
        }
        Commands::Info { data } => cmd_info(&data),
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_transform(
    train_path: &Path,
    test_path: &Path,
    config_path: Option<&Path>,
    preprocessor_path: Option<PathBuf>,
    arrays_dir: Option<&Path>,
) -> anyhow::Result<()> {
    section("Transform");

    let mut config = match config_path {
        Some(path) => TransformationConfig::from_json_file(path)?,
        None => TransformationConfig::default(),
    };
    if let Some(path) = preprocessor_path {
        config = config.with_preprocessor_path(path);
    }

    step_run("Fitting and transforming");
    let start = Instant::now();
    let output = DataTransformation::new(config).run(train_path, test_path)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    println!("  {:<14} {}", muted("Train"), shape(output.train.nrows(), output.train.ncols()));
    println!("  {:<14} {}", muted("Test"), shape(output.test.nrows(), output.test.ncols()));
    println!("  {:<14} {}", muted("Preprocessor"), output.preprocessor_path.display());

    if let Some(dir) = arrays_dir {
        std::fs::create_dir_all(dir)?;
        let train_out = dir.join("train_array.csv");
        let test_out = dir.join("test_array.csv");

        step_run(&format!("Saving arrays → {}", dir.display()));
        DataSaver::save_matrix_csv(&output.train, &output.column_names, &train_out)?;
        DataSaver::save_matrix_csv(&output.test, &output.column_names, &test_out)?;
        step_done(&format!("{}, {}", train_out.display(), test_out.display()));
    }

    println!();
    Ok(())
}

pub fn cmd_apply(preprocessor_path: &Path, data_path: &Path, output_path: &Path) -> anyhow::Result<()> {
    section("Apply");

    step_run("Loading preprocessor");
    let preprocessor = ColumnDispatcher::load(preprocessor_path)?;
    step_done(&format!("{} input columns", preprocessor.input_columns().len()));

    step_run("Loading data");
    let df = DataLoader::new().load_csv(data_path)?;
    step_done(&shape(df.height(), df.width()));

    step_run("Transforming");
    let matrix = preprocessor.transform(&df)?;
    let names = preprocessor.feature_names_out()?;
    step_done(&shape(matrix.nrows(), matrix.ncols()));

    step_run(&format!("Saving → {}", output_path.display()));
    DataSaver::save_matrix_csv(&matrix, &names, output_path)?;
    step_done("");

    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    println!(
        "  {:<30} {:<10} {:>6} {:>8}",
        muted("Column"),
        muted("Type"),
        muted("Nulls"),
        muted("Unique")
    );
    println!("  {}", dim(&"─".repeat(58)));

    for summary in summarize_columns(&df) {
        let nulls = if summary.null_count > 0 {
            summary.null_count.to_string().yellow()
        } else {
            summary.null_count.to_string().normal()
        };
        println!(
            "  {:<30} {:<10} {:>6} {:>8}",
            summary.name,
            summary.dtype.truecolor(140, 140, 140),
            nulls,
            summary.unique_count
        );
    }

    println!();
    Ok(())
}
