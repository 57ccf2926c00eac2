// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use bmi_tracker::export::{export_csv, to_json};
use bmi_tracker::logging::{init_tracing, LogTarget};
use bmi_tracker::shell::{calculate, show_history, CalculationForm, Notice};
use bmi_tracker::{BmiError, Config, RecordStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "bmi-tracker")]
#[command(about = "Calculate BMI, keep a history per user and chart the trend", long_about = None)]
#[command(version)]
struct Cli {
    /// Record store location (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive calculator (default)
    Tui,

    /// Calculate and store one measurement
    Calc {
        #[arg(long)]
        user: String,

        /// Weight in kilograms
        #[arg(long)]
        weight: String,

        /// Height in centimeters
        #[arg(long)]
        height: String,
    },

    /// Print a user's history
    History {
        #[arg(long)]
        user: String,

        #[arg(long)]
        json: bool,
    },

    /// Write a user's history to a CSV file
    Export {
        #[arg(long)]
        user: String,

        #[arg(long)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("❌ {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    let target = match command {
        Commands::Tui => LogTarget::FileOnly,
        _ => LogTarget::Stderr,
    };
    init_tracing(target, config.log_file.as_deref(), &config.log_level);

    // Opened once here and handed to every operation below
    let store = match RecordStore::open_with_parent(&config.db_path) {
        Ok(store) => store,
        Err(err) => return Ok(report(&err)),
    };

    match command {
        Commands::Tui => run_ui_mode(store),
        Commands::Calc {
            user,
            weight,
            height,
        } => match calculate(&store, &CalculationForm::new(user, weight, height)) {
            Ok(calc) => {
                println!("{}", calc.summary());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report(&err)),
        },
        Commands::History { user, json } => match show_history(&store, &user) {
            Ok(history) if json => {
                println!("{}", to_json(history.records())?);
                Ok(ExitCode::SUCCESS)
            }
            Ok(history) => {
                println!("BMI History for {}", history.user);
                println!("{:<21} {:>7}  {}", "Date", "BMI", "Category");
                for row in history.rows() {
                    println!("{:<21} {:>7.2}  {}", row.date, row.bmi, row.category);
                }
                if !history.has_trend() {
                    println!("\n{}", bmi_tracker::TREND_FALLBACK);
                }
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report(&err)),
        },
        Commands::Export { user, output } => match show_history(&store, &user) {
            Ok(history) => {
                let written = export_csv(history.records(), &output)?;
                println!("✓ Exported {} records to {}", written, output.display());
                Ok(ExitCode::SUCCESS)
            }
            Err(err) => Ok(report(&err)),
        },
    }
}

/// Print a user-facing notice for a recoverable error.
fn report(err: &BmiError) -> ExitCode {
    let notice = Notice::from(err);
    eprintln!("{}: {}", notice.title, notice.message);
    ExitCode::FAILURE
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: RecordStore) -> Result<ExitCode> {
    let mut app = ui::App::new(store);
    ui::run_ui(&mut app)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: RecordStore) -> Result<ExitCode> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the scripted commands: bmi-tracker calc --help");
    Ok(ExitCode::FAILURE)
}
