//! Brew Ledger
//!
//! Batch yield tracker for handcrafted tea.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};

use brew_ledger::calculator;
use brew_ledger::config;
use brew_ledger::db;
use brew_ledger::report;
use brew_ledger::shell::Shell;

#[derive(Parser)]
#[command(name = "brew-ledger")]
#[command(about = "Batch yield tracker for handcrafted tea extraction and reduction")]
struct Cli {
    /// Path to the SQLite database (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Run an interactive batch session on stdin
    Session,

    /// Classify a yield without touching the database
    Classify {
        /// Total extracted litres
        extracted: f64,

        /// Final reduced litres
        #[arg(value_name = "FINAL")]
        final_volume: f64,
    },

    /// List all stored batches
    List,

    /// Export all batches as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the full report for a stored batch
    Report {
        /// Batch ID
        id: String,
    },

    /// Print the compact label for a stored batch
    Label {
        /// Batch ID
        id: String,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let db_path = cli.database.clone().unwrap_or_else(|| cfg.database_path());

    match cli.command {
        Commands::Init => {
            db::open(&db_path)?;
            println!("Database initialized at: {}", db_path.display());
        }

        Commands::Session => {
            db::open(&db_path)?;
            let mut shell = Shell::new(cfg, &db_path);
            shell.run(io::stdin().lock(), io::stdout().lock())?;
        }

        Commands::Classify {
            extracted,
            final_volume,
        } => {
            let (min, max) = calculator::target_range(extracted);
            let result = calculator::classify(extracted, final_volume);
            println!("Target: {:.1} - {:.1} L", min, max);
            println!("Yield: {:.1}%", result.percentage);
            println!("Status: {}", result.status.describe());
        }

        Commands::List => {
            let batches = db::list_batches(&db::open(&db_path)?)?;
            if batches.is_empty() {
                println!("No batches in database. Run 'session' and 'save' first.");
            } else {
                println!(
                    "{:<16} {:<10} {:<14} {:>10} {:>10} {:>7}  {}",
                    "Batch", "Date", "Operator", "Extracted", "Final", "Yield", "Status"
                );
                println!("{}", "-".repeat(84));
                for b in batches {
                    println!(
                        "{:<16} {:<10} {:<14} {:>10.1} {:>10.1} {:>6.1}%  {}",
                        b.id,
                        b.created_on.to_string(),
                        b.operator,
                        b.extraction_total,
                        b.final_volume,
                        b.percentage,
                        b.status
                    );
                }
            }
        }

        Commands::Export { output } => {
            let batches = db::list_batches(&db::open(&db_path)?)?;
            match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    report::write_csv(BufWriter::new(file), &batches)?;
                    log::info!("exported {} batches to {}", batches.len(), path.display());
                }
                None => report::write_csv(io::stdout().lock(), &batches)?,
            }
        }

        Commands::Report { id } => {
            let batch = db::get_batch(&db::open(&db_path)?, &id)?
                .ok_or_else(|| anyhow!("Batch '{}' not found", id))?;
            print!("{}", report::format_report(&batch));
        }

        Commands::Label { id } => {
            let batch = db::get_batch(&db::open(&db_path)?, &id)?
                .ok_or_else(|| anyhow!("Batch '{}' not found", id))?;
            print!("{}", report::format_label(&batch));
        }
    }

    Ok(())
}
