use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use rayon::prelude::*;
use rostercraft_core::{ParseMode, ParseResult, RosterConfig, RosterParser};
use std::path::PathBuf;

mod formatter;

#[derive(Parser)]
#[command(name = "rosterview")]
#[command(about = "Parse duty roster spreadsheets into caregiver, dispatcher and sick lists", long_about = None)]
#[command(version)]
struct Cli {
    /// Roster files (.xlsx, .xlsm, .xls, .ods)
    #[arg(value_name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Keep silently ignored duties and excluded persons
    #[arg(short, long)]
    all: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON output for other tools
    Json,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = RosterConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    let mode = if cli.all {
        ParseMode::DisplayAll
    } else {
        config.parse_mode()
    };
    let parser = RosterParser::with_config(config);

    let results: Vec<ParseResult> = cli
        .files
        .par_iter()
        .map(|file| parser.parse_file_with_mode(file, mode))
        .collect();

    match cli.format {
        OutputFormat::Human => {
            for result in &results {
                formatter::print_human(result);
            }
        }
        OutputFormat::Json => {
            formatter::print_json(&results)?;
        }
    }

    let exit_code = if results.iter().all(|r| r.success) { 0 } else { 1 };
    std::process::exit(exit_code);
}
