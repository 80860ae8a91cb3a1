use anyhow::{Context, Result};
use clap::Parser;
use rostercraft_core::reader::{self, Sheet};
use rostercraft_core::roster::classify::{parse_time, parse_time_text};
use rostercraft_core::{
    Change, ClockTime, ColumnMap, ParseMode, RosterConfig, RosterParser, RowEdit, WriteBackError,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "rosteredit")]
#[command(about = "Change duty, start and end of one roster row while others may edit the file", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the roster workbook (.xlsx or .xlsm)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Spreadsheet row number as shown in the application (1-based)
    #[arg(short, long, value_name = "N")]
    row: u32,

    /// New duty code; an empty value clears the cell
    #[arg(short, long)]
    duty: Option<String>,

    /// New start time (HH:MM or HHMM); an empty value clears the cell
    #[arg(short, long)]
    start: Option<String>,

    /// New end time (HH:MM or HHMM); an empty value clears the cell
    #[arg(short, long)]
    end: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Show what would be done without making changes
    #[arg(long)]
    dry_run: bool,
}

/// Process exit codes per failure kind
const EXIT_OTHER: u8 = 1;
const EXIT_AUTHOR_LOCK: u8 = 2;
const EXIT_CONCURRENT_WRITER: u8 = 3;
const EXIT_UNREADABLE: u8 = 4;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = match e.downcast_ref::<WriteBackError>() {
                Some(WriteBackError::LockedByAuthor { .. }) => EXIT_AUTHOR_LOCK,
                Some(WriteBackError::LockedByConcurrentWriter { .. }) => EXIT_CONCURRENT_WRITER,
                Some(WriteBackError::Unreadable { .. }) => EXIT_UNREADABLE,
                _ => EXIT_OTHER,
            };
            ExitCode::from(code)
        }
    }
}

/// Parse a time argument; empty clears
fn time_arg(value: &str, name: &str) -> Result<Change<ClockTime>> {
    if value.trim().is_empty() {
        return Ok(Change::Clear);
    }
    parse_time_text(value)
        .map(Change::Set)
        .with_context(|| format!("Invalid {} time '{}', expected HH:MM", name, value))
}

/// Changes requested on the command line; omitted flags keep their cell
fn requested_edit(cli: &Cli) -> Result<RowEdit> {
    let mut edit = RowEdit::default();
    if let Some(duty) = &cli.duty {
        let duty = duty.trim();
        edit.duty = if duty.is_empty() {
            Change::Clear
        } else {
            Change::Set(duty.to_uppercase())
        };
    }
    if let Some(start) = &cli.start {
        edit.start = time_arg(start, "start")?;
    }
    if let Some(end) = &cli.end {
        edit.end = time_arg(end, "end")?;
    }
    Ok(edit)
}

/// Editable cells as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowView {
    duty: String,
    start: String,
    end: String,
}

fn show_time(sheet: &Sheet, row: u32, col: Option<u32>) -> String {
    let Some(col) = col else {
        return "--:--".into();
    };
    let value = sheet.value(row, col);
    match parse_time(value, false) {
        Some(time) => time.to_string(),
        None => value
            .display_text()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "--:--".into()),
    }
}

/// Values currently in the editable cells
fn current_view(sheet: &Sheet, columns: &ColumnMap, row: u32) -> RowView {
    RowView {
        duty: sheet
            .value(row, columns.duty)
            .display_text()
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "-".into()),
        start: show_time(sheet, row, columns.start),
        end: show_time(sheet, row, columns.end),
    }
}

/// `current` with the requested changes applied
fn apply(current: &RowView, edit: &RowEdit) -> RowView {
    let time = |old: &str, change: &Change<ClockTime>| match change {
        Change::Keep => old.to_string(),
        Change::Clear => "--:--".to_string(),
        Change::Set(t) => t.to_string(),
    };
    RowView {
        duty: match &edit.duty {
            Change::Keep => current.duty.clone(),
            Change::Clear => "-".to_string(),
            Change::Set(d) => d.clone(),
        },
        start: time(&current.start, &edit.start),
        end: time(&current.end, &edit.end),
    }
}

fn describe(view: &RowView) -> String {
    format!("{} {}-{}", view.duty, view.start, view.end)
}

fn run(cli: &Cli) -> Result<()> {
    if cli.row == 0 {
        anyhow::bail!("Row numbers start at 1");
    }
    let row = cli.row - 1;

    let config = RosterConfig::load(cli.config.as_deref()).context("Invalid configuration")?;
    let parser = RosterParser::with_config(config);

    let parsed = parser.parse_file_with_mode(&cli.file, ParseMode::DisplayAll);
    let Some(columns) = parsed.columns.filter(|_| parsed.success) else {
        anyhow::bail!(
            "Cannot edit {}: {}",
            cli.file.display(),
            parsed.error.as_deref().unwrap_or("roster could not be parsed")
        );
    };

    let edit = requested_edit(cli)?;
    if edit.is_empty() {
        anyhow::bail!("Nothing to change: pass --duty, --start or --end");
    }

    let sheet = reader::read_active_sheet(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let current = current_view(&sheet, &columns, row);
    let proposed = apply(&current, &edit);

    match parsed.record_at_row(row) {
        Some(record) => println!("Row {}: {}", cli.row, record.full_name),
        None => println!("Row {}: (no parsed person)", cli.row),
    }
    println!("  current: {}", describe(&current));
    println!("  new:     {}", describe(&proposed));

    if proposed == current {
        println!("Nothing to change.");
        return Ok(());
    }

    if cli.dry_run {
        println!("[DRY RUN] {} not modified", cli.file.display());
        return Ok(());
    }

    let outcome = parser.write_row(&cli.file, &columns, row, &edit)?;
    println!("✓ Saved {}", outcome.target.display());
    match outcome.backup {
        Some(backup) => println!("Backup: {}", backup.display()),
        None => println!("Backup: not written (see log)"),
    }

    Ok(())
}
