//! Output formatters for parse results

use anyhow::Result;
use colored::*;
use rostercraft_core::{ClockTime, ParseResult, PersonDutyRecord};

fn time_span(start: Option<ClockTime>, end: Option<ClockTime>) -> String {
    let show = |t: Option<ClockTime>| t.map(|t| t.to_string()).unwrap_or_else(|| "--:--".into());
    format!("{}-{}", show(start), show(end))
}

/// Print a parse result in human-readable format with colors
pub fn print_human(result: &ParseResult) {
    let title = match &result.date {
        Some(date) => format!("Roster: {} ({})", result.source.display(), date),
        None => format!("Roster: {}", result.source.display()),
    };
    println!("{}", title.bold());

    if !result.success {
        let message = result.error.as_deref().unwrap_or("unknown error");
        println!("{} {}", "✗".red().bold(), message.red());
        println!();
        return;
    }
    println!();

    print_group("Caregivers", &result.caregivers);
    print_group("Dispatchers", &result.dispatchers);
    print_group("Sick", &result.sick);

    if !result.unrecognized_duties.is_empty() {
        let codes: Vec<&str> = result.unrecognized_duties.iter().map(String::as_str).collect();
        println!(
            "{} {}",
            "Unrecognized duty codes:".yellow().bold(),
            codes.join(", ")
        );
        println!();
    }
}

fn print_group(title: &str, records: &[PersonDutyRecord]) {
    println!(
        "{} {}",
        title.bold().underline(),
        format!("({})", records.len()).bright_black()
    );
    for record in records {
        print_record(record);
    }
    println!();
}

fn print_record(record: &PersonDutyRecord) {
    let duty = match (&record.sick, &record.duty) {
        (Some(sick), _) if sick.confirmed => sick.duty_code.red().bold(),
        (Some(sick), _) => sick.duty_code.red(),
        (None, Some(duty)) => duty.cyan().bold(),
        (None, None) => "-".bright_black(),
    };

    let mut line = format!(
        "  {:<20} {:<6} {}",
        record.display_name,
        duty,
        time_span(record.start, record.end)
    );
    if let Some(shift) = record.sick.as_ref().and_then(|s| s.bucket).or(record.shift) {
        line.push_str(&format!("  {}", shift));
    }
    println!("{}{}", line, flags(record));
}

fn flags(record: &PersonDutyRecord) -> String {
    let mut tags = Vec::new();
    if record.is_sick {
        tags.push("sick".red().to_string());
    }
    if record.sick.as_ref().is_some_and(|s| s.is_dispatcher) {
        tags.push("dispatcher".blue().to_string());
    }
    if record.is_special_driver {
        tags.push("driver".yellow().to_string());
    }
    if record.zebra_row {
        tags.push("zebra".bright_black().to_string());
    }
    if tags.is_empty() {
        String::new()
    } else {
        format!("  [{}]", tags.join(", "))
    }
}

/// Print parse results in JSON format
pub fn print_json(results: &[ParseResult]) -> Result<()> {
    let output = serde_json::json!({
        "rosters": results,
        "summary": {
            "files": results.len(),
            "failed": results.iter().filter(|r| !r.success).count(),
            "records": results.iter().map(ParseResult::len).sum::<usize>(),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
