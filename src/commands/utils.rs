//! Shared utilities for commands

use anyhow::Result;
use chrome_profile_migrate::chrome::artifacts::{CopyOutcome, EntryKind};
use chrome_profile_migrate::chrome::MergeReport;
use chrome_profile_migrate::chrome::keywords::MergeMode;
use owo_colors::OwoColorize;
use std::io::{self, Write};
use std::process::Command;

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Print a prompt and read one trimmed line from stdin
pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Ask a y/N question
pub fn confirm(prompt: &str) -> Result<bool> {
    let answer = prompt_line(&format!("{} (y/N) ", prompt))?;
    Ok(answer.eq_ignore_ascii_case("y"))
}

/// Check if Chrome is running; `Err` when the process list cannot be queried
pub fn is_chrome_running() -> io::Result<bool> {
    #[cfg(target_os = "macos")]
    {
        Command::new("pgrep")
            .args(["-x", "Google Chrome"])
            .output()
            .map(|o| o.status.success())
    }

    #[cfg(target_os = "linux")]
    {
        Command::new("pgrep")
            .args(["-x", "chrome"])
            .output()
            .map(|o| o.status.success())
    }

    #[cfg(target_os = "windows")]
    {
        Command::new("tasklist")
            .args(["/FI", "IMAGENAME eq chrome.exe"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains("chrome.exe"))
    }
}

/// Print one line per copied item
pub fn print_copy_outcome(outcome: &CopyOutcome) {
    match outcome {
        CopyOutcome::Copied {
            name,
            size_bytes,
            entries,
            replaced,
        } => {
            let detail = match entries {
                Some((count, EntryKind::Extensions)) => format!("{} extensions", count),
                Some((count, EntryKind::SessionFiles)) => format!("{} session files", count),
                None => format_size(*size_bytes),
            };
            let note = if *replaced { " (replaced existing)" } else { "" };
            println!("  {} {} ({}){}", "Copied:".green(), name, detail, note.dimmed());
        }
        CopyOutcome::Missing { name } => {
            println!("  {} {} (not found in source)", "Skipping".yellow(), name);
        }
        CopyOutcome::Failed { name, reason } => {
            eprintln!("  {} {}: {}", "Failed:".red(), name, reason);
        }
    }
}

/// Print the three outcome lists of a keyword merge
pub fn print_merge_report(report: &MergeReport) {
    if report.mode == MergeMode::BulkCopy {
        println!(
            "  {} destination had no keywords, copied all {} from source",
            "Note:".yellow(),
            report.migrated.len()
        );
    }

    if report.is_empty() {
        println!("  No custom keyword searches found in source");
        return;
    }

    for migrated in &report.migrated {
        println!(
            "  {} '{}' ({})",
            "Migrated:".green(),
            migrated.keyword,
            migrated.short_name
        );
    }
    for keyword in &report.skipped {
        println!("  {} '{}' (already exists)", "Skipping".yellow(), keyword);
    }
    for failed in &report.failed {
        eprintln!("  {} '{}': {}", "Failed:".red(), failed.keyword, failed.reason);
    }

    println!(
        "  {} migrated, {} skipped, {} failed (of {})",
        report.migrated.len().to_string().green(),
        report.skipped.len(),
        if report.failed.is_empty() {
            "0".to_string()
        } else {
            report.failed.len().to_string().red().to_string()
        },
        report.total()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}
