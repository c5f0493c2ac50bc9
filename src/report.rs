//! Human and JSON output for a run.
//!
//! Kept apart from the run loop so the library can be driven without printing.

use std::io::{self, Write};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::{FileOutcome, FileReport, RunSummary};

pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘
pub const SKIP_MARK: &str = "-";

pub fn print_reports(reports: &[FileReport], summary: &RunSummary) {
    print_reports_to(reports, summary, &mut io::stdout().lock());
}

/// One line per file, then the summary line.
pub fn print_reports_to<W: Write>(reports: &[FileReport], summary: &RunSummary, writer: &mut W) {
    for report in reports {
        let _ = writeln!(writer, "{}", file_line(report));
    }
    // Roots that could not be walked have no per-file report.
    let walk_failures = summary
        .failed
        .iter()
        .filter(|f| !reports.iter().any(|r| r.display_path == f.path));
    for failed in walk_failures {
        let _ = writeln!(
            writer,
            "{} {}: {}",
            FAILURE_MARK.red(),
            failed.path,
            failed.error.red()
        );
    }
    let _ = writeln!(writer, "{}", summary_line(summary));
}

pub fn file_line(report: &FileReport) -> String {
    let label = report
        .language
        .map(|l| format!("|{}|", l.label()))
        .unwrap_or_default();

    match &report.outcome {
        FileOutcome::Changed { backup } => {
            let mut line = format!(
                "{} {} {}",
                SUCCESS_MARK.green(),
                label.cyan(),
                report.display_path
            );
            if backup.is_none() {
                line.push_str(&format!(" {}", "(not backed up)".dimmed()));
            }
            line
        }
        FileOutcome::Unchanged => format!(
            "{} {} {} {}",
            SKIP_MARK.dimmed(),
            label.dimmed(),
            report.display_path,
            "(no comments)".dimmed()
        ),
        FileOutcome::Skipped(reason) => format!(
            "{} {} {}",
            "skipped".yellow(),
            report.display_path,
            format!("({reason})").yellow()
        ),
        FileOutcome::Failed(err) => format!(
            "{} {}: {}",
            FAILURE_MARK.red(),
            report.display_path,
            format!("{err:#}").red()
        ),
    }
}

pub fn summary_line(summary: &RunSummary) -> String {
    let mut parts = vec![
        format!("processed {}", summary.processed()),
        format!("changed {}", summary.changed.len()),
        format!("unchanged {}", summary.unchanged.len()),
        format!("skipped {}", summary.skipped.len()),
    ];
    if summary.has_failures() {
        parts.push(format!("failed {}", summary.failed.len()).red().to_string());
    }
    if summary.dry_run {
        parts.push("dry run".yellow().to_string());
    } else if !summary.backup_dirs.is_empty() {
        let dirs: Vec<String> = summary
            .backup_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();
        parts.push(format!("backup {}", dirs.join(", ")));
    }
    parts.join(" | ")
}

pub fn print_json(summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialise summary")?;
    println!("{json}");
    Ok(())
}
