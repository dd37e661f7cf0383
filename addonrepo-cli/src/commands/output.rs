//! Output formatting utilities for commands.
//!
//! Helpers for printing a [`PublishReport`] consistently across the build,
//! catalog and package commands.

use console::style;

use addonrepo::publisher::{AddonIssue, PublishReport};
use addonrepo::vcs::CommitOutcome;

/// Format a size in bytes as a human-readable string.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

/// Print a section header.
pub fn header(title: &str) {
    println!("{}", style(title).bold());
    println!("{}", "=".repeat(title.len()));
}

fn print_issues(label: &str, issues: &[AddonIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("  {} ({}):", label, issues.len());
    for issue in issues {
        println!("    - {}: {}", issue.addon, issue.error);
    }
}

/// Print the full run report.
pub fn print_report(report: &PublishReport) {
    header("Repository Build");
    println!();
    println!("Addons discovered: {}", report.discovered.len());

    if let Some(catalog) = &report.catalog {
        println!();
        println!("{}", style("Catalog").bold());
        println!("  {} ({} addons)", catalog.path.display(), catalog.included.len());
        match &catalog.checksum {
            Some(digest) => println!("  {} {}", catalog.checksum_path.display(), digest),
            None => println!(
                "  {} {}",
                catalog.checksum_path.display(),
                style("not written").red()
            ),
        }
        print_issues("Excluded", &catalog.excluded);
    }

    if !report.textures.is_empty() {
        println!();
        println!("{}", style("Textures").bold());
        for outcome in &report.textures {
            match &outcome.result {
                Ok(path) => println!("  {} {}", style("✓").green(), path.display()),
                Err(e) => println!("  {} {}: {}", style("✗").red(), outcome.addon, e),
            }
        }
    }

    if !report.archives.is_empty() || !report.skipped.is_empty() || !report.failed.is_empty() {
        println!();
        println!("{}", style("Archives").bold());
        for archive in &report.archives {
            println!(
                "  {} {} ({} files, {})",
                style("✓").green(),
                archive.path.display(),
                archive.file_count,
                format_size(archive.size)
            );
        }
        print_issues("Skipped", &report.skipped);
        print_issues("Failed", &report.failed);
    }

    let copied = report.assets_copied();
    let asset_failures: Vec<_> = report.asset_failures().collect();
    if copied > 0 || !asset_failures.is_empty() {
        println!();
        println!("{}", style("Assets").bold());
        println!("  Copied: {}", copied);
        for (addon, error) in asset_failures {
            println!("    - {}: {}", addon, error);
        }
    }

    for error in &report.persistence_errors {
        println!();
        println!("{} {}", style("Error:").red().bold(), error);
    }

    println!();
    let summary = match report.elapsed() {
        Some(elapsed) => format!("Done in {:.2}s", elapsed.num_milliseconds() as f64 / 1000.0),
        None => "Done".to_string(),
    };
    if report.has_failures() {
        println!("{} (with failures)", style(summary).yellow());
    } else {
        println!("{}", style(summary).green());
    }
}

/// Print the outcome of a commit.
pub fn print_commit(outcome: &CommitOutcome) {
    match outcome {
        CommitOutcome::Committed => println!("{} Committed changes", style("✓").green()),
        CommitOutcome::NothingToCommit => println!("Nothing to commit"),
    }
}
