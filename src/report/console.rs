use colored::Colorize;
use supports_color::Stream;

use crate::ext::BestEffortPathExt;
use crate::runner::ProfileOutcome;
use crate::snapshot::SnapshotDiff;

/// Disables coloring when stdout does not advertise color support.
pub fn init_color() {
    if supports_color::on(Stream::Stdout).is_none() {
        colored::control::set_override(false);
    }
}

pub fn print_scan_summary(outcome: &ProfileOutcome) {
    let snapshot = &outcome.outcome.snapshot;
    println!(
        "{} {}: {} files, {} directories under {} (depth limit {})",
        "captured".green().bold(),
        outcome.profile.name,
        snapshot.file_count(),
        snapshot.directory_count(),
        snapshot.root_path().best_effort_path_display(),
        snapshot.max_depth(),
    );
    for path in &outcome.outcome.skipped {
        println!(
            "  {} {}",
            "skipped".yellow(),
            path.best_effort_path_display()
        );
    }
}

pub fn print_diff(name: &str, diff: &SnapshotDiff) {
    if diff.is_empty() {
        println!("{} no changes detected in '{}'", "unchanged".dimmed(), name);
        return;
    }

    for path in &diff.added {
        println!("{} {}", "+".green().bold(), path);
    }
    for path in &diff.removed {
        println!("{} {}", "-".red().bold(), path);
    }
    for path in &diff.modified {
        println!("{} {}", "~".yellow().bold(), path);
    }
    println!(
        "{}: {} added, {} removed, {} modified",
        name,
        diff.added.len(),
        diff.removed.len(),
        diff.modified.len()
    );
}
