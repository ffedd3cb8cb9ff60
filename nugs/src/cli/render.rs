// nugs/src/cli/render.rs
use std::io::{self, Write};

use colored::Colorize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use nugs_common::dependency::Resolution;
use nugs_core::{DownloadEvent, DownloadReport, DownloadStatus};

pub fn heading(w: &mut impl Write, text: &str) -> io::Result<()> {
    writeln!(w, "{}{}", "==> ".bold().blue(), text.bold())
}

pub fn print_frameworks(w: &mut impl Write, frameworks: &[String]) -> io::Result<()> {
    if frameworks.is_empty() {
        return writeln!(w, "No available frameworks found for this package.");
    }
    writeln!(w, "Available frameworks:")?;
    for (i, framework) in frameworks.iter().enumerate() {
        writeln!(w, "{}: {}", i + 1, framework)?;
    }
    Ok(())
}

pub fn print_resolution(w: &mut impl Write, resolution: &Resolution) -> io::Result<()> {
    for issue in &resolution.issues {
        let version = issue.version.as_deref().unwrap_or("?");
        if issue.kind.is_informational() {
            writeln!(
                w,
                "{}",
                format!("  {} {}: {}", issue.package, version, issue.message).dimmed()
            )?;
        } else {
            writeln!(
                w,
                "  {} {} {}: {}",
                "Skipped".yellow(),
                issue.package,
                version,
                issue.message
            )?;
        }
    }

    writeln!(w, "Resolved {} package(s):", resolution.resolved.len())?;
    for (name, version) in &resolution.resolved {
        writeln!(w, "  {} {}", name, version.to_string().cyan())?;
    }

    let skipped = resolution.failures().count();
    if skipped > 0 {
        writeln!(
            w,
            "{}",
            format!("{skipped} declaration(s) could not be followed.").yellow()
        )?;
    }
    Ok(())
}

/// Prints download progress until every sender is gone.
pub async fn follow_events(mut event_rx: broadcast::Receiver<DownloadEvent>, quiet: bool) {
    loop {
        match event_rx.recv().await {
            Ok(event) if !quiet => match event {
                DownloadEvent::DownloadStarted { target_id, url } => {
                    println!("  Downloading {} from {}", target_id, url.dimmed());
                }
                DownloadEvent::DownloadFinished {
                    target_id,
                    size_bytes,
                    ..
                } => {
                    println!("  {} {} ({} bytes)", "Fetched".green(), target_id, size_bytes);
                }
                DownloadEvent::DownloadFailed { target_id, .. } => {
                    println!("  {} {}", "Failed".red(), target_id);
                }
            },
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

pub fn print_report(w: &mut impl Write, report: &DownloadReport) -> io::Result<()> {
    for outcome in &report.outcomes {
        match &outcome.status {
            DownloadStatus::Downloaded { path, .. } => writeln!(
                w,
                "{} {} {} -> {}",
                "✓".green().bold(),
                outcome.name,
                outcome.version,
                path.display()
            )?,
            DownloadStatus::Failed { reason, .. } => writeln!(
                w,
                "{} {} {}: {}",
                "✗".red().bold(),
                outcome.name,
                outcome.version,
                reason
            )?,
        }
    }

    let summary = format!(
        "Download completed! {} succeeded, {} failed.",
        report.success_count(),
        report.failure_count()
    );
    if report.failure_count() == 0 {
        writeln!(w, "{}", summary.green().bold())
    } else {
        writeln!(w, "{}", summary.yellow().bold())
    }
}
