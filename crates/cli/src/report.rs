use std::io::{self, Write};

use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};

use sumo_import_engine::{ImportFailure, RunReport};

const RULE: &str = "------------------------------------------------------------";

struct Colors;

impl Colors {
    const HEADER: Color = Color::Magenta;
    const OK: Color = Color::Green;
    const FAILED: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
}

/// Plain-text end-of-run summary.
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{}:: {} - {}",
        report.destination.tag(),
        report.destination.id,
        report.destination.name
    )];
    for (status, count) in report.counts() {
        lines.push(format!("  {status}: {count}"));
    }
    if !report.skipped.is_empty() {
        lines.push(format!("  skipped (malformed): {}", report.skipped.len()));
    }
    lines.push(format!("manifest: {}", report.manifest_path.display()));
    lines
}

/// `FILE:` / `STATUS:` block for one failed item.
pub fn failure_block(failure: &ImportFailure) -> String {
    let status = serde_json::to_string_pretty(&failure.status)
        .unwrap_or_else(|_| failure.status.to_string());
    format!(
        "{RULE}\nFILE: {}\nSTATUS: {} {}\n{RULE}",
        failure.path.display(),
        failure.state,
        status
    )
}

pub fn print_report(report: &RunReport) -> Result<()> {
    let mut stdout = io::stdout();

    execute!(
        stdout,
        SetForegroundColor(Colors::HEADER),
        Print("Import finished\n"),
        ResetColor,
    )?;
    for line in summary_lines(report) {
        execute!(stdout, Print(line), Print("\n"))?;
    }

    if report.failures.is_empty() {
        execute!(
            stdout,
            SetForegroundColor(Colors::OK),
            Print("All items imported.\n"),
            ResetColor,
        )?;
    } else {
        execute!(
            stdout,
            SetForegroundColor(Colors::FAILED),
            Print(format!("{} item(s) failed:\n", report.failures.len())),
            ResetColor,
        )?;
        for failure in &report.failures {
            execute!(
                stdout,
                SetForegroundColor(Colors::DIM),
                Print(failure_block(failure)),
                Print("\n"),
                ResetColor,
            )?;
        }
    }

    stdout.flush()?;
    Ok(())
}
