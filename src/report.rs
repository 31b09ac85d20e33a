//! Human and machine readable run reports.

use colored::*;
use std::fmt;

use crate::driver::{FileOutcome, FileReport, RunReport};
use crate::error::PortResult;
use crate::result::{ConversionResult, PassKind};

/// Colored text rendering of a run: one block per file plus a totals
/// footer, with changed lines when `show_diff` is set.
pub struct TextReport<'a> {
    report: &'a RunReport,
    show_diff: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a RunReport, show_diff: bool) -> Self {
        Self { report, show_diff }
    }

    fn file(&self, f: &mut fmt::Formatter<'_>, file: &FileReport) -> fmt::Result {
        let path = file.path.display();

        match &file.outcome {
            FileOutcome::Failed { error } => {
                writeln!(f, "{} {} {}", "✗".red().bold(), path, error.red())
            }
            FileOutcome::Unchanged { result } => {
                writeln!(f, "{} {}", "·".dimmed(), path.to_string().dimmed())?;
                conditions(f, result)
            }
            FileOutcome::Changed {
                result,
                backup,
                changes,
                ..
            } => {
                let mark = if self.report.dry_run {
                    "~".yellow()
                } else {
                    "✓".green()
                };
                writeln!(f, "{} {} {}", mark, path, summary(result).dimmed())?;
                if let Some(backup) = backup {
                    writeln!(f, "  {} {}", "backup:".dimmed(), backup.display())?;
                }
                conditions(f, result)?;
                if self.show_diff {
                    for change in changes {
                        writeln!(f, "  {:>5} {} {}", change.line, "-".red(), change.before.red())?;
                        writeln!(f, "  {:>5} {} {}", "", "+".green(), change.after.green())?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.report.files {
            self.file(f, file)?;
        }

        let totals = self.report.totals();
        let failed = if totals.failed > 0 {
            totals.failed.to_string().red().bold()
        } else {
            totals.failed.to_string().normal()
        };

        writeln!(f)?;
        writeln!(
            f,
            "{} {} file(s): {} changed, {} unchanged, {} failed",
            "Σ".cyan().bold(),
            totals.files,
            totals.changed.to_string().green(),
            totals.unchanged,
            failed,
        )?;
        writeln!(
            f,
            "  placeholders: {}, functions: {}, booleans: {}, returning: {}",
            totals.placeholders, totals.functions, totals.booleans, totals.returning
        )?;
        if totals.conditions > 0 {
            writeln!(
                f,
                "  {} {} spot(s) need manual review",
                "⚠".yellow(),
                totals.conditions
            )?;
        }
        if self.report.dry_run && totals.changed > 0 {
            writeln!(f, "  {}", "dry run: no files were written".dimmed())?;
        }
        Ok(())
    }
}

fn conditions(f: &mut fmt::Formatter<'_>, result: &ConversionResult) -> fmt::Result {
    for condition in &result.conditions {
        writeln!(f, "  {} {}", "⚠".yellow(), condition)?;
    }
    Ok(())
}

/// `(2 placeholders, 1 function)`, listing only non-zero counters.
fn summary(result: &ConversionResult) -> String {
    let parts: Vec<String> = [
        (PassKind::Placeholders, "placeholder"),
        (PassKind::Functions, "function"),
        (PassKind::Booleans, "boolean"),
        (PassKind::Returning, "returning"),
    ]
    .into_iter()
    .filter_map(|(kind, label)| {
        let n = result.count(kind);
        match n {
            0 => None,
            1 => Some(format!("1 {}", label)),
            _ if kind == PassKind::Returning => Some(format!("{} {}", n, label)),
            _ => Some(format!("{} {}s", n, label)),
        }
    })
    .collect();

    format!("({})", parts.join(", "))
}

/// Pretty-printed JSON for the whole run, including per-file totals.
pub fn to_json(report: &RunReport) -> PortResult<String> {
    let value = serde_json::json!({
        "generated_at": report.generated_at,
        "dry_run": report.dry_run,
        "totals": report.totals(),
        "files": report.files,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
