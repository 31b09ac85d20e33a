//! File driver: discovery, read, convert, write-with-backup.
//!
//! Each file is read once and written at most once. A file is never
//! written when its converted text is byte-identical to the original, and
//! a failure on one file never stops the rest of the run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::error::{PortError, PortResult};
use crate::pipeline::Converter;
use crate::result::ConversionResult;

/// Whether converted files are persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteMode {
    /// Compute and report only.
    DryRun,
    /// Overwrite changed files, first saving `<file><suffix>` when a suffix
    /// is given.
    Write { backup_suffix: Option<String> },
}

impl WriteMode {
    /// Write mode as described by a driver configuration.
    pub fn from_config(config: &DriverConfig) -> Self {
        WriteMode::Write {
            backup_suffix: config.backup.then(|| config.backup_suffix.clone()),
        }
    }
}

/// A file's original contents, read once.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    original: String,
}

impl SourceFile {
    pub fn read(path: impl Into<PathBuf>) -> PortResult<Self> {
        let path = path.into();
        let original = fs::read_to_string(&path).map_err(|e| PortError::io(&path, e))?;
        Ok(Self { path, original })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    /// Persist `converted`, writing the original to a sibling backup first.
    ///
    /// Returns the backup path when one was written.
    pub fn write_with_backup(
        &self,
        converted: &str,
        backup_suffix: Option<&str>,
    ) -> PortResult<Option<PathBuf>> {
        let backup = match backup_suffix {
            Some(suffix) => {
                let backup = backup_path(&self.path, suffix);
                fs::write(&backup, &self.original).map_err(|e| PortError::io(&backup, e))?;
                Some(backup)
            }
            None => None,
        };

        fs::write(&self.path, converted).map_err(|e| PortError::io(&self.path, e))?;
        Ok(backup)
    }
}

/// `<path><suffix>`, e.g. `routes/admin.js.backup`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// A changed line, for diff-style reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineChange {
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// What happened to one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Changed {
        result: ConversionResult,
        /// False in dry-run mode.
        written: bool,
        backup: Option<PathBuf>,
        changes: Vec<LineChange>,
    },
    Unchanged {
        result: ConversionResult,
    },
    Failed {
        error: String,
    },
}

impl FileOutcome {
    pub fn result(&self) -> Option<&ConversionResult> {
        match self {
            FileOutcome::Changed { result, .. } | FileOutcome::Unchanged { result } => {
                Some(result)
            }
            FileOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Summed counts over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub files: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub placeholders: usize,
    pub functions: usize,
    pub booleans: usize,
    pub returning: usize,
    pub conditions: usize,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn totals(&self) -> Totals {
        let mut totals = Totals {
            files: self.files.len(),
            ..Default::default()
        };

        for file in &self.files {
            match &file.outcome {
                FileOutcome::Changed { .. } => totals.changed += 1,
                FileOutcome::Unchanged { .. } => totals.unchanged += 1,
                FileOutcome::Failed { .. } => totals.failed += 1,
            }
            if let Some(result) = file.outcome.result() {
                totals.placeholders += result.placeholders;
                totals.functions += result.functions;
                totals.booleans += result.booleans;
                totals.returning += result.returning;
                totals.conditions += result.conditions.len();
            }
        }

        totals
    }

    pub fn has_failures(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Failed { .. }))
    }

    pub fn has_changes(&self) -> bool {
        self.files
            .iter()
            .any(|f| matches!(f.outcome, FileOutcome::Changed { .. }))
    }
}

/// Expand the given paths into the files to convert.
///
/// Files named explicitly are always kept. Directories are walked
/// recursively, skipping configured directory names and keeping files with
/// a configured extension. Paths that do not exist are kept so that the
/// read failure is reported for them.
pub fn discover(paths: &[PathBuf], config: &DriverConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, config, &mut files);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn walk_dir(dir: &Path, config: &DriverConfig, files: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory");
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if config.skips_dir(name) {
                debug!(dir = %path.display(), "skipping directory");
                continue;
            }
            walk_dir(&path, config, files);
        } else if config.accepts(&path) {
            files.push(path);
        }
    }
}

/// Convert one file and persist it according to `mode`.
pub fn convert_file(path: &Path, converter: &Converter, mode: &WriteMode) -> FileReport {
    let outcome = match try_convert_file(path, converter, mode) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "conversion failed");
            FileOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    FileReport {
        path: path.to_path_buf(),
        outcome,
    }
}

fn try_convert_file(path: &Path, converter: &Converter, mode: &WriteMode) -> PortResult<FileOutcome> {
    let source = SourceFile::read(path)?;
    let conversion = converter.convert(source.original());

    if !conversion.result.changed {
        return Ok(FileOutcome::Unchanged {
            result: conversion.result,
        });
    }

    let changes = line_changes(source.original(), &conversion.text);
    let (written, backup) = match mode {
        WriteMode::DryRun => (false, None),
        WriteMode::Write { backup_suffix } => {
            let backup = source.write_with_backup(&conversion.text, backup_suffix.as_deref())?;
            info!(path = %path.display(), total = conversion.result.total(), "file converted");
            (true, backup)
        }
    };

    Ok(FileOutcome::Changed {
        result: conversion.result,
        written,
        backup,
        changes,
    })
}

/// Lines that differ between two texts with the same line structure.
///
/// The passes never add or remove line breaks, so lines pair up one to one.
fn line_changes(before: &str, after: &str) -> Vec<LineChange> {
    before
        .lines()
        .zip(after.lines())
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(idx, (b, a))| LineChange {
            line: idx + 1,
            before: b.to_string(),
            after: a.to_string(),
        })
        .collect()
}

/// Convert every file reachable from `paths`.
pub fn run(
    paths: &[PathBuf],
    config: &DriverConfig,
    converter: &Converter,
    mode: &WriteMode,
) -> RunReport {
    let files = discover(paths, config);
    debug!(count = files.len(), "files discovered");

    let files = files
        .iter()
        .map(|path| convert_file(path, converter, mode))
        .collect();

    RunReport {
        generated_at: Utc::now(),
        dry_run: *mode == WriteMode::DryRun,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("routes/admin.js"), ".backup"),
            PathBuf::from("routes/admin.js.backup")
        );
    }

    #[test]
    fn test_write_mode_from_config() {
        let mut config = DriverConfig::default();
        assert_eq!(
            WriteMode::from_config(&config),
            WriteMode::Write {
                backup_suffix: Some(".backup".to_string())
            }
        );
        config.backup = false;
        assert_eq!(
            WriteMode::from_config(&config),
            WriteMode::Write {
                backup_suffix: None
            }
        );
    }

    #[test]
    fn test_line_changes() {
        let changes = line_changes("a\nb ?\nc", "a\nb $1\nc");
        assert_eq!(
            changes,
            vec![LineChange {
                line: 2,
                before: "b ?".to_string(),
                after: "b $1".to_string(),
            }]
        );
    }

    #[test]
    fn test_failed_outcome_has_no_result() {
        let report = convert_file(
            Path::new("/definitely/not/here.js"),
            &Converter::default(),
            &WriteMode::DryRun,
        );
        assert!(matches!(report.outcome, FileOutcome::Failed { .. }));
        assert!(report.outcome.result().is_none());
    }
}
