//! Configuration for the conversion passes and the file driver.
//!
//! Everything the passes need to know about the target dialect lives here
//! as data. A `pgport.toml` file overrides any subset of it:
//!
//! ```toml
//! [dialect]
//! boolean_fields = ["is_active", "is_verified"]
//! sql_keywords = ["SELECT", "INSERT", "UPDATE", "DELETE", "WHERE", "VALUES", "SET", "FROM"]
//! returning_clause = "RETURNING id"
//! literal_scope = "statement"
//!
//! [driver]
//! extensions = ["js", "ts"]
//! backup_suffix = ".orig"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PortError, PortResult};

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pgport.toml";

/// How far a string literal may reach when looking for placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralScope {
    /// Each physical line is scanned on its own.
    #[default]
    Line,
    /// The whole file is scanned at once; backtick literals may span lines.
    Statement,
}

/// Target-dialect vocabulary and the boolean field set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Column names whose 0/1 literals become booleans.
    pub boolean_fields: Vec<String>,
    /// Words that mark a string literal as SQL. Placeholders are only
    /// renumbered in literals containing one of them.
    pub sql_keywords: Vec<String>,
    pub current_timestamp: String,
    pub current_date: String,
    pub interval_keyword: String,
    pub truncate_function: String,
    pub date_function: String,
    pub coalesce_function: String,
    pub returning_clause: String,
    pub true_literal: String,
    pub false_literal: String,
    pub literal_scope: LiteralScope,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            boolean_fields: ["is_active", "is_approved", "is_deleted", "is_paid", "is_admin"]
                .into_iter()
                .map(String::from)
                .collect(),
            sql_keywords: ["SELECT", "INSERT", "UPDATE", "DELETE", "WHERE", "VALUES", "SET"]
                .into_iter()
                .map(String::from)
                .collect(),
            current_timestamp: "CURRENT_TIMESTAMP".to_string(),
            current_date: "CURRENT_DATE".to_string(),
            interval_keyword: "INTERVAL".to_string(),
            truncate_function: "DATE_TRUNC".to_string(),
            date_function: "DATE".to_string(),
            coalesce_function: "COALESCE".to_string(),
            returning_clause: "RETURNING id".to_string(),
            true_literal: "true".to_string(),
            false_literal: "false".to_string(),
            literal_scope: LiteralScope::Line,
        }
    }
}

impl DialectConfig {
    /// Add a field to the boolean field set.
    pub fn with_boolean_field(mut self, field: impl Into<String>) -> Self {
        self.boolean_fields.push(field.into());
        self
    }

    /// Set the literal scope.
    pub fn with_literal_scope(mut self, scope: LiteralScope) -> Self {
        self.literal_scope = scope;
        self
    }

    /// Whether `name` is in the boolean field set (ASCII case-insensitive).
    pub fn is_boolean_field(&self, name: &str) -> bool {
        self.boolean_fields
            .iter()
            .any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Whether `text` contains one of the SQL keywords as a whole word.
    pub fn is_sql(&self, text: &str) -> bool {
        text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .filter(|word| !word.is_empty())
            .any(|word| self.sql_keywords.iter().any(|k| k.eq_ignore_ascii_case(word)))
    }

    /// Reject settings the passes cannot work with.
    pub fn validate(&self) -> PortResult<()> {
        for field in &self.boolean_fields {
            let valid = field
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(PortError::config(format!(
                    "boolean field '{}' is not a plain identifier",
                    field
                )));
            }
        }

        if self.sql_keywords.is_empty() {
            return Err(PortError::config("sql_keywords must not be empty"));
        }
        if let Some(bad) = self
            .sql_keywords
            .iter()
            .find(|k| k.is_empty() || !k.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(PortError::config(format!(
                "sql keyword '{}' is not a single word",
                bad
            )));
        }

        let keywords = [
            ("current_timestamp", &self.current_timestamp),
            ("current_date", &self.current_date),
            ("interval_keyword", &self.interval_keyword),
            ("truncate_function", &self.truncate_function),
            ("date_function", &self.date_function),
            ("coalesce_function", &self.coalesce_function),
            ("returning_clause", &self.returning_clause),
            ("true_literal", &self.true_literal),
            ("false_literal", &self.false_literal),
        ];
        for (name, value) in keywords {
            if value.trim().is_empty() {
                return Err(PortError::config(format!("{} must not be empty", name)));
            }
        }

        if !self
            .returning_clause
            .trim_start()
            .to_ascii_uppercase()
            .starts_with("RETURNING")
        {
            return Err(PortError::config(
                "returning_clause must start with RETURNING",
            ));
        }

        Ok(())
    }
}

/// Settings for file discovery and write-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// File extensions picked up when walking directories.
    pub extensions: Vec<String>,
    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
    /// Write `<file><backup_suffix>` before overwriting a file.
    pub backup: bool,
    pub backup_suffix: String,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            extensions: ["js", "ts", "mjs", "cjs"]
                .into_iter()
                .map(String::from)
                .collect(),
            skip_dirs: ["node_modules", ".git", "target", "dist", "vendor", "__pycache__"]
                .into_iter()
                .map(String::from)
                .collect(),
            backup: true,
            backup_suffix: ".backup".to_string(),
        }
    }
}

impl DriverConfig {
    /// Whether a directory name is on the skip list.
    pub fn skips_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }

    /// Whether a file path has one of the configured extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Full configuration as read from `pgport.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialect: DialectConfig,
    pub driver: DriverConfig,
}

impl Config {
    /// Parse a configuration document.
    pub fn from_toml(content: &str) -> PortResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.dialect.validate()?;
        if config.driver.backup_suffix.is_empty() {
            return Err(PortError::config("backup_suffix must not be empty"));
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(path: &Path) -> PortResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| PortError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Resolve configuration.
    ///
    /// An explicit path must exist. Otherwise `./pgport.toml` and then the
    /// user config directory are tried, falling back to defaults.
    pub fn load(explicit: Option<&Path>) -> PortResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading explicit config");
            return Self::from_file(path);
        }

        for candidate in Self::default_locations() {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading config");
                return Self::from_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Locations searched when no explicit config is given, in order.
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("pgport").join("config.toml"));
        }
        paths
    }
}
