//! # pgport
//!
//! > **Move embedded SQLite queries to PostgreSQL without touching the code around them.**
//!
//! pgport rewrites SQL that lives inside string literals of application
//! source files:
//!
//! | SQLite                               | PostgreSQL                              |
//! |--------------------------------------|-----------------------------------------|
//! | `WHERE a = ? AND b = ?`              | `WHERE a = $1 AND b = $2`               |
//! | `datetime('now', '+7 days')`         | `CURRENT_TIMESTAMP + INTERVAL '7 days'` |
//! | `IFNULL(x, 0)`                       | `COALESCE(x, 0)`                        |
//! | `is_active = 1`, `[is_active, 1]`    | `is_active = true`, `[is_active, true]` |
//! | `INSERT INTO t (a) VALUES (?)`       | `INSERT INTO t (a) VALUES ($1) RETURNING id` |
//!
//! ## Quick Example
//!
//! ```
//! let out = pgport::convert("db.query('SELECT * FROM t WHERE a=? AND b=?')");
//! assert_eq!(out.text, "db.query('SELECT * FROM t WHERE a=$1 AND b=$2')");
//! assert_eq!(out.result.placeholders, 2);
//! ```
//!
//! The engine is not a SQL parser. Anything outside its rule set is left
//! verbatim, and spots it refuses to guess about are reported as
//! [`Condition`](result::Condition)s for manual review.

pub mod booleans;
pub mod config;
pub mod driver;
pub mod error;
pub mod functions;
pub mod pipeline;
pub mod placeholder;
pub mod report;
pub mod result;
pub mod returning;
pub mod rewrite;
pub mod scanner;

pub mod prelude {
    pub use crate::config::{Config, DialectConfig, DriverConfig, LiteralScope};
    pub use crate::driver::{FileOutcome, FileReport, RunReport, SourceFile, WriteMode};
    pub use crate::error::*;
    pub use crate::pipeline::{Conversion, Converter, Pass};
    pub use crate::result::{Condition, ConditionKind, ConversionResult, PassKind};
}

/// Convert text with the default dialect configuration.
///
/// # Example
///
/// ```
/// let out = pgport::convert("db.run('INSERT INTO users (name) VALUES (?)', [name])");
/// assert_eq!(
///     out.text,
///     "db.run('INSERT INTO users (name) VALUES ($1) RETURNING id', [name])"
/// );
/// ```
pub fn convert(text: &str) -> pipeline::Conversion {
    pipeline::Converter::default().convert(text)
}
