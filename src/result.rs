//! Per-file conversion outcome.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pass produced a rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    Placeholders,
    Functions,
    Booleans,
    Returning,
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::Placeholders => write!(f, "placeholders"),
            PassKind::Functions => write!(f, "functions"),
            PassKind::Booleans => write!(f, "booleans"),
            PassKind::Returning => write!(f, "returning"),
        }
    }
}

/// A spot the engine deliberately left alone for manual follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// A quote opened and never closed; placeholders after it stay `?`.
    UnterminatedLiteral,
    /// An INSERT whose value list could not be delimited; no RETURNING added.
    AmbiguousInsertMatch,
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionKind::UnterminatedLiteral => write!(f, "unterminated literal"),
            ConditionKind::AmbiguousInsertMatch => write!(f, "ambiguous insert"),
        }
    }
}

/// A recorded condition with its 1-indexed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub kind: ConditionKind,
    pub line: usize,
}

impl Condition {
    pub fn unterminated_literal(line: usize) -> Self {
        Self {
            kind: ConditionKind::UnterminatedLiteral,
            line,
        }
    }

    pub fn ambiguous_insert(line: usize) -> Self {
        Self {
            kind: ConditionKind::AmbiguousInsertMatch,
            line,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}", self.kind, self.line)
    }
}

/// Summary of one file's conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub changed: bool,
    pub placeholders: usize,
    pub functions: usize,
    pub booleans: usize,
    pub returning: usize,
    pub conditions: Vec<Condition>,
}

impl ConversionResult {
    /// Count for a single pass.
    pub fn count(&self, kind: PassKind) -> usize {
        match kind {
            PassKind::Placeholders => self.placeholders,
            PassKind::Functions => self.functions,
            PassKind::Booleans => self.booleans,
            PassKind::Returning => self.returning,
        }
    }

    /// Sum of all rewrites.
    pub fn total(&self) -> usize {
        self.placeholders + self.functions + self.booleans + self.returning
    }

    /// Whether any condition of `kind` was recorded.
    pub fn has(&self, kind: ConditionKind) -> bool {
        self.conditions.iter().any(|c| c.kind == kind)
    }
}
