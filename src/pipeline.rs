//! Conversion pipeline.
//!
//! Runs the passes over one file's text in a fixed order:
//!
//! 1. placeholders (literal-scoped)
//! 2. function calls
//! 3. boolean literals
//! 4. RETURNING clauses
//!
//! Each pass sees the complete output of the previous one. The pipeline is
//! pure: text in, text and a [`ConversionResult`] out.

use tracing::debug;

use crate::booleans::BooleanNormalizer;
use crate::config::DialectConfig;
use crate::error::PortResult;
use crate::functions::FunctionTranslator;
use crate::placeholder::renumber_literals;
use crate::result::{ConversionResult, PassKind};
use crate::returning::ReturningInjector;
use crate::rewrite::Rewrite;

/// A single rewriting pass.
pub trait Pass {
    /// Which counter this pass feeds.
    fn kind(&self) -> PassKind;

    /// Rewrite the full text.
    fn apply(&self, text: &str) -> Rewrite;
}

struct PlaceholderPass<'c>(&'c DialectConfig);

impl Pass for PlaceholderPass<'_> {
    fn kind(&self) -> PassKind {
        PassKind::Placeholders
    }

    fn apply(&self, text: &str) -> Rewrite {
        renumber_literals(text, self.0)
    }
}

impl Pass for FunctionTranslator<'_> {
    fn kind(&self) -> PassKind {
        PassKind::Functions
    }

    fn apply(&self, text: &str) -> Rewrite {
        self.translate(text)
    }
}

impl Pass for BooleanNormalizer<'_> {
    fn kind(&self) -> PassKind {
        PassKind::Booleans
    }

    fn apply(&self, text: &str) -> Rewrite {
        self.normalize(text)
    }
}

impl Pass for ReturningInjector<'_> {
    fn kind(&self) -> PassKind {
        PassKind::Returning
    }

    fn apply(&self, text: &str) -> Rewrite {
        self.inject(text)
    }
}

/// Converted text plus its summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub text: String,
    pub result: ConversionResult,
}

/// The conversion engine, built once from a configuration and reused for
/// every file.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    config: DialectConfig,
}

impl Converter {
    /// Build a converter, rejecting unusable configuration.
    pub fn new(config: DialectConfig) -> PortResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }

    /// The passes in execution order.
    fn passes(&self) -> [Box<dyn Pass + '_>; 4] {
        [
            Box::new(PlaceholderPass(&self.config)),
            Box::new(FunctionTranslator::new(&self.config)),
            Box::new(BooleanNormalizer::new(&self.config)),
            Box::new(ReturningInjector::new(&self.config)),
        ]
    }

    /// Convert one file's text.
    pub fn convert(&self, source: &str) -> Conversion {
        let mut text = source.to_string();
        let mut counts = [0usize; 4];
        let mut conditions = Vec::new();

        for (slot, pass) in self.passes().iter().enumerate() {
            let rw = pass.apply(&text);
            debug!(pass = %pass.kind(), count = rw.count, "pass applied");
            counts[slot] = rw.count;
            conditions.extend(rw.conditions);
            text = rw.text;
        }

        conditions.sort_by_key(|c| c.line);
        let [placeholders, functions, booleans, returning] = counts;
        let result = ConversionResult {
            changed: text != source,
            placeholders,
            functions,
            booleans,
            returning,
            conditions,
        };

        Conversion { text, result }
    }
}
