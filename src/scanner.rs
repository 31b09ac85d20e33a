//! Literal scanner.
//!
//! Finds the quoted regions of a piece of source text with a small
//! quote-tracking automaton, so that only placeholders inside string
//! literals are touched.
//!
//! ```
//! use pgport::scanner::LiteralScanner;
//!
//! let line = r#"db.query('SELECT * FROM t WHERE a = ?', [a])"#;
//! let spans: Vec<_> = LiteralScanner::new(line).collect();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].content(line), "SELECT * FROM t WHERE a = ?");
//! ```

use std::ops::Range;
use std::str::CharIndices;

/// Characters that open and close a literal.
pub const QUOTE_CHARS: [char; 3] = ['\'', '`', '"'];

/// A quoted region: `start` and `end` are the byte offsets of the opening
/// and closing quote, which are always the same character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiteralSpan {
    pub start: usize,
    pub end: usize,
    pub quote: char,
}

impl LiteralSpan {
    /// Byte range of the text between the quotes.
    pub fn content_range(&self) -> Range<usize> {
        self.start + self.quote.len_utf8()..self.end
    }

    /// The text between the quotes.
    pub fn content<'a>(&self, text: &'a str) -> &'a str {
        &text[self.content_range()]
    }
}

/// Lazy iterator over the literal spans of a text.
///
/// A quote preceded by an odd number of backslashes never opens or closes
/// a literal. Differing quote characters inside an open literal are plain
/// content. `'` and `"` literals cannot cross a newline; backtick literals
/// can only when the scanner is built with [`LiteralScanner::multiline`].
/// A literal left open yields no span; its opening offset is available from
/// [`LiteralScanner::unterminated`] once the iterator is exhausted.
pub struct LiteralScanner<'a> {
    chars: CharIndices<'a>,
    multiline: bool,
    open: Option<(usize, char)>,
    backslashes: usize,
    unterminated: Vec<usize>,
}

impl<'a> LiteralScanner<'a> {
    /// Scanner for a single line.
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.char_indices(),
            multiline: false,
            open: None,
            backslashes: 0,
            unterminated: Vec::new(),
        }
    }

    /// Scanner for a whole statement window where backtick literals may
    /// span lines.
    pub fn multiline(text: &'a str) -> Self {
        Self {
            multiline: true,
            ..Self::new(text)
        }
    }

    /// Opening offsets of literals that were never closed.
    pub fn unterminated(&self) -> &[usize] {
        &self.unterminated
    }

    fn crosses_newline(&self, quote: char) -> bool {
        self.multiline && quote == '`'
    }
}

impl Iterator for LiteralScanner<'_> {
    type Item = LiteralSpan;

    fn next(&mut self) -> Option<LiteralSpan> {
        while let Some((idx, ch)) = self.chars.next() {
            let escaped = self.backslashes % 2 == 1;
            self.backslashes = if ch == '\\' { self.backslashes + 1 } else { 0 };

            match self.open {
                None => {
                    if !escaped && QUOTE_CHARS.contains(&ch) {
                        self.open = Some((idx, ch));
                    }
                }
                Some((start, quote)) => {
                    if !escaped && ch == quote {
                        self.open = None;
                        return Some(LiteralSpan {
                            start,
                            end: idx,
                            quote,
                        });
                    }
                    if ch == '\n' && !self.crosses_newline(quote) {
                        self.unterminated.push(start);
                        self.open = None;
                    }
                }
            }
        }

        if let Some((start, _)) = self.open.take() {
            self.unterminated.push(start);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(text: &str) -> Vec<&str> {
        LiteralScanner::new(text).map(|s| s.content(text)).collect()
    }

    #[test]
    fn test_all_quote_kinds() {
        let line = r#"run('a ?', "b ?", `c ?`)"#;
        assert_eq!(contents(line), vec!["a ?", "b ?", "c ?"]);
    }

    #[test]
    fn test_nested_differing_quotes_are_content() {
        let line = r#"db.get("SELECT * FROM t WHERE s = 'x' AND id = ?")"#;
        assert_eq!(
            contents(line),
            vec!["SELECT * FROM t WHERE s = 'x' AND id = ?"]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_close() {
        let line = r#"x = 'it\'s ?' + y"#;
        assert_eq!(contents(line), vec![r"it\'s ?"]);
    }

    #[test]
    fn test_double_backslash_does_close() {
        let line = r#"x = 'path\\' + '?'"#;
        assert_eq!(contents(line), vec![r"path\\", "?"]);
    }

    #[test]
    fn test_escaped_quote_outside_literal_is_ignored() {
        let line = r#"re = /\'/; q = '?'"#;
        assert_eq!(contents(line), vec!["?"]);
    }

    #[test]
    fn test_unterminated_literal_yields_no_span() {
        let line = "db.run('UPDATE t SET a = ? WHERE b = ?";
        let mut scanner = LiteralScanner::new(line);
        assert_eq!(scanner.by_ref().count(), 0);
        assert_eq!(scanner.unterminated(), &[7]);
    }

    #[test]
    fn test_span_offsets_reference_quotes() {
        let line = "f('?')";
        let span = LiteralScanner::new(line).next().unwrap();
        assert_eq!(span, LiteralSpan { start: 2, end: 4, quote: '\'' });
        assert_eq!(&line[span.start..=span.start], "'");
        assert_eq!(&line[span.end..=span.end], "'");
    }

    #[test]
    fn test_single_quote_stops_at_newline() {
        let text = "a('x\nb('?')";
        let mut scanner = LiteralScanner::multiline(text);
        let spans: Vec<_> = scanner.by_ref().map(|s| s.content(text)).collect();
        assert_eq!(spans, vec!["?"]);
        assert_eq!(scanner.unterminated(), &[2]);
    }

    #[test]
    fn test_multiline_backtick() {
        let text = "db.query(`\n  SELECT *\n  FROM t WHERE id = ?\n`, [id])";
        let spans: Vec<_> = LiteralScanner::multiline(text)
            .map(|s| s.content(text))
            .collect();
        assert_eq!(spans, vec!["\n  SELECT *\n  FROM t WHERE id = ?\n"]);

        let mut line_mode = LiteralScanner::new(text);
        assert_eq!(line_mode.by_ref().count(), 0);
        assert_eq!(line_mode.unterminated().len(), 2);
    }
}
