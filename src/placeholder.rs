//! Placeholder renumbering.
//!
//! Rewrites `?` bind markers inside string literals to `$1`, `$2`, ...
//! Numbering is per literal: every literal is its own statement. Only
//! literals that read as SQL (see [`DialectConfig::is_sql`]) are touched,
//! so URLs, prompts and regex text keep their `?`.

use tracing::warn;

use crate::config::{DialectConfig, LiteralScope};
use crate::result::Condition;
use crate::rewrite::{Rewrite, line_at};
use crate::scanner::LiteralScanner;

/// Renumber the placeholders of one literal's content.
///
/// Each `?` receives the next number, so a repeated marker still gets two
/// distinct numbers. `?NNN` keeps its explicit number. Existing `$N` tokens
/// count as converted: new numbers continue after the highest one, which
/// makes a fully converted literal a no-op. In backtick literals, `${...}`
/// substitutions are code and are copied through untouched.
///
/// Returns the rewritten content and how many markers were replaced.
pub fn renumber(content: &str, quote: char) -> (String, usize) {
    if !content.contains('?') {
        return (content.to_string(), 0);
    }

    let mut next = highest_numbered(content) + 1;
    let mut out = String::with_capacity(content.len() + 8);
    let mut count = 0;
    let mut chars = content.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '$' if quote == '`' && content[idx + 1..].starts_with('{') => {
                let end = substitution_end(content, idx);
                out.push_str(&content[idx..end]);
                while chars.next_if(|&(i, _)| i < end).is_some() {}
            }
            '?' => {
                let digits: String = std::iter::from_fn(|| {
                    chars.next_if(|&(_, c)| c.is_ascii_digit()).map(|(_, c)| c)
                })
                .collect();

                out.push('$');
                if digits.is_empty() {
                    out.push_str(&next.to_string());
                    next += 1;
                } else {
                    out.push_str(&digits);
                }
                count += 1;
            }
            _ => out.push(ch),
        }
    }

    (out, count)
}

/// PostgreSQL accepts at most this many bind parameters per statement.
const MAX_PARAMETER: usize = 65_535;

/// Highest `$N` already present, or 0. Tokens past [`MAX_PARAMETER`] are
/// not bind parameters and are ignored.
fn highest_numbered(content: &str) -> usize {
    content
        .split('$')
        .skip(1)
        .filter_map(|tail| {
            let end = tail
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(tail.len());
            tail[..end].parse::<usize>().ok()
        })
        .filter(|&n| n <= MAX_PARAMETER)
        .max()
        .unwrap_or(0)
}

/// Byte offset just past the `}` closing the `${` at `start`.
fn substitution_end(content: &str, start: usize) -> usize {
    let mut depth = 0usize;
    for (idx, ch) in content[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return start + idx + 1;
                }
            }
            _ => {}
        }
    }
    content.len()
}

/// Renumber placeholders in every SQL literal of `text`.
///
/// With [`LiteralScope::Line`] each line is scanned on its own; with
/// [`LiteralScope::Statement`] the whole text is one window. Literals left
/// open keep their placeholders; they are reported as conditions when the
/// text they would have covered is SQL with a marker in it.
pub fn renumber_literals(text: &str, config: &DialectConfig) -> Rewrite {
    match config.literal_scope {
        LiteralScope::Statement => {
            let (out, count, open) = renumber_window(text, true, config);
            Rewrite {
                text: out,
                count,
                conditions: unterminated_conditions(text, &open, config),
            }
        }
        LiteralScope::Line => {
            let mut out = String::with_capacity(text.len() + 16);
            let mut count = 0;
            let mut open = Vec::new();
            let mut line_start = 0;

            for line in text.split_inclusive('\n') {
                if line.contains(['?', '`']) {
                    let (converted, replaced, unclosed) = renumber_window(line, false, config);
                    out.push_str(&converted);
                    count += replaced;
                    open.extend(unclosed.into_iter().map(|offset| line_start + offset));
                } else {
                    out.push_str(line);
                }
                line_start += line.len();
            }

            Rewrite {
                text: out,
                count,
                conditions: unterminated_conditions(text, &open, config),
            }
        }
    }
}

/// One scanner pass over `window`. Returns the rewritten window, the number
/// of markers replaced and the window offsets of literals left open.
fn renumber_window(
    window: &str,
    multiline: bool,
    config: &DialectConfig,
) -> (String, usize, Vec<usize>) {
    let mut scanner = if multiline {
        LiteralScanner::multiline(window)
    } else {
        LiteralScanner::new(window)
    };

    let mut out = String::with_capacity(window.len() + 16);
    let mut count = 0;
    let mut cursor = 0;

    for span in scanner.by_ref() {
        let content = span.content(window);
        if !content.contains('?') || !config.is_sql(content) {
            continue;
        }
        let range = span.content_range();
        let (converted, replaced) = renumber(content, span.quote);
        out.push_str(&window[cursor..range.start]);
        out.push_str(&converted);
        cursor = range.end;
        count += replaced;
    }
    out.push_str(&window[cursor..]);

    (out, count, scanner.unterminated().to_vec())
}

/// Conditions for the literals opened at `offsets` in `text` and never
/// closed.
fn unterminated_conditions(text: &str, offsets: &[usize], config: &DialectConfig) -> Vec<Condition> {
    offsets
        .iter()
        .filter(|&&offset| loses_placeholders(&text[offset..], config))
        .map(|&offset| {
            let line = line_at(text, offset);
            warn!(line, "unterminated literal; placeholders left unconverted");
            Condition::unterminated_literal(line)
        })
        .collect()
}

/// Whether an unterminated literal starting at `rest` is worth reporting:
/// the text it would have covered is SQL holding a marker. A backtick
/// literal would have run to the next backtick, any other to the line end.
fn loses_placeholders(rest: &str, config: &DialectConfig) -> bool {
    let Some(quote) = rest.chars().next() else {
        return false;
    };
    let body = &rest[quote.len_utf8()..];
    let end = if quote == '`' {
        body.find('`')
    } else {
        body.find('\n')
    };
    let covered = &body[..end.unwrap_or(body.len())];
    covered.contains('?') && config.is_sql(covered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ConditionKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequential_numbering() {
        let (out, n) = renumber("SELECT * FROM t WHERE a = ? AND b = ?", '\'');
        assert_eq!(out, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_repeated_marker_gets_distinct_numbers() {
        let (out, _) = renumber("WHERE a = ? OR a = ?", '"');
        assert_eq!(out, "WHERE a = $1 OR a = $2");
    }

    #[test]
    fn test_converted_content_is_noop() {
        let (out, n) = renumber("WHERE a = $1 AND b = $2", '\'');
        assert_eq!(out, "WHERE a = $1 AND b = $2");
        assert_eq!(n, 0);
    }

    #[test]
    fn test_mixed_content_continues_numbering() {
        let (out, n) = renumber("WHERE a = $1 AND b = ?", '\'');
        assert_eq!(out, "WHERE a = $1 AND b = $2");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_explicit_number_kept() {
        let (out, n) = renumber("WHERE a = ?2 AND b = ?1", '\'');
        assert_eq!(out, "WHERE a = $2 AND b = $1");
        assert_eq!(n, 2);
    }

    #[test]
    fn test_template_substitution_untouched() {
        let (out, n) = renumber("SELECT * FROM ${a ? 'x' : 'y'} WHERE id = ?", '`');
        assert_eq!(out, "SELECT * FROM ${a ? 'x' : 'y'} WHERE id = $1");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_out_of_range_number_is_not_a_parameter() {
        let (out, n) = renumber("WHERE a = $18446744073709551615 AND b = ?", '\'');
        assert_eq!(out, "WHERE a = $18446744073709551615 AND b = $1");
        assert_eq!(n, 1);

        let (out, _) = renumber("WHERE a = $65535 AND b = ?", '\'');
        assert_eq!(out, "WHERE a = $65535 AND b = $65536");
    }

    fn line_scoped(text: &str) -> Rewrite {
        renumber_literals(text, &DialectConfig::default())
    }

    fn statement_scoped(text: &str) -> Rewrite {
        let config = DialectConfig::default().with_literal_scope(LiteralScope::Statement);
        renumber_literals(text, &config)
    }

    #[test]
    fn test_numbering_restarts_per_literal() {
        let rw = line_scoped(
            "db.run('UPDATE t SET a = ? WHERE id = ?'); db.get('SELECT ? FROM t')",
        );
        assert_eq!(
            rw.text,
            "db.run('UPDATE t SET a = $1 WHERE id = $2'); db.get('SELECT $1 FROM t')"
        );
        assert_eq!(rw.count, 3);
    }

    #[test]
    fn test_question_mark_outside_literal_untouched() {
        let rw = line_scoped("const q = ok ? 'SELECT a FROM t WHERE b = ?' : 'b';");
        assert_eq!(rw.text, "const q = ok ? 'SELECT a FROM t WHERE b = $1' : 'b';");
        assert_eq!(rw.count, 1);
    }

    #[test]
    fn test_non_sql_literals_untouched() {
        let text = "res.redirect('/login?next=' + url);\n\
                    alert(\"Are you sure?\");\n\
                    jsonText.replace(/```json\\n?/g, '').replace(/```/g, '');\n\
                    fetch(`/api/items?page=${page}`);";
        let rw = line_scoped(text);
        assert_eq!(rw.text, text);
        assert_eq!(rw.count, 0);
        assert!(rw.conditions.is_empty());
    }

    #[test]
    fn test_lowercase_sql_is_recognised() {
        let rw = line_scoped("db.get('select * from t where id = ?')");
        assert_eq!(rw.text, "db.get('select * from t where id = $1')");
    }

    #[test]
    fn test_unterminated_line_reported() {
        let text = "ok('SELECT ?')\ndb.run('UPDATE t SET a = ?\nnext('DELETE FROM t WHERE id = ?')";
        let rw = line_scoped(text);
        assert_eq!(
            rw.text,
            "ok('SELECT $1')\ndb.run('UPDATE t SET a = ?\nnext('DELETE FROM t WHERE id = $1')"
        );
        assert_eq!(rw.conditions.len(), 1);
        assert_eq!(rw.conditions[0].kind, ConditionKind::UnterminatedLiteral);
        assert_eq!(rw.conditions[0].line, 2);
    }

    #[test]
    fn test_statement_scope_spans_lines() {
        let text = "db.query(`\n  SELECT * FROM t\n  WHERE a = ? AND b = ?\n`, [a, b]);";
        let line = line_scoped(text);
        assert_eq!(line.text, text);
        assert_eq!(line.conditions, vec![Condition::unterminated_literal(1)]);

        let stmt = statement_scoped(text);
        assert_eq!(
            stmt.text,
            "db.query(`\n  SELECT * FROM t\n  WHERE a = $1 AND b = $2\n`, [a, b]);"
        );
        assert!(stmt.conditions.is_empty());
    }

    #[test]
    fn test_open_template_without_sql_not_reported() {
        let rw = line_scoped("const html = `\n  <p>Continue?</p>\n`;");
        assert!(rw.conditions.is_empty());
    }

    #[test]
    fn test_stray_apostrophe_not_reported() {
        let rw = line_scoped("// don't touch\nq('SELECT ?')");
        assert_eq!(rw.text, "// don't touch\nq('SELECT $1')");
        assert!(rw.conditions.is_empty());
    }

    #[test]
    fn test_statement_scope_reports_opening_line() {
        let text = "a('x')\nb(`SELECT ?\nFROM t";
        let rw = statement_scoped(text);
        assert_eq!(rw.text, text);
        assert_eq!(rw.conditions, vec![Condition::unterminated_literal(2)]);
    }
}
