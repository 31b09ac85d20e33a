//! RETURNING clause injection for INSERT statements.
//!
//! `INSERT INTO users (name) VALUES ($1)` becomes
//! `INSERT INTO users (name) VALUES ($1) RETURNING id`. Statements that
//! already return something are left alone, so repeated runs add the
//! clause at most once. When the host code continues the statement in a
//! concatenated literal (`'... VALUES ($1) ' + 'ON CONFLICT ...'`), that
//! literal is part of the statement too.

use nom::{
    IResult,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{char, multispace0, multispace1, one_of},
    combinator::recognize,
    multi::many0,
    sequence::{delimited, preceded, tuple},
};
use tracing::warn;

use crate::config::DialectConfig;
use crate::result::Condition;
use crate::rewrite::{Rewrite, is_ident_char, line_at, rewrite_matches};
use crate::scanner::QUOTE_CHARS;

/// Outcome of looking at one `INSERT INTO` site.
#[derive(Debug, PartialEq, Eq)]
enum InsertMatch {
    /// Header and value list matched; `len` bytes cover the whole statement
    /// up to the end of the last value tuple.
    Complete { len: usize },
    /// Header matched but the value list cannot be delimited safely.
    Ambiguous,
}

/// Appends the configured RETURNING clause to complete INSERT statements.
pub struct ReturningInjector<'c> {
    config: &'c DialectConfig,
}

impl<'c> ReturningInjector<'c> {
    pub fn new(config: &'c DialectConfig) -> Self {
        Self { config }
    }

    /// Inject the clause into every eligible INSERT in `text`.
    pub fn inject(&self, text: &str) -> Rewrite {
        let mut conditions = Vec::new();

        let mut rw = rewrite_matches(text, |offset, prev, rest| {
            if prev.is_some_and(is_ident_char) || !rest.starts_with(['i', 'I']) {
                return None;
            }

            let ambiguous = |conditions: &mut Vec<Condition>| {
                let line = line_at(text, offset);
                warn!(line, "INSERT value list is ambiguous; RETURNING not added");
                conditions.push(Condition::ambiguous_insert(line));
            };

            match insert_statement(rest)? {
                InsertMatch::Ambiguous => {
                    ambiguous(&mut conditions);
                    None
                }
                InsertMatch::Complete { len } => {
                    let statement = &rest[..len];
                    let tail = statement_tail(&rest[len..]);
                    let continued = continued_literal(&rest[len + tail.len()..]);

                    if contains_returning(statement)
                        || contains_returning(tail)
                        || continued.is_some_and(contains_returning)
                    {
                        return None;
                    }
                    if !tail.trim().is_empty() || continued.is_some() {
                        ambiguous(&mut conditions);
                        return None;
                    }
                    Some((len, format!("{} {}", statement, self.config.returning_clause)))
                }
            }
        });

        rw.conditions = conditions;
        rw
    }
}

/// Match `INSERT INTO name (cols) VALUES (...)[, (...)]*` at the start of
/// `input`. `None` when this is not an insert with explicit lists at all.
fn insert_statement(input: &str) -> Option<InsertMatch> {
    let (after_header, _) = header(input).ok()?;

    match value_tuples(after_header) {
        Ok((rest, _)) => Some(InsertMatch::Complete {
            len: input.len() - rest.len(),
        }),
        Err(_) => Some(InsertMatch::Ambiguous),
    }
}

/// `INSERT INTO name (cols) VALUES`, up to the first value tuple.
fn header(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        tag_no_case("insert"),
        multispace1,
        tag_no_case("into"),
        multispace1,
        take_while1(|c: char| is_ident_char(c) || c == '.' || c == '"'),
        multispace0,
        delimited(
            char('('),
            take_while1(|c: char| {
                is_ident_char(c) || c == ',' || c == '"' || c.is_whitespace()
            }),
            char(')'),
        ),
        multispace0,
        tag_no_case("values"),
        multispace0,
    )))(input)
}

/// One or more `(...)` tuples separated by commas. A tuple may not contain
/// parentheses or a statement terminator.
fn value_tuples(input: &str) -> IResult<&str, &str> {
    let tuple_body = || {
        delimited(
            char('('),
            take_while(|c: char| !matches!(c, '(' | ')' | ';')),
            char(')'),
        )
    };
    recognize(preceded(
        tuple_body(),
        many0(preceded(
            delimited(multispace0, char(','), multispace0),
            tuple_body(),
        )),
    ))(input)
}

/// Text after the value list up to the end of the statement: the first
/// `;`, quote character, or end of input.
fn statement_tail(rest: &str) -> &str {
    let end = rest
        .find(|c: char| c == ';' || QUOTE_CHARS.contains(&c))
        .unwrap_or(rest.len());
    &rest[..end]
}

/// What the host code appends to the literal ending at `rest`.
///
/// `' +\n  'RETURNING id'` yields `RETURNING id`. Concatenating anything
/// other than a literal yields an empty continuation, and `None` means the
/// statement ends with the literal.
fn continued_literal(rest: &str) -> Option<&str> {
    let joined: IResult<&str, _> = tuple((
        one_of("'\"`"),
        multispace0,
        char('+'),
        multispace0,
    ))(rest);
    let (next, _) = joined.ok()?;

    let Some(quote) = next.chars().next().filter(|c| QUOTE_CHARS.contains(c)) else {
        return Some("");
    };
    let body = &next[quote.len_utf8()..];
    Some(&body[..body.find(quote).unwrap_or(body.len())])
}

fn contains_returning(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    upper.match_indices("RETURNING").any(|(idx, word)| {
        let before = upper[..idx].chars().next_back();
        let after = upper[idx + word.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}
