//! Date/time and null-handling function translation.
//!
//! | Source                              | Target                                   |
//! |-------------------------------------|------------------------------------------|
//! | `datetime('now')`                   | `CURRENT_TIMESTAMP`                      |
//! | `datetime('now', '+7 days')`        | `CURRENT_TIMESTAMP + INTERVAL '7 days'`  |
//! | `datetime('now', '-2 hours')`       | `CURRENT_TIMESTAMP - INTERVAL '2 hours'` |
//! | `date('now', 'start of month')`     | `DATE_TRUNC('month', CURRENT_DATE)`      |
//! | `date('now')`                       | `CURRENT_DATE`                           |
//! | `date(created_at)`                  | `DATE(created_at)`                       |
//! | `IFNULL(a, b)`                      | `COALESCE(a, b)`                         |
//!
//! Matching runs over the whole text, not just literals. Calls with a
//! `'now'` argument are always tried before the bare `date(` rename, and
//! every rule requires a word boundary in front of the function name.
//! Inside a `'`-delimited host literal the quotes of an emitted interval
//! are backslash-escaped so the literal stays intact.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case},
    character::complete::{char, digit1, multispace0, multispace1, one_of},
    combinator::{all_consuming, opt, value, verify},
    sequence::{delimited, preceded, terminated, tuple},
};

use crate::config::DialectConfig;
use crate::rewrite::{Rewrite, is_ident_char, rewrite_matches};
use crate::scanner::{LiteralScanner, LiteralSpan};

/// Which `now`-style function was called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NowFn {
    DateTime,
    Date,
}

/// A recognised call.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call<'a> {
    Now(NowFn),
    NowOffset {
        func: NowFn,
        negative: bool,
        magnitude: &'a str,
        unit: &'a str,
    },
    StartOfMonth,
    IfNull,
    /// `date(` with an arbitrary argument; only the name is rewritten.
    BareDate,
}

/// Translates function calls according to a [`DialectConfig`].
pub struct FunctionTranslator<'c> {
    config: &'c DialectConfig,
}

impl<'c> FunctionTranslator<'c> {
    pub fn new(config: &'c DialectConfig) -> Self {
        Self { config }
    }

    /// Rewrite every recognised call in `text`.
    pub fn translate(&self, text: &str) -> Rewrite {
        if !text.contains('(') {
            return Rewrite::unchanged(text);
        }

        let spans: Vec<LiteralSpan> = LiteralScanner::multiline(text).collect();

        rewrite_matches(text, |offset, prev, rest| {
            if prev.is_some_and(|c| is_ident_char(c) || c == '.') {
                return None;
            }
            if !rest.starts_with(['d', 'D', 'i', 'I']) {
                return None;
            }
            let (remaining, call) = function_call(rest).ok()?;
            let mut rendered = self.render(&call);
            if enclosing_quote(&spans, offset) == Some('\'') {
                rendered = rendered.replace('\'', "\\'");
            }
            Some((rest.len() - remaining.len(), rendered))
        })
    }

    fn render(&self, call: &Call<'_>) -> String {
        let c = self.config;
        match call {
            Call::Now(NowFn::DateTime) => c.current_timestamp.clone(),
            Call::Now(NowFn::Date) => c.current_date.clone(),
            Call::NowOffset {
                func,
                negative,
                magnitude,
                unit,
            } => {
                let base = match func {
                    NowFn::DateTime => &c.current_timestamp,
                    NowFn::Date => &c.current_date,
                };
                let op = if *negative { '-' } else { '+' };
                format!(
                    "{} {} {} '{} {}'",
                    base, op, c.interval_keyword, magnitude, unit
                )
            }
            Call::StartOfMonth => {
                format!("{}('month', {})", c.truncate_function, c.current_date)
            }
            Call::IfNull => format!("{}(", c.coalesce_function),
            Call::BareDate => format!("{}(", c.date_function),
        }
    }
}

/// Quote character of the literal containing `offset`, if any.
fn enclosing_quote(spans: &[LiteralSpan], offset: usize) -> Option<char> {
    let idx = spans.partition_point(|s| s.end <= offset);
    spans
        .get(idx)
        .filter(|s| s.start < offset)
        .map(|s| s.quote)
}

/// Any recognised call, most specific first.
fn function_call(input: &str) -> IResult<&str, Call<'_>> {
    alt((now_call, ifnull_open, bare_date_open))(input)
}

/// `datetime(` / `date(` followed by a `'now'` argument and an optional
/// modifier.
fn now_call(input: &str) -> IResult<&str, Call<'_>> {
    let (input, func) = alt((
        value(NowFn::DateTime, tag_no_case("datetime")),
        value(NowFn::Date, tag_no_case("date")),
    ))(input)?;
    let (input, _) = tuple((multispace0, char('('), multispace0))(input)?;
    let (input, _) = verify(quoted, |s: &str| s.trim().eq_ignore_ascii_case("now"))(input)?;
    let (input, modifier) = opt(preceded(
        delimited(multispace0, char(','), multispace0),
        quoted,
    ))(input)?;
    let (input, _) = preceded(multispace0, char(')'))(input)?;

    let Some(modifier) = modifier else {
        return Ok((input, Call::Now(func)));
    };

    if let Ok((_, ())) = start_of_month(modifier) {
        return Ok((input, Call::StartOfMonth));
    }

    let (_, (negative, magnitude, unit)) = offset(modifier).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Verify))
    })?;

    Ok((
        input,
        Call::NowOffset {
            func,
            negative,
            magnitude,
            unit,
        },
    ))
}

/// Content of a `'...'` or `"..."` argument.
fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), is_not("'"), char('\'')),
        delimited(char('"'), is_not("\""), char('"')),
    ))(input)
}

/// `+7 days`, `-3 hours`, `1 day`.
fn offset(modifier: &str) -> IResult<&str, (bool, &str, &str)> {
    let (rest, (_, sign, magnitude, _, unit, _)) = all_consuming(tuple((
        multispace0,
        opt(one_of("+-")),
        digit1,
        multispace1,
        alt((
            tag_no_case("days"),
            tag_no_case("day"),
            tag_no_case("hours"),
            tag_no_case("hour"),
        )),
        multispace0,
    )))(modifier)?;
    Ok((rest, (sign == Some('-'), magnitude, unit)))
}

/// `start of month`, any case and spacing.
fn start_of_month(modifier: &str) -> IResult<&str, ()> {
    value(
        (),
        all_consuming(tuple((
            multispace0,
            tag_no_case("start"),
            multispace1,
            tag_no_case("of"),
            multispace1,
            tag_no_case("month"),
            multispace0,
        ))),
    )(modifier)
}

/// `IFNULL (`, any case.
fn ifnull_open(input: &str) -> IResult<&str, Call<'_>> {
    value(
        Call::IfNull,
        terminated(tag_no_case("ifnull"), preceded(multispace0, char('('))),
    )(input)
}

/// Lower-case `date(` only: `Date(` is far more often host-language code.
fn bare_date_open(input: &str) -> IResult<&str, Call<'_>> {
    value(Call::BareDate, terminated(tag("date"), char('(')))(input)
}
