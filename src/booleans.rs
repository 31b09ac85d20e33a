//! Integer-to-boolean literal normalization.
//!
//! Only three shapes are rewritten:
//!
//! - `is_active = 1` (assignment or equality on a boolean field)
//! - `[is_active, 1]` (a two-element parameter pair)
//! - `flag ? 1 : 0` (collapsed to `flag`), when `flag` is the whole
//!   condition and the whole operand
//!
//! Every other `0` or `1` is left as it is. Missing a boolean is fine;
//! rewriting an unrelated integer is not.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{eof, not, peek, recognize, value, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};

use crate::config::DialectConfig;
use crate::rewrite::{Rewrite, is_ident_char, rewrite_matches};
use crate::scanner::QUOTE_CHARS;

/// A recognised boolean site: text to keep before and after the digit.
struct Site<'a> {
    lead: &'a str,
    bit: char,
    trail: &'a str,
}

/// Rewrites boolean contexts for the fields of a [`DialectConfig`].
pub struct BooleanNormalizer<'c> {
    config: &'c DialectConfig,
}

impl<'c> BooleanNormalizer<'c> {
    pub fn new(config: &'c DialectConfig) -> Self {
        Self { config }
    }

    /// Rewrite every recognised boolean site in `text`.
    pub fn normalize(&self, text: &str) -> Rewrite {
        rewrite_matches(text, |offset, prev, rest| {
            if prev.is_some_and(is_ident_char) {
                return None;
            }

            if let Ok((remaining, site)) = alt((
                |i| self.assignment(i),
                |i| self.param_pair(i),
            ))(rest)
            {
                let literal = match site.bit {
                    '1' => &self.config.true_literal,
                    _ => &self.config.false_literal,
                };
                let replacement = format!("{}{}{}", site.lead, literal, site.trail);
                return Some((rest.len() - remaining.len(), replacement));
            }

            if prev == Some('.') || !opens_condition(&text[..offset]) {
                return None;
            }
            let (remaining, condition) = ternary(rest).ok()?;
            Some((rest.len() - remaining.len(), condition.to_string()))
        })
    }

    /// A whole identifier that is a configured boolean field.
    fn field<'a>(&self, input: &'a str) -> IResult<&'a str, &'a str> {
        verify(take_while1(is_ident_char), |name: &str| {
            self.config.is_boolean_field(name)
        })(input)
    }

    /// `field = 1`, but not `field == 1`.
    fn assignment<'a>(&self, input: &'a str) -> IResult<&'a str, Site<'a>> {
        let (rest, lead) = recognize(tuple((
            |i| self.field(i),
            multispace0,
            char('='),
            not(char('=')),
            multispace0,
        )))(input)?;
        let (rest, bit) = bit(rest)?;
        Ok((rest, Site { lead, bit, trail: "" }))
    }

    /// `[field, 1]`, the field optionally quoted.
    fn param_pair<'a>(&self, input: &'a str) -> IResult<&'a str, Site<'a>> {
        let (rest, lead) = recognize(tuple((
            char('['),
            multispace0,
            |i| self.maybe_quoted_field(i),
            multispace0,
            char(','),
            multispace0,
        )))(input)?;
        let (rest, bit) = bit(rest)?;
        let (rest, trail) = recognize(pair(multispace0, char(']')))(rest)?;
        Ok((rest, Site { lead, bit, trail }))
    }

    fn maybe_quoted_field<'a>(&self, input: &'a str) -> IResult<&'a str, &'a str> {
        for quote in QUOTE_CHARS {
            if let Ok(found) = delimited(char(quote), |i| self.field(i), char(quote))(input) {
                return Ok(found);
            }
        }
        self.field(input)
    }
}

/// A lone `0` or `1`, not part of a longer number or identifier.
fn bit(input: &str) -> IResult<&str, char> {
    let (rest, digit) = one_of("01")(input)?;
    let (rest, _) = not(peek(satisfy(|c| is_ident_char(c) || c == '.')))(rest)?;
    Ok((rest, digit))
}

/// Whether an identifier preceded by `before` starts a whole condition:
/// nothing but whitespace and `!` between it and an opening delimiter,
/// separator or assignment.
fn opens_condition(before: &str) -> bool {
    before
        .trim_end_matches(|c: char| c.is_whitespace() || c == '!')
        .chars()
        .next_back()
        .is_none_or(|c| matches!(c, '(' | '[' | ',' | '=' | ':' | '{' | ';'))
}

/// `cond ? 1 : 0`, where `cond` is a possibly dotted identifier and the
/// expression ends at a closing delimiter, separator or end of text.
/// Yields `cond`.
fn ternary(input: &str) -> IResult<&str, &str> {
    let (rest, condition) = identifier_path(input)?;
    let (rest, _) = tuple((
        multispace0,
        char('?'),
        multispace0,
        tag("1"),
        multispace0,
        char(':'),
        multispace0,
        tag("0"),
    ))(rest)?;
    let (rest, _) = peek(preceded(
        multispace0,
        alt((value((), eof), value((), one_of(")],;}")))),
    ))(rest)?;
    Ok((rest, condition))
}

fn identifier_path(input: &str) -> IResult<&str, &str> {
    let segment = || {
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic() || c == '_' || c == '$'),
            many0(satisfy(is_ident_char)),
        ))
    };
    recognize(pair(segment(), many0(preceded(char('.'), segment()))))(input)
}
