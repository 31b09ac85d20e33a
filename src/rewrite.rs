//! Forward-scan rewriting shared by the passes.

use crate::result::Condition;

/// Output of one pass over a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    /// Number of sites actually changed.
    pub count: usize,
    pub conditions: Vec<Condition>,
}

impl Rewrite {
    /// A pass that changed nothing.
    pub fn unchanged(text: &str) -> Self {
        Self {
            text: text.to_string(),
            count: 0,
            conditions: Vec::new(),
        }
    }
}

/// Identifier character for word-boundary checks (SQL and JS identifiers).
pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// 1-indexed line number of a byte offset.
pub(crate) fn line_at(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

/// Walk `text` once, left to right.
///
/// At every char boundary `attempt(offset, previous_char, rest)` may claim
/// a prefix of `rest` by returning how many bytes it consumed and what to
/// emit instead. Unclaimed characters are copied through. A claim whose
/// replacement equals the consumed text is not counted.
pub(crate) fn rewrite_matches<F>(text: &str, mut attempt: F) -> Rewrite
where
    F: FnMut(usize, Option<char>, &str) -> Option<(usize, String)>,
{
    let mut out = String::with_capacity(text.len() + 16);
    let mut count = 0;
    let mut prev: Option<char> = None;
    let mut idx = 0;

    while idx < text.len() {
        let rest = &text[idx..];

        if let Some((consumed, replacement)) = attempt(idx, prev, rest)
            && consumed > 0
            && consumed <= rest.len()
        {
            let matched = &rest[..consumed];
            if replacement != matched {
                count += 1;
            }
            out.push_str(&replacement);
            prev = matched.chars().next_back();
            idx += consumed;
            continue;
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        prev = Some(ch);
        idx += ch.len_utf8();
    }

    Rewrite {
        text: out,
        count,
        conditions: Vec::new(),
    }
}
