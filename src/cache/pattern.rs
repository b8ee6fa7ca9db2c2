//! Key Pattern Module
//!
//! Redis-style glob matching for `keys(pattern)` on the in-process cache.
//! Supports `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes.

use regex::Regex;

use crate::error::{CacheError, Result};

// == Key Pattern ==
/// Compiled glob pattern.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
}

impl KeyPattern {
    // == Constructor ==
    /// Compiles a glob pattern.
    ///
    /// Fails on an unterminated or empty character class.
    pub fn new(pattern: &str) -> Result<Self> {
        let source = glob_to_regex(pattern)?;
        let regex = Regex::new(&source)
            .map_err(|e| CacheError::InvalidPattern(format!("{}: {}", pattern, e)))?;
        Ok(Self { regex })
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

fn glob_to_regex(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("(?s:.*)"),
            '?' => out.push_str("(?s:.)"),
            '\\' => match chars.next() {
                Some(escaped) => push_literal(&mut out, escaped),
                None => push_literal(&mut out, '\\'),
            },
            '[' => push_class(&mut out, &mut chars, pattern)?,
            other => push_literal(&mut out, other),
        }
    }

    out.push('$');
    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

fn push_class(out: &mut String, chars: &mut std::str::Chars<'_>, pattern: &str) -> Result<()> {
    let mut members: Vec<(char, bool)> = Vec::new();
    let mut negated = false;
    let mut closed = false;

    while let Some(c) = chars.next() {
        match c {
            ']' => {
                closed = true;
                break;
            }
            '^' if members.is_empty() && !negated => negated = true,
            '\\' => {
                let escaped = chars.next().unwrap_or('\\');
                members.push((escaped, true));
            }
            other => members.push((other, false)),
        }
    }

    if !closed {
        return Err(CacheError::InvalidPattern(format!(
            "unterminated character class in '{}'",
            pattern
        )));
    }
    if members.is_empty() {
        return Err(CacheError::InvalidPattern(format!(
            "empty character class in '{}'",
            pattern
        )));
    }

    out.push('[');
    if negated {
        out.push('^');
    }
    let last = members.len() - 1;
    for (index, (c, escaped)) in members.into_iter().enumerate() {
        let is_range_dash = c == '-' && !escaped && index != 0 && index != last;
        if is_range_dash {
            out.push(c);
        } else {
            push_literal(out, c);
        }
    }
    out.push(']');
    Ok(())
}
