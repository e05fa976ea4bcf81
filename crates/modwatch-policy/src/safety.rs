//! Static ReDoS safety validation for rule patterns
//!
//! Patterns are checked before compilation, not at match time. The check
//! rejects quantified groups whose body itself contains an unbounded
//! quantifier — the `(a+)+` family that backtracks exponentially on
//! crafted input.

use regex::{Regex, RegexBuilder};

use crate::rule::ParseError;

/// Maximum accepted pattern length
pub const MAX_PATTERN_LEN: usize = 100;

/// Compiled-size ceiling handed to the regex engine
const REGEX_SIZE_LIMIT: usize = 1 << 16;

/// Validate a pattern source without compiling it.
pub fn check_pattern(pattern: &str) -> Result<(), ParseError> {
    if pattern.is_empty() {
        return Err(ParseError::UnsafePattern {
            pattern: pattern.to_string(),
            reason: "empty pattern".to_string(),
        });
    }
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(ParseError::UnsafePattern {
            pattern: pattern.to_string(),
            reason: format!("longer than {} bytes", MAX_PATTERN_LEN),
        });
    }
    if let Some(reason) = nested_unbounded_quantifier(pattern) {
        return Err(ParseError::UnsafePattern {
            pattern: pattern.to_string(),
            reason,
        });
    }
    Ok(())
}

/// Validate and compile a pattern source.
///
/// Compilation is case-insensitive and capped by a size limit so even an
/// accepted pattern cannot expand into an oversized automaton.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ParseError> {
    check_pattern(pattern)?;
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| ParseError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Scan for a quantified group containing an unbounded quantifier.
///
/// Tracks group nesting with a stack, skips escaped characters and
/// character classes. Returns a description of the offending construct.
fn nested_unbounded_quantifier(pattern: &str) -> Option<String> {
    let bytes = pattern.as_bytes();
    let mut stack: Vec<usize> = Vec::new();
    let mut in_class = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'(' if !in_class => stack.push(i),
            b')' if !in_class => {
                if let Some(start) = stack.pop() {
                    if unbounded_quantifier_at(bytes, i + 1) {
                        let body = &pattern[start + 1..i];
                        if contains_unbounded_quantifier(body) {
                            return Some(format!(
                                "unbounded quantifier nested inside quantified group '({})'",
                                body
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// Whether the quantifier starting at `pos` (if any) has no upper bound
fn unbounded_quantifier_at(bytes: &[u8], pos: usize) -> bool {
    match bytes.get(pos) {
        Some(b'*') | Some(b'+') => true,
        Some(b'{') => {
            // `{n,}` is unbounded; `{n}` and `{n,m}` are not
            let rest = &bytes[pos + 1..];
            if let Some(close) = rest.iter().position(|&b| b == b'}') {
                rest[..close].ends_with(b",")
            } else {
                false
            }
        }
        _ => false,
    }
}

/// Whether a group body holds an unescaped unbounded quantifier
fn contains_unbounded_quantifier(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut in_class = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'[' if !in_class => in_class = true,
            b']' if in_class => in_class = false,
            b'*' | b'+' if !in_class => return true,
            b'{' if !in_class => {
                if unbounded_quantifier_at(bytes, i) {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}
