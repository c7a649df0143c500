//! Pattern parsing and compilation.
//!
//! A pattern is a `/`-separated list of segments:
//!
//! | Segment | Meaning |
//! |---------|---------|
//! | `hoge` | Literal, must appear verbatim |
//! | `:id` | Captures exactly one path segment as `id` |
//! | `*params` | Captures the rest of the path (zero or more segments) as `params` |
//!
//! Empty segments are ignored, so `:controller/:action/` and
//! `:controller/:action` are the same pattern.

use regex::Regex;

use crate::error::{MapperError, Result};
use crate::route::{Defaults, Rules};

const DEFAULT_CAPTURE: &str = "[^/]+";
const DEFAULT_WILDCARD: &str = ".+";

/// One parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Matches the text verbatim.
    Literal(String),
    /// Captures a single path segment.
    Capture(String),
    /// Captures the remaining path, slashes included.
    Wildcard(String),
}

impl Segment {
    /// The capture name, or `None` for literals.
    pub fn name(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Capture(name) | Segment::Wildcard(name) => Some(name),
        }
    }
}

/// Splits a pattern into segments, validating capture names.
pub fn parse(pattern: &str) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut seen_wildcard = false;

    for raw in pattern.split('/').filter(|s| !s.is_empty()) {
        let segment = if let Some(name) = raw.strip_prefix(':') {
            Segment::Capture(valid_name(name)?)
        } else if let Some(name) = raw.strip_prefix('*') {
            if seen_wildcard {
                return Err(MapperError::MisplacedWildcard(pattern.to_string()));
            }
            seen_wildcard = true;
            Segment::Wildcard(valid_name(name)?)
        } else {
            Segment::Literal(raw.to_string())
        };
        segments.push(segment);
    }

    Ok(segments)
}

fn valid_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let head_ok = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(name.to_string())
    } else {
        Err(MapperError::InvalidSegmentName(name.to_string()))
    }
}

/// Index of the first segment that may be omitted from a path.
///
/// A segment is optional when it and every segment after it is either a
/// wildcard or a capture with a non-null default value.
fn first_optional(segments: &[Segment], defaults: &Defaults) -> usize {
    let mut first = segments.len();
    for (i, segment) in segments.iter().enumerate().rev() {
        let optional = match segment {
            Segment::Literal(_) => false,
            Segment::Capture(name) => defaults.get(name).is_some(),
            Segment::Wildcard(_) => true,
        };
        if !optional {
            break;
        }
        first = i;
    }
    first
}

/// Compiles segments into an anchored expression.
///
/// Capture groups are named `g<index>` after the segment position so that
/// arbitrary capture names never clash with regex group syntax.
pub fn compile(segments: &[Segment], defaults: &Defaults, rules: &Rules) -> Result<Regex> {
    let mut pieces = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let sep = if i == 0 { "" } else { "/" };
        let body = match segment {
            Segment::Literal(text) => regex::escape(text),
            Segment::Capture(name) => {
                format!("(?P<g{i}>{})", segment_rule(name, rules, DEFAULT_CAPTURE)?)
            }
            Segment::Wildcard(name) => {
                format!("(?P<g{i}>{})", segment_rule(name, rules, DEFAULT_WILDCARD)?)
            }
        };
        pieces.push(format!("{sep}{body}"));
    }

    let split = first_optional(segments, defaults);
    let mut tail = String::new();
    for piece in pieces[split..].iter().rev() {
        tail = format!("(?:{piece}{tail})?");
    }
    let head: String = pieces[..split].concat();

    Ok(Regex::new(&format!("^{head}{tail}$"))?)
}

fn segment_rule(name: &str, rules: &Rules, fallback: &str) -> Result<String> {
    match rules.get(name) {
        Some(rule) => checked_rule(name, rule),
        None => Ok(fallback.to_string()),
    }
}

/// Validates a user rule and wraps it for splicing.
///
/// The whole route is anchored, so a leading `^` and a trailing `$` on the
/// rule are dropped rather than left to anchor mid-expression.
fn checked_rule(name: &str, rule: &str) -> Result<String> {
    let rule = rule.strip_prefix('^').unwrap_or(rule);
    let rule = match rule.strip_suffix('$') {
        Some(inner) if !inner.ends_with('\\') => inner,
        _ => rule,
    };
    let wrapped = format!("(?:{rule})");
    Regex::new(&wrapped).map_err(|source| MapperError::InvalidRule {
        name: name.to_string(),
        source,
    })?;
    Ok(wrapped)
}
