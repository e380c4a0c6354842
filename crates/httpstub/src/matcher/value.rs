//! Compiled facet matchers.
//!
//! Descriptor builders compile raw pattern strings into these forms once, at
//! registration time; runtime matching never re-parses a pattern.

use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// A regex compiled for full matching: the pattern only matches when it spans
/// the entire candidate value.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `source`, anchoring it so partial matches do not count.
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// The pattern as the caller wrote it, without the added anchors.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Matcher for a single string facet (path, query value, content type).
#[derive(Debug, Clone)]
pub enum ValueMatch {
    /// Literal, byte-for-byte equality.
    Exact(String),
    /// Anchored regular expression.
    Pattern(CompiledPattern),
}

impl ValueMatch {
    pub fn exact(value: impl Into<String>) -> Self {
        ValueMatch::Exact(value.into())
    }

    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(ValueMatch::Pattern(CompiledPattern::compile(source)?))
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            ValueMatch::Exact(expected) => expected == value,
            ValueMatch::Pattern(pattern) => pattern.is_full_match(value),
        }
    }
}

/// Matcher for a named header.
#[derive(Debug, Clone)]
pub enum HeaderMatch {
    /// Header must be present and its value must satisfy the matcher.
    Value(ValueMatch),
    /// Header must not appear on the request at all.
    Absent,
}

/// Matcher for the (decoded) request body.
#[derive(Clone)]
pub enum BodyMatch {
    /// Literal equality against the full body text.
    Exact(String),
    /// Anchored regular expression over the full body text.
    Pattern(CompiledPattern),
    /// Structural JSON equality: the body parses as JSON and equals this
    /// value. Key order and whitespace are irrelevant.
    Json(serde_json::Value),
    /// Arbitrary predicate over the body text.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl BodyMatch {
    pub fn matches(&self, body: &str) -> bool {
        match self {
            BodyMatch::Exact(expected) => expected == body,
            BodyMatch::Pattern(pattern) => pattern.is_full_match(body),
            BodyMatch::Json(expected) => serde_json::from_str::<serde_json::Value>(body)
                .map(|actual| actual == *expected)
                .unwrap_or(false),
            BodyMatch::Predicate(predicate) => predicate(body),
        }
    }
}

impl fmt::Debug for BodyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyMatch::Exact(expected) => f.debug_tuple("Exact").field(expected).finish(),
            BodyMatch::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.source).finish(),
            BodyMatch::Json(expected) => f.debug_tuple("Json").field(expected).finish(),
            BodyMatch::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}
