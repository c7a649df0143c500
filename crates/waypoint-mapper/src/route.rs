//! Routes, their defaults and rules, and match results.

use regex::Regex;

use crate::error::Result;
use crate::pattern::{self, Segment};

/// Ordered default values for route captures.
///
/// A default may be `None` (null): the key is reported in every match, but a
/// null default does not make its segment optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Defaults {
    entries: Vec<(String, Option<String>)>,
}

impl Defaults {
    /// Creates an empty default set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a default value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key.into(), Some(value.into()));
        self
    }

    /// Adds or replaces a null default.
    pub fn with_null(mut self, key: impl Into<String>) -> Self {
        self.set(key.into(), None);
        self
    }

    /// Adds or replaces a default which may be null.
    pub fn with_opt(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.set(key.into(), value);
        self
    }

    fn set(&mut self, key: String, value: Option<String>) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the non-null default for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns true if `key` has a default, null or not.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Defaults {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Defaults::new(), |acc, (k, v)| acc.with_opt(k, v))
    }
}

/// Per-segment validation rules.
///
/// Each rule is a regular expression that must match the whole capture, for
/// `:name` and `*name` segments alike. Rules are implicitly anchored; an
/// explicit leading `^` or trailing `$` is accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rules {
    entries: Vec<(String, String)>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrains the capture `name` to `regex`.
    pub fn with(mut self, name: impl Into<String>, regex: impl Into<String>) -> Self {
        let name = name.into();
        let regex = regex.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = regex,
            None => self.entries.push((name, regex)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The outcome of matching a path against a route.
///
/// Keys keep the order in which the route declared them: defaults first,
/// then captures that the defaults did not mention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    values: Vec<(String, Option<String>)>,
}

impl RouteMatch {
    fn insert(&mut self, key: &str, value: Option<String>) {
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key.to_string(), value)),
        }
    }

    /// Returns the value for `key`; `None` if missing or null.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns true if the key is present, even with a null value.
    pub fn contains(&self, key: &str) -> bool {
        self.values.iter().any(|(k, _)| k == key)
    }

    /// Removes `key`, returning its value if it was present and non-null.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let index = self.values.iter().position(|(k, _)| k == key)?;
        self.values.remove(index).1
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl IntoIterator for RouteMatch {
    type Item = (String, Option<String>);
    type IntoIter = std::vec::IntoIter<(String, Option<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A registered pattern with its defaults and compiled expression.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: String,
    segments: Vec<Segment>,
    defaults: Defaults,
    regex: Regex,
}

impl Route {
    /// Parses and compiles a route.
    pub fn new(pattern: &str, defaults: Defaults, rules: &Rules) -> Result<Self> {
        let segments = pattern::parse(pattern)?;
        let regex = pattern::compile(&segments, &defaults, rules)?;
        Ok(Self {
            pattern: pattern.to_string(),
            segments,
            defaults,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Matches a normalized path (no leading or trailing `/`).
    ///
    /// Omitted optional captures and empty wildcards fall back to their
    /// defaults; a capture with neither value nor default is left out.
    pub fn matches(&self, path: &str) -> Option<RouteMatch> {
        let caps = self.regex.captures(path)?;

        let mut result = RouteMatch::default();
        for (key, value) in self.defaults.iter() {
            result.insert(key, value.map(str::to_string));
        }

        for (i, segment) in self.segments.iter().enumerate() {
            let Some(name) = segment.name() else {
                continue;
            };
            let value = caps
                .name(&format!("g{i}"))
                .map(|m| m.as_str())
                .filter(|v| !v.is_empty());
            if let Some(value) = value {
                result.insert(name, Some(value.to_string()));
            }
        }

        Some(result)
    }
}
