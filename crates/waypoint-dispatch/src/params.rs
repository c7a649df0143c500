//! Request parameter resolution.
//!
//! Parameters reach a handler from several sources, merged in a fixed order
//! where later sources replace earlier ones key by key:
//!
//! ```text
//! residual path pairs   (params capture, "key/value/key2")
//!   → query parameters
//!   → body parameters
//!   → other named route captures     (done by the dispatcher)
//!   → dispatcher default parameters  (done by the dispatcher, always wins)
//! ```
//!
//! Every string value has its NUL bytes removed before a handler sees it.

use serde_json::{Map, Value};

/// Ordered parameter map handed to handlers.
pub type Params = Map<String, Value>;

/// The `params` capture of a route match.
#[derive(Debug, Clone, PartialEq)]
pub enum Residual {
    /// Unparsed `key/value/key2/...` path fragment.
    Path(String),
    /// Already keyed values.
    Map(Params),
}

impl From<&str> for Residual {
    fn from(path: &str) -> Self {
        Residual::Path(path.to_string())
    }
}

impl From<String> for Residual {
    fn from(path: String) -> Self {
        Residual::Path(path)
    }
}

impl From<Params> for Residual {
    fn from(map: Params) -> Self {
        Residual::Map(map)
    }
}

/// Builds a parameter map from key/value pairs.
///
/// ```rust
/// use waypoint_dispatch::params::from_pairs;
///
/// let params = from_pairs([("id", "7"), ("name", "foo")]);
/// assert_eq!(params["id"], "7");
/// ```
pub fn from_pairs<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Splits a residual path into key/value pairs.
///
/// A single leading `/` is dropped. Tokens at even positions are keys and
/// the token after each key is its value; a trailing key without a value
/// maps to `null`.
///
/// ```rust
/// use serde_json::Value;
/// use waypoint_dispatch::params::parse_pairs;
///
/// let params = parse_pairs("/key/value/key2");
/// assert_eq!(params["key"], "value");
/// assert_eq!(params["key2"], Value::Null);
/// ```
pub fn parse_pairs(path: &str) -> Params {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let tokens: Vec<&str> = trimmed.split('/').collect();

    tokens
        .chunks(2)
        .map(|pair| {
            let value = pair
                .get(1)
                .map_or(Value::Null, |v| Value::String((*v).to_string()));
            (pair[0].to_string(), value)
        })
        .collect()
}

/// Writes every entry of `top` into `base`.
///
/// Existing keys keep their position and take the new value; new keys are
/// appended.
pub fn overlay(base: &mut Params, top: Params) {
    for (key, value) in top {
        base.insert(key, value);
    }
}

/// Merges residual, query and body parameters.
///
/// Returns `None` when nothing was produced; callers treat that the same as
/// an empty map.
pub fn resolve(residual: Option<Residual>, query: &Params, body: &Params) -> Option<Params> {
    let mut merged = match residual {
        Some(Residual::Path(path)) => parse_pairs(&path),
        Some(Residual::Map(map)) => map,
        None => Params::new(),
    };

    overlay(&mut merged, query.clone());
    overlay(&mut merged, body.clone());
    strip_nul_bytes_in(&mut merged);

    if merged.is_empty() {
        None
    } else {
        Some(merged)
    }
}

/// Removes NUL bytes from every string inside `value`, recursing into
/// arrays and objects.
pub fn strip_nul_bytes(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.contains('\0') {
                s.retain(|c| c != '\0');
            }
        }
        Value::Array(items) => items.iter_mut().for_each(strip_nul_bytes),
        Value::Object(map) => map.values_mut().for_each(strip_nul_bytes),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// [`strip_nul_bytes`] over every value of a parameter map.
pub fn strip_nul_bytes_in(params: &mut Params) {
    params.values_mut().for_each(strip_nul_bytes);
}
