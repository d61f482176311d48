//! JSON addressing helpers.
//!
//! Documents are plain [`serde_json::Value`]s (built with `preserve_order`, so
//! objects keep insertion order while comparing structurally). A [`JsonPath`]
//! addresses one node by repeated descent; the empty path is the document root.

pub mod tracker;

pub use tracker::{JsonChange, JsonTracker};

use crate::error::{ChangeError, Result};
use serde_json::{Map, Value};
use std::fmt;

/// Largest number of `null` elements a single write may pad an array with.
pub const MAX_ARRAY_PADDING: usize = 1024;

/// One addressing step inside a JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexLiteral {
    /// Object member selector.
    Key(String),
    /// Array element selector.
    Index(usize),
}

impl IndexLiteral {
    /// Single-string form used in records: `k<key>` or `i<index>`.
    pub fn encode(&self) -> String {
        match self {
            IndexLiteral::Key(key) => format!("k{}", key),
            IndexLiteral::Index(index) => format!("i{}", index),
        }
    }

    /// Parses the form produced by [`IndexLiteral::encode`].
    pub fn decode(encoded: &str) -> Option<Self> {
        if let Some(key) = encoded.strip_prefix('k') {
            return Some(IndexLiteral::Key(key.to_string()));
        }
        let digits = encoded.strip_prefix('i')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(IndexLiteral::Index)
    }
}

impl From<&str> for IndexLiteral {
    fn from(key: &str) -> Self {
        IndexLiteral::Key(key.to_string())
    }
}

impl From<String> for IndexLiteral {
    fn from(key: String) -> Self {
        IndexLiteral::Key(key)
    }
}

impl From<usize> for IndexLiteral {
    fn from(index: usize) -> Self {
        IndexLiteral::Index(index)
    }
}

impl fmt::Display for IndexLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexLiteral::Key(key) => write!(f, "{}", key),
            IndexLiteral::Index(index) => write!(f, "[{}]", index),
        }
    }
}

/// Ordered list of steps addressing a single node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(Vec<IndexLiteral>);

impl JsonPath {
    pub fn new(steps: Vec<IndexLiteral>) -> Self {
        Self(steps)
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn steps(&self) -> &[IndexLiteral] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Encodes every step with [`IndexLiteral::encode`].
    pub fn encode(&self) -> Vec<String> {
        self.0.iter().map(IndexLiteral::encode).collect()
    }

    /// Decodes encoded steps; `None` if any step is malformed.
    pub fn decode<S: AsRef<str>>(encoded: &[S]) -> Option<Self> {
        encoded
            .iter()
            .map(|s| IndexLiteral::decode(s.as_ref()))
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    /// Parses a dotted path such as `items.0.name`.
    ///
    /// Purely numeric steps address array elements.
    pub fn parse_dotted(dotted: &str) -> Self {
        let steps = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|step| match step.parse::<usize>() {
                Ok(index) if step.bytes().all(|b| b.is_ascii_digit()) => {
                    IndexLiteral::Index(index)
                }
                _ => IndexLiteral::Key(step.to_string()),
            })
            .collect();
        Self(steps)
    }

    /// Returns the node at this path, if present.
    pub fn get<'a>(&self, doc: &'a Value) -> Option<&'a Value> {
        let mut current = doc;
        for step in &self.0 {
            current = match (step, current) {
                (IndexLiteral::Key(key), Value::Object(map)) => map.get(key)?,
                (IndexLiteral::Index(index), Value::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Shortest prefix of this path whose node a write here would create
    /// or reshape.
    ///
    /// Descends while each step exists in `doc`. A missing member yields the
    /// path to that member; an index past the end of an array, or a node of
    /// the wrong container kind, yields the path to that node. When every
    /// step exists the whole path is returned.
    pub fn reshaped_prefix(&self, doc: &Value) -> JsonPath {
        let mut current = doc;
        for (depth, step) in self.0.iter().enumerate() {
            current = match (step, current) {
                (IndexLiteral::Key(key), Value::Object(map)) => match map.get(key) {
                    Some(next) => next,
                    None => return Self(self.0[..=depth].to_vec()),
                },
                (IndexLiteral::Index(index), Value::Array(items)) => match items.get(*index) {
                    Some(next) => next,
                    None => return Self(self.0[..depth].to_vec()),
                },
                _ => return Self(self.0[..depth].to_vec()),
            };
        }
        self.clone()
    }

    /// Fails if a write here would pad an array past [`MAX_ARRAY_PADDING`].
    fn check_padding(&self, doc: &Value) -> Result<()> {
        let mut current = Some(doc);
        for step in &self.0 {
            current = match step {
                IndexLiteral::Key(key) => current.and_then(|node| node.get(key.as_str())),
                IndexLiteral::Index(index) => {
                    let items = current.and_then(Value::as_array);
                    let len = items.map_or(0, Vec::len);
                    if index.saturating_sub(len) > MAX_ARRAY_PADDING {
                        return Err(ChangeError::InvalidPath(
                            self.to_string(),
                            format!(
                                "index {} is more than {} past the end of its array",
                                index, MAX_ARRAY_PADDING
                            ),
                        ));
                    }
                    items.and_then(|items| items.get(*index))
                }
            };
        }
        Ok(())
    }

    /// Writes `value` at this path.
    ///
    /// Missing containers along the way are created; a node of the wrong
    /// container kind is replaced. Arrays are padded with `null`, by at most
    /// [`MAX_ARRAY_PADDING`] elements. On error `doc` is left untouched.
    pub fn set(&self, doc: &mut Value, value: Value) -> Result<()> {
        self.check_padding(doc)?;

        let mut current = doc;
        for step in &self.0 {
            current = match step {
                IndexLiteral::Key(key) => {
                    if !current.is_object() {
                        *current = Value::Object(Map::new());
                    }
                    match current {
                        Value::Object(map) => map.entry(key.clone()).or_insert(Value::Null),
                        _ => unreachable!("node was just made an object"),
                    }
                }
                IndexLiteral::Index(index) => {
                    if !current.is_array() {
                        *current = Value::Array(Vec::new());
                    }
                    match current {
                        Value::Array(items) => {
                            if items.len() <= *index {
                                items.resize(*index + 1, Value::Null);
                            }
                            &mut items[*index]
                        }
                        _ => unreachable!("node was just made an array"),
                    }
                }
            };
        }
        *current = value;
        Ok(())
    }
}

impl<T: Into<IndexLiteral>> FromIterator<T> for JsonPath {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for step in &self.0 {
            match step {
                IndexLiteral::Key(key) => write!(f, ".{}", key)?,
                IndexLiteral::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Builds a [`JsonPath`] from a mix of keys and indices.
///
/// ```
/// use json_file_change::json_path;
///
/// let path = json_path!["items", 0usize, "name"];
/// assert_eq!(path.steps().len(), 3);
/// ```
#[macro_export]
macro_rules! json_path {
    () => { $crate::json::JsonPath::root() };
    ($($step:expr),+ $(,)?) => {
        $crate::json::JsonPath::new(vec![$($crate::json::IndexLiteral::from($step)),+])
    };
}

/// Compact serialization with object keys sorted at every level.
///
/// Two structurally equal values always produce the same string.
pub fn to_sorted_string(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.clone(), sorted(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
