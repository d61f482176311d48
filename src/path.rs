//! Store paths.
//!
//! A path is the list of folder names leading from the store root to a node.
//! Its canonical form is the `/`-joined string; [`NodePath::new`] always goes
//! through that form so that `["a", "", "b"]` and `["a/b"]` end up as the same
//! `["a", "b"]` value.

use crate::error::{ChangeError, Result};
use std::fmt;

/// Separator used by the canonical joined form.
pub const SEPARATOR: char = '/';

/// Joins segments into the canonical string form.
pub fn reduce_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits a canonical string back into segments, dropping empty ones.
pub fn components(joined: &str) -> Vec<String> {
    joined
        .split(SEPARATOR)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a joined full path into its parent segments and final name.
///
/// Returns `None` for the root.
pub fn split_parent_name(joined: &str) -> Option<(Vec<String>, String)> {
    let mut parts = components(joined);
    let name = parts.pop()?;
    Some((parts, name))
}

/// Normalized ancestry of a node, root being the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath(Vec<String>);

impl NodePath {
    /// Normalizes `segments` by reducing them to the joined form and splitting again.
    pub fn new<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
        Self::parse(&reduce_path(segments))
    }

    /// Parses a canonical joined string.
    pub fn parse(joined: &str) -> Result<Self> {
        let segments = components(joined);
        for segment in &segments {
            if segment == ".." {
                return Err(ChangeError::InvalidPath(
                    joined.to_string(),
                    "resolves outside the store root".to_string(),
                ));
            }
            if segment == "." {
                return Err(ChangeError::InvalidPath(
                    joined.to_string(),
                    "relative segments are not allowed".to_string(),
                ));
            }
        }
        Ok(Self(segments))
    }

    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Canonical joined form.
    pub fn joined(&self) -> String {
        self.0.join("/")
    }

    /// Path of the child `name` below this path.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        Self(segments)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.joined())
    }
}

/// Rejects empty names and names that would split into several segments.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ChangeError::InvalidPath(
            name.to_string(),
            "name cannot be empty".to_string(),
        ));
    }

    if name.contains(SEPARATOR) {
        return Err(ChangeError::InvalidPath(
            name.to_string(),
            format!("name cannot contain '{}'", SEPARATOR),
        ));
    }

    if name == "." || name == ".." {
        return Err(ChangeError::InvalidPath(
            name.to_string(),
            "name cannot be a relative segment".to_string(),
        ));
    }

    Ok(())
}
