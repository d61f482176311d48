//! Point-write tracking for one in-memory JSON document.
//!
//! [`JsonTracker`] mutates the document it borrows and records a
//! before/after pair for every write that actually changes a node. It never
//! touches the store; the transaction turns the recorded pairs into
//! `JsonEdit` changes and persists the document once.
//!
//! A write that has to create or reshape containers is recorded at the
//! shallowest node it changes (see [`JsonPath::reshaped_prefix`]), so writing
//! `from` back at the recorded path undoes the whole write.

use super::JsonPath;
use crate::error::Result;
use serde_json::{Map, Value};

/// One recorded write.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonChange {
    pub path: JsonPath,
    pub from: Value,
    pub to: Value,
}

/// Records granular edits made to a borrowed document.
#[derive(Debug)]
pub struct JsonTracker<'a> {
    doc: &'a mut Value,
    changes: Vec<JsonChange>,
}

impl<'a> JsonTracker<'a> {
    pub fn new(doc: &'a mut Value) -> Self {
        Self {
            doc,
            changes: Vec::new(),
        }
    }

    /// Current value at `path`.
    pub fn get(&self, path: &JsonPath) -> Option<&Value> {
        path.get(&*self.doc)
    }

    /// Writes `value` at `path`.
    ///
    /// An absent node counts as `null` when deciding whether anything changed.
    pub fn set_scalar(&mut self, path: JsonPath, value: impl Into<Value>) -> Result<&mut Self> {
        self.write(path, value.into())
    }

    /// Writes an empty array at `path`.
    pub fn set_array(&mut self, path: JsonPath) -> Result<&mut Self> {
        self.write(path, Value::Array(Vec::new()))
    }

    /// Writes an empty object at `path`.
    pub fn set_dictionary(&mut self, path: JsonPath) -> Result<&mut Self> {
        self.write(path, Value::Object(Map::new()))
    }

    pub fn changes(&self) -> &[JsonChange] {
        &self.changes
    }

    pub fn into_changes(self) -> Vec<JsonChange> {
        self.changes
    }

    fn write(&mut self, path: JsonPath, value: Value) -> Result<&mut Self> {
        if path.get(&*self.doc).unwrap_or(&Value::Null) == &value {
            log::debug!("Unchanged value at {}, skipping", path);
            return Ok(self);
        }

        let anchor = path.reshaped_prefix(&*self.doc);
        let from = anchor.get(&*self.doc).cloned().unwrap_or(Value::Null);
        path.set(self.doc, value)?;
        let to = anchor.get(&*self.doc).cloned().unwrap_or(Value::Null);

        if anchor != path {
            log::debug!("Write to {} reshapes {}", path, anchor);
        }
        self.changes.push(JsonChange {
            path: anchor,
            from,
            to,
        });
        Ok(self)
    }
}
