//! Flat, discriminator-tagged records.
//!
//! A [`Record`] is the persisted form of a change: a `classId` plus named
//! fields that are either a string or a list of strings. JSON values travel
//! as strings in sorted-key form. Records serialize to a single flat JSON
//! object:
//!
//! ```text
//! {"classId":3,"from":"a.txt","parent":"docs","to":"b.txt"}
//! ```

use crate::error::{ChangeError, Result};
use crate::path::components;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Field {
    Text(String),
    List(Vec<String>),
}

/// Serialized form of a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "classId")]
    class_id: i64,
    #[serde(flatten)]
    fields: BTreeMap<String, Field>,
}

impl Record {
    pub fn new(class_id: i64) -> Self {
        Self {
            class_id,
            fields: BTreeMap::new(),
        }
    }

    /// Adds a string field.
    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(name.to_string(), Field::Text(value.into()));
        self
    }

    /// Adds a list-of-strings field.
    pub fn with_list(mut self, name: &str, values: Vec<String>) -> Self {
        self.fields.insert(name.to_string(), Field::List(values));
        self
    }

    pub fn class_id(&self) -> i64 {
        self.class_id
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String field `name`.
    pub fn require_text(&self, name: &str) -> Result<&str> {
        match self.fields.get(name) {
            Some(Field::Text(value)) => Ok(value),
            _ => Err(ChangeError::MalformedRecord(name.to_string())),
        }
    }

    /// List field `name`.
    pub fn require_list(&self, name: &str) -> Result<&[String]> {
        match self.fields.get(name) {
            Some(Field::List(values)) => Ok(values),
            _ => Err(ChangeError::MalformedRecord(name.to_string())),
        }
    }

    /// String field `name` holding a `/`-joined path, split into segments.
    pub fn require_components(&self, name: &str) -> Result<Vec<String>> {
        self.require_text(name).map(components)
    }

    /// String field `name` holding a serialized JSON value.
    pub fn require_json(&self, name: &str) -> Result<Value> {
        let text = self.require_text(name)?;
        serde_json::from_str(text).map_err(|e| {
            log::debug!("Field '{}' is not valid JSON: {}", name, e);
            ChangeError::MalformedRecord(name.to_string())
        })
    }
}
