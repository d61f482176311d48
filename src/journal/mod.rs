//! Change journal: transactions, their logs, and read-side access.

mod change_log;
pub mod file;
mod transaction;

pub use change_log::{ChangeLog, LogStats};
pub use transaction::Transaction;

use crate::error::{ChangeError, Result};
use crate::json::JsonPath;
use crate::path::NodePath;
use crate::store::{Listing, Store};
use serde_json::Value;

/// Read-only queries against a store. Never touches a change log.
pub struct Reader<'s, S: Store + ?Sized> {
    store: &'s S,
}

impl<'s, S: Store + ?Sized> Reader<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn list<P: AsRef<str>>(&self, parent: &[P]) -> Result<Listing> {
        Ok(self.store.list(&NodePath::new(parent)?)?)
    }

    /// All descendants as full paths, parents before children.
    pub fn list_deep<P: AsRef<str>>(&self, parent: &[P]) -> Result<Listing> {
        Ok(self.store.list_deep(&NodePath::new(parent)?)?)
    }

    pub fn exist_file<P: AsRef<str>>(&self, parent: &[P], name: &str) -> Result<bool> {
        Ok(self.store.exist_file(&NodePath::new(parent)?, name)?)
    }

    /// Loads the document `parent/name` and passes it to `block`.
    pub fn read<P, T, F>(&self, parent: &[P], name: &str, block: F) -> Result<T>
    where
        P: AsRef<str>,
        F: FnOnce(&JsonReader<'_>) -> Result<T>,
    {
        let doc = self.store.read_file(&NodePath::new(parent)?, name)?;
        block(&JsonReader::new(&doc))
    }
}

/// Read access to one loaded document.
#[derive(Debug, Clone, Copy)]
pub struct JsonReader<'a> {
    doc: &'a Value,
}

impl<'a> JsonReader<'a> {
    pub fn new(doc: &'a Value) -> Self {
        Self { doc }
    }

    /// Node at `path`, if present.
    pub fn get(&self, path: &JsonPath) -> Option<&'a Value> {
        path.get(self.doc)
    }

    pub fn document(&self) -> &'a Value {
        self.doc
    }
}

/// Reverts `changes` against `store`, most recent first.
///
/// Each reverted change is removed from the log. On failure the failing
/// change is kept, so the log still lists exactly what remains applied.
pub fn revert_log<S: Store + ?Sized>(store: &mut S, changes: &mut ChangeLog) -> Result<()> {
    let total = changes.len();
    log::info!("Reverting {} change(s)...", total);

    while let Some(change) = changes.pop() {
        if let Err(e) = change.revert(store) {
            log::warn!("Failed to revert '{}': {}", change, e);
            changes.push(change);
            return Err(ChangeError::RevertFailed {
                remaining: changes.len(),
                source: Box::new(e),
            });
        }
    }

    log::info!("Revert completed");
    Ok(())
}
