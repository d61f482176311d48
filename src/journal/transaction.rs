//! Write transactions over a store.
//!
//! A [`Transaction`] applies every operation to the store immediately and
//! appends the resulting changes to its [`ChangeLog`]. The log can be handed
//! back with [`Transaction::commit`] or undone with [`Transaction::revert`].
//!
//! ## Execution Guarantees
//!
//! - **Immediate**: each change is applied before it is logged
//! - **Prefix on failure**: a multi-step operation that fails midway leaves
//!   the log holding exactly the changes that succeeded
//! - **LIFO revert**: changes are undone from most recent to oldest
//! - **Idempotent edits**: JSON writes that change nothing are not logged
//!
//! ## Example
//!
//! ```
//! # use json_file_change::journal::Transaction;
//! # use json_file_change::store::MemoryStore;
//! # use json_file_change::json_path;
//! # fn example() -> json_file_change::Result<()> {
//! let root: [&str; 0] = [];
//! let mut store = MemoryStore::new();
//! let mut txn = Transaction::new(&mut store);
//!
//! txn.create_folder(&root, "docs")?;
//! txn.create_file(&["docs"], "a.json")?;
//! txn.edit_json(&["docs"], "a.json", |json| {
//!     json.set_scalar(json_path!["title"], "hello")?;
//!     Ok(())
//! })?;
//!
//! txn.revert()?; // Store is back to its initial state
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use super::{ChangeLog, JsonReader, Reader, revert_log};
use crate::change::Change;
use crate::error::{ChangeError, Result};
use crate::json::JsonTracker;
use crate::path::{NodePath, split_parent_name, validate_name};
use crate::store::{Listing, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    /// Accepting operations.
    Active,
    /// Log handed to the caller.
    Committed,
    /// All changes undone.
    RolledBack,
}

/// Write transaction recording every change it applies.
///
/// If dropped while active with changes applied, logs a warning; the
/// changes stay in the store.
#[must_use = "Transaction must be committed or reverted"]
pub struct Transaction<'s, S: Store + ?Sized> {
    store: &'s mut S,
    log: ChangeLog,
    state: TransactionState,
}

impl<'s, S: Store + ?Sized> Transaction<'s, S> {
    /// Starts a transaction with an empty log.
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            log: ChangeLog::new(),
            state: TransactionState::Active,
        }
    }

    fn ensure_active(&self) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(ChangeError::Closed);
        }
        Ok(())
    }

    /// Applies `change` and logs it once it succeeded.
    fn record(&mut self, change: Change) -> Result<()> {
        change.apply(&mut *self.store)?;
        self.log.push(change);
        Ok(())
    }

    pub fn create_file<P: AsRef<str>>(&mut self, parent: &[P], name: &str) -> Result<()> {
        self.ensure_active()?;
        self.record(Change::create_file(parent, name)?)
    }

    pub fn delete_file<P: AsRef<str>>(&mut self, parent: &[P], name: &str) -> Result<()> {
        self.ensure_active()?;
        self.record(Change::delete_file(parent, name)?)
    }

    pub fn rename_file<P: AsRef<str>>(
        &mut self,
        parent: &[P],
        from: &str,
        to: &str,
    ) -> Result<()> {
        self.ensure_active()?;
        self.record(Change::rename_file(parent, from, to)?)
    }

    pub fn create_folder<P: AsRef<str>>(&mut self, parent: &[P], name: &str) -> Result<()> {
        self.ensure_active()?;
        self.record(Change::create_folder(parent, name)?)
    }

    /// Deletes a folder and everything below it.
    ///
    /// Decomposes into one `DeleteFile` per descendant file, then one
    /// `DeleteFolder` per folder, deepest first, ending with the folder
    /// itself. Reverting the log recreates folders top-down before files.
    pub fn delete_folder<P: AsRef<str>>(&mut self, parent: &[P], name: &str) -> Result<()> {
        self.ensure_active()?;
        validate_name(name)?;
        let target = NodePath::new(parent)?.child(name);

        let listing = self.store.list_deep(&target)?;
        let mut folders = listing.folders;
        folders.insert(0, target.joined());

        log::debug!(
            "Deleting {}: {} file(s), {} folder(s)",
            target,
            listing.files.len(),
            folders.len()
        );

        for item in &listing.files {
            if let Some((parents, file)) = split_parent_name(item) {
                self.record(Change::delete_file(&parents, &file)?)?;
            }
        }

        for item in folders.iter().rev() {
            if let Some((parents, folder)) = split_parent_name(item) {
                self.record(Change::delete_folder(&parents, &folder)?)?;
            }
        }

        Ok(())
    }

    pub fn rename_folder<P: AsRef<str>>(
        &mut self,
        parent: &[P],
        from: &str,
        to: &str,
    ) -> Result<()> {
        self.ensure_active()?;
        self.record(Change::rename_folder(parent, from, to)?)
    }

    /// Edits the JSON document `parent/name` through a [`JsonTracker`].
    ///
    /// Every effective write becomes one `JsonEdit` change. The document is
    /// written back once, after `edit` returns; if `edit` fails nothing is
    /// written or logged.
    pub fn edit_json<P, F>(&mut self, parent: &[P], name: &str, edit: F) -> Result<()>
    where
        P: AsRef<str>,
        F: FnOnce(&mut JsonTracker<'_>) -> Result<()>,
    {
        self.ensure_active()?;
        validate_name(name)?;
        let parent = NodePath::new(parent)?;

        let mut doc = self.store.read_file(&parent, name)?;
        let mut tracker = JsonTracker::new(&mut doc);
        edit(&mut tracker)?;
        let edits = tracker.into_changes();

        if edits.is_empty() {
            log::debug!("No effective edits to {}", parent.child(name));
            return Ok(());
        }

        self.store.write_file(&parent, name, &doc)?;
        log::debug!("Wrote {} edit(s) to {}", edits.len(), parent.child(name));

        for change in edits {
            self.log.push(Change::JsonEdit {
                parent: parent.clone(),
                name: name.to_string(),
                path: change.path,
                from: change.from,
                to: change.to,
            });
        }
        Ok(())
    }

    fn reader(&self) -> Reader<'_, S> {
        Reader::new(&*self.store)
    }

    pub fn list<P: AsRef<str>>(&self, parent: &[P]) -> Result<Listing> {
        self.reader().list(parent)
    }

    pub fn list_deep<P: AsRef<str>>(&self, parent: &[P]) -> Result<Listing> {
        self.reader().list_deep(parent)
    }

    pub fn exist_file<P: AsRef<str>>(&self, parent: &[P], name: &str) -> Result<bool> {
        self.reader().exist_file(parent, name)
    }

    pub fn read<P, T, F>(&self, parent: &[P], name: &str, block: F) -> Result<T>
    where
        P: AsRef<str>,
        F: FnOnce(&JsonReader<'_>) -> Result<T>,
    {
        self.reader().read(parent, name, block)
    }

    /// Changes applied so far, oldest first.
    pub fn changes(&self) -> &ChangeLog {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Ends the transaction and hands over its log.
    pub fn commit(mut self) -> Result<ChangeLog> {
        self.ensure_active()?;
        self.state = TransactionState::Committed;
        log::info!("Committed {} change(s)", self.log.len());
        Ok(std::mem::take(&mut self.log))
    }

    /// Undoes every logged change, most recent first.
    ///
    /// Stops at the first change that fails to revert; that change and
    /// everything before it stay in the log and the transaction stays active.
    pub fn revert(&mut self) -> Result<()> {
        self.ensure_active()?;
        revert_log(&mut *self.store, &mut self.log)?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }
}

impl<S: Store + ?Sized> Drop for Transaction<'_, S> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active && !self.log.is_empty() {
            log::warn!(
                "Transaction dropped with {} change(s) neither committed nor reverted",
                self.log.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_path;
    use crate::store::{MemoryStore, StoreError};
    use serde_json::json;

    const ROOT: [&str; 0] = [];

    fn listing(store: &MemoryStore, joined: &str) -> Listing {
        store.list(&NodePath::parse(joined).unwrap()).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let mut store = MemoryStore::new();
        let txn = Transaction::new(&mut store);
        assert!(txn.is_empty());
        assert!(txn.is_active());
        assert_eq!(txn.len(), 0);
    }

    #[test]
    fn test_operations_apply_immediately() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_folder(&ROOT, "a").unwrap();
        txn.create_file(&["a"], "x.json").unwrap();

        assert!(txn.exist_file(&["a"], "x.json").unwrap());
        assert_eq!(txn.len(), 2);
        let log = txn.commit().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(listing(&store, "a").files, vec!["x.json"]);
    }

    #[test]
    fn test_failed_operation_is_not_logged() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        let result = txn.create_file(&["missing"], "x.json");

        assert!(matches!(
            result,
            Err(ChangeError::Store(StoreError::ParentMissing(_)))
        ));
        assert!(txn.is_empty());
    }

    #[test]
    fn test_invalid_rename_rejected_before_store() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        let result = txn.rename_file(&ROOT, "a", "a");
        assert!(matches!(result, Err(ChangeError::InvalidPath(_, _))));
        assert!(txn.is_empty());
    }

    #[test]
    fn test_revert_is_lifo() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_folder(&ROOT, "a").unwrap();
        txn.create_folder(&["a"], "b").unwrap();
        txn.create_file(&["a", "b"], "c.json").unwrap();

        txn.revert().unwrap();
        assert!(txn.is_empty());
        assert!(!txn.is_active());
        drop(txn);
        assert_eq!(store, MemoryStore::new());
    }

    #[test]
    fn test_closed_transaction_rejects_operations() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_file(&ROOT, "a.json").unwrap();
        txn.revert().unwrap();

        assert!(matches!(
            txn.create_file(&ROOT, "b.json"),
            Err(ChangeError::Closed)
        ));
        assert!(matches!(txn.revert(), Err(ChangeError::Closed)));
        assert!(matches!(txn.commit(), Err(ChangeError::Closed)));
    }

    #[test]
    fn test_delete_folder_decomposition_order() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_folder(&ROOT, "a").unwrap();
        txn.create_folder(&["a"], "c").unwrap();
        txn.create_folder(&["a", "c"], "d").unwrap();
        txn.create_file(&["a", "c", "d"], "e.txt").unwrap();
        txn.create_file(&["a", "c"], "f.txt").unwrap();
        let setup = txn.commit().unwrap();
        assert_eq!(setup.len(), 5);

        let mut txn = Transaction::new(&mut store);
        txn.delete_folder(&ROOT, "a").unwrap();
        assert_eq!(
            txn.changes().preview(),
            vec![
                "Delete file: /a/c/d/e.txt",
                "Delete file: /a/c/f.txt",
                "Delete folder: /a/c/d",
                "Delete folder: /a/c",
                "Delete folder: /a",
            ]
        );
        assert!(txn.list(&ROOT).unwrap().folders.is_empty());

        txn.revert().unwrap();
        drop(txn);
        assert_eq!(listing(&store, "").folders, vec!["a"]);
        assert_eq!(listing(&store, "a").folders, vec!["c"]);
        assert_eq!(listing(&store, "a/c").folders, vec!["d"]);
        assert_eq!(listing(&store, "a/c").files, vec!["f.txt"]);
        assert_eq!(listing(&store, "a/c/d").files, vec!["e.txt"]);
    }

    #[test]
    fn test_delete_missing_folder_logs_nothing() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        assert!(txn.delete_folder(&ROOT, "nope").is_err());
        assert!(txn.is_empty());
    }

    #[test]
    fn test_edit_json_logs_each_effective_write() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_file(&ROOT, "doc.json").unwrap();
        txn.edit_json(&ROOT, "doc.json", |json| {
            json.set_scalar(json_path!["title"], "draft")?
                .set_scalar(json_path!["title"], "draft")?
                .set_array(json_path!["tags"])?
                .set_scalar(json_path!["tags", 0usize], "a")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(txn.len(), 4);
        let title = txn
            .read(&ROOT, "doc.json", |json| {
                Ok(json.get(&json_path!["title"]).cloned())
            })
            .unwrap();
        assert_eq!(title, Some(json!("draft")));

        txn.revert().unwrap();
        drop(txn);
        assert!(listing(&store, "").files.is_empty());
    }

    #[test]
    fn test_edit_json_revert_restores_document() {
        let mut store = MemoryStore::new();
        store.create_file(&NodePath::root(), "doc.json").unwrap();
        let original = json!({"count": 1, "nested": {"keep": true}});
        store
            .write_file(&NodePath::root(), "doc.json", &original)
            .unwrap();

        let mut txn = Transaction::new(&mut store);
        txn.edit_json(&ROOT, "doc.json", |json| {
            json.set_scalar(json_path!["count"], 2)?
                .set_dictionary(json_path!["extra"])?
                .set_scalar(json_path!["extra", "x"], 1)?
                .set_scalar(json_path!["nested", "keep", "deeper"], 3)?;
            Ok(())
        })
        .unwrap();
        txn.revert().unwrap();
        drop(txn);

        // Object members created by an edit revert to null, not to absence.
        let doc = store.read_file(&NodePath::root(), "doc.json").unwrap();
        assert_eq!(doc["count"], json!(1));
        assert_eq!(doc["nested"], json!({"keep": true}));
        assert_eq!(doc.as_object().map(|map| map.len()), Some(3));
        assert_eq!(doc["extra"], json!(null));
    }

    #[test]
    fn test_edit_json_failure_writes_nothing() {
        let mut store = MemoryStore::new();
        store.create_file(&NodePath::root(), "doc.json").unwrap();

        let mut txn = Transaction::new(&mut store);
        let result = txn.edit_json(&ROOT, "doc.json", |json| {
            json.set_scalar(json_path!["a"], 1)?;
            Err(ChangeError::Other(anyhow::anyhow!("abort")))
        });
        assert!(result.is_err());
        assert!(txn.is_empty());
        drop(txn);

        assert_eq!(
            store.read_file(&NodePath::root(), "doc.json").unwrap(),
            json!({})
        );
    }

    #[test]
    fn test_revert_failure_keeps_prefix() {
        let mut store = MemoryStore::new();
        let mut txn = Transaction::new(&mut store);
        txn.create_file(&ROOT, "a.json").unwrap();
        txn.create_file(&ROOT, "b.json").unwrap();

        // Remove b.json behind the transaction's back.
        txn.store.delete_file(&NodePath::root(), "b.json").unwrap();

        let result = txn.revert();
        assert!(matches!(
            result,
            Err(ChangeError::RevertFailed { remaining: 2, .. })
        ));
        assert_eq!(txn.len(), 2);
        assert!(txn.is_active());
    }
}
