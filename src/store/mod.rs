//! Hierarchical file/folder stores.
//!
//! [`Store`] is the contract every change is applied against. Files hold one
//! JSON document each and are read and written whole. Two implementations
//! ship with the crate: [`MemoryStore`] and the directory-backed [`DirStore`].

mod dir;
mod memory;

pub use dir::DirStore;
pub use memory::MemoryStore;

use crate::path::NodePath;
use serde_json::Value;
use thiserror::Error;

/// Failures reported by a store. Changes surface these unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Node is absent or has the other kind (file vs folder).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Target name is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Parent folder does not exist.
    #[error("Parent folder missing: {0}")]
    ParentMissing(String),

    /// Folder still has children.
    #[error("Folder not empty: {0}")]
    NotEmpty(String),

    /// Name is reserved by the store.
    #[error("Reserved name: {0}")]
    Reserved(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Folder and file names returned by [`Store::list`].
///
/// For deep listings the entries are full `/`-joined paths from the store root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub folders: Vec<String>,
    pub files: Vec<String>,
}

/// Abstract hierarchical store of JSON files.
pub trait Store {
    /// Direct children of the folder at `path`.
    fn list(&self, path: &NodePath) -> StoreResult<Listing>;

    /// All descendants of the folder at `path`, parents before children.
    fn list_deep(&self, path: &NodePath) -> StoreResult<Listing>;

    fn exist_file(&self, path: &NodePath, name: &str) -> StoreResult<bool>;

    /// Creates an empty file (`{}`).
    fn create_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()>;

    fn delete_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()>;

    fn rename_file(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()>;

    fn create_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()>;

    /// Deletes an empty folder.
    fn delete_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()>;

    fn rename_folder(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()>;

    fn read_file(&self, path: &NodePath, name: &str) -> StoreResult<Value>;

    fn write_file(&mut self, path: &NodePath, name: &str, doc: &Value) -> StoreResult<()>;
}

/// Display form of `path/name` used in store errors.
pub(crate) fn display_node(path: &NodePath, name: &str) -> String {
    path.child(name).to_string()
}
