//! Invertible store changes.
//!
//! Every mutation of the store is captured as a [`Change`]: it carries
//! everything needed to replay ([`Change::apply`]) or undo
//! ([`Change::revert`]) it, and converts to and from a [`Record`].
//!
//! ## Record layout
//!
//! | Kind | classId | Fields |
//! |------|---------|--------|
//! | CreateFile / DeleteFile | 1 / 2 | `parent`, `name` |
//! | RenameFile | 3 | `parent`, `from`, `to` |
//! | CreateFolder / DeleteFolder | 4 / 5 | `parent`, `name` |
//! | RenameFolder | 6 | `parent`, `from`, `to` |
//! | JsonEdit | 7 | `parents`, `name`, `path`, `from`, `to` |
//!
//! `parent` is the `/`-joined path, `parents` and `path` are string lists,
//! and the JSON values are stored in sorted-key form.

use crate::error::{ChangeError, Result};
use crate::json::{JsonPath, to_sorted_string};
use crate::path::{NodePath, validate_name};
use crate::record::Record;
use crate::store::Store;
use serde_json::Value;
use std::fmt;

/// Stable discriminator of each change variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum ChangeKind {
    CreateFile = 1,
    DeleteFile = 2,
    RenameFile = 3,
    CreateFolder = 4,
    DeleteFolder = 5,
    RenameFolder = 6,
    JsonEdit = 7,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 7] = [
        ChangeKind::CreateFile,
        ChangeKind::DeleteFile,
        ChangeKind::RenameFile,
        ChangeKind::CreateFolder,
        ChangeKind::DeleteFolder,
        ChangeKind::RenameFolder,
        ChangeKind::JsonEdit,
    ];

    /// Returns `None` for discriminators with no known variant.
    pub fn from_class_id(class_id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.class_id() == class_id)
    }

    pub fn class_id(self) -> i64 {
        self as i64
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::CreateFile => "create-file",
            ChangeKind::DeleteFile => "delete-file",
            ChangeKind::RenameFile => "rename-file",
            ChangeKind::CreateFolder => "create-folder",
            ChangeKind::DeleteFolder => "delete-folder",
            ChangeKind::RenameFolder => "rename-folder",
            ChangeKind::JsonEdit => "json-edit",
        };
        f.write_str(name)
    }
}

/// One invertible store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    CreateFile {
        parent: NodePath,
        name: String,
    },
    DeleteFile {
        parent: NodePath,
        name: String,
    },
    RenameFile {
        parent: NodePath,
        from: String,
        to: String,
    },
    CreateFolder {
        parent: NodePath,
        name: String,
    },
    /// Removes one empty folder. Recursive deletion is decomposed by the
    /// transaction into file and folder deletions.
    DeleteFolder {
        parent: NodePath,
        name: String,
    },
    RenameFolder {
        parent: NodePath,
        from: String,
        to: String,
    },
    /// Point edit inside the JSON document `parent/name`.
    JsonEdit {
        parent: NodePath,
        name: String,
        path: JsonPath,
        from: Value,
        to: Value,
    },
}

impl Change {
    pub fn create_file<S: AsRef<str>>(parent: &[S], name: &str) -> Result<Self> {
        let (parent, name) = node(parent, name)?;
        Ok(Change::CreateFile { parent, name })
    }

    pub fn delete_file<S: AsRef<str>>(parent: &[S], name: &str) -> Result<Self> {
        let (parent, name) = node(parent, name)?;
        Ok(Change::DeleteFile { parent, name })
    }

    pub fn rename_file<S: AsRef<str>>(parent: &[S], from: &str, to: &str) -> Result<Self> {
        let (parent, from, to) = rename(parent, from, to)?;
        Ok(Change::RenameFile { parent, from, to })
    }

    pub fn create_folder<S: AsRef<str>>(parent: &[S], name: &str) -> Result<Self> {
        let (parent, name) = node(parent, name)?;
        Ok(Change::CreateFolder { parent, name })
    }

    pub fn delete_folder<S: AsRef<str>>(parent: &[S], name: &str) -> Result<Self> {
        let (parent, name) = node(parent, name)?;
        Ok(Change::DeleteFolder { parent, name })
    }

    pub fn rename_folder<S: AsRef<str>>(parent: &[S], from: &str, to: &str) -> Result<Self> {
        let (parent, from, to) = rename(parent, from, to)?;
        Ok(Change::RenameFolder { parent, from, to })
    }

    pub fn json_edit<S: AsRef<str>>(
        parent: &[S],
        name: &str,
        path: JsonPath,
        from: Value,
        to: Value,
    ) -> Result<Self> {
        let (parent, name) = node(parent, name)?;
        Ok(Change::JsonEdit {
            parent,
            name,
            path,
            from,
            to,
        })
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::CreateFile { .. } => ChangeKind::CreateFile,
            Change::DeleteFile { .. } => ChangeKind::DeleteFile,
            Change::RenameFile { .. } => ChangeKind::RenameFile,
            Change::CreateFolder { .. } => ChangeKind::CreateFolder,
            Change::DeleteFolder { .. } => ChangeKind::DeleteFolder,
            Change::RenameFolder { .. } => ChangeKind::RenameFolder,
            Change::JsonEdit { .. } => ChangeKind::JsonEdit,
        }
    }

    /// Folder the change operates in.
    pub fn parent(&self) -> &NodePath {
        match self {
            Change::CreateFile { parent, .. }
            | Change::DeleteFile { parent, .. }
            | Change::RenameFile { parent, .. }
            | Change::CreateFolder { parent, .. }
            | Change::DeleteFolder { parent, .. }
            | Change::RenameFolder { parent, .. }
            | Change::JsonEdit { parent, .. } => parent,
        }
    }

    /// Performs the change against `store`.
    ///
    /// Store failures (already exists, not found, ...) are returned unchanged.
    pub fn apply<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        log::debug!("Applying: {}", self);
        match self {
            Change::CreateFile { parent, name } => store.create_file(parent, name)?,
            Change::DeleteFile { parent, name } => store.delete_file(parent, name)?,
            Change::RenameFile { parent, from, to } => store.rename_file(parent, from, to)?,
            Change::CreateFolder { parent, name } => store.create_folder(parent, name)?,
            Change::DeleteFolder { parent, name } => store.delete_folder(parent, name)?,
            Change::RenameFolder { parent, from, to } => store.rename_folder(parent, from, to)?,
            Change::JsonEdit {
                parent,
                name,
                path,
                to,
                ..
            } => write_at(store, parent, name, path, to)?,
        }
        Ok(())
    }

    /// Undoes the change against `store`.
    pub fn revert<S: Store + ?Sized>(&self, store: &mut S) -> Result<()> {
        log::debug!("Reverting: {}", self);
        match self {
            Change::CreateFile { parent, name } => store.delete_file(parent, name)?,
            Change::DeleteFile { parent, name } => store.create_file(parent, name)?,
            Change::RenameFile { parent, from, to } => store.rename_file(parent, to, from)?,
            Change::CreateFolder { parent, name } => store.delete_folder(parent, name)?,
            Change::DeleteFolder { parent, name } => store.create_folder(parent, name)?,
            Change::RenameFolder { parent, from, to } => store.rename_folder(parent, to, from)?,
            Change::JsonEdit {
                parent,
                name,
                path,
                from,
                ..
            } => write_at(store, parent, name, path, from)?,
        }
        Ok(())
    }

    pub fn encode(&self) -> Record {
        let record = Record::new(self.kind().class_id());
        match self {
            Change::CreateFile { parent, name }
            | Change::DeleteFile { parent, name }
            | Change::CreateFolder { parent, name }
            | Change::DeleteFolder { parent, name } => record
                .with_text("parent", parent.joined())
                .with_text("name", name.as_str()),
            Change::RenameFile { parent, from, to } | Change::RenameFolder { parent, from, to } => {
                record
                    .with_text("parent", parent.joined())
                    .with_text("from", from.as_str())
                    .with_text("to", to.as_str())
            }
            Change::JsonEdit {
                parent,
                name,
                path,
                from,
                to,
            } => record
                .with_list("parents", parent.segments().to_vec())
                .with_text("name", name.as_str())
                .with_list("path", path.encode())
                .with_text("from", to_sorted_string(from))
                .with_text("to", to_sorted_string(to)),
        }
    }

    /// Rebuilds a change from its record.
    pub fn decode(record: &Record) -> Result<Self> {
        let kind = ChangeKind::from_class_id(record.class_id())
            .ok_or(ChangeError::UnknownDiscriminator(record.class_id()))?;

        match kind {
            ChangeKind::CreateFile => Self::create_file(
                &record.require_components("parent")?,
                record.require_text("name")?,
            ),
            ChangeKind::DeleteFile => Self::delete_file(
                &record.require_components("parent")?,
                record.require_text("name")?,
            ),
            ChangeKind::RenameFile => Self::rename_file(
                &record.require_components("parent")?,
                record.require_text("from")?,
                record.require_text("to")?,
            ),
            ChangeKind::CreateFolder => Self::create_folder(
                &record.require_components("parent")?,
                record.require_text("name")?,
            ),
            ChangeKind::DeleteFolder => Self::delete_folder(
                &record.require_components("parent")?,
                record.require_text("name")?,
            ),
            ChangeKind::RenameFolder => Self::rename_folder(
                &record.require_components("parent")?,
                record.require_text("from")?,
                record.require_text("to")?,
            ),
            ChangeKind::JsonEdit => {
                let path = JsonPath::decode(record.require_list("path")?)
                    .ok_or_else(|| ChangeError::MalformedRecord("path".to_string()))?;
                Self::json_edit(
                    record.require_list("parents")?,
                    record.require_text("name")?,
                    path,
                    record.require_json("from")?,
                    record.require_json("to")?,
                )
            }
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::CreateFile { parent, name } => {
                write!(f, "Create file: {}", parent.child(name))
            }
            Change::DeleteFile { parent, name } => {
                write!(f, "Delete file: {}", parent.child(name))
            }
            Change::RenameFile { parent, from, to } => {
                write!(f, "Rename file: {} → {}", parent.child(from), to)
            }
            Change::CreateFolder { parent, name } => {
                write!(f, "Create folder: {}", parent.child(name))
            }
            Change::DeleteFolder { parent, name } => {
                write!(f, "Delete folder: {}", parent.child(name))
            }
            Change::RenameFolder { parent, from, to } => {
                write!(f, "Rename folder: {} → {}", parent.child(from), to)
            }
            Change::JsonEdit {
                parent,
                name,
                path,
                from,
                to,
            } => write!(
                f,
                "Edit {} at {}: {} → {}",
                parent.child(name),
                path,
                from,
                to
            ),
        }
    }
}

fn node<S: AsRef<str>>(parent: &[S], name: &str) -> Result<(NodePath, String)> {
    validate_name(name)?;
    Ok((NodePath::new(parent)?, name.to_string()))
}

fn rename<S: AsRef<str>>(
    parent: &[S],
    from: &str,
    to: &str,
) -> Result<(NodePath, String, String)> {
    validate_name(from)?;
    validate_name(to)?;
    if from == to {
        return Err(ChangeError::InvalidPath(
            to.to_string(),
            "rename source and target are the same".to_string(),
        ));
    }
    Ok((NodePath::new(parent)?, from.to_string(), to.to_string()))
}

/// Read-modify-writes the whole document with `value` placed at `path`.
fn write_at<S: Store + ?Sized>(
    store: &mut S,
    parent: &NodePath,
    name: &str,
    path: &JsonPath,
    value: &Value,
) -> Result<()> {
    let mut doc = store.read_file(parent, name)?;
    path.set(&mut doc, value.clone())?;
    store.write_file(parent, name, &doc)?;
    Ok(())
}
