//! Directory-backed store.
//!
//! Folders map to directories and files to JSON documents below a root
//! directory. Entries directly in the root whose name starts with `.` belong
//! to the host (the CLI keeps its journal there) and are neither listed nor
//! creatable. Below the root, dot-names are ordinary nodes.

use super::{Listing, Store, StoreError, StoreResult, display_node};
use crate::path::{NodePath, split_parent_name};
use serde_json::{Map, Value};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Opens the store at `root`, which must be an existing directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StoreError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self, path: &NodePath) -> PathBuf {
        path.segments()
            .iter()
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    fn node(&self, path: &NodePath, name: &str) -> PathBuf {
        self.folder(path).join(name)
    }

    fn require_parent(&self, path: &NodePath) -> StoreResult<PathBuf> {
        let folder = self.folder(path);
        if folder.is_dir() {
            Ok(folder)
        } else {
            Err(StoreError::ParentMissing(path.to_string()))
        }
    }

    fn require_creatable(&self, path: &NodePath, name: &str) -> StoreResult<PathBuf> {
        if is_reserved(path, name) {
            return Err(StoreError::Reserved(display_node(path, name)));
        }
        let target = self.require_parent(path)?.join(name);
        if target.exists() {
            return Err(StoreError::AlreadyExists(display_node(path, name)));
        }
        Ok(target)
    }

    fn require_file(&self, path: &NodePath, name: &str) -> StoreResult<PathBuf> {
        let target = self.node(path, name);
        if is_reserved(path, name) || !target.is_file() {
            return Err(StoreError::NotFound(display_node(path, name)));
        }
        Ok(target)
    }

    fn require_dir(&self, path: &NodePath, name: &str) -> StoreResult<PathBuf> {
        let target = self.node(path, name);
        if is_reserved(path, name) || !target.is_dir() {
            return Err(StoreError::NotFound(display_node(path, name)));
        }
        Ok(target)
    }

    /// Walks the folder at `path`, parents before children and siblings by
    /// name, skipping the reserved root entries.
    fn walk(&self, path: &NodePath, max_depth: Option<usize>) -> StoreResult<Listing> {
        let folder = self.folder(path);
        if !folder.is_dir() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        let at_root = path.is_root();
        let walker = ignore::WalkBuilder::new(&folder)
            .standard_filters(false)
            .max_depth(max_depth)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |e| {
                let hidden = e.file_name().to_string_lossy().starts_with('.');
                !(at_root && e.depth() == 1 && hidden)
            })
            .build();

        let mut listing = Listing::default();
        for entry in walker {
            let entry = entry.map_err(|e| StoreError::Io(io::Error::other(e.to_string())))?;
            if entry.depth() == 0 {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                log::debug!("Skipping entry outside the root: {}", entry.path().display());
                continue;
            };
            let joined = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if entry.file_type().is_some_and(|ft| ft.is_dir()) {
                listing.folders.push(joined);
            } else {
                listing.files.push(joined);
            }
        }
        Ok(listing)
    }
}

/// Dot-names directly in the store root are reserved for the host.
fn is_reserved(path: &NodePath, name: &str) -> bool {
    path.is_root() && name.starts_with('.')
}

fn io_context(e: io::Error, action: &str, target: &Path) -> StoreError {
    StoreError::Io(io::Error::new(
        e.kind(),
        format!("Failed to {} {}: {}", action, target.display(), e),
    ))
}

impl Store for DirStore {
    fn list(&self, path: &NodePath) -> StoreResult<Listing> {
        let mut listing = self.walk(path, Some(1))?;
        for entry in listing.folders.iter_mut().chain(listing.files.iter_mut()) {
            if let Some((_, name)) = split_parent_name(entry) {
                *entry = name;
            }
        }
        Ok(listing)
    }

    fn list_deep(&self, path: &NodePath) -> StoreResult<Listing> {
        self.walk(path, None)
    }

    fn exist_file(&self, path: &NodePath, name: &str) -> StoreResult<bool> {
        Ok(!is_reserved(path, name) && self.node(path, name).is_file())
    }

    fn create_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let target = self.require_creatable(path, name)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    StoreError::AlreadyExists(display_node(path, name))
                }
                _ => io_context(e, "create", &target),
            })?;
        file.write_all(b"{}")
            .map_err(|e| io_context(e, "write", &target))?;
        log::debug!("Created file: {}", target.display());
        Ok(())
    }

    fn delete_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let target = self.require_file(path, name)?;
        fs::remove_file(&target).map_err(|e| io_context(e, "delete", &target))?;
        log::debug!("Deleted file: {}", target.display());
        Ok(())
    }

    fn rename_file(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()> {
        let source = self.require_file(path, from)?;
        let target = self.require_creatable(path, to)?;
        fs::rename(&source, &target).map_err(|e| io_context(e, "move", &source))?;
        log::debug!("Renamed file: {} → {}", source.display(), target.display());
        Ok(())
    }

    fn create_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let target = self.require_creatable(path, name)?;
        fs::create_dir(&target).map_err(|e| io_context(e, "create", &target))?;
        log::debug!("Created folder: {}", target.display());
        Ok(())
    }

    fn delete_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let target = self.require_dir(path, name)?;
        if fs::read_dir(&target)?.next().is_some() {
            return Err(StoreError::NotEmpty(display_node(path, name)));
        }
        fs::remove_dir(&target).map_err(|e| io_context(e, "delete", &target))?;
        log::debug!("Deleted folder: {}", target.display());
        Ok(())
    }

    fn rename_folder(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()> {
        let source = self.require_dir(path, from)?;
        let target = self.require_creatable(path, to)?;
        fs::rename(&source, &target).map_err(|e| io_context(e, "move", &source))?;
        log::debug!(
            "Renamed folder: {} → {}",
            source.display(),
            target.display()
        );
        Ok(())
    }

    fn read_file(&self, path: &NodePath, name: &str) -> StoreResult<Value> {
        let target = self.require_file(path, name)?;
        let content =
            fs::read_to_string(&target).map_err(|e| io_context(e, "read", &target))?;
        if content.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_file(&mut self, path: &NodePath, name: &str, doc: &Value) -> StoreResult<()> {
        let target = self.require_file(path, name)?;
        let content = serde_json::to_string_pretty(doc)?;
        fs::write(&target, content).map_err(|e| io_context(e, "write", &target))?;
        Ok(())
    }
}
