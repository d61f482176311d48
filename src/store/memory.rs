use super::{Listing, Store, StoreError, StoreResult, display_node};
use crate::error::Result;
use crate::path::{NodePath, components};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Folder,
    File(Value),
}

/// In-memory store keyed by full path.
///
/// Keys sort segment by segment, so a folder always precedes its
/// descendants, which gives deep listings their top-down order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    nodes: BTreeMap<Vec<String>, Node>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the whole content of `source` into a new in-memory store.
    pub fn snapshot<S: Store + ?Sized>(source: &S) -> Result<Self> {
        let listing = source.list_deep(&NodePath::root())?;
        let mut nodes = BTreeMap::new();

        for folder in &listing.folders {
            nodes.insert(components(folder), Node::Folder);
        }
        for file in &listing.files {
            let key = components(file);
            let Some((name, parent)) = key.split_last() else {
                continue;
            };
            let doc = source.read_file(&NodePath::new(parent)?, name)?;
            nodes.insert(key, Node::File(doc));
        }

        log::debug!(
            "Snapshot holds {} folder(s) and {} file(s)",
            listing.folders.len(),
            listing.files.len()
        );
        Ok(Self { nodes })
    }

    fn key(path: &NodePath, name: &str) -> Vec<String> {
        path.child(name).segments().to_vec()
    }

    fn is_folder(&self, path: &NodePath) -> bool {
        path.is_root() || self.nodes.get(path.segments()) == Some(&Node::Folder)
    }

    fn require_parent(&self, path: &NodePath) -> StoreResult<()> {
        if self.is_folder(path) {
            Ok(())
        } else {
            Err(StoreError::ParentMissing(path.to_string()))
        }
    }

    fn require_folder(&self, path: &NodePath) -> StoreResult<()> {
        if self.is_folder(path) {
            Ok(())
        } else {
            Err(StoreError::NotFound(path.to_string()))
        }
    }

    fn require_free(&self, path: &NodePath, name: &str) -> StoreResult<()> {
        if self.nodes.contains_key(&Self::key(path, name)) {
            return Err(StoreError::AlreadyExists(display_node(path, name)));
        }
        Ok(())
    }

    fn descendants<'a>(
        &'a self,
        prefix: &'a [String],
    ) -> impl Iterator<Item = (&'a Vec<String>, &'a Node)> {
        self.nodes
            .range(prefix.to_vec()..)
            .take_while(move |(key, _)| key.starts_with(prefix))
            .filter(move |(key, _)| key.len() > prefix.len())
    }
}

impl Store for MemoryStore {
    fn list(&self, path: &NodePath) -> StoreResult<Listing> {
        self.require_folder(path)?;

        let depth = path.segments().len() + 1;
        let mut listing = Listing::default();
        for (key, node) in self.descendants(path.segments()) {
            if key.len() != depth {
                continue;
            }
            let name = key[depth - 1].clone();
            match node {
                Node::Folder => listing.folders.push(name),
                Node::File(_) => listing.files.push(name),
            }
        }
        Ok(listing)
    }

    fn list_deep(&self, path: &NodePath) -> StoreResult<Listing> {
        self.require_folder(path)?;

        let mut listing = Listing::default();
        for (key, node) in self.descendants(path.segments()) {
            let joined = key.join("/");
            match node {
                Node::Folder => listing.folders.push(joined),
                Node::File(_) => listing.files.push(joined),
            }
        }
        Ok(listing)
    }

    fn exist_file(&self, path: &NodePath, name: &str) -> StoreResult<bool> {
        Ok(matches!(
            self.nodes.get(&Self::key(path, name)),
            Some(Node::File(_))
        ))
    }

    fn create_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        self.require_parent(path)?;
        self.require_free(path, name)?;
        self.nodes
            .insert(Self::key(path, name), Node::File(Value::Object(Map::new())));
        Ok(())
    }

    fn delete_file(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let key = Self::key(path, name);
        match self.nodes.get(&key) {
            Some(Node::File(_)) => {
                self.nodes.remove(&key);
                Ok(())
            }
            _ => Err(StoreError::NotFound(display_node(path, name))),
        }
    }

    fn rename_file(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()> {
        let from_key = Self::key(path, from);
        if !matches!(self.nodes.get(&from_key), Some(Node::File(_))) {
            return Err(StoreError::NotFound(display_node(path, from)));
        }
        self.require_free(path, to)?;

        if let Some(node) = self.nodes.remove(&from_key) {
            self.nodes.insert(Self::key(path, to), node);
        }
        Ok(())
    }

    fn create_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        self.require_parent(path)?;
        self.require_free(path, name)?;
        self.nodes.insert(Self::key(path, name), Node::Folder);
        Ok(())
    }

    fn delete_folder(&mut self, path: &NodePath, name: &str) -> StoreResult<()> {
        let key = Self::key(path, name);
        if self.nodes.get(&key) != Some(&Node::Folder) {
            return Err(StoreError::NotFound(display_node(path, name)));
        }
        if self.descendants(&key).next().is_some() {
            return Err(StoreError::NotEmpty(display_node(path, name)));
        }
        self.nodes.remove(&key);
        Ok(())
    }

    fn rename_folder(&mut self, path: &NodePath, from: &str, to: &str) -> StoreResult<()> {
        let from_key = Self::key(path, from);
        if self.nodes.get(&from_key) != Some(&Node::Folder) {
            return Err(StoreError::NotFound(display_node(path, from)));
        }
        self.require_free(path, to)?;

        let to_key = Self::key(path, to);
        let moved: Vec<Vec<String>> = self
            .descendants(&from_key)
            .map(|(key, _)| key.clone())
            .chain(std::iter::once(from_key.clone()))
            .collect();

        for old_key in moved {
            if let Some(node) = self.nodes.remove(&old_key) {
                let mut new_key = to_key.clone();
                new_key.extend_from_slice(&old_key[from_key.len()..]);
                self.nodes.insert(new_key, node);
            }
        }
        Ok(())
    }

    fn read_file(&self, path: &NodePath, name: &str) -> StoreResult<Value> {
        match self.nodes.get(&Self::key(path, name)) {
            Some(Node::File(doc)) => Ok(doc.clone()),
            _ => Err(StoreError::NotFound(display_node(path, name))),
        }
    }

    fn write_file(&mut self, path: &NodePath, name: &str, doc: &Value) -> StoreResult<()> {
        match self.nodes.get_mut(&Self::key(path, name)) {
            Some(Node::File(current)) => {
                *current = doc.clone();
                Ok(())
            }
            _ => Err(StoreError::NotFound(display_node(path, name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> NodePath {
        NodePath::root()
    }

    fn at(joined: &str) -> NodePath {
        NodePath::parse(joined).unwrap()
    }

    #[test]
    fn test_create_and_list() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        store.create_file(&root(), "x.json").unwrap();
        store.create_file(&at("a"), "y.json").unwrap();

        let listing = store.list(&root()).unwrap();
        assert_eq!(listing.folders, vec!["a"]);
        assert_eq!(listing.files, vec!["x.json"]);
        assert_eq!(store.list(&at("a")).unwrap().files, vec!["y.json"]);
    }

    #[test]
    fn test_new_file_is_empty_object() {
        let mut store = MemoryStore::new();
        store.create_file(&root(), "x.json").unwrap();
        assert_eq!(store.read_file(&root(), "x.json").unwrap(), json!({}));
    }

    #[test]
    fn test_create_requires_parent() {
        let mut store = MemoryStore::new();
        let result = store.create_file(&at("missing"), "x.json");
        assert!(matches!(result, Err(StoreError::ParentMissing(_))));
    }

    #[test]
    fn test_create_twice_fails() {
        let mut store = MemoryStore::new();
        store.create_file(&root(), "x.json").unwrap();
        let result = store.create_file(&root(), "x.json");
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[test]
    fn test_delete_folder_requires_empty() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        store.create_file(&at("a"), "x.json").unwrap();

        let result = store.delete_folder(&root(), "a");
        assert!(matches!(result, Err(StoreError::NotEmpty(_))));

        store.delete_file(&at("a"), "x.json").unwrap();
        store.delete_folder(&root(), "a").unwrap();
        assert!(store.list(&root()).unwrap().folders.is_empty());
    }

    #[test]
    fn test_list_deep_is_top_down() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        store.create_folder(&at("a"), "c").unwrap();
        store.create_folder(&at("a/c"), "d").unwrap();
        store.create_file(&at("a/c/d"), "e.txt").unwrap();
        store.create_file(&at("a/c"), "f.txt").unwrap();

        let listing = store.list_deep(&at("a")).unwrap();
        assert_eq!(listing.folders, vec!["a/c", "a/c/d"]);
        assert_eq!(listing.files, vec!["a/c/d/e.txt", "a/c/f.txt"]);
    }

    #[test]
    fn test_rename_folder_moves_subtree() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        store.create_folder(&at("a"), "b").unwrap();
        store.create_file(&at("a/b"), "x.json").unwrap();
        store
            .write_file(&at("a/b"), "x.json", &json!({"k": 1}))
            .unwrap();

        store.rename_folder(&root(), "a", "z").unwrap();

        assert_eq!(store.list(&root()).unwrap().folders, vec!["z"]);
        assert_eq!(
            store.read_file(&at("z/b"), "x.json").unwrap(),
            json!({"k": 1})
        );
        assert!(store.list(&at("a")).is_err());
    }

    #[test]
    fn test_rename_file_keeps_content() {
        let mut store = MemoryStore::new();
        store.create_file(&root(), "a.json").unwrap();
        store.write_file(&root(), "a.json", &json!([1])).unwrap();
        store.rename_file(&root(), "a.json", "b.json").unwrap();

        assert!(!store.exist_file(&root(), "a.json").unwrap());
        assert_eq!(store.read_file(&root(), "b.json").unwrap(), json!([1]));
    }

    #[test]
    fn test_kind_mismatch_is_not_found() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        assert!(matches!(
            store.delete_file(&root(), "a"),
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.exist_file(&root(), "a").unwrap());
    }

    #[test]
    fn test_snapshot_copies_everything() {
        let mut store = MemoryStore::new();
        store.create_folder(&root(), "a").unwrap();
        store.create_folder(&at("a"), "b").unwrap();
        store.create_file(&at("a/b"), "x.json").unwrap();
        store
            .write_file(&at("a/b"), "x.json", &json!({"k": [true]}))
            .unwrap();

        let copy = MemoryStore::snapshot(&store).unwrap();
        assert_eq!(copy, store);
    }
}
