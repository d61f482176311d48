//! Shared helpers for json-file-change integration tests
//!
//! Fixtures are real directory trees in a temporary directory, driven either
//! through the library or through the command-line interface.

use assert_cmd::cargo::cargo_bin_cmd;
use json_file_change::record::Record;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create an empty store root
#[allow(unused)]
pub fn create_store() -> TempDir {
    TempDir::new().unwrap()
}

/// Helper to create the nested fixture `a/c/d/e.txt` and `a/c/f.txt`
#[allow(unused)]
pub fn create_nested_store() -> TempDir {
    let temp = create_store();
    let root = temp.path();

    fs::create_dir_all(root.join("a/c/d")).unwrap();
    fs::write(root.join("a/c/d/e.txt"), r#"{"name": "e"}"#).unwrap();
    fs::write(root.join("a/c/f.txt"), "{}").unwrap();

    temp
}

/// Sorted relative paths of every entry below `root`, root dot-names excluded
#[allow(unused)]
pub fn snapshot_tree(root: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let entry = entry.unwrap();
            let name = entry.file_name().to_string_lossy().into_owned();
            if dir == root && name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            if path.is_dir() {
                out.push(format!("{}/", relative));
                walk(root, &path, out);
            } else {
                out.push(relative);
            }
        }
    }

    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

/// Reads a JSON document relative to `root`
#[allow(unused)]
pub fn read_json(root: &Path, relative: &str) -> Value {
    let content = fs::read_to_string(root.join(relative)).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// Records stored in the default journal of `root`
#[allow(unused)]
pub fn journal_records(root: &Path) -> Vec<Record> {
    json_file_change::journal::file::load_records(&root.join(".journal.jsonl")).unwrap()
}

/// Helper to run the binary against `root`
pub fn run_cli(root: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("json-file-change");
    cmd.arg("-C").arg(root).args(args).env("NO_COLOR", "1");

    cmd.assert()
}
