//! Store-changing commands.
//!
//! Every command runs as one [`Transaction`] against the directory store. The
//! changes it records are appended to the journal, including the prefix that
//! was applied before a failing step, so `revert` can always undo them.
//! With `--dry-run` the transaction runs against an in-memory snapshot and the
//! journal is left alone.

use super::Workspace;
use crate::error::Result;
use crate::journal::{ChangeLog, Transaction};
use crate::json::JsonPath;
use crate::path::components;
use crate::store::{MemoryStore, Store};
use clap::Parser;
use colored::Colorize;
use serde_json::Value;
use std::fmt;

#[derive(Parser, Debug, Clone)]
pub struct NodeArgs {
    /// Parent folder, `/`-separated ("" or "/" for the root)
    pub parent: String,

    /// Name of the file or folder
    pub name: String,

    /// Show what would change without touching the store or the journal
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

impl NodeArgs {
    pub fn into_create_file(self) -> Operation {
        Operation::CreateFile {
            parent: components(&self.parent),
            name: self.name,
        }
    }

    pub fn into_delete_file(self) -> Operation {
        Operation::DeleteFile {
            parent: components(&self.parent),
            name: self.name,
        }
    }

    pub fn into_create_folder(self) -> Operation {
        Operation::CreateFolder {
            parent: components(&self.parent),
            name: self.name,
        }
    }

    pub fn into_delete_folder(self) -> Operation {
        Operation::DeleteFolder {
            parent: components(&self.parent),
            name: self.name,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct RenameArgs {
    /// Parent folder, `/`-separated ("" or "/" for the root)
    pub parent: String,

    /// Current name
    pub from: String,

    /// New name
    pub to: String,

    /// Show what would change without touching the store or the journal
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

impl RenameArgs {
    pub fn into_rename_file(self) -> Operation {
        Operation::RenameFile {
            parent: components(&self.parent),
            from: self.from,
            to: self.to,
        }
    }

    pub fn into_rename_folder(self) -> Operation {
        Operation::RenameFolder {
            parent: components(&self.parent),
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[clap(verbatim_doc_comment)]
pub struct SetArgs {
    /// Parent folder, `/`-separated ("" or "/" for the root)
    pub parent: String,

    /// Name of the JSON file
    pub file: String,

    /// Dot-separated location inside the document
    ///
    /// Numeric steps address array elements; missing containers are created.
    ///
    /// Examples:
    ///   title          Top-level member "title"
    ///   items.0.name   Member "name" of the first element of "items"
    #[arg(verbatim_doc_comment)]
    pub json_path: String,

    /// New value, parsed as JSON and taken as a plain string otherwise
    pub value: String,

    /// Show what would change without touching the store or the journal
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

impl SetArgs {
    pub fn into_operation(self) -> Operation {
        let value = serde_json::from_str(&self.value).unwrap_or(Value::String(self.value));
        Operation::Set {
            parent: components(&self.parent),
            name: self.file,
            path: JsonPath::parse_dotted(&self.json_path),
            value,
        }
    }
}

/// One user-level store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateFile {
        parent: Vec<String>,
        name: String,
    },
    DeleteFile {
        parent: Vec<String>,
        name: String,
    },
    CreateFolder {
        parent: Vec<String>,
        name: String,
    },
    DeleteFolder {
        parent: Vec<String>,
        name: String,
    },
    RenameFile {
        parent: Vec<String>,
        from: String,
        to: String,
    },
    RenameFolder {
        parent: Vec<String>,
        from: String,
        to: String,
    },
    Set {
        parent: Vec<String>,
        name: String,
        path: JsonPath,
        value: Value,
    },
}

impl Operation {
    /// Runs the operation inside `txn`.
    pub fn apply<S: Store + ?Sized>(&self, txn: &mut Transaction<'_, S>) -> Result<()> {
        match self {
            Operation::CreateFile { parent, name } => txn.create_file(parent.as_slice(), name),
            Operation::DeleteFile { parent, name } => txn.delete_file(parent.as_slice(), name),
            Operation::CreateFolder { parent, name } => {
                txn.create_folder(parent.as_slice(), name)
            }
            Operation::DeleteFolder { parent, name } => {
                txn.delete_folder(parent.as_slice(), name)
            }
            Operation::RenameFile { parent, from, to } => {
                txn.rename_file(parent.as_slice(), from, to)
            }
            Operation::RenameFolder { parent, from, to } => {
                txn.rename_folder(parent.as_slice(), from, to)
            }
            Operation::Set {
                parent,
                name,
                path,
                value,
            } => txn.edit_json(parent.as_slice(), name, |json| {
                json.set_scalar(path.clone(), value.clone())?;
                Ok(())
            }),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateFile { parent, name } => {
                write!(f, "create file {}", node(parent, name))
            }
            Operation::DeleteFile { parent, name } => {
                write!(f, "delete file {}", node(parent, name))
            }
            Operation::CreateFolder { parent, name } => {
                write!(f, "create folder {}", node(parent, name))
            }
            Operation::DeleteFolder { parent, name } => {
                write!(f, "delete folder {}", node(parent, name))
            }
            Operation::RenameFile { parent, from, to } => {
                write!(f, "rename file {} to {}", node(parent, from), to)
            }
            Operation::RenameFolder { parent, from, to } => {
                write!(f, "rename folder {} to {}", node(parent, from), to)
            }
            Operation::Set {
                parent,
                name,
                path,
                value,
            } => write!(f, "set {} at {} to {}", node(parent, name), path, value),
        }
    }
}

fn node(parent: &[String], name: &str) -> String {
    let mut joined = String::from("/");
    for segment in parent {
        joined.push_str(segment);
        joined.push('/');
    }
    joined.push_str(name);
    joined
}

/// Applies `operation` in one transaction.
///
/// Returns the changes that were applied together with the outcome, so a
/// failure still reports the prefix that took effect.
pub fn run<S: Store + ?Sized>(
    store: &mut S,
    operation: &Operation,
) -> Result<(ChangeLog, Result<()>)> {
    let mut txn = Transaction::new(store);
    let outcome = operation.apply(&mut txn);
    let log = txn.commit()?;
    Ok((log, outcome))
}

pub fn execute(workspace: &mut Workspace, operation: &Operation, dry_run: bool) -> Result<()> {
    log::info!("Running: {}", operation);

    let (log, outcome) = if dry_run {
        let mut preview = MemoryStore::snapshot(workspace.store())?;
        run(&mut preview, operation)?
    } else {
        run(workspace.store_mut(), operation)?
    };

    if !dry_run && !log.is_empty() {
        workspace.append_log(&log)?;
    }

    if let Err(e) = outcome {
        if !log.is_empty() {
            eprintln!(
                "{} {} change{} applied before the failure {} recorded in the journal",
                "!".yellow().bold(),
                log.len(),
                if log.len() == 1 { "" } else { "s" },
                if dry_run { "would be" } else { "were" }
            );
        }
        return Err(e);
    }

    log.print_summary(dry_run);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_path;
    use serde_json::json;

    fn node_args(parent: &str, name: &str) -> NodeArgs {
        NodeArgs {
            parent: parent.to_string(),
            name: name.to_string(),
            dry_run: false,
        }
    }

    #[test]
    fn test_parent_argument_is_normalized() {
        assert_eq!(
            node_args("/a//b/", "x.json").into_create_file(),
            Operation::CreateFile {
                parent: vec!["a".to_string(), "b".to_string()],
                name: "x.json".to_string(),
            }
        );
        assert_eq!(
            node_args("", "a").into_create_folder(),
            node_args("/", "a").into_create_folder()
        );
    }

    #[test]
    fn test_set_value_parsing() {
        let args = |value: &str| SetArgs {
            parent: String::new(),
            file: "x.json".to_string(),
            json_path: "items.0.name".to_string(),
            value: value.to_string(),
            dry_run: false,
        };

        let Operation::Set { path, value, .. } = args("[1, 2]").into_operation() else {
            panic!("expected a set operation");
        };
        assert_eq!(path, json_path!["items", 0usize, "name"]);
        assert_eq!(value, json!([1, 2]));

        let Operation::Set { value, .. } = args("hello world").into_operation() else {
            panic!("expected a set operation");
        };
        assert_eq!(value, json!("hello world"));
    }

    #[test]
    fn test_run_records_changes() {
        let mut store = MemoryStore::new();
        let (log, outcome) = run(&mut store, &node_args("", "a").into_create_folder()).unwrap();
        outcome.unwrap();
        assert_eq!(log.preview(), vec!["Create folder: /a"]);

        let set = Operation::Set {
            parent: Vec::new(),
            name: "x.json".to_string(),
            path: json_path!["k"],
            value: json!(1),
        };
        let (log, outcome) = run(&mut store, &set).unwrap();
        assert!(outcome.is_err());
        assert!(log.is_empty());
    }

    #[test]
    fn test_run_keeps_prefix_of_failed_delete() {
        let mut store = MemoryStore::new();
        let (_, outcome) = run(&mut store, &node_args("", "a").into_create_folder()).unwrap();
        outcome.unwrap();
        let (_, outcome) = run(&mut store, &node_args("a", "x.json").into_create_file()).unwrap();
        outcome.unwrap();

        let (log, outcome) = run(&mut store, &node_args("", "missing").into_delete_folder()).unwrap();
        assert!(outcome.is_err());
        assert!(log.is_empty());

        let (log, outcome) = run(&mut store, &node_args("", "a").into_delete_folder()).unwrap();
        outcome.unwrap();
        assert_eq!(
            log.preview(),
            vec!["Delete file: /a/x.json", "Delete folder: /a"]
        );
    }

    #[test]
    fn test_display() {
        let op = RenameArgs {
            parent: "docs".to_string(),
            from: "a".to_string(),
            to: "b".to_string(),
            dry_run: false,
        }
        .into_rename_folder();
        assert_eq!(op.to_string(), "rename folder /docs/a to b");
    }
}
