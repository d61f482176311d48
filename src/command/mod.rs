pub mod journal;
pub mod mutate;

use crate::error::Result;
use crate::journal::{ChangeLog, file};
use crate::store::DirStore;
use clap::Subcommand;
use std::path::{Path, PathBuf};

/// File name of the default journal, kept hidden in the store root.
pub const JOURNAL_FILE_NAME: &str = ".journal.jsonl";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty JSON file
    CreateFile(mutate::NodeArgs),
    /// Delete a file
    DeleteFile(mutate::NodeArgs),
    /// Rename a file within its folder
    RenameFile(mutate::RenameArgs),
    /// Create a folder
    CreateFolder(mutate::NodeArgs),
    /// Delete a folder and everything below it
    DeleteFolder(mutate::NodeArgs),
    /// Rename a folder within its parent
    RenameFolder(mutate::RenameArgs),
    /// Set a value inside a JSON file
    Set(mutate::SetArgs),
    /// Show the recorded changes
    Log,
    /// Undo every recorded change, most recent first
    Revert(journal::RevertArgs),
}

/// A store root together with its journal.
#[derive(Debug)]
pub struct Workspace {
    store: DirStore,
    journal: PathBuf,
}

impl Workspace {
    /// Opens the store at `root`. The journal defaults to `<root>/.journal.jsonl`.
    pub fn open(root: &Path, journal: Option<&Path>) -> Result<Self> {
        let store = DirStore::open(root)?;
        let journal = journal
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.join(JOURNAL_FILE_NAME));

        log::debug!("Store root: {}", root.display());
        log::debug!("Journal: {}", journal.display());
        Ok(Self { store, journal })
    }

    pub fn store(&self) -> &DirStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DirStore {
        &mut self.store
    }

    pub fn journal(&self) -> &Path {
        &self.journal
    }

    /// Decodes the journal into a change log.
    pub fn load_log(&self) -> Result<ChangeLog> {
        ChangeLog::from_records(&file::load_records(&self.journal)?)
    }

    /// Appends `log` to the journal.
    pub fn append_log(&self, log: &ChangeLog) -> Result<()> {
        file::append_records(&self.journal, &log.to_records())
    }

    /// Replaces the journal content with `log`.
    pub fn replace_log(&self, log: &ChangeLog) -> Result<()> {
        file::clear(&self.journal)?;
        self.append_log(log)
    }
}

pub fn execute(
    root: &Path,
    journal_path: Option<&Path>,
    command: Command,
) -> Result<()> {
    let mut workspace = Workspace::open(root, journal_path)?;

    match command {
        Command::CreateFile(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_create_file(), dry_run)
        }
        Command::DeleteFile(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_delete_file(), dry_run)
        }
        Command::CreateFolder(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_create_folder(), dry_run)
        }
        Command::DeleteFolder(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_delete_folder(), dry_run)
        }
        Command::RenameFile(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_rename_file(), dry_run)
        }
        Command::RenameFolder(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_rename_folder(), dry_run)
        }
        Command::Set(args) => {
            let dry_run = args.dry_run;
            mutate::execute(&mut workspace, &args.into_operation(), dry_run)
        }
        Command::Log => journal::show(&workspace),
        Command::Revert(args) => journal::revert(&mut workspace, &args),
    }
}
