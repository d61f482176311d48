use crate::change::{Change, ChangeKind};
use crate::error::Result;
use crate::record::Record;
use colored::Colorize;

/// Ordered list of applied changes for one transaction.
///
/// Changes are appended in apply order; reverting walks them back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub(crate) fn pop(&mut self) -> Option<Change> {
        self.changes.pop()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Encodes every change, oldest first.
    pub fn to_records(&self) -> Vec<Record> {
        self.changes.iter().map(Change::encode).collect()
    }

    /// Decodes a previously persisted log. Fails on the first bad record.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let changes = records
            .iter()
            .map(Change::decode)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { changes })
    }

    /// Returns one human-readable line per change.
    pub fn preview(&self) -> Vec<String> {
        self.changes.iter().map(Change::to_string).collect()
    }

    /// Returns change counts per kind.
    pub fn stats(&self) -> LogStats {
        let mut stats = LogStats {
            total: self.changes.len(),
            ..LogStats::default()
        };

        for change in &self.changes {
            match change.kind() {
                ChangeKind::CreateFile => stats.files_created += 1,
                ChangeKind::DeleteFile => stats.files_deleted += 1,
                ChangeKind::RenameFile => stats.files_renamed += 1,
                ChangeKind::CreateFolder => stats.folders_created += 1,
                ChangeKind::DeleteFolder => stats.folders_deleted += 1,
                ChangeKind::RenameFolder => stats.folders_renamed += 1,
                ChangeKind::JsonEdit => stats.json_edits += 1,
            }
        }

        stats
    }

    /// Prints a grouped summary to stdout.
    ///
    /// Groups structure changes (files and folders) apart from JSON edits,
    /// showing at most eight edits.
    pub fn print_summary(&self, dry_run: bool) {
        if self.changes.is_empty() {
            println!("\n{}", "No changes recorded".yellow());
            return;
        }

        if dry_run {
            println!("\n{}", "DRY RUN - No changes will be kept".yellow().bold());
        } else {
            println!("\n{}", "Changes applied:".green().bold());
        }

        let marker = if dry_run {
            "•".to_string()
        } else {
            "✓".green().to_string()
        };

        let (edits, structure): (Vec<&Change>, Vec<&Change>) = self
            .changes
            .iter()
            .partition(|c| c.kind() == ChangeKind::JsonEdit);

        if !structure.is_empty() {
            println!("\n{} Files and folders", "📁".bold());
            for change in &structure {
                println!("   {} {}", marker, change.to_string().dimmed());
            }
        }

        if !edits.is_empty() {
            println!(
                "\n{} JSON edits ({} change{})",
                "📝".bold(),
                edits.len(),
                if edits.len() == 1 { "" } else { "s" }
            );
            for change in edits.iter().take(8) {
                println!("   {} {}", marker, change.to_string().dimmed());
            }
            if edits.len() > 8 {
                println!("   {} {} more...", marker, edits.len() - 8);
            }
        }

        println!();
        let total = self.changes.len();
        if dry_run {
            println!(
                "{} {} would be recorded. Run without {} to apply.",
                total.to_string().cyan().bold(),
                if total > 1 { "changes" } else { "change" },
                "--dry-run".cyan()
            );
        } else {
            println!(
                "{} Successfully recorded {} change{}",
                "✓".green().bold(),
                total,
                if total == 1 { "" } else { "s" }
            );
        }
    }
}

impl<'a> IntoIterator for &'a ChangeLog {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.iter()
    }
}

/// Per-kind change counts of a [`ChangeLog`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogStats {
    pub files_created: usize,
    pub files_deleted: usize,
    pub files_renamed: usize,
    pub folders_created: usize,
    pub folders_deleted: usize,
    pub folders_renamed: usize,
    pub json_edits: usize,
    pub total: usize,
}
