use super::Workspace;
use crate::error::Result;
use crate::journal::revert_log;
use crate::store::MemoryStore;
use clap::Parser;
use colored::Colorize;

#[derive(Parser, Debug, Clone)]
pub struct RevertArgs {
    /// Show what would be reverted without touching the store or the journal
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

/// Prints the journal, oldest change first.
pub fn show(workspace: &Workspace) -> Result<()> {
    let log = workspace.load_log()?;
    if log.is_empty() {
        println!("{}", "Journal is empty".yellow());
        return Ok(());
    }

    println!(
        "{} {} ({} change{})",
        "📝".bold(),
        workspace.journal().display(),
        log.len(),
        if log.len() == 1 { "" } else { "s" }
    );
    for (index, line) in log.preview().iter().enumerate() {
        println!("{:>5}  {}", (index + 1).to_string().dimmed(), line);
    }
    Ok(())
}

/// Reverts the journal, most recent change first, then clears it.
///
/// When a change fails to revert, the journal is rewritten with the changes
/// that are still applied.
pub fn revert(workspace: &mut Workspace, args: &RevertArgs) -> Result<()> {
    let mut log = workspace.load_log()?;
    if log.is_empty() {
        println!("{}", "Nothing to revert".yellow());
        return Ok(());
    }
    let total = log.len();

    if args.dry_run {
        println!("\n{}", "DRY RUN - No changes will be kept".yellow().bold());
        for change in log.iter().rev() {
            println!("   • {}", change.to_string().dimmed());
        }
        let mut preview = MemoryStore::snapshot(workspace.store())?;
        revert_log(&mut preview, &mut log)?;
        println!(
            "\n{} {} would be reverted. Run without {} to apply.",
            total.to_string().cyan().bold(),
            if total > 1 { "changes" } else { "change" },
            "--dry-run".cyan()
        );
        return Ok(());
    }

    let result = revert_log(workspace.store_mut(), &mut log);
    workspace.replace_log(&log)?;

    match result {
        Ok(()) => {
            println!(
                "{} Reverted {} change{}",
                "✓".green().bold(),
                total,
                if total == 1 { "" } else { "s" }
            );
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{} Reverted {} of {} changes; {} remain in the journal",
                "✗".red().bold(),
                total - log.len(),
                total,
                log.len()
            );
            Err(e)
        }
    }
}
