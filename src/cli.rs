use crate::command::Command;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "json-file-change",
    version,
    about = "Apply and revert journaled changes to a directory of JSON files"
)]
pub struct Cli {
    /// Root directory of the store
    #[arg(long, short = 'C', global = true, default_value = ".", value_name = "DIR")]
    pub root: PathBuf,

    /// Journal file (defaults to <DIR>/.journal.jsonl)
    #[arg(long, global = true, value_name = "PATH")]
    pub journal: Option<PathBuf>,

    /// Print debug logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}
