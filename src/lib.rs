#![doc = include_str!("../README.md")]

pub mod change;
pub mod cli;
pub mod command;
pub mod error;
pub mod journal;
pub mod json;
pub mod path;
pub mod record;
pub mod store;

pub use error::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> Result<()> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    init_logging(cli.verbose);
    command::execute(&cli.root, cli.journal.as_deref(), cli.command)
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env = env_logger::Env::default().default_filter_or(level);
    // A logger may already be installed when embedded.
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
