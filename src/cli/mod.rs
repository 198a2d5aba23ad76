//! Command-line surface
//!
//! `Cli` is the clap definition used by the binary; [`menu`] holds the
//! interactive loop that `pagespeed-monitor menu` (the default) runs.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod menu;

pub use menu::{Menu, MenuAction};

#[derive(Debug, Parser)]
#[command(name = "pagespeed-monitor")]
#[command(author = "A3S Lab Team")]
#[command(version)]
#[command(about = "Periodic PageSpeed Insights audits appended to Google Sheets")]
pub struct Cli {
    /// Configuration file path (.toml)
    #[arg(
        short,
        long,
        env = "PAGESPEED_CONFIG",
        default_value = crate::config::DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Log rows instead of appending them to the spreadsheet
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Interactive menu (default)
    Menu,

    /// Run one cycle and wait for every unit to finish
    Run {
        /// Extra targets for this run, added after the configured ones
        #[arg(long = "target", value_name = "URL")]
        targets: Vec<String>,
    },

    /// Run cycles on the configured interval until Ctrl-C
    Watch,

    /// Print the configured targets
    Targets,
}

impl Cli {
    /// Subcommand to execute, defaulting to the menu
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Menu)
    }
}
