//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `check`: Report string literals that are not passed through gettext
//! - `init`: Initialize a `.gettextrc.json` configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Check(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Arguments shared by commands that scan a project.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Directory holding the tree dumps (default: current directory)
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Report string literals in the target script that are not wrapped in gettext
    Check(CheckCommand),
    /// Initialize a new .gettextrc.json configuration file
    Init,
}
