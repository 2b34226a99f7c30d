use crate::{cli::args::OutputFormat, issues::Issue};

#[derive(Debug)]
pub enum CommandSummary {
    Check,
    Init(InitSummary),
}

#[derive(Debug)]
pub struct InitSummary {
    pub created: bool,
    /// Set when the config file could not be created.
    pub error: Option<String>,
}

/// Result of running a command.
pub struct CommandResult {
    pub summary: CommandSummary,
    pub format: OutputFormat,
    pub error_count: usize,
    pub warning_count: usize,
    /// All issues found during the check, sorted.
    /// Empty for non-check commands.
    pub issues: Vec<Issue>,
    /// Number of dumps that failed to load.
    pub parse_error_count: usize,
    /// Number of tree dumps that were checked.
    pub files_checked: usize,
}
