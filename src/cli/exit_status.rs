use std::process::ExitCode;

use super::commands::{CommandResult, CommandSummary};

/// Exit status for CLI commands, following common conventions for linter tools.
///
/// - `Success` (0): Command completed successfully, no issues found
/// - `Failure` (1): Command completed but found issues (errors/warnings)
/// - `Error` (2): Command failed due to internal error (config error, IO error, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl ExitStatus {
    pub(crate) fn from_result(result: &CommandResult) -> Self {
        let failed = match result.summary {
            CommandSummary::Check => !result.issues.is_empty(),
            CommandSummary::Init(_) => result.error_count > 0,
        };
        if failed {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
