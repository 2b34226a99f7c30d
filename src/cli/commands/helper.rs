use super::{CommandResult, CommandSummary};
use crate::{
    cli::args::OutputFormat,
    issues::{Issue, Severity},
};

pub fn finish(
    summary: CommandSummary,
    format: OutputFormat,
    mut issues: Vec<Issue>,
    files_checked: usize,
) -> CommandResult {
    issues.sort();

    let parse_error_count = issues
        .iter()
        .filter(|i| matches!(i, Issue::ParseError(_)))
        .count();

    let mut error_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Error)
        .count();

    let warning_count = issues
        .iter()
        .filter(|i| i.severity() == Severity::Warning)
        .count();

    if let CommandSummary::Init(ref summary) = summary
        && summary.error.is_some()
    {
        error_count += 1;
    }

    CommandResult {
        summary,
        format,
        error_count,
        warning_count,
        issues,
        parse_error_count,
        files_checked,
    }
}
