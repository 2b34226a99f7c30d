use anyhow::{Ok, Result};

use super::super::args::CheckCommand;
use super::{
    helper::finish,
    {CommandResult, CommandSummary},
};

use crate::{core::CheckContext, issues::Issue};

pub fn check(cmd: CheckCommand) -> Result<CommandResult> {
    let ctx = CheckContext::new(&cmd.common)?;

    let mut all_issues: Vec<Issue> = ctx
        .missing_gettext_issues()
        .into_iter()
        .map(Issue::MissingGettext)
        .collect();

    let parse_errors = ctx.parse_errors();
    all_issues.extend(parse_errors.iter().map(|i| Issue::ParseError(i.clone())));

    Ok(finish(
        CommandSummary::Check,
        cmd.format,
        all_issues,
        ctx.files.len(),
    ))
}
