use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{CommandResult, check::check, init::init},
};

/// Dispatches to the handler of the parsed command.
pub fn run(Arguments { command }: Arguments) -> Result<CommandResult> {
    match command {
        Some(Command::Check(cmd)) => check(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
