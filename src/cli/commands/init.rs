use std::{fs, path::Path};

use anyhow::{Context, Result};

use super::{CommandResult, CommandSummary, InitSummary, helper::finish};
use crate::{
    cli::args::OutputFormat,
    config::{CONFIG_FILE_NAME, default_config_json},
};

/// Writes the default configuration into the current directory.
pub fn init() -> Result<CommandResult> {
    let summary = init_in(Path::new("."))?;
    Ok(finish(
        CommandSummary::Init(summary),
        OutputFormat::Text,
        Vec::new(),
        0,
    ))
}

fn init_in(dir: &Path) -> Result<InitSummary> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        return Ok(InitSummary {
            created: false,
            error: Some(format!("{} already exists", CONFIG_FILE_NAME)),
        });
    }

    fs::write(&config_path, default_config_json()?)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    Ok(InitSummary {
        created: true,
        error: None,
    })
}
