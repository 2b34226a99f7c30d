use std::process::ExitCode;

use clap::Parser;
use missing_gettext::cli::{Arguments, ExitStatus};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_ENV: &str = "MISSING_GETTEXT_LOG";

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    tracing_subscriber::registry().with(console_layer).init();
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_tracing(args.verbose());

    match missing_gettext::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
