//! Command-line entry point for the conformance checker.
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use conformance_cli::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());
    let log = Arc::new(logging::Logger::new(args.command.name()));

    match args.command {
        cli::Command::Eval(opts) => commands::eval::run(&opts, &log),
        cli::Command::Check(opts) => commands::check::run(&opts, &log),
        cli::Command::Scan(opts) => commands::scan::run(&opts, &log),
        cli::Command::Translate(opts) => commands::translate::run(&opts, &log),
        cli::Command::Version => {
            let version =
                option_env!("CONFORMANCE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            writeln!(std::io::stdout().lock(), "conformance {version}")?;
            Ok(())
        }
    }
}
