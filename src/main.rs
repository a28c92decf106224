mod app;
mod args;
mod diag;
mod input;
mod model;
mod retention;
mod store;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, error::ErrorKind};

use crate::{
    app::{Ringlog, Termination},
    args::{Args, USAGE},
    diag::Diagnostics,
    model::{Config, RetentionPolicy},
};

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let verbose = args.verbose;
    let config = match args.into_config() {
        Ok(config) => config,
        Err(err) => {
            Diagnostics::new(verbose).verbose(format_args!("invalid configuration: {err}"));
            println!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let diag = Diagnostics::new(config.verbose);
    match run(&config, diag) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            diag.error(format_args!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, diag: Diagnostics) -> Result<Termination> {
    diag.verbose("Verbose mode enabled");
    diag.verbose(format_args!("Log file: {}", config.path.display()));
    match config.policy {
        RetentionPolicy::ByBytes(bytes) => diag.verbose(format_args!("Max size: {bytes} bytes")),
        RetentionPolicy::ByLines(lines) => diag.verbose(format_args!("Max lines: {lines}")),
    }

    let file = store::open_log_file(&config.path)?;
    let mut ringlog = Ringlog::new(file, config.policy, diag);
    ringlog.run(input::stdin_lines())
}
