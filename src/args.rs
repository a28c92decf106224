use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crate::model::{Config, RetentionPolicy};

pub const USAGE: &str = "Usage: ringlog -s <max_size_bytes> or -l <max_lines> -f <log_file>\n\nPipe-friendly utility to manage log files by capping size or line count.";

#[derive(Parser, Debug)]
#[command(author, version, about = "Append stdin to a log file capped by size or line count")]
pub struct Args {
    /// Maximum size of the log file in bytes (use either -s or -l)
    #[arg(short = 's', long, default_value_t = 0)]
    pub max_size: u64,

    /// Maximum number of lines in the log file (use either -s or -l)
    #[arg(short = 'l', long, default_value_t = 0)]
    pub max_lines: usize,

    /// Log file path
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let path = match self.file {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => bail!("no log file given"),
        };

        let policy = match (self.max_size, self.max_lines) {
            (0, 0) => bail!("one of --max-size or --max-lines is required"),
            (bytes, 0) => RetentionPolicy::ByBytes(bytes),
            (0, lines) => RetentionPolicy::ByLines(lines),
            _ => bail!("--max-size and --max-lines are mutually exclusive"),
        };

        Ok(Config {
            path,
            policy,
            verbose: self.verbose,
        })
    }
}
