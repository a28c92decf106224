use std::path::PathBuf;

/// How the log file is kept bounded. Exactly one mode is active per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetentionPolicy {
    ByBytes(u64),
    ByLines(usize),
}

impl RetentionPolicy {
    pub fn unit(&self) -> &'static str {
        match self {
            RetentionPolicy::ByBytes(_) => "size",
            RetentionPolicy::ByLines(_) => "lines",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub path: PathBuf,
    pub policy: RetentionPolicy,
    pub verbose: bool,
}
