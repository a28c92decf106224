use std::fmt::Display;

use chrono::{Local, SecondsFormat};

/// Stderr reporting: progress only when verbose, errors always.
#[derive(Clone, Copy, Debug, Default)]
pub struct Diagnostics {
    verbose: bool,
}

impl Diagnostics {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn verbose(&self, message: impl Display) {
        if self.verbose {
            let now = Local::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            eprintln!("{now} ringlog: {message}");
        }
    }

    pub fn error(&self, message: impl Display) {
        eprintln!("error: {message}");
    }
}
