use std::io::{self, SeekFrom, Write};

use anyhow::{Context, Result};

use crate::{
    diag::Diagnostics,
    model::RetentionPolicy,
    retention::Retained,
    store::LogStore,
};

/// Why the processing loop stopped without a fatal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    EndOfInput,
    InputError,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub lines_appended: u64,
    pub truncations: u64,
    pub truncation_failures: u64,
}

/// The open log plus everything needed to append to it and keep it bounded.
pub struct Ringlog<S> {
    store: S,
    policy: RetentionPolicy,
    diag: Diagnostics,
    stats: RunStats,
}

impl<S: LogStore> Ringlog<S> {
    pub fn new(store: S, policy: RetentionPolicy, diag: Diagnostics) -> Self {
        Self {
            store,
            policy,
            diag,
            stats: RunStats::default(),
        }
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Writes `line` plus a newline at the end of the log.
    pub fn append(&mut self, line: &[u8]) -> Result<()> {
        let mut record = Vec::with_capacity(line.len() + 1);
        record.extend_from_slice(line);
        record.push(b'\n');

        self.store
            .seek(SeekFrom::End(0))
            .context("seeking to end of log file")?;
        self.store
            .write_all(&record)
            .context("writing to log file")?;
        self.store.flush().context("flushing log file")?;

        self.stats.lines_appended += 1;
        Ok(())
    }

    pub fn check_retention(&mut self) -> Result<Retained> {
        self.diag.verbose(format_args!(
            "Checking if truncation by {} is needed",
            self.policy.unit()
        ));
        self.policy.enforce(&mut self.store)
    }

    /// Appends one line, then runs a truncation cycle.
    ///
    /// Append failures are returned. Truncation failures are reported and
    /// skipped so the pipe stays alive.
    pub fn process_line(&mut self, line: &[u8]) -> Result<()> {
        if self.diag.is_verbose() {
            self.diag.verbose(format_args!(
                "Writing line to log: {}",
                String::from_utf8_lossy(line)
            ));
        }
        self.append(line)?;

        match self.check_retention() {
            Ok(Retained::Unchanged) => {}
            Ok(Retained::Truncated { before, after }) => {
                self.stats.truncations += 1;
                self.diag.verbose(format_args!(
                    "Truncated log by {}: {before} -> {after}",
                    self.policy.unit()
                ));
            }
            Err(err) => {
                self.stats.truncation_failures += 1;
                self.diag.error(format_args!("{err:#}"));
            }
        }
        Ok(())
    }

    pub fn run<I>(&mut self, lines: I) -> Result<Termination>
    where
        I: IntoIterator<Item = io::Result<Vec<u8>>>,
    {
        let mut termination = Termination::EndOfInput;
        for line in lines {
            match line {
                Ok(line) => self.process_line(&line)?,
                Err(err) => {
                    self.diag.error(format_args!("reading stdin: {err}"));
                    termination = Termination::InputError;
                    break;
                }
            }
        }

        let stats = self.stats;
        self.diag.verbose(format_args!(
            "Input finished: {} lines appended, {} truncations, {} truncation failures",
            stats.lines_appended, stats.truncations, stats.truncation_failures
        ));
        Ok(termination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read, Seek};

    fn lines(items: &[&str]) -> Vec<io::Result<Vec<u8>>> {
        items.iter().map(|item| Ok(item.as_bytes().to_vec())).collect()
    }

    fn ringlog(policy: RetentionPolicy) -> Ringlog<Cursor<Vec<u8>>> {
        Ringlog::new(Cursor::new(Vec::new()), policy, Diagnostics::default())
    }

    fn text(store: Cursor<Vec<u8>>) -> String {
        String::from_utf8(store.into_inner()).unwrap()
    }

    #[test]
    fn line_bound_keeps_last_three() {
        let mut app = ringlog(RetentionPolicy::ByLines(3));
        let end = app.run(lines(&["a", "b", "c", "d"])).unwrap();

        assert_eq!(end, Termination::EndOfInput);
        assert_eq!(app.stats().truncations, 1);
        assert_eq!(text(app.into_store()), "b\nc\nd\n");
    }

    #[test]
    fn byte_bound_keeps_trailing_bytes() {
        let mut app = ringlog(RetentionPolicy::ByBytes(10));
        app.run(lines(&["HelloWorldFoo"])).unwrap();

        assert_eq!(text(app.into_store()), "oWorldFoo\n");
    }

    #[test]
    fn under_bound_never_truncates() {
        let mut app = ringlog(RetentionPolicy::ByLines(5));
        app.run(lines(&["x", "y", "z"])).unwrap();

        assert_eq!(app.stats().truncations, 0);
        assert_eq!(text(app.into_store()), "x\ny\nz\n");
    }

    #[test]
    fn byte_bound_holds_after_every_line() {
        let bound = 7;
        let mut app = ringlog(RetentionPolicy::ByBytes(bound));
        let mut appended = Vec::new();

        for i in 0..40 {
            let line = format!("line-{i}");
            app.process_line(line.as_bytes()).unwrap();
            appended.extend_from_slice(line.as_bytes());
            appended.push(b'\n');

            let size = app.store.get_ref().len() as u64;
            assert_eq!(size, (appended.len() as u64).min(bound));
            assert!(appended.ends_with(app.store.get_ref()));
        }
    }

    #[test]
    fn line_bound_retains_exact_recent_lines() {
        let bound = 4;
        let mut app = ringlog(RetentionPolicy::ByLines(bound));
        let all: Vec<String> = (0..25).map(|i| format!("entry {i} \u{2603}")).collect();

        for (i, line) in all.iter().enumerate() {
            app.process_line(line.as_bytes()).unwrap();

            let expected: String = all[(i + 1).saturating_sub(bound)..=i]
                .iter()
                .map(|line| format!("{line}\n"))
                .collect();
            assert_eq!(std::str::from_utf8(app.store.get_ref()).unwrap(), expected);
        }
    }

    #[test]
    fn check_without_append_changes_nothing() {
        let mut app = ringlog(RetentionPolicy::ByLines(2));
        app.run(lines(&["1", "2", "3"])).unwrap();
        let before = app.store.get_ref().clone();

        assert_eq!(app.check_retention().unwrap(), Retained::Unchanged);
        assert_eq!(app.store.get_ref(), &before);
    }

    #[test]
    fn appends_after_existing_content() {
        let mut store = Cursor::new(b"old\n".to_vec());
        store.seek(SeekFrom::Start(0)).unwrap();
        let mut app = Ringlog::new(store, RetentionPolicy::ByLines(10), Diagnostics::default());

        app.run(lines(&["new"])).unwrap();
        assert_eq!(text(app.into_store()), "old\nnew\n");
    }

    #[test]
    fn input_error_ends_loop_without_failure() {
        let mut app = ringlog(RetentionPolicy::ByLines(10));
        let input = vec![
            Ok(b"kept".to_vec()),
            Err(io::Error::new(io::ErrorKind::InvalidData, "bad read")),
            Ok(b"never".to_vec()),
        ];

        assert_eq!(app.run(input).unwrap(), Termination::InputError);
        assert_eq!(text(app.into_store()), "kept\n");
    }

    /// In-memory log whose writes or truncations can be made to fail.
    struct Faulty {
        inner: Cursor<Vec<u8>>,
        writes_allowed: usize,
        fail_set_len: bool,
    }

    impl Faulty {
        fn new(writes_allowed: usize, fail_set_len: bool) -> Self {
            Self {
                inner: Cursor::new(Vec::new()),
                writes_allowed,
                fail_set_len,
            }
        }
    }

    impl Read for Faulty {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Write for Faulty {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.writes_allowed == 0 {
                return Err(io::Error::new(io::ErrorKind::StorageFull, "disk full"));
            }
            self.writes_allowed -= 1;
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for Faulty {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl LogStore for Faulty {
        fn size(&mut self) -> io::Result<u64> {
            self.inner.size()
        }

        fn set_len(&mut self, len: u64) -> io::Result<()> {
            if self.fail_set_len {
                return Err(io::Error::other("set_len refused"));
            }
            self.inner.set_len(len)
        }
    }

    #[test]
    fn write_failure_on_second_line_is_fatal() {
        let mut app = Ringlog::new(
            Faulty::new(1, false),
            RetentionPolicy::ByLines(10),
            Diagnostics::default(),
        );

        let err = app.run(lines(&["first", "second", "third"])).unwrap_err();

        assert!(format!("{err:#}").contains("writing to log file"));
        assert_eq!(app.stats().lines_appended, 1);
        assert_eq!(app.store.inner.get_ref(), b"first\n");
    }

    #[test]
    fn truncation_failure_keeps_pipe_alive() {
        let mut app = Ringlog::new(
            Faulty::new(usize::MAX, true),
            RetentionPolicy::ByLines(1),
            Diagnostics::default(),
        );

        let end = app.run(lines(&["a", "b", "c"])).unwrap();

        assert_eq!(end, Termination::EndOfInput);
        let stats = app.stats();
        assert_eq!(stats.lines_appended, 3);
        assert_eq!(stats.truncations, 0);
        assert_eq!(stats.truncation_failures, 2);
        assert_eq!(app.store.inner.get_ref(), b"a\nb\nc\n");
    }
}
