use std::io::{self, BufRead, StdinLock};

/// Newline-delimited lines from a reader, as raw bytes.
///
/// The trailing `\n` (and a `\r` before it) is stripped. A final line without a
/// terminator is still yielded. Iteration stops after the first read error.
pub struct LineSource<R> {
    reader: R,
    finished: bool,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            finished: false,
        }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => {
                self.finished = true;
                None
            }
            Ok(_) => {
                if line.last() == Some(&b'\n') {
                    line.pop();
                    if line.last() == Some(&b'\r') {
                        line.pop();
                    }
                }
                Some(Ok(line))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

pub fn stdin_lines() -> LineSource<StdinLock<'static>> {
    LineSource::new(io::stdin().lock())
}
