use std::io::{BufReader, Read, SeekFrom, Write};

use anyhow::{Context, Result};

use crate::{input::LineSource, model::RetentionPolicy, store::LogStore};

/// Result of one truncation cycle. Sizes are in the policy's unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Retained {
    Unchanged,
    Truncated { before: u64, after: u64 },
}

impl RetentionPolicy {
    pub fn enforce<S: LogStore>(&self, store: &mut S) -> Result<Retained> {
        match *self {
            RetentionPolicy::ByBytes(bound) => enforce_size(store, bound),
            RetentionPolicy::ByLines(bound) => enforce_lines(store, bound),
        }
    }
}

/// Keeps only the trailing `bound` bytes of the store.
///
/// The cut is byte-exact: it may split a line or a multi-byte character.
pub fn enforce_size<S: LogStore>(store: &mut S, bound: u64) -> Result<Retained> {
    let size = store.size().context("reading log file size")?;
    if size <= bound {
        return Ok(Retained::Unchanged);
    }

    store
        .seek(SeekFrom::Start(size - bound))
        .context("seeking log file for truncation")?;

    // The file may have shrunk since it was measured; keep whatever is there.
    let mut suffix = Vec::with_capacity(bound as usize);
    Read::take(&mut *store, bound)
        .read_to_end(&mut suffix)
        .context("reading log file for truncation")?;

    rewrite(store, &suffix)?;
    Ok(Retained::Truncated {
        before: size,
        after: suffix.len() as u64,
    })
}

/// Keeps only the last `bound` lines of the store, each newline-terminated.
pub fn enforce_lines<S: LogStore>(store: &mut S, bound: usize) -> Result<Retained> {
    store
        .seek(SeekFrom::Start(0))
        .context("rewinding log file for truncation")?;
    let mut lines = LineSource::new(BufReader::new(&mut *store))
        .collect::<std::io::Result<Vec<_>>>()
        .context("reading log file for truncation")?;

    let total = lines.len();
    if total <= bound {
        return Ok(Retained::Unchanged);
    }

    let kept = lines.split_off(total - bound);
    let mut content = Vec::with_capacity(kept.iter().map(|line| line.len() + 1).sum());
    for line in &kept {
        content.extend_from_slice(line);
        content.push(b'\n');
    }

    rewrite(store, &content)?;
    Ok(Retained::Truncated {
        before: total as u64,
        after: kept.len() as u64,
    })
}

fn rewrite<S: LogStore>(store: &mut S, content: &[u8]) -> Result<()> {
    store.set_len(0).context("truncating log file")?;
    store
        .seek(SeekFrom::Start(0))
        .context("rewinding log file after truncation")?;
    store
        .write_all(content)
        .context("writing truncated content")?;
    store.flush().context("flushing truncated content")?;
    Ok(())
}
