//! Backward tail scanning and in-place truncation.
//!
//! [`tail_file`] walks a file from its last byte toward its first,
//! reconstructs each line, asks a [`StopPredicate`] whether to keep it, and
//! finally replaces the file with the retained tail. Only the tail is ever
//! held in memory; bytes are pulled backward through a small block buffer.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{FilterError, Result};
use crate::predicate::{StopPredicate, Verdict};

/// Default number of bytes fetched per backward read.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024;

/// Tuning knobs for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Bytes fetched per backward read. `1` reads the file one byte at a time.
    pub block_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl ScanOptions {
    /// Sets the block size. Zero is raised to one.
    #[must_use]
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }
}

/// Why a scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The start of the file, or of its header, was reached; every examined
    /// line was retained.
    Exhausted,
    /// The predicate returned [`Verdict::Stop`].
    Predicate,
    /// The predicate failed with a boundary error, carried here as text.
    Boundary(String),
}

/// Outcome of a successful [`tail_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailReport {
    /// Number of lines kept.
    pub retained: usize,
    /// Why scanning ended.
    pub stop: StopReason,
    /// Whether the file was replaced. Files retained whole are never touched.
    pub rewritten: bool,
}

impl TailReport {
    const fn untouched(retained: usize) -> Self {
        Self {
            retained,
            stop: StopReason::Exhausted,
            rewritten: false,
        }
    }
}

/// Yields the bytes of a seekable source from last to first.
struct ReverseBytes<R> {
    inner: R,
    /// Bytes at or after this offset from the end have been fetched.
    offset: i64,
    block: Vec<u8>,
    remaining: usize,
    at_start: bool,
}

impl<R: Read + Seek> ReverseBytes<R> {
    fn new(inner: R, block_size: usize) -> Self {
        Self {
            inner,
            offset: 0,
            block: vec![0; block_size.max(1)],
            remaining: 0,
            at_start: false,
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        if self.remaining == 0 && !self.refill()? {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.block[self.remaining]))
    }

    /// Fetches the block preceding the already consumed region.
    fn refill(&mut self) -> io::Result<bool> {
        if self.at_start {
            return Ok(false);
        }
        let want = self.block.len() as i64;
        let end_pos = self.inner.seek(SeekFrom::End(self.offset))?;
        let len = want.min(end_pos as i64);
        if len == 0 {
            self.at_start = true;
            return Ok(false);
        }
        self.offset -= len;
        let start_pos = self.inner.seek(SeekFrom::End(self.offset))?;
        self.inner.read_exact(&mut self.block[..len as usize])?;
        self.remaining = len as usize;
        self.at_start = start_pos == 0;
        Ok(true)
    }
}

/// Truncates `path` to the tail accepted by `predicate`, with default options.
///
/// # Errors
///
/// See [`tail_file_with`].
pub fn tail_file<P>(path: impl AsRef<Path>, predicate: &P) -> Result<TailReport>
where
    P: StopPredicate + ?Sized,
{
    tail_file_with(path, predicate, &ScanOptions::default())
}

/// Truncates `path` to the tail accepted by `predicate`.
///
/// Lines are examined newest first. The first [`Verdict::Stop`] discards the
/// examined line and everything older; the kept lines are written back in
/// their original order, each newline terminated. A file whose lines are all
/// kept is left byte-for-byte unchanged, and a zero-byte file is not scanned.
///
/// The replacement is written to a temporary sibling and renamed over the
/// original, so a failure never leaves a partially truncated file. The
/// truncated file is therefore a new inode: hard links to the original keep
/// the old content.
///
/// Lines inside the predicate's [`StopPredicate::header_len`] are not
/// examined. Reaching them ends the scan as [`StopReason::Exhausted`].
///
/// # Errors
///
/// Returns [`FilterError::Config`] for an empty path, [`FilterError::Io`] for
/// read or write failures, and any non-boundary error raised by the predicate.
/// In every error case the file is left untouched.
pub fn tail_file_with<P>(
    path: impl AsRef<Path>,
    predicate: &P,
    options: &ScanOptions,
) -> Result<TailReport>
where
    P: StopPredicate + ?Sized,
{
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(FilterError::Config(
            "you must provide the path to a file".into(),
        ));
    }

    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        debug!(path = %path.display(), "empty file, nothing to filter");
        return Ok(TailReport::untouched(0));
    }

    let (mut tail, stop) = scan(ReverseBytes::new(file, options.block_size), len, predicate)?;
    if stop == StopReason::Exhausted {
        debug!(path = %path.display(), retained = tail.len(), "file retained whole");
        return Ok(TailReport::untouched(tail.len()));
    }

    tail.reverse();
    rewrite(path, &tail)?;
    debug!(path = %path.display(), retained = tail.len(), ?stop, "file truncated to tail");

    Ok(TailReport {
        retained: tail.len(),
        stop,
        rewritten: true,
    })
}

/// Collects the retained lines, newest first.
///
/// `len` is the size of the source; lines starting inside the predicate's
/// header are never examined.
fn scan<R, P>(
    mut bytes: ReverseBytes<R>,
    len: u64,
    predicate: &P,
) -> Result<(Vec<Vec<u8>>, StopReason)>
where
    R: Read + Seek,
    P: StopPredicate + ?Sized,
{
    let header_len = predicate.header_len();
    let mut tail: Vec<Vec<u8>> = Vec::new();
    // bytes of the current line, last byte first
    let mut line = Vec::new();
    let mut first = true;
    // offset of the byte last read
    let mut pos = len;

    loop {
        let byte = bytes.next_byte()?;
        if byte.is_some() {
            pos = pos.saturating_sub(1);
        }
        match byte {
            // trailing terminator of the last line
            Some(b'\n') if first => {}
            Some(b'\n') | None => {
                let line_start = if byte.is_some() { pos + 1 } else { 0 };
                if line_start < header_len {
                    debug!(retained = tail.len(), "header reached");
                    return Ok((tail, StopReason::Exhausted));
                }
                line.reverse();
                let verdict = {
                    let text = String::from_utf8_lossy(&line);
                    predicate.check(&text, tail.len())
                };
                match verdict {
                    Ok(Verdict::Retain) => tail.push(std::mem::take(&mut line)),
                    Ok(Verdict::Stop) => return Ok((tail, StopReason::Predicate)),
                    Err(e) if e.is_boundary() => {
                        debug!(error = %e, retained = tail.len(), "scan boundary reached");
                        return Ok((tail, StopReason::Boundary(e.to_string())));
                    }
                    Err(e) => return Err(e),
                }
                if byte.is_none() {
                    return Ok((tail, StopReason::Exhausted));
                }
            }
            Some(b) => line.push(b),
        }
        first = false;
    }
}

fn rewrite(path: &Path, lines: &[Vec<u8>]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let permissions = fs::metadata(path)?.permissions();

    let mut replacement = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(replacement.as_file_mut());
        for line in lines {
            writer.write_all(line)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    replacement.as_file().sync_all()?;
    fs::set_permissions(replacement.path(), permissions)?;
    replacement.persist(path).map_err(|e| e.error)?;
    Ok(())
}
