//! Memory-mapped file windows with an advancing cursor.
//!
//! Grounded in `MemoryMappedFile` from
//! `examples/original_source/MemoryMapping/MemoryMappedFile.h`: a mapping
//! over a region of a file, with a cache hint passed through to the OS, an
//! access mode fixed at open time, and a cursor that `ReadFrom`/`CopyTo`/
//! `ReadLine` advance as they consume the mapping.
//!
//! Two behaviors are deliberately fixed relative to that source (see the
//! design notes' redesign flags):
//!
//! - [`MappedWindow::read_line`] itself advances the cursor past the
//!   trailing newline; callers never issue a compensating [`MappedWindow::advance`].
//! - [`MappedWindow::copy_to`] and [`MappedWindow::read_from`] use the same
//!   advance convention: both move the cursor forward by the number of
//!   bytes transferred.

use memmap2::{Advice, Mmap, MmapMut, MmapOptions};
use std::error::Error;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

/// Hint passed to the OS about the expected access pattern of a mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CacheHint {
    Normal,
    Sequential,
    Random,
}

/// Access mode a [`MappedWindow`] was opened with.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Error opening, remapping, or operating on a [`MappedWindow`].
#[derive(Debug)]
#[non_exhaustive]
pub enum MappedError {
    Io(io::Error),
    /// An operation attempted to advance the cursor past the end (or
    /// before the start) of the current mapping.
    OutOfBounds,
    /// The access mode of the window does not permit the attempted
    /// operation (e.g. writing to a `ReadOnly` window).
    AccessDenied,
    /// A typed zero-copy view was requested at an offset that isn't
    /// properly aligned for the target type.
    AlignmentHazard { offset: usize, required: usize },
    /// The mapping syscall failed, or a write-mode `Open`/`Remap` was
    /// requested with `bytes=0` (write modes must size the mapping
    /// explicitly rather than default to "whole file").
    MappingFailed,
}

impl Error for MappedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MappedError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for MappedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MappedError::Io(err) => write!(f, "I/O error: {}", err),
            MappedError::OutOfBounds => write!(f, "operation would move past the mapped window"),
            MappedError::AccessDenied => write!(f, "operation not permitted by the window's access mode"),
            MappedError::AlignmentHazard { offset, required } => write!(
                f,
                "offset {} is not aligned to the required {}-byte boundary",
                offset, required
            ),
            MappedError::MappingFailed => write!(f, "mapping failed"),
        }
    }
}

impl From<io::Error> for MappedError {
    fn from(err: io::Error) -> Self {
        MappedError::Io(err)
    }
}

impl From<MappedError> for io::Error {
    fn from(err: MappedError) -> Self {
        match err {
            MappedError::Io(err) => err,
            other => io::Error::new(io::ErrorKind::Other, other.to_string()),
        }
    }
}

enum Backing {
    ReadOnly(Mmap),
    Writable(MmapMut),
}

impl Backing {
    fn as_slice(&self) -> &[u8] {
        match self {
            Backing::ReadOnly(m) => &m[..],
            Backing::Writable(m) => &m[..],
        }
    }

    fn advise(&self, advice: Advice) -> io::Result<()> {
        match self {
            Backing::ReadOnly(m) => m.advise(advice),
            Backing::Writable(m) => m.advise(advice),
        }
    }
}

fn advice_for(hint: CacheHint) -> Advice {
    match hint {
        CacheHint::Normal => Advice::Normal,
        CacheHint::Sequential => Advice::Sequential,
        CacheHint::Random => Advice::Random,
    }
}

/// The OS allocation granularity mappings must be offset-aligned to.
///
/// `memmap2` doesn't expose this directly on all platforms, so a
/// conservative 4 KiB is used; it is a multiple of the true granularity on
/// every platform this crate targets.
const ALLOCATION_GRANULARITY: u64 = 4096;

/// A memory-mapped view over a region of a file, with a cursor that
/// advances as bytes are consumed or produced.
pub struct MappedWindow {
    file: File,
    backing: Backing,
    /// Offset into the file at which the current mapping starts.
    base_offset: u64,
    /// Cursor position within the current mapping, in `[0, backing.len()]`.
    cursor: usize,
    /// Alignment skew captured at open/remap time: the distance from
    /// `base_offset` to the originally requested offset. [`MappedWindow::rewind`]
    /// restores the cursor here, not to absolute 0, so that `position()`
    /// after a rewind agrees with the position the window was opened at.
    skew: usize,
    access_mode: AccessMode,
    cache_hint: CacheHint,
}

impl MappedWindow {
    /// Maps `path` starting at file offset 0. `bytes=0` maps the whole
    /// file; write modes must pass a nonzero `bytes` (fails with
    /// [`MappedError::MappingFailed`] otherwise, since a write mapping
    /// can't default to "whatever the file currently is").
    pub fn open(
        path: impl AsRef<Path>,
        bytes: u64,
        access_mode: AccessMode,
        cache_hint: CacheHint,
    ) -> Result<Self, MappedError> {
        if bytes == 0 && access_mode != AccessMode::ReadOnly {
            return Err(MappedError::MappingFailed);
        }
        let file = match access_mode {
            AccessMode::ReadOnly => OpenOptions::new().read(true).open(path)?,
            AccessMode::WriteOnly => OpenOptions::new().write(true).open(path)?,
            AccessMode::ReadWrite => OpenOptions::new().read(true).write(true).open(path)?,
        };
        Self::from_file(file, 0, bytes, access_mode, cache_hint)
    }

    /// Maps `file` starting at `offset`, which is rounded down to the
    /// nearest allocation-granularity boundary; the cursor starts at the
    /// difference, so that [`MappedWindow::position`] still reports
    /// progress relative to the requested `offset`. `bytes=0` maps to the
    /// end of the file; a nonzero `bytes` is the length of the mapping
    /// starting at `offset`, truncated if it would run past the end of the
    /// file.
    fn from_file(
        file: File,
        offset: u64,
        bytes: u64,
        access_mode: AccessMode,
        cache_hint: CacheHint,
    ) -> Result<Self, MappedError> {
        let aligned = offset - offset % ALLOCATION_GRANULARITY;
        let skew = (offset - aligned) as usize;
        let file_len = file.metadata()?.len();
        let available = file_len.saturating_sub(aligned);
        let mapped_len = if bytes == 0 {
            available
        } else {
            (skew as u64 + bytes).min(available)
        };
        let backing = match access_mode {
            AccessMode::ReadOnly => {
                let mmap = unsafe { MmapOptions::new().offset(aligned).len(mapped_len as usize).map(&file)? };
                Backing::ReadOnly(mmap)
            }
            AccessMode::WriteOnly | AccessMode::ReadWrite => {
                let mmap =
                    unsafe { MmapOptions::new().offset(aligned).len(mapped_len as usize).map_mut(&file)? };
                Backing::Writable(mmap)
            }
        };
        backing.advise(advice_for(cache_hint))?;
        Ok(MappedWindow { file, backing, base_offset: aligned, cursor: skew, skew, access_mode, cache_hint })
    }

    /// Remaps the same underlying file at a new file offset, aligned down
    /// to the OS allocation granularity. `bytes=0` means "to end of file";
    /// requests past EOF are truncated.
    pub fn remap_at(&mut self, offset: u64, bytes: u64) -> Result<(), MappedError> {
        let file = self.file.try_clone()?;
        let remapped = Self::from_file(file, offset, bytes, self.access_mode, self.cache_hint)?;
        *self = remapped;
        Ok(())
    }

    /// Moves the cursor back to the start of the current mapping (the
    /// alignment skew captured at open/remap time, not necessarily 0).
    pub fn rewind(&mut self) {
        self.cursor = self.skew;
    }

    /// Total length of the current mapping, in bytes.
    pub fn len(&self) -> usize {
        self.backing.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor offset within the current mapping.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// The file offset the current mapping starts at (before alignment
    /// skew is subtracted).
    pub fn base_offset(&self) -> u64 {
        self.base_offset
    }

    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Bytes remaining between the cursor and the end of the mapping.
    pub fn remaining(&self) -> usize {
        self.len() - self.cursor
    }

    /// Advances the cursor by `n` bytes without reading anything.
    pub fn advance(&mut self, n: usize) -> Result<(), MappedError> {
        let new_cursor = self.cursor.checked_add(n).ok_or(MappedError::OutOfBounds)?;
        if new_cursor > self.len() {
            return Err(MappedError::OutOfBounds);
        }
        self.cursor = new_cursor;
        Ok(())
    }

    /// Returns the whole mapping as a byte slice, irrespective of the
    /// cursor.
    pub fn as_bytes(&self) -> &[u8] {
        self.backing.as_slice()
    }

    /// Reads `n` bytes at the cursor and advances past them, returning a
    /// zero-copy view into the mapping.
    pub fn read_exact(&mut self, n: usize) -> Result<&[u8], MappedError> {
        let end = self.cursor.checked_add(n).ok_or(MappedError::OutOfBounds)?;
        if end > self.len() {
            return Err(MappedError::OutOfBounds);
        }
        let slice = &self.backing.as_slice()[self.cursor..end];
        self.cursor = end;
        Ok(slice)
    }

    /// Reads a line, stopping at (and consuming) the next `\n`, or the end
    /// of the mapping if no `\n` remains. The returned slice excludes the
    /// newline; the cursor lands just past it.
    pub fn read_line(&mut self) -> Result<&[u8], MappedError> {
        let bytes = self.backing.as_slice();
        let start = self.cursor;
        match bytes[start..].iter().position(|&b| b == b'\n') {
            Some(rel) => {
                let line_end = start + rel;
                self.cursor = line_end + 1;
                Ok(&bytes[start..line_end])
            }
            None => {
                self.cursor = bytes.len();
                Ok(&bytes[start..])
            }
        }
    }

    /// Copies `data` into the mapping at the cursor and advances past it.
    /// Requires [`AccessMode::WriteOnly`] or [`AccessMode::ReadWrite`].
    pub fn copy_to(&mut self, data: &[u8]) -> Result<(), MappedError> {
        if self.access_mode == AccessMode::ReadOnly {
            return Err(MappedError::AccessDenied);
        }
        let end = self.cursor.checked_add(data.len()).ok_or(MappedError::OutOfBounds)?;
        if end > self.len() {
            return Err(MappedError::OutOfBounds);
        }
        match &mut self.backing {
            Backing::Writable(m) => m[self.cursor..end].copy_from_slice(data),
            Backing::ReadOnly(_) => return Err(MappedError::AccessDenied),
        }
        self.cursor = end;
        Ok(())
    }

    /// Reads `buf.len()` bytes from the cursor into `buf` and advances past
    /// them, using the same advance convention as [`MappedWindow::copy_to`].
    pub fn read_from(&mut self, buf: &mut [u8]) -> Result<(), MappedError> {
        let data = self.read_exact(buf.len())?;
        buf.copy_from_slice(data);
        Ok(())
    }

    /// Flushes any pending writes to the backing file.
    pub fn flush(&self) -> Result<(), MappedError> {
        match &self.backing {
            Backing::Writable(m) => m.flush()?,
            Backing::ReadOnly(_) => {}
        }
        Ok(())
    }

    /// Returns a zero-copy typed view of `count` elements of `T` starting
    /// at byte offset `offset` within the mapping, or
    /// [`MappedError::AlignmentHazard`] if `offset` isn't aligned for `T`.
    ///
    /// # Safety
    ///
    /// The caller must ensure `T` has no padding and that any bit pattern
    /// of its size is a valid `T` (true for the fixed-width numeric types
    /// this crate reads).
    pub unsafe fn view_at<T>(&self, offset: usize, count: usize) -> Result<&[T], MappedError> {
        let required = std::mem::align_of::<T>();
        let base_ptr = self.as_bytes().as_ptr();
        if (base_ptr as usize + offset) % required != 0 {
            return Err(MappedError::AlignmentHazard { offset, required });
        }
        let byte_len = count.checked_mul(std::mem::size_of::<T>()).ok_or(MappedError::OutOfBounds)?;
        if offset.checked_add(byte_len).ok_or(MappedError::OutOfBounds)? > self.len() {
            return Err(MappedError::OutOfBounds);
        }
        let ptr = base_ptr.add(offset) as *const T;
        Ok(std::slice::from_raw_parts(ptr, count))
    }
}

impl Read for MappedWindow {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        let data = self.read_exact(n).map_err(io::Error::from)?;
        buf[..n].copy_from_slice(data);
        Ok(n)
    }
}

impl Write for MappedWindow {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        self.copy_to(&buf[..n]).map_err(io::Error::from)?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        MappedWindow::flush(self).map_err(io::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn file_with(contents: &[u8]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_exact_advances_cursor() {
        let f = file_with(b"hello world");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        assert_eq!(win.read_exact(5).unwrap(), b"hello");
        assert_eq!(win.position(), 5);
        assert_eq!(win.read_exact(1).unwrap(), b" ");
    }

    #[test]
    fn read_line_consumes_newline_itself() {
        let f = file_with(b"first\nsecond");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Sequential).unwrap();
        assert_eq!(win.read_line().unwrap(), b"first");
        // No compensating advance(1) needed: the newline is already behind us.
        assert_eq!(win.read_exact(6).unwrap(), b"second");
    }

    #[test]
    fn rewind_resets_to_window_start() {
        let f = file_with(b"abcdef");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        win.advance(3).unwrap();
        win.rewind();
        assert_eq!(win.position(), 0);
        assert_eq!(win.read_exact(3).unwrap(), b"abc");
    }

    #[test]
    fn rewind_after_unaligned_remap_restores_skew_not_zero() {
        let mut contents = vec![0u8; ALLOCATION_GRANULARITY as usize + 16];
        contents[ALLOCATION_GRANULARITY as usize..].copy_from_slice(b"needleandmore123");
        let f = file_with(&contents[..ALLOCATION_GRANULARITY as usize + 16]);

        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        // An offset one byte past the allocation granularity boundary forces
        // a nonzero skew between `base_offset` and the requested offset.
        win.remap_at(ALLOCATION_GRANULARITY + 1, 0).unwrap();
        assert_eq!(win.position(), 1);
        win.advance(5).unwrap();
        assert_eq!(win.position(), 6);
        win.rewind();
        assert_eq!(win.position(), 1, "rewind must restore the skew, not jump to absolute 0");
    }

    #[test]
    fn open_with_bytes_zero_in_write_mode_fails() {
        let f = file_with(b"abcd");
        let err = MappedWindow::open(f.path(), 0, AccessMode::ReadWrite, CacheHint::Normal).unwrap_err();
        assert!(matches!(err, MappedError::MappingFailed));
    }

    #[test]
    fn remap_past_eof_is_truncated() {
        let f = file_with(b"abcd");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        win.remap_at(0, 1000).unwrap();
        assert_eq!(win.len(), 4);
    }

    #[test]
    fn copy_to_and_read_from_share_advance_convention() {
        let f = NamedTempFile::new().unwrap();
        f.as_file().set_len(16).unwrap();
        let mut win = MappedWindow::open(f.path(), 16, AccessMode::ReadWrite, CacheHint::Normal).unwrap();
        win.copy_to(b"abcd").unwrap();
        assert_eq!(win.position(), 4);
        win.rewind();
        let mut buf = [0u8; 4];
        win.read_from(&mut buf).unwrap();
        assert_eq!(&buf, b"abcd");
        assert_eq!(win.position(), 4);
    }

    #[test]
    fn read_only_window_rejects_writes() {
        let f = file_with(b"abcd");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        assert!(matches!(win.copy_to(b"x"), Err(MappedError::AccessDenied)));
    }

    #[test]
    fn advance_past_end_is_out_of_bounds() {
        let f = file_with(b"abcd");
        let mut win = MappedWindow::open(f.path(), 0, AccessMode::ReadOnly, CacheHint::Normal).unwrap();
        assert!(matches!(win.advance(100), Err(MappedError::OutOfBounds)));
    }
}
