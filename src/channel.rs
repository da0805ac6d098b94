//! Byte channels (§4.6, L5): per-open-handle position state over a
//! [`RegularFile`], the read/write/seek surface [`crate::fs::FileSystem::open`]
//! hands back.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use log::warn;

use crate::error::{FsErrorKind, FsResult};
use crate::file::File;
use crate::fs::OpenOptions;

/// A seekable handle onto one regular file's bytes.
///
/// Each `ByteChannel` carries its own cursor; several channels may be open
/// on the same [`File`] simultaneously, each reading/writing independently.
/// Dropping (or explicitly [`ByteChannel::close`]ing) the last channel onto
/// a file that has already been unlinked reclaims its disk blocks (§8,
/// scenario S5).
pub struct ByteChannel {
    file: Arc<File>,
    position: AtomicU64,
    options: OpenOptions,
    closed: AtomicBool,
}

impl std::fmt::Debug for ByteChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteChannel")
            .field("file_id", &self.file.id())
            .field("position", &self.position())
            .field("options", &self.options)
            .finish()
    }
}

impl ByteChannel {
    pub(crate) fn new(file: Arc<File>, options: OpenOptions) -> Self {
        file.opened();
        ByteChannel {
            file,
            position: AtomicU64::new(0),
            options,
            closed: AtomicBool::new(false),
        }
    }

    /// The channel's current cursor position.
    pub fn position(&self) -> u64 {
        self.position.load(Ordering::SeqCst)
    }

    /// Move the cursor to `pos`, returning the new position. Seeking past
    /// the current end of the file is permitted; the next write there
    /// zero-fills the gap (§4.2).
    pub fn seek(&self, pos: u64) -> u64 {
        self.position.store(pos, Ordering::SeqCst);
        pos
    }

    /// Read up to `buf.len()` bytes starting at the cursor, advancing it by
    /// the number of bytes read. Reading at or past the end of the file
    /// returns `0`, not an error.
    pub fn read(&self, buf: &mut [u8]) -> FsResult<usize> {
        if !self.options.contains(OpenOptions::READ) {
            return Err(FsErrorKind::AccessDenied.into());
        }
        let regular = self.file.as_regular_file().ok_or(FsErrorKind::IsADirectory)?;
        let pos = self.position.load(Ordering::SeqCst);
        let n = regular.read(pos, buf).unwrap_or(0);
        self.position.fetch_add(n as u64, Ordering::SeqCst);
        self.file.touch_accessed(SystemTime::now());
        Ok(n)
    }

    /// Write `buf` at the cursor (or at the current end of file, if opened
    /// with [`OpenOptions::APPEND`]), advancing the cursor by the number of
    /// bytes written.
    pub fn write(&self, buf: &[u8]) -> FsResult<usize> {
        if !self.options.contains(OpenOptions::WRITE) {
            return Err(FsErrorKind::AccessDenied.into());
        }
        let regular = self.file.as_regular_file().ok_or(FsErrorKind::IsADirectory)?;
        let pos = if self.options.contains(OpenOptions::APPEND) {
            regular.size()
        } else {
            self.position.load(Ordering::SeqCst)
        };
        let written = regular.write(pos, buf)?;
        self.position.store(pos + written as u64, Ordering::SeqCst);
        self.file.touch_modified(SystemTime::now());
        Ok(written)
    }

    /// Close this channel, decrementing the underlying file's open-handle
    /// count. If the file was already unlinked and this was the last open
    /// handle, its blocks are reclaimed immediately. Idempotent.
    pub fn close(&self) -> FsResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let should_destroy = self.file.closed();
        if should_destroy {
            if let Some(regular) = self.file.as_regular_file() {
                regular.truncate(0);
            }
        }
        Ok(())
    }
}

impl Drop for ByteChannel {
    fn drop(&mut self) {
        if !self.closed.load(Ordering::SeqCst) {
            if let Err(err) = self.close() {
                warn!("error closing channel on drop: {err}");
            }
        }
    }
}
