use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::MmapMut;
use thiserror::Error;
use tracing::debug;

use crate::access::{AccessError, ByteAccess, ByteSource};

#[derive(Error, Debug)]
pub enum FileContextError {
    #[error("failed to map {path}: {source}")]
    Unavailable {
        path: String,
        source: std::io::Error,
    },
}

/// Context for byte accesses that read and write a file on disk.
///
/// The whole file is mapped into memory once at open; accesses are slice
/// copies against the shared mapping, so writes through one access are
/// immediately visible to every other access over the same context. Dropping
/// the context unmaps the file and closes the handle; accesses borrow the
/// context and therefore cannot outlive it.
///
/// Not `Sync`: accesses over one context are meant to be driven from a
/// single thread.
pub struct FileContext {
    // Handle kept open for the lifetime of the mapping.
    _file: File,
    mmap: RefCell<MmapMut>,
}

impl FileContext {
    /// Open `path` read-write and map its entire contents.
    ///
    /// Fails with [`FileContextError::Unavailable`] if the file cannot be
    /// opened or mapped. Empty files cannot be mapped and fail the same way.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FileContextError> {
        let path = path.as_ref();

        let unavailable = |source| FileContextError::Unavailable {
            path: path.display().to_string(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(unavailable)?;

        // Safety: the map is backed by a real file we just opened read-write,
        // and this context is the only place the mapping is mutated through.
        let mmap = unsafe { MmapMut::map_mut(&file) }.map_err(unavailable)?;

        debug!(path = %path.display(), len = mmap.len(), "mapped file context");

        Ok(Self {
            _file: file,
            mmap: RefCell::new(mmap),
        })
    }

    /// Length of the mapped file in bytes.
    pub fn len(&self) -> usize {
        self.mmap.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A byte access of `size` bytes at absolute file `offset`.
    ///
    /// The extent is not validated against the file length here; an access
    /// that reaches past the end of the file fails on the individual read or
    /// write that crosses it.
    pub fn access(&self, offset: usize, size: usize) -> ByteAccess<'_> {
        ByteAccess::new(self, offset, size)
    }
}

impl ByteSource for FileContext {
    fn raw_read(&self, offset: usize, buf: &mut [u8]) -> Result<(), AccessError> {
        let mmap = self.mmap.borrow();

        let end = offset
            .checked_add(buf.len())
            .filter(|&end| end <= mmap.len())
            .ok_or(AccessError::OutOfSurface {
                offset,
                len: buf.len(),
                surface: mmap.len(),
            })?;

        buf.copy_from_slice(&mmap[offset..end]);
        Ok(())
    }

    fn raw_write(&self, offset: usize, data: &[u8]) -> Result<(), AccessError> {
        let mut mmap = self.mmap.borrow_mut();
        let surface = mmap.len();

        let end = offset
            .checked_add(data.len())
            .filter(|&end| end <= surface)
            .ok_or(AccessError::OutOfSurface {
                offset,
                len: data.len(),
                surface,
            })?;

        mmap[offset..end].copy_from_slice(data);
        Ok(())
    }
}
