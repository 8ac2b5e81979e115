use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("cannot access past end of byte access: offset {offset} len {len} size {size}")]
    OutOfRange {
        offset: usize,
        len: usize,
        size: usize,
    },
    #[error("backing surface ends before offset {offset} + len {len} (surface is {surface} bytes)")]
    OutOfSurface {
        offset: usize,
        len: usize,
        surface: usize,
    },
    #[error("remote memory access failed: {0}")]
    Remote(String),
}

/// Raw byte-level access to a backing medium, addressed by absolute offset.
///
/// Implemented once per backend: [`crate::file::FileContext`] over a mapped
/// file, [`crate::process::ProcessContext`] over another process's memory.
/// Implementations transfer exactly `buf.len()` / `data.len()` bytes or fail;
/// they never report a partial transfer as success.
pub trait ByteSource {
    fn raw_read(&self, offset: usize, buf: &mut [u8]) -> Result<(), AccessError>;
    fn raw_write(&self, offset: usize, data: &[u8]) -> Result<(), AccessError>;
}

/// A bounds-checked window over a region of a [`ByteSource`].
///
/// Offsets passed to [`read`](Self::read) and [`write`](Self::write) are
/// relative to the window, so accesses over identical data behave identically
/// no matter where that data actually lives. Multiple windows over the same
/// source may alias freely; there is no caching, every call goes straight to
/// the source.
///
/// A window borrows its source, so it cannot outlive the context that owns
/// the underlying resource.
pub struct ByteAccess<'a> {
    source: &'a dyn ByteSource,
    offset: usize,
    size: usize,
}

impl<'a> ByteAccess<'a> {
    /// Create a window of `size` bytes at absolute `offset` within `source`.
    ///
    /// The extent is not validated against the source here; a window that
    /// reaches past the backing surface fails on the individual read or
    /// write that crosses the end.
    pub fn new(source: &'a dyn ByteSource, offset: usize, size: usize) -> Self {
        Self {
            source,
            offset,
            size,
        }
    }

    /// Absolute offset of this window within the source medium.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes this window grants access to.
    pub fn size(&self) -> usize {
        self.size
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<(), AccessError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(AccessError::OutOfRange {
                offset,
                len,
                size: self.size,
            }),
        }
    }

    /// Read `len` bytes at a window-relative `offset`.
    ///
    /// Returns exactly `len` bytes, or `AccessError::OutOfRange` if the
    /// request reaches past the end of the window.
    pub fn read(&self, offset: usize, len: usize) -> Result<Vec<u8>, AccessError> {
        self.check_bounds(offset, len)?;

        let mut buf = vec![0u8; len];
        self.source.raw_read(self.offset + offset, &mut buf)?;

        Ok(buf)
    }

    /// Read every byte this window encapsulates.
    pub fn read_all(&self) -> Result<Vec<u8>, AccessError> {
        self.read(0, self.size)
    }

    /// Write `data` at a window-relative `offset`.
    ///
    /// Writes shorter than the window are legal; data is never truncated or
    /// padded. Bounds are checked before the source is touched, so a failed
    /// call leaves the medium unmodified.
    pub fn write(&self, offset: usize, data: &[u8]) -> Result<(), AccessError> {
        self.check_bounds(offset, data.len())?;

        self.source.raw_write(self.offset + offset, data)
    }
}
