//! Common interface for reading and writing binary data in files and
//! processes.
//!
//! Within a [`ByteAccess`], offsets are relative. Accesses that wrap the
//! same data always appear and behave identically, regardless of where that
//! data actually is: a region of a file on disk or a region of another
//! process's memory. This is useful when the same operations need to be
//! performed on identical data from different locations.
//!
//! A context ([`FileContext`] or [`ProcessContext`]) owns the backing
//! resource and hands out any number of accesses over it. Accesses borrow
//! the context, so the resource outlives every access derived from it;
//! dropping the context unmaps the file or closes the process handle.
//!
//! ```no_run
//! use byteaccess::FileContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let context = FileContext::open("file.bin")?;
//!
//! let foo = context.access(0x10, 8);
//! foo.write(0, b"somedata")?;
//! assert_eq!(foo.read(4, 4)?, b"data");
//! # Ok(())
//! # }
//! ```
//!
//! Process contexts work the same way, addressed by absolute remote
//! address instead of file offset:
//!
//! ```no_run
//! use byteaccess::ProcessContext;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let context = ProcessContext::open("halo")?;
//! let header = context.access(0x6A8154, 4);
//! let bytes = header.read_all()?;
//! # Ok(())
//! # }
//! ```
//!
//! Everything is synchronous and single-threaded: reads and writes go
//! straight to the backing medium with no caching, no retries and no
//! internal locking. Callers driving one context from multiple threads must
//! synchronize themselves.

pub mod access;
pub mod file;
pub mod process;

pub use access::{AccessError, ByteAccess, ByteSource};
pub use file::{FileContext, FileContextError};
pub use process::{find_process, FindProcessError, ProcessContext, ProcessContextError};
