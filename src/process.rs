use thiserror::Error;
use tracing::debug;

use crate::access::{AccessError, ByteAccess, ByteSource};

#[derive(Error, Debug)]
pub enum FindProcessError {
    #[error("no running process named {0:?}")]
    NotFound(String),
    #[error("failed to enumerate processes: {0}")]
    Enumeration(String),
    #[error("process enumeration is not supported on this platform")]
    Unsupported,
}

#[derive(Error, Debug)]
pub enum ProcessContextError {
    #[error(transparent)]
    Find(FindProcessError),
    #[error("access to process {pid} denied")]
    PermissionDenied { pid: u32 },
    #[error("failed to open process {pid}: {reason}")]
    Unavailable { pid: u32, reason: String },
    #[error("process memory access is not supported on this platform")]
    Unsupported,
}

#[cfg(windows)]
mod platform {
    use std::ffi::CStr;

    use winapi::shared::basetsd::SIZE_T;
    use winapi::shared::minwindef::{DWORD, FALSE, LPCVOID, LPVOID};
    use winapi::shared::winerror::ERROR_ACCESS_DENIED;
    use winapi::um::handleapi::{CloseHandle, INVALID_HANDLE_VALUE};
    use winapi::um::memoryapi::{ReadProcessMemory, WriteProcessMemory};
    use winapi::um::processthreadsapi::OpenProcess;
    use winapi::um::tlhelp32::{
        CreateToolhelp32Snapshot, Process32First, Process32Next, PROCESSENTRY32,
        TH32CS_SNAPPROCESS,
    };
    use winapi::um::winnt::{
        HANDLE, PROCESS_QUERY_INFORMATION, PROCESS_VM_OPERATION, PROCESS_VM_READ,
        PROCESS_VM_WRITE,
    };

    use crate::access::AccessError;

    use super::{FindProcessError, ProcessContextError};

    // Closes the toolhelp snapshot on every exit path out of find_process.
    struct Snapshot(HANDLE);

    impl Drop for Snapshot {
        fn drop(&mut self) {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }

    pub fn find_process(name: &str) -> Result<u32, FindProcessError> {
        let target = format!("{name}.exe");

        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        if raw == INVALID_HANDLE_VALUE {
            return Err(FindProcessError::Enumeration(
                std::io::Error::last_os_error().to_string(),
            ));
        }
        let snapshot = Snapshot(raw);

        let mut entry: PROCESSENTRY32 = unsafe { std::mem::zeroed() };
        entry.dwSize = std::mem::size_of::<PROCESSENTRY32>() as DWORD;

        if unsafe { Process32First(snapshot.0, &mut entry) } == FALSE {
            return Err(FindProcessError::Enumeration(
                std::io::Error::last_os_error().to_string(),
            ));
        }

        loop {
            let exe = unsafe { CStr::from_ptr(entry.szExeFile.as_ptr()) };
            if exe.to_bytes() == target.as_bytes() {
                return Ok(entry.th32ProcessID);
            }

            if unsafe { Process32Next(snapshot.0, &mut entry) } == FALSE {
                break;
            }
        }

        Err(FindProcessError::NotFound(name.to_string()))
    }

    pub struct ProcessHandle(HANDLE);

    impl ProcessHandle {
        pub fn open(pid: u32) -> Result<Self, ProcessContextError> {
            let handle = unsafe {
                OpenProcess(
                    PROCESS_VM_READ
                        | PROCESS_VM_WRITE
                        | PROCESS_VM_OPERATION
                        | PROCESS_QUERY_INFORMATION,
                    FALSE,
                    pid,
                )
            };
            if handle.is_null() {
                let err = std::io::Error::last_os_error();
                // The process may also have exited between enumeration and
                // open; that window surfaces here as Unavailable.
                return Err(match err.raw_os_error() {
                    Some(code) if code as DWORD == ERROR_ACCESS_DENIED => {
                        ProcessContextError::PermissionDenied { pid }
                    }
                    _ => ProcessContextError::Unavailable {
                        pid,
                        reason: err.to_string(),
                    },
                });
            }

            Ok(Self(handle))
        }

        pub fn read(&self, address: usize, buf: &mut [u8]) -> Result<(), AccessError> {
            let mut transferred: SIZE_T = 0;

            let result = unsafe {
                ReadProcessMemory(
                    self.0,
                    address as LPCVOID,
                    buf.as_mut_ptr() as LPVOID,
                    buf.len() as SIZE_T,
                    &mut transferred,
                )
            };
            if result == 0 {
                return Err(AccessError::Remote(
                    std::io::Error::last_os_error().to_string(),
                ));
            }
            if transferred != buf.len() as SIZE_T {
                return Err(AccessError::Remote(format!(
                    "short read: {transferred} of {} bytes at {address:#x}",
                    buf.len()
                )));
            }

            Ok(())
        }

        pub fn write(&self, address: usize, data: &[u8]) -> Result<(), AccessError> {
            let mut transferred: SIZE_T = 0;

            let result = unsafe {
                WriteProcessMemory(
                    self.0,
                    address as LPVOID,
                    data.as_ptr() as LPCVOID,
                    data.len() as SIZE_T,
                    &mut transferred,
                )
            };
            if result == 0 {
                return Err(AccessError::Remote(
                    std::io::Error::last_os_error().to_string(),
                ));
            }
            if transferred != data.len() as SIZE_T {
                return Err(AccessError::Remote(format!(
                    "short write: {transferred} of {} bytes at {address:#x}",
                    data.len()
                )));
            }

            Ok(())
        }
    }

    impl Drop for ProcessHandle {
        fn drop(&mut self) {
            unsafe {
                CloseHandle(self.0);
            }
        }
    }
}

#[cfg(not(windows))]
mod platform {
    use crate::access::AccessError;

    use super::{FindProcessError, ProcessContextError};

    pub fn find_process(_name: &str) -> Result<u32, FindProcessError> {
        Err(FindProcessError::Unsupported)
    }

    // Uninhabited: a ProcessContext can never be constructed here, so the
    // raw accessors are unreachable.
    pub enum ProcessHandle {}

    impl ProcessHandle {
        pub fn open(_pid: u32) -> Result<Self, ProcessContextError> {
            Err(ProcessContextError::Unsupported)
        }

        pub fn read(&self, _address: usize, _buf: &mut [u8]) -> Result<(), AccessError> {
            match *self {}
        }

        pub fn write(&self, _address: usize, _data: &[u8]) -> Result<(), AccessError> {
            match *self {}
        }
    }
}

/// Resolve an executable name (without extension) to a process id.
///
/// Takes a point-in-time snapshot of running processes and walks it in the
/// order the OS returns, comparing each entry's executable name against
/// `name` with the platform suffix appended, by exact equality. The first
/// match wins; callers must not assume names are unique. The snapshot handle
/// is released on every exit path.
pub fn find_process(name: &str) -> Result<u32, FindProcessError> {
    platform::find_process(name)
}

/// Context for byte accesses that read and write another process's memory.
///
/// Opening resolves `name` to a pid via [`find_process`], then acquires a
/// process handle with read/write access. Dropping the context closes the
/// handle; accesses borrow the context and therefore cannot outlive it.
pub struct ProcessContext {
    pid: u32,
    handle: platform::ProcessHandle,
}

impl ProcessContext {
    /// Open a context on the first running process named `name` (the
    /// platform executable suffix is appended before matching).
    ///
    /// The target may exit between enumeration and open; that race surfaces
    /// as [`ProcessContextError::Unavailable`]. On platforms without a
    /// remote-memory facility this fails with
    /// [`ProcessContextError::Unsupported`] before enumerating anything.
    pub fn open(name: &str) -> Result<Self, ProcessContextError> {
        let pid = find_process(name).map_err(|e| match e {
            FindProcessError::Unsupported => ProcessContextError::Unsupported,
            other => ProcessContextError::Find(other),
        })?;

        let handle = platform::ProcessHandle::open(pid)?;
        debug!(name, pid, "opened process context");

        Ok(Self { pid, handle })
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// A byte access of `size` bytes at the absolute remote `address`.
    pub fn access(&self, address: usize, size: usize) -> ByteAccess<'_> {
        ByteAccess::new(self, address, size)
    }
}

impl ByteSource for ProcessContext {
    fn raw_read(&self, offset: usize, buf: &mut [u8]) -> Result<(), AccessError> {
        self.handle.read(offset, buf)
    }

    fn raw_write(&self, offset: usize, data: &[u8]) -> Result<(), AccessError> {
        self.handle.write(offset, data)
    }
}
