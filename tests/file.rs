use std::cell::RefCell;
use std::io::Write;

use byteaccess::{AccessError, ByteAccess, ByteSource, FileContext, FileContextError};
use tempfile::NamedTempFile;

const CONTENTS: &[u8] = b"asdf01234567890123456";

fn temp_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(CONTENTS).expect("failed to seed temp file");
    file.flush().unwrap();
    file
}

#[test]
fn file_byte_access_round_trip() {
    let file = temp_file();
    let context = FileContext::open(file.path()).unwrap();

    let foo = context.access(0, 21);
    assert_eq!(foo.read(0, 4).unwrap(), b"asdf");
    assert_eq!(foo.read(4, 10).unwrap(), b"0123456789");

    foo.write(0, b"test").unwrap();
    assert_eq!(foo.read(0, 4).unwrap(), b"test");
}

#[test]
fn aliasing_accesses_observe_each_others_writes() {
    let file = temp_file();
    let context = FileContext::open(file.path()).unwrap();

    let foo = context.access(0, 21);
    let bar = context.access(0, 4);

    foo.write(0, b"test").unwrap();
    assert_eq!(bar.read_all().unwrap(), b"test");

    bar.write(0, b"asdf").unwrap();
    assert_eq!(foo.read(0, 4).unwrap(), b"asdf");
    assert_eq!(bar.read_all().unwrap(), foo.read(0, 4).unwrap());
}

#[test]
fn read_all_is_idempotent() {
    let file = temp_file();
    let context = FileContext::open(file.path()).unwrap();

    let access = context.access(2, 8);
    assert_eq!(access.read_all().unwrap(), access.read_all().unwrap());
}

#[test]
fn view_bound_and_file_bound_fail_differently() {
    let file = temp_file();
    let context = FileContext::open(file.path()).unwrap();
    assert_eq!(context.len(), 21);

    // Request exceeds the access's own bound.
    let small = context.access(0, 4);
    assert!(matches!(
        small.read(2, 3),
        Err(AccessError::OutOfRange { size: 4, .. })
    ));

    // Request fits the access but the file ends first.
    let wide = context.access(16, 10);
    assert!(matches!(
        wide.read(0, 10),
        Err(AccessError::OutOfSurface { surface: 21, .. })
    ));
    assert!(matches!(
        wide.write(0, b"0123456789"),
        Err(AccessError::OutOfSurface { .. })
    ));

    // Neither failure touched the file.
    assert_eq!(context.access(0, 21).read_all().unwrap(), CONTENTS);
}

#[test]
fn writes_reach_the_file_after_the_context_is_dropped() {
    let file = temp_file();

    {
        let context = FileContext::open(file.path()).unwrap();
        context.access(0, 21).write(0, b"test").unwrap();
    }

    let on_disk = std::fs::read(file.path()).unwrap();
    assert_eq!(&on_disk[..4], b"test");
    assert_eq!(&on_disk[4..], &CONTENTS[4..]);
}

#[test]
fn missing_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-file.bin");

    assert!(matches!(
        FileContext::open(&missing),
        Err(FileContextError::Unavailable { .. })
    ));
}

// In-memory source used to check that a file context and any other backend
// behave identically through equivalently-bounded accesses.
struct MirrorSource {
    bytes: RefCell<Vec<u8>>,
}

impl ByteSource for MirrorSource {
    fn raw_read(&self, offset: usize, buf: &mut [u8]) -> Result<(), AccessError> {
        let bytes = self.bytes.borrow();
        let end = offset + buf.len();
        if end > bytes.len() {
            return Err(AccessError::OutOfSurface {
                offset,
                len: buf.len(),
                surface: bytes.len(),
            });
        }
        buf.copy_from_slice(&bytes[offset..end]);
        Ok(())
    }

    fn raw_write(&self, offset: usize, data: &[u8]) -> Result<(), AccessError> {
        let mut bytes = self.bytes.borrow_mut();
        let end = offset + data.len();
        if end > bytes.len() {
            return Err(AccessError::OutOfSurface {
                offset,
                len: data.len(),
                surface: bytes.len(),
            });
        }
        bytes[offset..end].copy_from_slice(data);
        Ok(())
    }
}

#[test]
fn backends_over_identical_data_behave_identically() {
    let file = temp_file();
    let file_context = FileContext::open(file.path()).unwrap();
    let mirror = MirrorSource {
        bytes: RefCell::new(CONTENTS.to_vec()),
    };

    let file_access = file_context.access(4, 10);
    let mirror_access = ByteAccess::new(&mirror, 4, 10);

    for access in [&file_access, &mirror_access] {
        access.write(0, b"9876").unwrap();
        access.write(6, b"ab").unwrap();
        assert!(access.read(8, 4).is_err());
    }

    assert_eq!(
        file_access.read_all().unwrap(),
        mirror_access.read_all().unwrap()
    );
    assert_eq!(file_access.read_all().unwrap(), b"987645ab89");
}
