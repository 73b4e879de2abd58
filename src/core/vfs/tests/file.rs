// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! File handle tests (open/read/seek/tell/close)

use crate::core::error::{ErrorCategory, VfsError};
use crate::core::vfs::{FileHandle, SeekOrigin, Vfs};
use tempfile::TempDir;

/// Create a VFS with `/app0` mounted on a scratch directory holding
/// `data.bin` = bytes 0..100
fn setup() -> (Vfs, TempDir) {
    let dir = TempDir::new().unwrap();
    let data: Vec<u8> = (0..100u8).collect();
    std::fs::write(dir.path().join("data.bin"), data).unwrap();

    let mut vfs = Vfs::default();
    vfs.mount("/app0", dir.path()).unwrap();
    (vfs, dir)
}

#[test]
fn test_open_and_read() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();
    assert_eq!(vfs.tell(handle), 0);
    assert_eq!(vfs.open_handles(), 1);

    let mut buf = [0u8; 10];
    assert_eq!(vfs.read(handle, &mut buf, 1, 10), 10);
    assert_eq!(buf, [0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(vfs.tell(handle), 10);

    vfs.close(handle).unwrap();
    assert_eq!(vfs.open_handles(), 0);
}

#[test]
fn test_read_counts_whole_items() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    vfs.seek(handle, 90, SeekOrigin::Start).unwrap();

    // 10 bytes remain: one whole 8-byte item plus a 2-byte tail
    let mut buf = [0u8; 32];
    assert_eq!(vfs.read(handle, &mut buf, 8, 4), 1);

    // Offset advances by the bytes actually read, not the items
    assert_eq!(vfs.tell(handle), 100);
    assert_eq!(&buf[..10], &[90, 91, 92, 93, 94, 95, 96, 97, 98, 99]);

    // At EOF nothing more is read
    assert_eq!(vfs.read(handle, &mut buf, 1, 32), 0);
    assert_eq!(vfs.tell(handle), 100);
}

#[test]
fn test_read_clamps_to_buffer() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    let mut buf = [0u8; 10];
    // Asking for 4 items of 4 bytes with a 10-byte buffer reads 2 items
    assert_eq!(vfs.read(handle, &mut buf, 4, 4), 2);
    assert_eq!(vfs.tell(handle), 8);
}

#[test]
fn test_degenerate_reads() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    let mut empty: [u8; 0] = [];
    assert_eq!(vfs.read(handle, &mut empty, 1, 10), 0);

    let mut buf = [0u8; 4];
    assert_eq!(vfs.read(handle, &mut buf, 0, 4), 0);
    assert_eq!(vfs.read(handle, &mut buf, 4, 0), 0);
    assert_eq!(vfs.tell(handle), 0);
}

#[test]
fn test_seek_origins() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    assert_eq!(vfs.seek(handle, 20, SeekOrigin::Start).unwrap(), 20);
    assert_eq!(vfs.tell(handle), 20);

    assert_eq!(vfs.seek(handle, 5, SeekOrigin::Current).unwrap(), 25);
    assert_eq!(vfs.seek(handle, -10, SeekOrigin::Current).unwrap(), 15);
    assert_eq!(vfs.seek(handle, -1, SeekOrigin::End).unwrap(), 99);

    let mut byte = [0u8; 1];
    assert_eq!(vfs.read(handle, &mut byte, 1, 1), 1);
    assert_eq!(byte[0], 99);
    assert_eq!(vfs.tell(handle), 100);
}

#[test]
fn test_negative_seek_leaves_offset_unchanged() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();
    vfs.seek(handle, 42, SeekOrigin::Start).unwrap();

    let err = vfs.seek(handle, -1, SeekOrigin::Start).unwrap_err();
    assert!(matches!(err, VfsError::Seek(_)));
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(vfs.tell(handle), 42);

    assert!(vfs.seek(handle, -100, SeekOrigin::Current).is_err());
    assert_eq!(vfs.tell(handle), 42);

    assert!(vfs.seek(handle, -1000, SeekOrigin::End).is_err());
    assert_eq!(vfs.tell(handle), 42);

    // The handle still works afterwards
    let mut byte = [0u8; 1];
    assert_eq!(vfs.read(handle, &mut byte, 1, 1), 1);
    assert_eq!(byte[0], 42);
}

#[test]
fn test_seek_past_end_is_allowed() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    assert_eq!(vfs.seek(handle, 500, SeekOrigin::Start).unwrap(), 500);
    let mut buf = [0u8; 4];
    assert_eq!(vfs.read(handle, &mut buf, 1, 4), 0);
    assert_eq!(vfs.tell(handle), 500);
}

#[test]
fn test_open_unresolved_path() {
    let (mut vfs, _dir) = setup();
    let err = vfs.open("/data/file.bin", "rb").unwrap_err();
    assert!(matches!(err, VfsError::UnresolvedPath(ref p) if p == "/data/file.bin"));
    assert_eq!(err.category(), ErrorCategory::Path);
    assert_eq!(vfs.open_handles(), 0);
}

#[test]
fn test_open_missing_host_file() {
    let (mut vfs, _dir) = setup();
    let err = vfs.open("/app0/missing.bin", "rb").unwrap_err();
    match err {
        VfsError::HostOpen {
            ref virtual_path,
            ref source,
            ..
        } => {
            assert_eq!(virtual_path, "/app0/missing.bin");
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("Expected HostOpen, got {:?}", other),
    }
    assert_eq!(err.category(), ErrorCategory::Io);
}

#[test]
fn test_open_invalid_mode() {
    let (mut vfs, _dir) = setup();
    let err = vfs.open("/app0/data.bin", "z").unwrap_err();
    assert!(matches!(err, VfsError::InvalidMode(_)));
}

#[test]
fn test_invalid_handle_is_total() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();
    vfs.close(handle).unwrap();

    let mut buf = [0u8; 4];
    assert_eq!(vfs.read(handle, &mut buf, 1, 4), 0);
    assert_eq!(vfs.tell(handle), -1);
    assert!(matches!(
        vfs.seek(handle, 0, SeekOrigin::Start),
        Err(VfsError::InvalidHandle(_))
    ));

    // Second close is rejected rather than touching another file
    assert!(matches!(
        vfs.close(handle),
        Err(VfsError::InvalidHandle(_))
    ));
}

#[test]
fn test_handles_are_independent() {
    let (mut vfs, _dir) = setup();
    let a = vfs.open("/app0/data.bin", "rb").unwrap();
    let b = vfs.open("/app0/data.bin", "rb").unwrap();
    assert_ne!(a, b);

    vfs.seek(a, 50, SeekOrigin::Start).unwrap();
    assert!(vfs.seek(b, -5, SeekOrigin::Start).is_err());

    assert_eq!(vfs.tell(a), 50);
    assert_eq!(vfs.tell(b), 0);

    vfs.close(a).unwrap();
    assert_eq!(vfs.tell(b), 0);
    vfs.close(b).unwrap();
}

#[test]
fn test_handles_survive_unmount_and_init() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    vfs.unmount("/app0").unwrap();
    vfs.init();

    let mut buf = [0u8; 3];
    assert_eq!(vfs.read(handle, &mut buf, 1, 3), 3);
    assert_eq!(buf, [0, 1, 2]);
    vfs.close(handle).unwrap();
}

#[test]
fn test_write_then_read_back() {
    let (mut vfs, dir) = setup();
    let handle = vfs.open("/app0/save.dat", "w+b").unwrap();

    let payload = b"SAVEDATA";
    assert_eq!(vfs.write(handle, payload, 4, 2), 2);
    assert_eq!(vfs.tell(handle), 8);

    vfs.seek(handle, 0, SeekOrigin::Start).unwrap();
    let mut buf = [0u8; 8];
    assert_eq!(vfs.read(handle, &mut buf, 8, 1), 1);
    assert_eq!(&buf, payload);
    vfs.close(handle).unwrap();

    assert_eq!(std::fs::read(dir.path().join("save.dat")).unwrap(), payload);
}

#[test]
fn test_append_mode() {
    let (mut vfs, dir) = setup();
    std::fs::write(dir.path().join("log.txt"), b"abc").unwrap();

    let handle = vfs.open("/app0/log.txt", "a").unwrap();
    // Positioned at the end before anything is written
    assert_eq!(vfs.tell(handle), 3);
    assert_eq!(vfs.write(handle, b"def", 1, 3), 3);
    assert_eq!(vfs.tell(handle), 6);
    vfs.close(handle).unwrap();

    assert_eq!(std::fs::read(dir.path().join("log.txt")).unwrap(), b"abcdef");
}

#[test]
fn test_append_plus_starts_at_end() {
    let (mut vfs, dir) = setup();
    std::fs::write(dir.path().join("log.txt"), b"abc").unwrap();

    let handle = vfs.open("/app0/log.txt", "a+").unwrap();
    assert_eq!(vfs.tell(handle), 3);

    // Reading from the start is allowed; writes still go to the end
    vfs.seek(handle, 0, SeekOrigin::Start).unwrap();
    let mut buf = [0u8; 3];
    assert_eq!(vfs.read(handle, &mut buf, 1, 3), 3);
    assert_eq!(&buf, b"abc");

    vfs.seek(handle, 0, SeekOrigin::Start).unwrap();
    assert_eq!(vfs.write(handle, b"de", 1, 2), 2);
    assert_eq!(vfs.tell(handle), 5);
    vfs.close(handle).unwrap();

    assert_eq!(std::fs::read(dir.path().join("log.txt")).unwrap(), b"abcde");
}

#[test]
fn test_write_on_read_only_handle() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();
    assert_eq!(vfs.write(handle, b"xx", 1, 2), 0);
    assert_eq!(vfs.tell(handle), 0);
}

#[test]
fn test_close_all() {
    let (mut vfs, _dir) = setup();
    let handles: Vec<FileHandle> = (0..3)
        .map(|_| vfs.open("/app0/data.bin", "rb").unwrap())
        .collect();
    assert_eq!(vfs.open_handles(), 3);

    vfs.close_all();
    assert_eq!(vfs.open_handles(), 0);
    for handle in handles {
        assert_eq!(vfs.tell(handle), -1);
    }
}

#[test]
fn test_file_metadata() {
    let (mut vfs, _dir) = setup();
    let handle = vfs.open("/app0/data.bin", "rb").unwrap();

    let file = vfs.file(handle).unwrap();
    assert_eq!(file.virtual_path(), "/app0/data.bin");
    assert!(file.mode().read);
    assert!(!file.mode().is_writable());
}
