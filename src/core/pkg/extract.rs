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

//! Single-entry extraction
//!
//! Copies one entry's byte range out of an archive into a host file. The
//! output is staged in a temporary file next to the destination and only
//! renamed into place once every byte has been written, so a failed
//! extraction never leaves a short file behind.

use super::entry::PkgEntry;
use crate::core::error::PkgError;
use std::fs;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path};

/// Payload decryption hook
///
/// Called on every entry after it has been read and before it is written.
pub trait Decryptor {
    /// Transform `data` in place
    ///
    /// `entry.flags1` says whether the entry is encrypted and
    /// `entry.key_index()` selects the key.
    fn decrypt(&self, entry: &PkgEntry, data: &mut Vec<u8>) -> Result<(), PkgError>;
}

/// Leaves data untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDecryptor;

impl Decryptor for NoopDecryptor {
    fn decrypt(&self, entry: &PkgEntry, _data: &mut Vec<u8>) -> Result<(), PkgError> {
        if entry.is_encrypted() {
            log::warn!(
                "PKG: Entry 0x{:X} is encrypted (key {}), extracting raw bytes",
                entry.id,
                entry.key_index()
            );
        }
        Ok(())
    }
}

/// Chooses the file name an entry is extracted to
pub trait FilenameResolver {
    /// Relative path for `entry` inside the staging directory
    fn file_name(&self, entry: &PkgEntry) -> String;
}

/// Names every entry `file_<id>.bin`
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticNames;

impl FilenameResolver for SyntheticNames {
    fn file_name(&self, entry: &PkgEntry) -> String {
        format!("file_{}.bin", entry.id)
    }
}

/// Whether `name` is a non-empty relative path that stays inside its parent
pub(super) fn is_contained(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty() && path.components().all(|c| matches!(c, Component::Normal(_)))
}

/// Extract one entry to `dest`
///
/// Creates the parent directory if needed, reads exactly `entry.size`
/// bytes from `entry.offset`, runs them through `decryptor` and writes
/// the result atomically.
///
/// # Errors
///
/// - `PkgError::DirectoryCreate` if the parent directory cannot be created
/// - `PkgError::Seek` if the archive cannot be positioned at the entry
/// - `PkgError::Read` on an I/O failure or if the archive ends early
/// - `PkgError::Write` if the output cannot be written or moved into place
pub fn extract_entry<R: Read + Seek + ?Sized>(
    archive: &mut R,
    entry: &PkgEntry,
    dest: &Path,
    decryptor: &dyn Decryptor,
) -> Result<(), PkgError> {
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|source| PkgError::DirectoryCreate {
        path: parent.to_path_buf(),
        source,
    })?;

    let offset = entry.offset as u64;
    archive
        .seek(SeekFrom::Start(offset))
        .map_err(|source| PkgError::Seek { offset, source })?;

    let read_error = |source: io::Error| PkgError::Read {
        id: entry.id,
        offset,
        size: entry.size,
        source,
    };

    // Sizes come from the archive; let the buffer grow instead of trusting them
    let mut data = Vec::with_capacity((entry.size as usize).min(1 << 20));
    Read::take(&mut *archive, entry.size as u64)
        .read_to_end(&mut data)
        .map_err(read_error)?;
    if data.len() < entry.size as usize {
        return Err(read_error(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("archive ended after {} bytes", data.len()),
        )));
    }

    decryptor.decrypt(entry, &mut data)?;

    let write_error = |source: io::Error| PkgError::Write {
        path: dest.to_path_buf(),
        source,
    };
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_error)?;
    tmp.write_all(&data).map_err(write_error)?;
    tmp.flush().map_err(write_error)?;
    tmp.persist(dest).map_err(|e| write_error(e.error))?;

    log::debug!(
        "PKG: Extracted entry 0x{:X} ({} bytes) to {}",
        entry.id,
        data.len(),
        dest.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn entry(id: u32, offset: u32, size: u32) -> PkgEntry {
        PkgEntry {
            id,
            filename_offset: 0,
            flags1: 0,
            flags2: 0,
            offset,
            size,
        }
    }

    fn archive_bytes() -> Cursor<Vec<u8>> {
        Cursor::new((0..=255u8).collect())
    }

    #[test]
    fn test_extract_exact_range() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.bin");

        extract_entry(&mut archive_bytes(), &entry(1, 16, 8), &dest, &NoopDecryptor).unwrap();
        assert_eq!(
            fs::read(&dest).unwrap(),
            vec![16, 17, 18, 19, 20, 21, 22, 23]
        );
    }

    #[test]
    fn test_extract_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("sce_sys").join("nested").join("param.sfo");

        extract_entry(&mut archive_bytes(), &entry(2, 0, 4), &dest, &NoopDecryptor).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), vec![0, 1, 2, 3]);

        // Parent already exists the second time
        extract_entry(&mut archive_bytes(), &entry(2, 4, 4), &dest, &NoopDecryptor).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), vec![4, 5, 6, 7]);
    }

    #[test]
    fn test_empty_entry() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.bin");

        extract_entry(&mut archive_bytes(), &entry(3, 100, 0), &dest, &NoopDecryptor).unwrap();
        assert_eq!(fs::metadata(&dest).unwrap().len(), 0);
    }

    #[test]
    fn test_entry_past_end_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("short.bin");

        let err =
            extract_entry(&mut archive_bytes(), &entry(4, 250, 10), &dest, &NoopDecryptor)
                .unwrap_err();
        match err {
            PkgError::Read {
                id, ref source, ..
            } => {
                assert_eq!(id, 4);
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("Expected Read, got {:?}", other),
        }

        assert!(!dest.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let err = extract_entry(
            &mut archive_bytes(),
            &entry(5, 0, 4),
            &blocker.join("out.bin"),
            &NoopDecryptor,
        )
        .unwrap_err();
        assert!(matches!(err, PkgError::DirectoryCreate { .. }));
    }

    struct XorDecryptor {
        calls: Cell<u32>,
    }

    impl Decryptor for XorDecryptor {
        fn decrypt(&self, _entry: &PkgEntry, data: &mut Vec<u8>) -> Result<(), PkgError> {
            self.calls.set(self.calls.get() + 1);
            data.iter_mut().for_each(|b| *b ^= 0xFF);
            Ok(())
        }
    }

    #[test]
    fn test_custom_decryptor_sees_payload() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dec.bin");
        let decryptor = XorDecryptor {
            calls: Cell::new(0),
        };

        extract_entry(&mut archive_bytes(), &entry(6, 0, 2), &dest, &decryptor).unwrap();
        assert_eq!(decryptor.calls.get(), 1);
        assert_eq!(fs::read(&dest).unwrap(), vec![0xFF, 0xFE]);
    }

    #[test]
    fn test_synthetic_names() {
        assert_eq!(SyntheticNames.file_name(&entry(7, 0, 0)), "file_7.bin");
        assert_eq!(
            SyntheticNames.file_name(&entry(0x1000, 0, 0)),
            "file_4096.bin"
        );
    }

    #[test]
    fn test_contained_names() {
        assert!(is_contained("file_1.bin"));
        assert!(is_contained("sce_sys/param.sfo"));
        assert!(!is_contained(""));
        assert!(!is_contained("../escape.bin"));
        assert!(!is_contained("/etc/passwd"));
        assert!(!is_contained("./file.bin"));
    }
}
