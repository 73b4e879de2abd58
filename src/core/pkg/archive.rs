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

//! Archive orchestration
//!
//! Ties header/entry decoding and single-entry extraction together:
//! opening an archive, extracting all of it, and the open → extract →
//! mount pipeline that exposes an archive through the VFS.

use super::codec::read_full;
use super::entry::{PkgEntry, ENTRY_SIZE};
use super::extract::{
    extract_entry, is_contained, Decryptor, FilenameResolver, NoopDecryptor, SyntheticNames,
};
use super::header::PkgHeader;
use crate::core::config::PkgConfig;
use crate::core::error::PkgError;
use crate::core::vfs::Vfs;
use serde::Serialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Read and decode the header at the start of `archive`
///
/// # Errors
///
/// - `PkgError::Seek` if the archive cannot be rewound
/// - `PkgError::TruncatedRead` if the archive is shorter than 4096 bytes
/// - `PkgError::BadMagic` if the magic is wrong
pub fn parse_header<R: Read + Seek + ?Sized>(archive: &mut R) -> Result<PkgHeader, PkgError> {
    archive
        .seek(SeekFrom::Start(0))
        .map_err(|source| PkgError::Seek { offset: 0, source })?;
    PkgHeader::read_from(archive)
}

/// Read the `file_count` entries found at `table_offset`
///
/// Either every record is decoded or an error is returned; a partial
/// table is never handed back. Entry bounds are not checked here.
///
/// # Errors
///
/// - `PkgError::Seek` if the table offset cannot be reached
/// - `PkgError::TruncatedRead` if any record is short
/// - `PkgError::Io` if the underlying read fails
pub fn parse_entries<R: Read + Seek + ?Sized>(
    archive: &mut R,
    header: &PkgHeader,
) -> Result<Vec<PkgEntry>, PkgError> {
    let table_offset = header.table_offset as u64;

    // Bound the up-front allocation by what the archive can actually hold
    let archive_len = archive
        .seek(SeekFrom::End(0))
        .map_err(|source| PkgError::Seek { offset: 0, source })?;
    archive
        .seek(SeekFrom::Start(table_offset))
        .map_err(|source| PkgError::Seek {
            offset: table_offset,
            source,
        })?;

    let count = header.file_count as usize;
    let room = (archive_len.saturating_sub(table_offset) / ENTRY_SIZE as u64) as usize;
    let mut entries = Vec::with_capacity(count.min(room));

    let mut record = [0u8; ENTRY_SIZE];
    for index in 0..count {
        let offset = table_offset + (index * ENTRY_SIZE) as u64;
        let got =
            read_full(archive, &mut record).map_err(|source| PkgError::Io { offset, source })?;
        if got < ENTRY_SIZE {
            return Err(PkgError::TruncatedRead {
                offset,
                expected: ENTRY_SIZE,
                got,
            });
        }
        entries.push(PkgEntry::from_bytes(&record, offset)?);
    }

    Ok(entries)
}

/// A file written by extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedFile {
    /// Entry id
    pub id: u32,
    /// Path relative to the extraction directory
    pub name: String,
    /// Size in bytes
    pub size: u32,
}

/// An opened archive with its decoded header
#[derive(Debug)]
pub struct PkgArchive {
    path: PathBuf,
    reader: BufReader<File>,
    header: PkgHeader,
    len: u64,
}

impl PkgArchive {
    /// Open an archive and decode its header
    ///
    /// # Errors
    ///
    /// - `PkgError::Open` if the file cannot be opened
    /// - Any error from [`parse_header`]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, PkgError> {
        let path = path.as_ref();
        let open_error = |source: io::Error| PkgError::Open {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_error)?;
        let len = file.metadata().map_err(open_error)?.len();
        let mut reader = BufReader::new(file);
        let header = parse_header(&mut reader)?;

        log::debug!(
            "PKG: Opened {} ({} bytes, {} files, table at 0x{:X})",
            path.display(),
            len,
            header.file_count,
            header.table_offset
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            len,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &PkgHeader {
        &self.header
    }

    /// Archive length in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Decode the entry table
    pub fn entries(&mut self) -> Result<Vec<PkgEntry>, PkgError> {
        parse_entries(&mut self.reader, &self.header)
    }

    /// Extract a single entry to `dest`
    ///
    /// Entries reaching past the end of the archive are rejected before
    /// anything is written.
    pub fn extract_entry(
        &mut self,
        entry: &PkgEntry,
        dest: &Path,
        decryptor: &dyn Decryptor,
    ) -> Result<(), PkgError> {
        if entry.end() > self.len {
            return Err(PkgError::Read {
                id: entry.id,
                offset: entry.offset as u64,
                size: entry.size,
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "entry ends at 0x{:X}, past the end of the archive (0x{:X})",
                        entry.end(),
                        self.len
                    ),
                ),
            });
        }
        extract_entry(&mut self.reader, entry, dest, decryptor)
    }

    /// Extract every entry into `dest_dir`
    pub fn extract_all(
        &mut self,
        dest_dir: &Path,
        names: &dyn FilenameResolver,
        decryptor: &dyn Decryptor,
    ) -> Result<Vec<ExtractedFile>, PkgError> {
        let entries = self.entries()?;
        self.extract_entries(&entries, dest_dir, names, decryptor)
    }

    /// Extract `entries` into `dest_dir`, stopping at the first failure
    ///
    /// Names come from `names`. A name that would escape `dest_dir` falls
    /// back to `file_<id>.bin`; a name already used by an earlier entry
    /// becomes `file_<id>_<index>.bin`, with a counter appended if that is
    /// taken too.
    pub fn extract_entries(
        &mut self,
        entries: &[PkgEntry],
        dest_dir: &Path,
        names: &dyn FilenameResolver,
        decryptor: &dyn Decryptor,
    ) -> Result<Vec<ExtractedFile>, PkgError> {
        let mut used = HashSet::with_capacity(entries.len());
        let mut files = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let mut name = names.file_name(entry);
            if !is_contained(&name) {
                log::warn!(
                    "PKG: Entry 0x{:X} name '{}' leaves the extraction directory, using synthetic name",
                    entry.id,
                    name
                );
                name = SyntheticNames.file_name(entry);
            }
            if used.contains(&name) {
                let mut unique = format!("file_{}_{}.bin", entry.id, index);
                let mut attempt = 1u32;
                while used.contains(&unique) {
                    unique = format!("file_{}_{}_{}.bin", entry.id, index, attempt);
                    attempt += 1;
                }
                log::warn!(
                    "PKG: Duplicate entry name '{}' (id 0x{:X}), extracting as '{}'",
                    name,
                    entry.id,
                    unique
                );
                name = unique;
            }

            self.extract_entry(entry, &dest_dir.join(&name), decryptor)?;
            used.insert(name.clone());
            files.push(ExtractedFile {
                id: entry.id,
                name,
                size: entry.size,
            });
        }

        Ok(files)
    }
}

/// An archive extracted to a staging directory and mounted in a [`Vfs`]
#[derive(Debug)]
pub struct MountedPkg {
    mount_point: String,
    staging_dir: PathBuf,
    header: PkgHeader,
    files: Vec<ExtractedFile>,
}

impl MountedPkg {
    pub fn mount_point(&self) -> &str {
        &self.mount_point
    }

    /// Host directory holding the extracted files
    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn header(&self) -> &PkgHeader {
        &self.header
    }

    pub fn files(&self) -> &[ExtractedFile] {
        &self.files
    }

    /// Virtual path under which `file` is reachable
    pub fn virtual_path(&self, file: &ExtractedFile) -> String {
        if self.mount_point.ends_with('/') {
            format!("{}{}", self.mount_point, file.name)
        } else {
            format!("{}/{}", self.mount_point, file.name)
        }
    }

    /// Unmount the archive and delete its staging directory
    ///
    /// # Errors
    ///
    /// - `PkgError::Mount` if the mount point was already removed
    /// - `PkgError::Cleanup` if the staging directory cannot be deleted
    pub fn release(self, vfs: &mut Vfs) -> Result<(), PkgError> {
        vfs.unmount(&self.mount_point)?;
        fs::remove_dir_all(&self.staging_dir).map_err(|source| PkgError::Cleanup {
            path: self.staging_dir.clone(),
            source,
        })?;
        log::info!(
            "PKG: Released {} (removed {})",
            self.mount_point,
            self.staging_dir.display()
        );
        Ok(())
    }
}

/// Archive extraction pipeline with pluggable decryption and naming
pub struct Extractor {
    config: PkgConfig,
    decryptor: Box<dyn Decryptor>,
    names: Box<dyn FilenameResolver>,
}

impl Extractor {
    /// Create an extractor using the no-op decryptor and synthetic names
    pub fn new(config: PkgConfig) -> Self {
        Self {
            config,
            decryptor: Box::new(NoopDecryptor),
            names: Box::new(SyntheticNames),
        }
    }

    pub fn with_decryptor<D: Decryptor + 'static>(mut self, decryptor: D) -> Self {
        self.decryptor = Box::new(decryptor);
        self
    }

    pub fn with_filename_resolver<F: FilenameResolver + 'static>(mut self, names: F) -> Self {
        self.names = Box::new(names);
        self
    }

    pub fn config(&self) -> &PkgConfig {
        &self.config
    }

    /// Extract every entry of `archive` into `dest_dir`
    pub fn extract_to(
        &self,
        archive: &mut PkgArchive,
        dest_dir: &Path,
    ) -> Result<Vec<ExtractedFile>, PkgError> {
        archive.extract_all(dest_dir, self.names.as_ref(), self.decryptor.as_ref())
    }

    /// Extract an archive into a fresh staging directory and mount it
    ///
    /// # Arguments
    ///
    /// * `vfs` - VFS receiving the mount
    /// * `archive_path` - Host path of the archive
    /// * `mount_point` - Virtual path to mount the extracted tree at
    ///
    /// # Returns
    ///
    /// The mounted archive. Nothing is mounted and the staging directory
    /// is removed if any step fails.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use layra::core::config::PkgConfig;
    /// use layra::core::pkg::Extractor;
    /// use layra::core::vfs::Vfs;
    /// use std::path::Path;
    ///
    /// let mut vfs = Vfs::default();
    /// let extractor = Extractor::new(PkgConfig::default());
    /// let pkg = extractor
    ///     .open_and_mount(&mut vfs, Path::new("game.pkg"), "/app0")
    ///     .unwrap();
    /// for file in pkg.files() {
    ///     println!("{}", pkg.virtual_path(file));
    /// }
    /// ```
    pub fn open_and_mount(
        &self,
        vfs: &mut Vfs,
        archive_path: &Path,
        mount_point: &str,
    ) -> Result<MountedPkg, PkgError> {
        let mut archive = PkgArchive::open(archive_path)?;
        let entries = archive.entries()?;
        let staging = self.create_staging()?;

        let result = archive
            .extract_entries(
                &entries,
                staging.path(),
                self.names.as_ref(),
                self.decryptor.as_ref(),
            )
            .and_then(|files| {
                vfs.mount(mount_point, staging.path())?;
                Ok(files)
            });

        match result {
            Ok(files) => {
                let staging_dir = staging.keep();
                log::info!(
                    "PKG: Mounted {} ({}, {} files) at {} from {}",
                    archive_path.display(),
                    archive.header().content_id(),
                    files.len(),
                    mount_point,
                    staging_dir.display()
                );
                Ok(MountedPkg {
                    mount_point: mount_point.to_string(),
                    staging_dir,
                    header: archive.header,
                    files,
                })
            }
            Err(e) => {
                log::debug!("PKG: Extraction of {} failed: {}", archive_path.display(), e);
                self.discard_staging(staging);
                Err(e)
            }
        }
    }

    fn create_staging(&self) -> Result<TempDir, PkgError> {
        let root = self.config.staging_root();
        let create_error = |source: io::Error| PkgError::DirectoryCreate {
            path: root.clone(),
            source,
        };

        fs::create_dir_all(&root).map_err(create_error)?;
        let staging = tempfile::Builder::new()
            .prefix(&self.config.staging_prefix)
            .tempdir_in(&root)
            .map_err(create_error)?;

        log::debug!("PKG: Created staging directory {}", staging.path().display());
        Ok(staging)
    }

    fn discard_staging(&self, staging: TempDir) {
        if self.config.keep_staging_on_failure {
            let path = staging.keep();
            log::warn!("PKG: Keeping staging directory {} after failure", path.display());
            return;
        }

        let path = staging.path().to_path_buf();
        if let Err(e) = staging.close() {
            log::warn!(
                "PKG: Failed to remove staging directory {}: {}",
                path.display(),
                e
            );
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(PkgConfig::default())
    }
}

/// Extract and mount an archive with the default [`Extractor`]
pub fn open_and_mount(
    vfs: &mut Vfs,
    archive_path: &Path,
    mount_point: &str,
) -> Result<MountedPkg, PkgError> {
    Extractor::default().open_and_mount(vfs, archive_path, mount_point)
}
