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

//! Virtual filesystem
//!
//! Maps stable virtual paths such as `/app0` onto host directories and
//! provides `fopen`-style file access through opaque [`FileHandle`]s.
//!
//! # Architecture
//!
//! - [`MountTable`]: ordered, bounded list of mounts plus the resolution strategy
//! - [`VfsFile`]: one open host file with its tracked position
//! - [`Vfs`]: owns both and is the only thing callers talk to
//!
//! A [`Vfs`] is plain owned state with no internal locking. Share one
//! across threads by wrapping it in a single `Mutex`.
//!
//! # Example
//!
//! ```no_run
//! use layra::core::vfs::{SeekOrigin, Vfs};
//! use std::path::Path;
//!
//! let mut vfs = Vfs::default();
//! vfs.mount("/app0", Path::new("/tmp/game")).unwrap();
//!
//! let handle = vfs.open("/app0/eboot.bin", "rb").unwrap();
//! let mut magic = [0u8; 4];
//! assert_eq!(vfs.read(handle, &mut magic, 4, 1), 1);
//! vfs.seek(handle, 0, SeekOrigin::End).unwrap();
//! println!("size: {}", vfs.tell(handle));
//! vfs.close(handle).unwrap();
//! ```

mod file;
mod mode;
mod mount;
#[cfg(test)]
mod tests;

pub use file::{SeekOrigin, VfsFile};
pub use mode::OpenMode;
pub use mount::{MountPoint, MountTable, Resolution};

use crate::core::config::VfsConfig;
use crate::core::error::VfsError;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque handle to a file opened through [`Vfs::open`]
///
/// Handles are only meaningful to the [`Vfs`] that issued them. Once closed,
/// a handle is rejected by every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle(u32);

impl FileHandle {
    /// Raw handle number
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Virtual filesystem state
#[derive(Debug)]
pub struct Vfs {
    mounts: MountTable,
    files: HashMap<u32, VfsFile>,
    next_handle: u32,
}

impl Vfs {
    /// Create an empty VFS
    pub fn new(config: &VfsConfig) -> Self {
        Self {
            mounts: MountTable::new(
                config.max_mounts,
                config.max_path_len,
                config.resolution,
            ),
            files: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Reset the mount table to empty
    ///
    /// Open handles are not affected; they keep their host files.
    pub fn init(&mut self) {
        self.mounts.clear();
        log::debug!("VFS: initialized");
    }

    /// Mount `host_path` at `virtual_path`
    ///
    /// # Errors
    ///
    /// - `VfsError::MountTableFull` if no mount slot is free
    /// - `VfsError::PathTooLong` if either path exceeds the configured limit
    pub fn mount(&mut self, virtual_path: &str, host_path: &Path) -> Result<(), VfsError> {
        self.mounts.mount(virtual_path, host_path)?;
        log::info!("VFS: Mounted {} to {}", virtual_path, host_path.display());
        Ok(())
    }

    /// Remove the mount registered at exactly `virtual_path`
    pub fn unmount(&mut self, virtual_path: &str) -> Result<(), VfsError> {
        let mount = self.mounts.unmount(virtual_path)?;
        log::info!(
            "VFS: Unmounted {} (was {})",
            virtual_path,
            mount.host_path().display()
        );
        Ok(())
    }

    /// Translate a virtual path to a host path
    pub fn resolve(&self, virtual_path: &str) -> Option<PathBuf> {
        self.mounts.resolve(virtual_path)
    }

    pub fn mounts(&self) -> &MountTable {
        &self.mounts
    }

    pub fn is_mounted(&self, virtual_path: &str) -> bool {
        self.mounts.contains(virtual_path)
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.mounts.set_resolution(resolution);
    }

    /// Open a virtual file
    ///
    /// # Arguments
    ///
    /// * `virtual_path` - Path to open (e.g. `/app0/param.sfo`)
    /// * `mode` - `fopen`-style mode string (`"rb"`, `"w+"`, `"a"`, ...)
    ///
    /// # Errors
    ///
    /// - `VfsError::InvalidMode` if `mode` cannot be parsed
    /// - `VfsError::UnresolvedPath` if no mount serves `virtual_path`
    /// - `VfsError::HostOpen` if the host file cannot be opened
    pub fn open(&mut self, virtual_path: &str, mode: &str) -> Result<FileHandle, VfsError> {
        let mode: OpenMode = mode.parse()?;
        let host_path = self
            .resolve(virtual_path)
            .ok_or_else(|| VfsError::UnresolvedPath(virtual_path.to_string()))?;

        let file = VfsFile::open(virtual_path, &host_path, mode)?;
        let handle = self.allocate_handle();
        self.files.insert(handle.0, file);

        log::debug!(
            "VFS: opened {} -> {} as {}",
            virtual_path,
            host_path.display(),
            handle
        );
        Ok(handle)
    }

    /// Read up to `count` items of `size` bytes into `buffer`
    ///
    /// Returns the number of complete items read; an unknown handle reads
    /// nothing.
    pub fn read(
        &mut self,
        handle: FileHandle,
        buffer: &mut [u8],
        size: usize,
        count: usize,
    ) -> usize {
        self.files
            .get_mut(&handle.0)
            .map_or(0, |file| file.read(buffer, size, count))
    }

    /// Write up to `count` items of `size` bytes from `buffer`
    pub fn write(
        &mut self,
        handle: FileHandle,
        buffer: &[u8],
        size: usize,
        count: usize,
    ) -> usize {
        self.files
            .get_mut(&handle.0)
            .map_or(0, |file| file.write(buffer, size, count))
    }

    /// Move the position of an open file
    ///
    /// Returns the new position. On failure the tracked position is unchanged.
    pub fn seek(
        &mut self,
        handle: FileHandle,
        offset: i64,
        origin: SeekOrigin,
    ) -> Result<u64, VfsError> {
        self.files
            .get_mut(&handle.0)
            .ok_or(VfsError::InvalidHandle(handle.0))?
            .seek(offset, origin)
    }

    /// Current position of an open file, or -1 for an unknown handle
    pub fn tell(&self, handle: FileHandle) -> i64 {
        self.files
            .get(&handle.0)
            .map_or(-1, |file| file.tell() as i64)
    }

    /// Close an open file
    ///
    /// The handle is invalidated even if closing the host file reports an
    /// error.
    pub fn close(&mut self, handle: FileHandle) -> Result<(), VfsError> {
        let file = self
            .files
            .remove(&handle.0)
            .ok_or(VfsError::InvalidHandle(handle.0))?;
        log::debug!("VFS: closing {} ({})", handle, file.virtual_path());
        file.close()
    }

    /// Borrow an open file
    pub fn file(&self, handle: FileHandle) -> Option<&VfsFile> {
        self.files.get(&handle.0)
    }

    /// Number of open handles
    pub fn open_handles(&self) -> usize {
        self.files.len()
    }

    /// Close every open handle, logging close failures
    pub fn close_all(&mut self) {
        for (raw, file) in self.files.drain() {
            let virtual_path = file.virtual_path().to_string();
            if let Err(e) = file.close() {
                log::warn!("VFS: error closing #{} ({}): {}", raw, virtual_path, e);
            }
        }
    }

    fn allocate_handle(&mut self) -> FileHandle {
        while self.next_handle == 0 || self.files.contains_key(&self.next_handle) {
            self.next_handle = self.next_handle.wrapping_add(1);
        }
        let handle = FileHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        handle
    }
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new(&VfsConfig::default())
    }
}
