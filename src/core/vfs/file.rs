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

//! Open virtual file
//!
//! Wraps a host [`File`] together with the virtual path it was opened
//! through and a tracked position. The tracked position is always taken
//! from the host file after an operation that moves it, never computed on
//! the side.

use super::mode::OpenMode;
use crate::core::error::VfsError;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Origin for [`VfsFile::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Relative to the start of the file
    Start,
    /// Relative to the current position
    Current,
    /// Relative to the end of the file
    End,
}

impl SeekOrigin {
    fn to_seek_from(self, offset: i64) -> io::Result<SeekFrom> {
        match self {
            SeekOrigin::Start => u64::try_from(offset).map(SeekFrom::Start).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("negative offset {} from start", offset),
                )
            }),
            SeekOrigin::Current => Ok(SeekFrom::Current(offset)),
            SeekOrigin::End => Ok(SeekFrom::End(offset)),
        }
    }
}

/// A file opened through the VFS
#[derive(Debug)]
pub struct VfsFile {
    virtual_path: String,
    file: File,
    mode: OpenMode,
    offset: u64,
}

impl VfsFile {
    /// Open the host file backing `virtual_path`
    ///
    /// The tracked offset starts at zero, except in append modes where it is
    /// the end of the host file, where the next write lands.
    pub fn open(virtual_path: &str, host_path: &Path, mode: OpenMode) -> Result<Self, VfsError> {
        let host_open_error = |source| VfsError::HostOpen {
            virtual_path: virtual_path.to_string(),
            host_path: host_path.to_path_buf(),
            source,
        };

        let mut file = mode.options().open(host_path).map_err(host_open_error)?;
        let offset = if mode.is_append() {
            file.seek(SeekFrom::End(0)).map_err(host_open_error)?
        } else {
            0
        };

        Ok(Self {
            virtual_path: virtual_path.to_string(),
            file,
            mode,
            offset,
        })
    }

    /// Virtual path this file was opened with
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Read up to `count` items of `size` bytes each
    ///
    /// Mirrors `fread`: the request is clamped to the whole items that fit in
    /// `buffer`, reading stops at end of file, and the return value is the
    /// number of *complete* items read. A trailing partial item still
    /// advances the position.
    pub fn read(&mut self, buffer: &mut [u8], size: usize, count: usize) -> usize {
        if size == 0 || count == 0 || buffer.is_empty() {
            return 0;
        }

        let items = count.min(buffer.len() / size);
        let wanted = items * size;
        let mut total = 0;

        while total < wanted {
            match self.file.read(&mut buffer[total..wanted]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("VFS: read error on {}: {}", self.virtual_path, e);
                    break;
                }
            }
        }

        self.refresh_offset(total as u64);
        total / size
    }

    /// Write up to `count` items of `size` bytes each from `buffer`
    ///
    /// Returns the number of complete items written.
    pub fn write(&mut self, buffer: &[u8], size: usize, count: usize) -> usize {
        if size == 0 || count == 0 || buffer.is_empty() {
            return 0;
        }

        let items = count.min(buffer.len() / size);
        let wanted = items * size;
        let mut total = 0;

        while total < wanted {
            match self.file.write(&buffer[total..wanted]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("VFS: write error on {}: {}", self.virtual_path, e);
                    break;
                }
            }
        }

        self.refresh_offset(total as u64);
        total / size
    }

    /// Move the file position
    ///
    /// On failure the tracked offset is left untouched.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64, VfsError> {
        let target = origin.to_seek_from(offset).map_err(VfsError::Seek)?;
        let position = self.file.seek(target).map_err(VfsError::Seek)?;
        self.offset = position;
        Ok(position)
    }

    /// Tracked position
    pub fn tell(&self) -> u64 {
        self.offset
    }

    /// Close the file
    ///
    /// Writable files are synced first so write-back failures surface here.
    /// The host file is dropped whether or not that succeeds.
    pub fn close(self) -> Result<(), VfsError> {
        let result = if self.mode.is_writable() {
            self.file.sync_all()
        } else {
            Ok(())
        };

        result.map_err(|source| VfsError::Close {
            virtual_path: self.virtual_path,
            source,
        })
    }

    fn refresh_offset(&mut self, advanced: u64) {
        self.offset = match self.file.stream_position() {
            Ok(position) => position,
            Err(e) => {
                log::warn!(
                    "VFS: could not query position of {}: {}",
                    self.virtual_path,
                    e
                );
                self.offset + advanced
            }
        };
    }
}
