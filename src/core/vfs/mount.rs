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

//! Mount table
//!
//! An ordered, bounded list of virtual-path → host-path mappings.
//!
//! # Resolution
//!
//! A mount matches a virtual path when the mount's virtual path is a
//! *literal string prefix* of it. No path-component boundary is enforced,
//! so `/app0` also matches `/app01/data`.
//!
//! With [`Resolution::FirstMatch`] (the default) mounts are scanned in
//! insertion order and the first match wins, even when a later mount is
//! more specific:
//!
//! | Mounts (in order)            | Request          | Winner      |
//! |------------------------------|------------------|-------------|
//! | `/app0`, `/app0/dlc`         | `/app0/dlc/file` | `/app0`     |
//! | `/app0/dlc`, `/app0`         | `/app0/dlc/file` | `/app0/dlc` |
//!
//! [`Resolution::LongestPrefix`] picks the longest matching prefix instead.

use crate::core::error::{LayraError, VfsError};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Strategy used to pick a mount for a virtual path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    /// Earliest registered matching mount wins
    #[default]
    FirstMatch,
    /// Longest matching virtual prefix wins (earliest on ties)
    LongestPrefix,
}

impl Resolution {
    /// Select the mount that serves `virtual_path`
    pub fn select<'a>(
        self,
        mounts: &'a [MountPoint],
        virtual_path: &str,
    ) -> Option<&'a MountPoint> {
        match self {
            Resolution::FirstMatch => first_match(mounts, virtual_path),
            Resolution::LongestPrefix => longest_prefix(mounts, virtual_path),
        }
    }
}

impl FromStr for Resolution {
    type Err = LayraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first-match" => Ok(Resolution::FirstMatch),
            "longest-prefix" => Ok(Resolution::LongestPrefix),
            _ => Err(LayraError::Config(format!(
                "Unknown resolution strategy: '{}' (expected first-match or longest-prefix)",
                s
            ))),
        }
    }
}

fn first_match<'a>(mounts: &'a [MountPoint], virtual_path: &str) -> Option<&'a MountPoint> {
    mounts.iter().find(|m| m.matches(virtual_path))
}

fn longest_prefix<'a>(mounts: &'a [MountPoint], virtual_path: &str) -> Option<&'a MountPoint> {
    // max_by_key keeps the last maximum; reversing makes ties go to the earliest mount
    mounts
        .iter()
        .rev()
        .filter(|m| m.matches(virtual_path))
        .max_by_key(|m| m.virtual_path.len())
}

/// A single virtual-path → host-path mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPoint {
    virtual_path: String,
    host_path: PathBuf,
}

impl MountPoint {
    /// Virtual path prefix (e.g. `/app0`)
    pub fn virtual_path(&self) -> &str {
        &self.virtual_path
    }

    /// Host directory backing this mount
    pub fn host_path(&self) -> &Path {
        &self.host_path
    }

    fn matches(&self, virtual_path: &str) -> bool {
        virtual_path.starts_with(&self.virtual_path)
    }

    /// Map `virtual_path` onto the host by replacing the mount prefix
    ///
    /// The remainder is appended verbatim (string concatenation, not
    /// `Path::join`), so `/app0` + `/save.bin` becomes `<host>/save.bin`.
    fn translate(&self, virtual_path: &str) -> PathBuf {
        let rest = &virtual_path[self.virtual_path.len()..];
        let mut host = OsString::from(self.host_path.as_os_str());
        host.push(rest);
        PathBuf::from(host)
    }
}

/// Bounded, insertion-ordered mount table
#[derive(Debug, Clone)]
pub struct MountTable {
    mounts: Vec<MountPoint>,
    capacity: usize,
    max_path_len: usize,
    resolution: Resolution,
}

impl MountTable {
    /// Create an empty mount table
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of mounts
    /// * `max_path_len` - Path buffer size; paths must be strictly shorter
    /// * `resolution` - Strategy used by [`MountTable::resolve`]
    pub fn new(capacity: usize, max_path_len: usize, resolution: Resolution) -> Self {
        Self {
            mounts: Vec::with_capacity(capacity),
            capacity,
            max_path_len,
            resolution,
        }
    }

    /// Register a new mount
    ///
    /// Duplicate or overlapping virtual paths are accepted; which one serves
    /// a request is decided by the resolution strategy.
    ///
    /// # Errors
    ///
    /// - `VfsError::MountTableFull` if the table is at capacity
    /// - `VfsError::PathTooLong` if either path is `max_path_len` bytes or longer
    pub fn mount(&mut self, virtual_path: &str, host_path: &Path) -> Result<(), VfsError> {
        if self.mounts.len() >= self.capacity {
            return Err(VfsError::MountTableFull {
                capacity: self.capacity,
            });
        }

        let host_len = host_path.as_os_str().len();
        for len in [virtual_path.len(), host_len] {
            if len >= self.max_path_len {
                return Err(VfsError::PathTooLong {
                    len,
                    max: self.max_path_len,
                });
            }
        }

        self.mounts.push(MountPoint {
            virtual_path: virtual_path.to_string(),
            host_path: host_path.to_path_buf(),
        });
        Ok(())
    }

    /// Remove the mount whose virtual path equals `virtual_path` exactly
    ///
    /// The relative order of the remaining mounts is preserved.
    pub fn unmount(&mut self, virtual_path: &str) -> Result<MountPoint, VfsError> {
        let index = self
            .mounts
            .iter()
            .position(|m| m.virtual_path == virtual_path)
            .ok_or_else(|| VfsError::MountNotFound(virtual_path.to_string()))?;
        Ok(self.mounts.remove(index))
    }

    /// Translate a virtual path into a host path
    pub fn resolve(&self, virtual_path: &str) -> Option<PathBuf> {
        self.resolution
            .select(&self.mounts, virtual_path)
            .map(|m| m.translate(virtual_path))
    }

    /// Remove every mount
    pub fn clear(&mut self) {
        self.mounts.clear();
    }

    /// Whether a mount with exactly this virtual path exists
    pub fn contains(&self, virtual_path: &str) -> bool {
        self.mounts.iter().any(|m| m.virtual_path == virtual_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MountPoint> {
        self.mounts.iter()
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }
}
