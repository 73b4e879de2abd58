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

//! Error types
//!
//! Each subsystem has its own error enum ([`PkgError`], [`VfsError`]) and
//! [`LayraError`] wraps them for callers that drive the whole pipeline.
//! Every error can be bucketed into an [`ErrorCategory`] so callers can
//! react to the kind of failure without matching every variant.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, LayraError>;

/// Coarse classification of failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad magic or otherwise malformed archive structure
    Format,
    /// Archive is shorter than its header or entry table declares
    TruncatedRead,
    /// Seek/read/write/open failure against host storage
    Io,
    /// Mount table is full
    Capacity,
    /// Path too long or virtual path could not be resolved
    Path,
    /// Unmount of an unknown virtual path
    NotFound,
    /// Invalid configuration
    Config,
}

/// Archive parsing and extraction errors
#[derive(Error, Debug)]
pub enum PkgError {
    #[error("Failed to open archive '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Truncated read at offset 0x{offset:X}: expected {expected} bytes, got {got}")]
    TruncatedRead {
        offset: u64,
        expected: usize,
        got: usize,
    },

    #[error("Invalid PKG magic: 0x{0:08X}")]
    BadMagic(u32),

    #[error("I/O error at offset 0x{offset:X}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Seek to offset 0x{offset:X} failed: {source}")]
    Seek {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read entry {id} ({size} bytes at 0x{offset:X}): {source}")]
    Read {
        id: u32,
        offset: u64,
        size: u32,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove staging directory '{path}': {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to mount extracted archive: {0}")]
    Mount(#[from] VfsError),
}

impl PkgError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            PkgError::BadMagic(_) => ErrorCategory::Format,
            PkgError::TruncatedRead { .. } => ErrorCategory::TruncatedRead,
            PkgError::Open { .. }
            | PkgError::Io { .. }
            | PkgError::Seek { .. }
            | PkgError::Read { .. }
            | PkgError::Write { .. }
            | PkgError::DirectoryCreate { .. }
            | PkgError::Cleanup { .. } => ErrorCategory::Io,
            PkgError::Mount(e) => e.category(),
        }
    }
}

/// Virtual filesystem errors
#[derive(Error, Debug)]
pub enum VfsError {
    #[error("Mount table full ({capacity} mount points)")]
    MountTableFull { capacity: usize },

    #[error("Path too long: {len} bytes (max {max})")]
    PathTooLong { len: usize, max: usize },

    #[error("Mount point not found: {0}")]
    MountNotFound(String),

    #[error("Could not resolve virtual path: {0}")]
    UnresolvedPath(String),

    #[error("Invalid open mode: '{0}'")]
    InvalidMode(String),

    #[error("Failed to open host file '{host_path}' for virtual path '{virtual_path}': {source}")]
    HostOpen {
        virtual_path: String,
        host_path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Seek failed: {0}")]
    Seek(#[source] io::Error),

    #[error("Failed to close '{virtual_path}': {source}")]
    Close {
        virtual_path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid file handle: {0}")]
    InvalidHandle(u32),
}

impl VfsError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            VfsError::MountTableFull { .. } => ErrorCategory::Capacity,
            VfsError::PathTooLong { .. } | VfsError::UnresolvedPath(_) => ErrorCategory::Path,
            VfsError::MountNotFound(_) | VfsError::InvalidHandle(_) => ErrorCategory::NotFound,
            VfsError::InvalidMode(_) => ErrorCategory::Format,
            VfsError::HostOpen { .. } | VfsError::Seek(_) | VfsError::Close { .. } => {
                ErrorCategory::Io
            }
        }
    }
}

/// Crate-level error
#[derive(Error, Debug)]
pub enum LayraError {
    #[error("PKG error: {0}")]
    Pkg(#[from] PkgError),

    #[error("VFS error: {0}")]
    Vfs(#[from] VfsError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl LayraError {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            LayraError::Pkg(e) => e.category(),
            LayraError::Vfs(e) => e.category(),
            LayraError::Config(_) => ErrorCategory::Config,
            LayraError::Io(_) => ErrorCategory::Io,
        }
    }
}
