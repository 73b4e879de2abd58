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

//! layra: PKG archive extraction and virtual filesystem
//!
//! This crate provides the package-archive and virtual-filesystem layer of
//! a console emulator: it decodes PKG archives, extracts their contents to
//! a staging directory and exposes them under stable virtual paths such as
//! `/app0`.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`core`]: Archive decoding, the virtual filesystem, configuration and errors
//!
//! # Example
//!
//! ```no_run
//! use layra::core::pkg::open_and_mount;
//! use layra::core::vfs::Vfs;
//! use std::path::Path;
//!
//! let mut vfs = Vfs::default();
//! let pkg = open_and_mount(&mut vfs, Path::new("game.pkg"), "/app0")?;
//!
//! let handle = vfs.open("/app0/file_0.bin", "rb")?;
//! let mut buf = [0u8; 16];
//! vfs.read(handle, &mut buf, 1, 16);
//! vfs.close(handle)?;
//!
//! pkg.release(&mut vfs)?;
//! # Ok::<(), layra::core::error::LayraError>(())
//! ```
//!
//! # Getting Started
//!
//! 1. Create a [`core::vfs::Vfs`] instance
//! 2. Open and mount an archive with [`core::pkg::open_and_mount`]
//! 3. Access its files through the VFS handle API
//!
//! # Modules
//!
//! - [`core::pkg`]: PKG header/entry decoding, extraction and mounting
//! - [`core::vfs`]: Mount table, path resolution and file handles
//! - [`core::config`]: TOML configuration with environment overrides
//!
//! # Error Handling
//!
//! Subsystems return [`core::error::PkgError`] or [`core::error::VfsError`];
//! both convert into [`LayraError`], and [`core::error::Result<T>`] is an
//! alias for `Result<T, LayraError>`.

pub mod core;

// Re-export commonly used types
pub use core::error::{LayraError, Result};
