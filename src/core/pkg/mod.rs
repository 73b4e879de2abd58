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

//! PKG archive support
//!
//! A PKG archive is a big-endian container made of a fixed 4096-byte
//! header, a table of 24-byte entry records and the entry payloads.
//!
//! # Pipeline
//!
//! ```text
//! open ─► parse_header ─► parse_entries ─► staging dir ─► extract_entry × N ─► Vfs::mount
//! ```
//!
//! Any failure before the mount succeeds removes the staging directory,
//! so a partially extracted archive is never visible through the VFS.
//!
//! Decryption and file naming are delegated to the [`Decryptor`] and
//! [`FilenameResolver`] traits. The defaults pass payloads through
//! unchanged and name files `file_<id>.bin`.

mod archive;
mod codec;
mod entry;
mod extract;
mod header;
#[cfg(test)]
mod tests;

pub use archive::{
    open_and_mount, parse_entries, parse_header, ExtractedFile, Extractor, MountedPkg, PkgArchive,
};
pub use entry::{EntryFlags, PkgEntry, ENTRY_SIZE};
pub use extract::{extract_entry, Decryptor, FilenameResolver, NoopDecryptor, SyntheticNames};
pub use header::{Digest, HeaderSummary, PkgHeader, CONTENT_ID_SIZE, HEADER_SIZE, PKG_MAGIC};
