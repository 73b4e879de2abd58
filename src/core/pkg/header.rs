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

//! PKG header
//!
//! The header occupies the first 4096 bytes of every archive. All integers
//! are stored big-endian; byte arrays (content ID, digests, reserved
//! regions) are kept verbatim.
//!
//! # Layout
//!
//! | Offset | Size  | Field                                   |
//! |--------|-------|-----------------------------------------|
//! | 0x000  | 4     | magic (`0x7F434E54`, "\x7FCNT")         |
//! | 0x004  | 4     | type                                    |
//! | 0x00C  | 4     | file count                              |
//! | 0x010  | 4     | entry count                             |
//! | 0x014  | 2+2   | SC entry count, entry count (again)     |
//! | 0x018  | 4     | entry table offset                      |
//! | 0x01C  | 4     | entry data size                         |
//! | 0x020  | 8+8   | body offset / size                      |
//! | 0x030  | 8+8   | content offset / size                   |
//! | 0x040  | 36    | content ID                              |
//! | 0x070  | 48    | DRM / content type, flags, versions     |
//! | 0x100  | 4×32  | SHA-256 digests                         |
//! | 0x400  | 0x90  | PFS image metadata                      |
//! | 0xFE0  | 32    | package digest                          |
//!
//! Digests are carried for format fidelity only and are never verified.

use super::codec::{read_full, FieldReader, FieldWriter};
use crate::core::error::PkgError;
use serde::Serialize;
use std::io::Read;

/// Header size in bytes
pub const HEADER_SIZE: usize = 0x1000;

/// Expected value of [`PkgHeader::magic`]
pub const PKG_MAGIC: u32 = 0x7F434E54;

/// Length of the content ID field
pub const CONTENT_ID_SIZE: usize = 0x24;

/// SHA-256 digest
pub type Digest = [u8; 32];

const PADDING_SIZE: usize = 0x0C;
const RESERVED_1_SIZE: usize = 0x60;
const RESERVED_2_SIZE: usize = 0x280;
const RESERVED_3_SIZE: usize = 0xB50;

/// Decoded PKG header
///
/// Field order matches the on-disk order. Unknown fields keep their offset
/// in the name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkgHeader {
    pub magic: u32,
    pub pkg_type: u32,
    pub unknown_0x008: u32,
    pub file_count: u32,
    pub entry_count: u32,
    pub sc_entry_count: u16,
    pub entry_count_2: u16,
    pub table_offset: u32,
    pub entry_data_size: u32,
    pub body_offset: u64,
    pub body_size: u64,
    pub content_offset: u64,
    pub content_size: u64,
    pub content_id: [u8; CONTENT_ID_SIZE],
    pub padding: [u8; PADDING_SIZE],
    pub drm_type: u32,
    pub content_type: u32,
    pub content_flags: u32,
    pub promote_size: u32,
    pub version_date: u32,
    pub version_hash: u32,
    pub unknown_0x088: u32,
    pub unknown_0x08c: u32,
    pub unknown_0x090: u32,
    pub unknown_0x094: u32,
    pub iro_tag: u32,
    pub drm_type_version: u32,
    pub reserved_1: Vec<u8>,
    pub digest_entries1: Digest,
    pub digest_entries2: Digest,
    pub digest_table: Digest,
    pub digest_body: Digest,
    pub reserved_2: Vec<u8>,
    pub unknown_0x400: u32,
    pub pfs_image_count: u32,
    pub pfs_image_flags: u64,
    pub pfs_image_offset: u64,
    pub pfs_image_size: u64,
    pub mount_image_offset: u64,
    pub mount_image_size: u64,
    pub pkg_size: u64,
    pub pfs_signed_size: u32,
    pub pfs_cache_size: u32,
    pub pfs_image_digest: Digest,
    pub pfs_signed_digest: Digest,
    pub pfs_split_size_nth_0: u64,
    pub pfs_split_size_nth_1: u64,
    pub reserved_3: Vec<u8>,
    pub pkg_digest: Digest,
}

impl PkgHeader {
    /// Read and decode a header from the current position of `reader`
    ///
    /// # Errors
    ///
    /// - `PkgError::TruncatedRead` if fewer than 4096 bytes are available
    /// - `PkgError::BadMagic` if the decoded magic is wrong
    /// - `PkgError::Io` if the underlying read fails
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, PkgError> {
        let mut buf = vec![0u8; HEADER_SIZE];
        let got = read_full(reader, &mut buf).map_err(|source| PkgError::Io { offset: 0, source })?;
        if got < HEADER_SIZE {
            return Err(PkgError::TruncatedRead {
                offset: 0,
                expected: HEADER_SIZE,
                got,
            });
        }
        Self::from_bytes(&buf)
    }

    /// Decode a header from a buffer of at least 4096 bytes
    pub fn from_bytes(buf: &[u8]) -> Result<Self, PkgError> {
        if buf.len() < HEADER_SIZE {
            return Err(PkgError::TruncatedRead {
                offset: 0,
                expected: HEADER_SIZE,
                got: buf.len(),
            });
        }

        let mut r = FieldReader::new(&buf[..HEADER_SIZE], 0);
        let header = Self {
            magic: r.u32()?,
            pkg_type: r.u32()?,
            unknown_0x008: r.u32()?,
            file_count: r.u32()?,
            entry_count: r.u32()?,
            sc_entry_count: r.u16()?,
            entry_count_2: r.u16()?,
            table_offset: r.u32()?,
            entry_data_size: r.u32()?,
            body_offset: r.u64()?,
            body_size: r.u64()?,
            content_offset: r.u64()?,
            content_size: r.u64()?,
            content_id: r.array()?,
            padding: r.array()?,
            drm_type: r.u32()?,
            content_type: r.u32()?,
            content_flags: r.u32()?,
            promote_size: r.u32()?,
            version_date: r.u32()?,
            version_hash: r.u32()?,
            unknown_0x088: r.u32()?,
            unknown_0x08c: r.u32()?,
            unknown_0x090: r.u32()?,
            unknown_0x094: r.u32()?,
            iro_tag: r.u32()?,
            drm_type_version: r.u32()?,
            reserved_1: r.bytes(RESERVED_1_SIZE)?,
            digest_entries1: r.array()?,
            digest_entries2: r.array()?,
            digest_table: r.array()?,
            digest_body: r.array()?,
            reserved_2: r.bytes(RESERVED_2_SIZE)?,
            unknown_0x400: r.u32()?,
            pfs_image_count: r.u32()?,
            pfs_image_flags: r.u64()?,
            pfs_image_offset: r.u64()?,
            pfs_image_size: r.u64()?,
            mount_image_offset: r.u64()?,
            mount_image_size: r.u64()?,
            pkg_size: r.u64()?,
            pfs_signed_size: r.u32()?,
            pfs_cache_size: r.u32()?,
            pfs_image_digest: r.array()?,
            pfs_signed_digest: r.array()?,
            pfs_split_size_nth_0: r.u64()?,
            pfs_split_size_nth_1: r.u64()?,
            reserved_3: r.bytes(RESERVED_3_SIZE)?,
            pkg_digest: r.array()?,
        };
        debug_assert_eq!(r.position(), HEADER_SIZE);

        // Only checked once every field is in host order
        if header.magic != PKG_MAGIC {
            return Err(PkgError::BadMagic(header.magic));
        }

        Ok(header)
    }

    /// Encode back to the 4096-byte on-disk form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = FieldWriter::with_capacity(HEADER_SIZE);
        w.u32(self.magic);
        w.u32(self.pkg_type);
        w.u32(self.unknown_0x008);
        w.u32(self.file_count);
        w.u32(self.entry_count);
        w.u16(self.sc_entry_count);
        w.u16(self.entry_count_2);
        w.u32(self.table_offset);
        w.u32(self.entry_data_size);
        w.u64(self.body_offset);
        w.u64(self.body_size);
        w.u64(self.content_offset);
        w.u64(self.content_size);
        w.bytes(&self.content_id);
        w.bytes(&self.padding);
        w.u32(self.drm_type);
        w.u32(self.content_type);
        w.u32(self.content_flags);
        w.u32(self.promote_size);
        w.u32(self.version_date);
        w.u32(self.version_hash);
        w.u32(self.unknown_0x088);
        w.u32(self.unknown_0x08c);
        w.u32(self.unknown_0x090);
        w.u32(self.unknown_0x094);
        w.u32(self.iro_tag);
        w.u32(self.drm_type_version);
        w.bytes(&fixed(&self.reserved_1, RESERVED_1_SIZE));
        w.bytes(&self.digest_entries1);
        w.bytes(&self.digest_entries2);
        w.bytes(&self.digest_table);
        w.bytes(&self.digest_body);
        w.bytes(&fixed(&self.reserved_2, RESERVED_2_SIZE));
        w.u32(self.unknown_0x400);
        w.u32(self.pfs_image_count);
        w.u64(self.pfs_image_flags);
        w.u64(self.pfs_image_offset);
        w.u64(self.pfs_image_size);
        w.u64(self.mount_image_offset);
        w.u64(self.mount_image_size);
        w.u64(self.pkg_size);
        w.u32(self.pfs_signed_size);
        w.u32(self.pfs_cache_size);
        w.bytes(&self.pfs_image_digest);
        w.bytes(&self.pfs_signed_digest);
        w.u64(self.pfs_split_size_nth_0);
        w.u64(self.pfs_split_size_nth_1);
        w.bytes(&fixed(&self.reserved_3, RESERVED_3_SIZE));
        w.bytes(&self.pkg_digest);
        debug_assert_eq!(w.len(), HEADER_SIZE);
        w.into_inner()
    }

    /// Content ID as text, cut at the first NUL
    pub fn content_id(&self) -> String {
        let end = self
            .content_id
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CONTENT_ID_SIZE);
        String::from_utf8_lossy(&self.content_id[..end]).into_owned()
    }

    /// Store `id` in the content ID field, NUL-padded and truncated to 36 bytes
    pub fn set_content_id(&mut self, id: &str) {
        self.content_id = [0; CONTENT_ID_SIZE];
        let len = id.len().min(CONTENT_ID_SIZE);
        self.content_id[..len].copy_from_slice(&id.as_bytes()[..len]);
    }

    /// Short summary for display and JSON output
    pub fn summary(&self) -> HeaderSummary {
        HeaderSummary {
            content_id: self.content_id(),
            pkg_type: self.pkg_type,
            drm_type: self.drm_type,
            content_type: self.content_type,
            content_flags: self.content_flags,
            file_count: self.file_count,
            entry_count: self.entry_count,
            table_offset: self.table_offset,
            body_offset: self.body_offset,
            body_size: self.body_size,
            pkg_size: self.pkg_size,
            pfs_image_count: self.pfs_image_count,
            digest_body: hex(&self.digest_body),
            pkg_digest: hex(&self.pkg_digest),
        }
    }
}

impl Default for PkgHeader {
    /// A zeroed header carrying the correct magic
    fn default() -> Self {
        Self {
            magic: PKG_MAGIC,
            pkg_type: 0,
            unknown_0x008: 0,
            file_count: 0,
            entry_count: 0,
            sc_entry_count: 0,
            entry_count_2: 0,
            table_offset: 0,
            entry_data_size: 0,
            body_offset: 0,
            body_size: 0,
            content_offset: 0,
            content_size: 0,
            content_id: [0; CONTENT_ID_SIZE],
            padding: [0; PADDING_SIZE],
            drm_type: 0,
            content_type: 0,
            content_flags: 0,
            promote_size: 0,
            version_date: 0,
            version_hash: 0,
            unknown_0x088: 0,
            unknown_0x08c: 0,
            unknown_0x090: 0,
            unknown_0x094: 0,
            iro_tag: 0,
            drm_type_version: 0,
            reserved_1: vec![0; RESERVED_1_SIZE],
            digest_entries1: [0; 32],
            digest_entries2: [0; 32],
            digest_table: [0; 32],
            digest_body: [0; 32],
            reserved_2: vec![0; RESERVED_2_SIZE],
            unknown_0x400: 0,
            pfs_image_count: 0,
            pfs_image_flags: 0,
            pfs_image_offset: 0,
            pfs_image_size: 0,
            mount_image_offset: 0,
            mount_image_size: 0,
            pkg_size: 0,
            pfs_signed_size: 0,
            pfs_cache_size: 0,
            pfs_image_digest: [0; 32],
            pfs_signed_digest: [0; 32],
            pfs_split_size_nth_0: 0,
            pfs_split_size_nth_1: 0,
            reserved_3: vec![0; RESERVED_3_SIZE],
            pkg_digest: [0; 32],
        }
    }
}

/// Human-oriented subset of the header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSummary {
    pub content_id: String,
    pub pkg_type: u32,
    pub drm_type: u32,
    pub content_type: u32,
    pub content_flags: u32,
    pub file_count: u32,
    pub entry_count: u32,
    pub table_offset: u32,
    pub body_offset: u64,
    pub body_size: u64,
    pub pkg_size: u64,
    pub pfs_image_count: u32,
    pub digest_body: String,
    pub pkg_digest: String,
}

/// Reserved regions are public fields; pad or cut them to their on-disk size
fn fixed(bytes: &[u8], size: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out.resize(size, 0);
    out
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
