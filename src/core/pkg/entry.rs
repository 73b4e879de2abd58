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

//! PKG entry table records
//!
//! The entry table is a tight array of 24-byte big-endian records starting
//! at `table_offset`:
//!
//! | Offset | Field           |
//! |--------|-----------------|
//! | 0x00   | id              |
//! | 0x04   | filename_offset |
//! | 0x08   | flags1          |
//! | 0x0C   | flags2          |
//! | 0x10   | offset          |
//! | 0x14   | size            |

use super::codec::{FieldReader, FieldWriter};
use crate::core::error::PkgError;
use serde::Serialize;

/// Size of one entry record in bytes
pub const ENTRY_SIZE: usize = 24;

bitflags::bitflags! {
    /// Flags stored in `flags1`
    ///
    /// Only the encryption bit is interpreted; all other bits are carried
    /// through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u32 {
        /// Entry payload is encrypted
        const ENCRYPTED = 1 << 31;
    }
}

/// One entry table record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PkgEntry {
    pub id: u32,
    pub filename_offset: u32,
    pub flags1: u32,
    pub flags2: u32,
    /// Absolute byte offset of the entry data within the archive
    pub offset: u32,
    pub size: u32,
}

impl PkgEntry {
    /// Decode one record
    ///
    /// # Arguments
    ///
    /// * `buf` - At least [`ENTRY_SIZE`] bytes
    /// * `base` - Archive offset of `buf[0]`, used in error reports
    pub fn from_bytes(buf: &[u8], base: u64) -> Result<Self, PkgError> {
        let mut r = FieldReader::new(buf, base);
        Ok(Self {
            id: r.u32()?,
            filename_offset: r.u32()?,
            flags1: r.u32()?,
            flags2: r.u32()?,
            offset: r.u32()?,
            size: r.u32()?,
        })
    }

    /// Encode to the on-disk record
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut w = FieldWriter::with_capacity(ENTRY_SIZE);
        w.u32(self.id);
        w.u32(self.filename_offset);
        w.u32(self.flags1);
        w.u32(self.flags2);
        w.u32(self.offset);
        w.u32(self.size);

        let mut out = [0u8; ENTRY_SIZE];
        out.copy_from_slice(&w.into_inner());
        out
    }

    pub fn flags(&self) -> EntryFlags {
        EntryFlags::from_bits_retain(self.flags1)
    }

    pub fn is_encrypted(&self) -> bool {
        self.flags().contains(EntryFlags::ENCRYPTED)
    }

    /// Key slot selected by bits 12-15 of `flags2`
    pub fn key_index(&self) -> u8 {
        ((self.flags2 >> 12) & 0xF) as u8
    }

    /// One past the last byte of the entry data
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }
}
