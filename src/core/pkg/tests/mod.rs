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

//! Unit tests for archive parsing, extraction and mounting


use super::{PkgEntry, PkgHeader, ENTRY_SIZE, HEADER_SIZE};
use std::path::{Path, PathBuf};

/// Offset of the entry table in synthetic archives
const TABLE_OFFSET: u32 = HEADER_SIZE as u32;

/// Build an in-memory archive holding `payloads`, keyed by entry id
///
/// Layout: header, entry table at 0x1000, payloads packed after the table.
fn build_archive(payloads: &[(u32, &[u8])]) -> Vec<u8> {
    let table_len = payloads.len() * ENTRY_SIZE;
    let body_offset = TABLE_OFFSET as usize + table_len;

    let mut entries = Vec::with_capacity(payloads.len());
    let mut body = Vec::new();
    for (id, data) in payloads {
        entries.push(PkgEntry {
            id: *id,
            filename_offset: 0,
            flags1: 0,
            flags2: 0,
            offset: (body_offset + body.len()) as u32,
            size: data.len() as u32,
        });
        body.extend_from_slice(data);
    }

    let mut header = PkgHeader {
        file_count: payloads.len() as u32,
        entry_count: payloads.len() as u32,
        table_offset: TABLE_OFFSET,
        entry_data_size: table_len as u32,
        body_offset: body_offset as u64,
        body_size: body.len() as u64,
        pkg_size: (body_offset + body.len()) as u64,
        ..PkgHeader::default()
    };
    header.set_content_id("UP0000-TEST00000_00-LAYRATESTPKG0001");

    let mut out = header.to_bytes();
    for entry in &entries {
        out.extend_from_slice(&entry.to_bytes());
    }
    out.extend_from_slice(&body);
    out
}

/// Write `bytes` to `dir/name` and return the path
fn write_archive(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Overwrite the entry record at `index` in a built archive
fn patch_entry(archive: &mut [u8], index: usize, entry: &PkgEntry) {
    let start = TABLE_OFFSET as usize + index * ENTRY_SIZE;
    archive[start..start + ENTRY_SIZE].copy_from_slice(&entry.to_bytes());
}
