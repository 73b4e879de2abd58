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

//! Big-endian field codec
//!
//! Sequential readers/writers over byte buffers. Every read is bounds
//! checked; running off the end of the buffer is reported as a truncated
//! read at the offending offset.

use crate::core::error::PkgError;
use std::io::{self, Read};

/// Sequential big-endian reader over a byte slice
pub(super) struct FieldReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Offset of `buf[0]` within the archive, for error reporting
    base: u64,
}

impl<'a> FieldReader<'a> {
    pub fn new(buf: &'a [u8], base: u64) -> Self {
        Self { buf, pos: 0, base }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], PkgError> {
        let end = self.pos.checked_add(len);
        let bytes = end
            .and_then(|end| self.buf.get(self.pos..end))
            .ok_or(PkgError::TruncatedRead {
                offset: self.base + self.pos as u64,
                expected: len,
                got: self.buf.len().saturating_sub(self.pos),
            })?;
        self.pos += len;
        Ok(bytes)
    }

    pub fn array<const N: usize>(&mut self) -> Result<[u8; N], PkgError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn bytes(&mut self, len: usize) -> Result<Vec<u8>, PkgError> {
        Ok(self.take(len)?.to_vec())
    }

    pub fn u16(&mut self) -> Result<u16, PkgError> {
        self.array().map(u16::from_be_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, PkgError> {
        self.array().map(u32::from_be_bytes)
    }

    pub fn u64(&mut self) -> Result<u64, PkgError> {
        self.array().map(u64::from_be_bytes)
    }
}

/// Sequential big-endian writer into a growable buffer
pub(super) struct FieldWriter {
    buf: Vec<u8>,
}

impl FieldWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn u16(&mut self, value: u16) {
        self.bytes(&value.to_be_bytes());
    }

    pub fn u32(&mut self, value: u32) {
        self.bytes(&value.to_be_bytes());
    }

    pub fn u64(&mut self, value: u64) {
        self.bytes(&value.to_be_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input
///
/// Returns the number of bytes read, which is less than `buf.len()` only
/// when the reader ran dry.
pub(super) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(total)
}
