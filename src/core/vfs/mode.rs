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

//! `fopen`-style mode strings
//!
//! | Mode | Read | Write | Create | Truncate | Append |
//! |------|------|-------|--------|----------|--------|
//! | `r`  | yes  |       |        |          |        |
//! | `r+` | yes  | yes   |        |          |        |
//! | `w`  |      | yes   | yes    | yes      |        |
//! | `w+` | yes  | yes   | yes    | yes      |        |
//! | `a`  |      | yes   | yes    |          | yes    |
//! | `a+` | yes  | yes   | yes    |          | yes    |
//!
//! `b` and `t` may follow in any position after the first character and are
//! accepted for compatibility; host files are always byte streams. `x`
//! (with `w`) fails if the file already exists.

use crate::core::error::VfsError;
use std::fs::OpenOptions;
use std::str::FromStr;

/// Parsed access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMode {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub truncate: bool,
    pub exclusive: bool,
    pub binary: bool,
}

impl OpenMode {
    /// Read-only binary mode (`"rb"`)
    pub const READ: OpenMode = OpenMode {
        read: true,
        write: false,
        append: false,
        create: false,
        truncate: false,
        exclusive: false,
        binary: true,
    };

    /// Build the matching [`OpenOptions`]
    pub fn options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(self.read);
        if self.append {
            options.append(true);
        } else {
            options.write(self.write).truncate(self.truncate);
        }
        if self.exclusive {
            options.create_new(true);
        } else {
            options.create(self.create);
        }
        options
    }

    pub fn is_append(&self) -> bool {
        self.append
    }

    pub fn is_writable(&self) -> bool {
        self.write || self.append
    }
}

impl FromStr for OpenMode {
    type Err = VfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VfsError::InvalidMode(s.to_string());

        let mut chars = s.chars();
        let mut mode = match chars.next() {
            Some('r') => OpenMode::READ,
            Some('w') => OpenMode {
                read: false,
                write: true,
                create: true,
                truncate: true,
                ..OpenMode::READ
            },
            Some('a') => OpenMode {
                read: false,
                append: true,
                create: true,
                ..OpenMode::READ
            },
            _ => return Err(invalid()),
        };
        mode.binary = false;

        let mut seen_plus = false;
        let mut seen_type = false;
        for c in chars {
            match c {
                '+' if !seen_plus => {
                    seen_plus = true;
                    mode.read = true;
                    mode.write = true;
                }
                'b' | 't' if !seen_type => {
                    seen_type = true;
                    mode.binary = c == 'b';
                }
                'x' if mode.truncate && !mode.exclusive => mode.exclusive = true,
                _ => return Err(invalid()),
            }
        }

        Ok(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> OpenMode {
        s.parse().unwrap()
    }

    #[test]
    fn test_read_modes() {
        let mode = parse("r");
        assert!(mode.read);
        assert!(!mode.is_writable());
        assert!(!mode.binary);

        assert_eq!(parse("rb"), OpenMode::READ);

        let mode = parse("r+b");
        assert!(mode.read && mode.write);
        assert!(!mode.create && !mode.truncate);
        assert!(mode.binary);
    }

    #[test]
    fn test_write_modes() {
        let mode = parse("wb");
        assert!(!mode.read);
        assert!(mode.write && mode.create && mode.truncate);

        let mode = parse("w+");
        assert!(mode.read && mode.write);

        let mode = parse("wx");
        assert!(mode.exclusive);
    }

    #[test]
    fn test_append_modes() {
        let mode = parse("a");
        assert!(mode.is_append());
        assert!(mode.is_writable());
        assert!(!mode.read);
        assert!(!mode.truncate);

        let mode = parse("ab+");
        assert!(mode.is_append() && mode.read && mode.binary);
    }

    #[test]
    fn test_invalid_modes() {
        for bad in ["", "q", "rr", "r++", "rbt", "rx", "ax", "+r", "wxx"] {
            assert!(
                matches!(bad.parse::<OpenMode>(), Err(VfsError::InvalidMode(_))),
                "mode {:?} should be rejected",
                bad
            );
        }
    }
}
