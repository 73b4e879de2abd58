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

//! Runtime configuration
//!
//! Configuration is stored as TOML. Every field has a default, so an empty
//! file (or no file at all) yields a working setup. A handful of settings
//! can be overridden through `LAYRA_*` environment variables.
//!
//! ```toml
//! [vfs]
//! max_mounts = 16
//! max_path_len = 256
//! resolution = "first-match"
//!
//! [pkg]
//! staging_prefix = "layra_pkg_"
//! keep_staging_on_failure = false
//! ```

use super::error::{LayraError, Result};
use super::vfs::Resolution;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the config file (used by the CLI)
pub const ENV_CONFIG_PATH: &str = "LAYRA_CONFIG";
/// Overrides [`PkgConfig::staging_root`]
pub const ENV_STAGING_ROOT: &str = "LAYRA_STAGING_ROOT";
/// Overrides [`VfsConfig::max_mounts`]
pub const ENV_MAX_MOUNTS: &str = "LAYRA_MAX_MOUNTS";
/// Overrides [`VfsConfig::resolution`]
pub const ENV_RESOLUTION: &str = "LAYRA_RESOLUTION";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Virtual filesystem settings
    pub vfs: VfsConfig,
    /// Archive extraction settings
    pub pkg: PkgConfig,
}

/// Virtual filesystem settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VfsConfig {
    /// Maximum number of simultaneous mounts
    pub max_mounts: usize,
    /// Path buffer size in bytes, terminator included; virtual and host
    /// paths must be strictly shorter
    pub max_path_len: usize,
    /// Path resolution strategy
    pub resolution: Resolution,
}

impl VfsConfig {
    /// Default mount table capacity
    pub const DEFAULT_MAX_MOUNTS: usize = 16;
    /// Default path length limit
    pub const DEFAULT_MAX_PATH_LEN: usize = 256;
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            max_mounts: Self::DEFAULT_MAX_MOUNTS,
            max_path_len: Self::DEFAULT_MAX_PATH_LEN,
            resolution: Resolution::FirstMatch,
        }
    }
}

/// Archive extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PkgConfig {
    /// Directory under which staging directories are created
    /// (the OS temp directory when unset)
    pub staging_root: Option<PathBuf>,
    /// Name prefix of each staging directory
    pub staging_prefix: String,
    /// Leave the staging directory on disk when extraction fails
    pub keep_staging_on_failure: bool,
}

impl Default for PkgConfig {
    fn default() -> Self {
        Self {
            staging_root: None,
            staging_prefix: "layra_pkg_".to_string(),
            keep_staging_on_failure: false,
        }
    }
}

impl PkgConfig {
    /// Directory that staging directories are created in
    pub fn staging_root(&self) -> PathBuf {
        self.staging_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `LayraError::Config` if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LayraError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)
            .map_err(|e| LayraError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &str) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| LayraError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)
            .map_err(|e| LayraError::Config(format!("Failed to write config file: {}", e)))
    }

    /// Apply `LAYRA_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Split out from [`Config::apply_env_overrides`] so tests don't have to
    /// mutate the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_STAGING_ROOT) {
            log::debug!("{} override: {}", ENV_STAGING_ROOT, root);
            self.pkg.staging_root = Some(PathBuf::from(root));
        }

        if let Some(value) = lookup(ENV_MAX_MOUNTS) {
            self.vfs.max_mounts = value.trim().parse().map_err(|_| {
                LayraError::Config(format!("{} is not a number: '{}'", ENV_MAX_MOUNTS, value))
            })?;
        }

        if let Some(value) = lookup(ENV_RESOLUTION) {
            self.vfs.resolution = value.trim().parse()?;
        }

        self.validate()
    }

    fn validate(&self) -> Result<()> {
        if self.vfs.max_mounts == 0 {
            return Err(LayraError::Config(
                "vfs.max_mounts must be greater than 0".to_string(),
            ));
        }
        if self.vfs.max_path_len == 0 {
            return Err(LayraError::Config(
                "vfs.max_path_len must be greater than 0".to_string(),
            ));
        }
        if self.pkg.staging_prefix.contains(['/', '\\']) {
            return Err(LayraError::Config(format!(
                "pkg.staging_prefix must not contain path separators: '{}'",
                self.pkg.staging_prefix
            )));
        }
        Ok(())
    }
}
