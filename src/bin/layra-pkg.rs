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

//! layra-pkg entry point
//!
//! Command-line tool for inspecting PKG archives, extracting them and
//! mounting them in a throwaway VFS.

use clap::{Parser, Subcommand};
use layra::core::config::{Config, ENV_CONFIG_PATH};
use layra::core::pkg::{Extractor, PkgArchive};
use layra::core::vfs::{SeekOrigin, Vfs};
use layra::{LayraError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "layra-pkg")]
#[command(about = "Inspect, extract and mount PKG archives", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the archive header
    Info {
        /// Archive path
        pkg: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the entry table
    List {
        /// Archive path
        pkg: PathBuf,
    },

    /// Extract every entry into a directory
    Extract {
        /// Archive path
        pkg: PathBuf,
        /// Output directory
        out_dir: PathBuf,
    },

    /// Extract and mount an archive, then list or print its files
    Mount {
        /// Archive path
        pkg: PathBuf,
        /// Virtual mount point
        #[arg(long, default_value = "/app0")]
        at: String,
        /// Virtual path to print to stdout
        #[arg(long)]
        cat: Option<String>,
    },
}

fn main() -> ExitCode {
    // .env may set RUST_LOG, so load it before the logger
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            log::warn!("Failed to load .env: {}", e);
        }
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { pkg, json } => info(&pkg, json),
        Commands::List { pkg } => list(&pkg),
        Commands::Extract { pkg, out_dir } => extract(&config, &pkg, &out_dir),
        Commands::Mount { pkg, at, cat } => mount(&config, &pkg, &at, cat.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            Config::load(&path.to_string_lossy())?
        }
        None => Config::default(),
    };
    config.apply_env_overrides()?;
    Ok(config)
}

fn info(pkg: &Path, json: bool) -> Result<()> {
    let archive = PkgArchive::open(pkg)?;
    let summary = archive.header().summary();

    if json {
        let text = serde_json::to_string_pretty(&summary)
            .map_err(|e| LayraError::Config(format!("Failed to encode JSON: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("Content ID:    {}", summary.content_id);
    println!("Type:          0x{:08X}", summary.pkg_type);
    println!("DRM type:      0x{:X}", summary.drm_type);
    println!("Content type:  0x{:X}", summary.content_type);
    println!("Content flags: 0x{:08X}", summary.content_flags);
    println!("Files:         {}", summary.file_count);
    println!("Entries:       {}", summary.entry_count);
    println!("Table offset:  0x{:X}", summary.table_offset);
    println!(
        "Body:          0x{:X} ({} bytes)",
        summary.body_offset, summary.body_size
    );
    println!("Package size:  {}", summary.pkg_size);
    println!("PFS images:    {}", summary.pfs_image_count);
    println!("Body digest:   {}", summary.digest_body);
    println!("PKG digest:    {}", summary.pkg_digest);
    Ok(())
}

fn list(pkg: &Path) -> Result<()> {
    let mut archive = PkgArchive::open(pkg)?;
    let entries = archive.entries()?;

    println!(
        "{:>10}  {:>10}  {:>10}  {:>10}  {:>10}  ENC",
        "ID", "OFFSET", "SIZE", "FLAGS1", "FLAGS2"
    );
    for entry in &entries {
        println!(
            "0x{:08X}  0x{:08X}  {:>10}  0x{:08X}  0x{:08X}  {}",
            entry.id,
            entry.offset,
            entry.size,
            entry.flags1,
            entry.flags2,
            if entry.is_encrypted() { "yes" } else { "no" }
        );
    }
    println!("{} entries", entries.len());
    Ok(())
}

fn extract(config: &Config, pkg: &Path, out_dir: &Path) -> Result<()> {
    let mut archive = PkgArchive::open(pkg)?;
    let files = Extractor::new(config.pkg.clone()).extract_to(&mut archive, out_dir)?;

    let total: u64 = files.iter().map(|f| f.size as u64).sum();
    log::info!(
        "Extracted {} files ({} bytes) to {}",
        files.len(),
        total,
        out_dir.display()
    );
    Ok(())
}

fn mount(config: &Config, pkg: &Path, at: &str, cat: Option<&str>) -> Result<()> {
    let mut vfs = Vfs::new(&config.vfs);
    let mounted = Extractor::new(config.pkg.clone()).open_and_mount(&mut vfs, pkg, at)?;

    let result = match cat {
        Some(path) => cat_file(&mut vfs, path),
        None => {
            for file in mounted.files() {
                println!("{:>10}  {}", file.size, mounted.virtual_path(file));
            }
            Ok(())
        }
    };

    vfs.close_all();
    mounted.release(&mut vfs)?;
    result
}

/// Copy a virtual file to stdout through the VFS handle API
fn cat_file(vfs: &mut Vfs, path: &str) -> Result<()> {
    let handle = vfs.open(path, "rb")?;
    let size = vfs.seek(handle, 0, SeekOrigin::End)?;
    vfs.seek(handle, 0, SeekOrigin::Start)?;
    log::debug!("{}: {} bytes", path, size);

    let mut stdout = std::io::stdout().lock();
    let mut buf = [0u8; 8192];
    let chunk = buf.len();
    loop {
        let n = vfs.read(handle, &mut buf, 1, chunk);
        if n == 0 {
            break;
        }
        stdout.write_all(&buf[..n])?;
    }
    stdout.flush()?;

    vfs.close(handle)?;
    Ok(())
}
