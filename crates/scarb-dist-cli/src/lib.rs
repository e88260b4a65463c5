//! scarb-dist - Scarb release registry and installer
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Resolves a version selector and host to a verified Scarb release archive
//! and installs it into a standard layout.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.scarb-dist/
//! ├── versions.json   # Version registry (embedded fallback when absent)
//! ├── CHANGES.md      # Log appended by `scarb-dist update`
//! └── cache/          # Verified archives by sha256
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use scarb_dist_core::select::Selector;
use scarb_dist_core::types::HostId;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "scarb-dist")]
#[command(author, version, about = "Resolve, verify and install Scarb releases")]
pub struct Cli {
    /// Registry file (defaults to $SCARB_DIST_REGISTRY or ~/.scarb-dist/versions.json)
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List registry versions
    List,
    /// Print the build descriptor for a selector as JSON
    Resolve {
        /// default, latest, latest-stable or an exact version
        #[arg(default_value = "default")]
        selector: Selector,
        /// Host identifier (e.g. x86_64-linux); detected when omitted
        #[arg(long)]
        host: Option<HostId>,
    },
    /// Download, verify and install a release
    Install {
        /// default, latest, latest-stable or an exact version
        #[arg(default_value = "default")]
        selector: Selector,
        /// Installation directory
        #[arg(long)]
        dest: PathBuf,
        /// Host identifier (e.g. x86_64-linux); detected when omitted
        #[arg(long)]
        host: Option<HostId>,
    },
    /// Check that an installation provides every required binary
    Verify {
        /// Installation directory
        #[arg(long)]
        dest: PathBuf,
        /// Host the installation targets; read from its version info when omitted
        #[arg(long)]
        host: Option<HostId>,
    },
    /// Build several versions and hosts concurrently
    Matrix {
        /// Output root; each build goes to <dest>/<version>/<host>
        #[arg(long)]
        dest: PathBuf,
        /// Host identifiers (all supported hosts when omitted)
        #[arg(long, value_delimiter = ',')]
        hosts: Vec<HostId>,
        /// Selectors to build
        #[arg(long, value_delimiter = ',', default_value = "default")]
        versions: Vec<Selector>,
        /// Concurrent builds
        #[arg(short, long, default_value_t = 4)]
        jobs: usize,
    },
    /// Refresh the registry from the release host
    Update {
        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}
