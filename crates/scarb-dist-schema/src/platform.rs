//! Host identifiers, upstream platform triples and archive formats.
//!
//! Scarb publishes one archive per Rust target triple. Callers identify the
//! machine they build for with a short host identifier (`x86_64-linux`),
//! which maps onto exactly one triple through a fixed table.
//!
//! # Example
//!
//! ```
//! use scarb_dist_schema::{ArchiveFormat, Platform, resolve};
//!
//! let platform = resolve("x86_64-windows").unwrap();
//! assert_eq!(platform, Platform::X86_64PcWindowsMsvc);
//! assert_eq!(platform.archive_format(), ArchiveFormat::Zip);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the host and triple lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The host identifier is not one of the seven supported values.
    #[error("Unsupported platform '{0}'")]
    UnsupportedHost(String),

    /// The target triple is not one Scarb publishes archives for.
    #[error("Unknown platform triple '{0}'")]
    UnknownTriple(String),
}

/// A supported build host, named `<arch>-<os>[-<libc>]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum HostId {
    /// Apple Silicon macOS.
    #[serde(rename = "aarch64-darwin")]
    Aarch64Darwin,
    /// Intel macOS.
    #[serde(rename = "x86_64-darwin")]
    X86_64Darwin,
    /// ARM64 Linux, glibc.
    #[serde(rename = "aarch64-linux")]
    Aarch64Linux,
    /// `x86_64` Linux, glibc.
    #[serde(rename = "x86_64-linux")]
    X86_64Linux,
    /// ARM64 Linux, musl.
    #[serde(rename = "aarch64-linux-musl")]
    Aarch64LinuxMusl,
    /// `x86_64` Linux, musl.
    #[serde(rename = "x86_64-linux-musl")]
    X86_64LinuxMusl,
    /// `x86_64` Windows.
    #[serde(rename = "x86_64-windows")]
    X86_64Windows,
}

impl HostId {
    /// Every supported host, in table order.
    pub const ALL: [HostId; 7] = [
        Self::Aarch64Darwin,
        Self::X86_64Darwin,
        Self::Aarch64Linux,
        Self::X86_64Linux,
        Self::Aarch64LinuxMusl,
        Self::X86_64LinuxMusl,
        Self::X86_64Windows,
    ];

    /// The host this binary was compiled for, if it is a supported one.
    pub fn current() -> Option<Self> {
        if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
            Some(Self::Aarch64Darwin)
        } else if cfg!(all(target_os = "macos", target_arch = "x86_64")) {
            Some(Self::X86_64Darwin)
        } else if cfg!(all(target_os = "linux", target_arch = "aarch64", target_env = "musl")) {
            Some(Self::Aarch64LinuxMusl)
        } else if cfg!(all(target_os = "linux", target_arch = "x86_64", target_env = "musl")) {
            Some(Self::X86_64LinuxMusl)
        } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
            Some(Self::Aarch64Linux)
        } else if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Some(Self::X86_64Linux)
        } else if cfg!(all(target_os = "windows", target_arch = "x86_64")) {
            Some(Self::X86_64Windows)
        } else {
            None
        }
    }

    /// The identifier string (`x86_64-linux`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aarch64Darwin => "aarch64-darwin",
            Self::X86_64Darwin => "x86_64-darwin",
            Self::Aarch64Linux => "aarch64-linux",
            Self::X86_64Linux => "x86_64-linux",
            Self::Aarch64LinuxMusl => "aarch64-linux-musl",
            Self::X86_64LinuxMusl => "x86_64-linux-musl",
            Self::X86_64Windows => "x86_64-windows",
        }
    }

    /// The upstream platform this host installs.
    pub fn platform(&self) -> Platform {
        match self {
            Self::Aarch64Darwin => Platform::Aarch64AppleDarwin,
            Self::X86_64Darwin => Platform::X86_64AppleDarwin,
            Self::Aarch64Linux => Platform::Aarch64UnknownLinuxGnu,
            Self::X86_64Linux => Platform::X86_64UnknownLinuxGnu,
            Self::Aarch64LinuxMusl => Platform::Aarch64UnknownLinuxMusl,
            Self::X86_64LinuxMusl => Platform::X86_64UnknownLinuxMusl,
            Self::X86_64Windows => Platform::X86_64PcWindowsMsvc,
        }
    }
}

impl std::fmt::Display for HostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HostId {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|host| host.as_str() == s)
            .ok_or_else(|| PlatformError::UnsupportedHost(s.to_string()))
    }
}

/// An upstream platform triple that Scarb ships archives for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Platform {
    /// `aarch64-apple-darwin`
    #[serde(rename = "aarch64-apple-darwin")]
    Aarch64AppleDarwin,
    /// `x86_64-apple-darwin`
    #[serde(rename = "x86_64-apple-darwin")]
    X86_64AppleDarwin,
    /// `aarch64-unknown-linux-gnu`
    #[serde(rename = "aarch64-unknown-linux-gnu")]
    Aarch64UnknownLinuxGnu,
    /// `x86_64-unknown-linux-gnu`
    #[serde(rename = "x86_64-unknown-linux-gnu")]
    X86_64UnknownLinuxGnu,
    /// `aarch64-unknown-linux-musl`
    #[serde(rename = "aarch64-unknown-linux-musl")]
    Aarch64UnknownLinuxMusl,
    /// `x86_64-unknown-linux-musl`
    #[serde(rename = "x86_64-unknown-linux-musl")]
    X86_64UnknownLinuxMusl,
    /// `x86_64-pc-windows-msvc`
    #[serde(rename = "x86_64-pc-windows-msvc")]
    X86_64PcWindowsMsvc,
}

impl Platform {
    /// Every known triple.
    pub const ALL: [Platform; 7] = [
        Self::Aarch64AppleDarwin,
        Self::X86_64AppleDarwin,
        Self::Aarch64UnknownLinuxGnu,
        Self::X86_64UnknownLinuxGnu,
        Self::Aarch64UnknownLinuxMusl,
        Self::X86_64UnknownLinuxMusl,
        Self::X86_64PcWindowsMsvc,
    ];

    /// The triple string used in asset names.
    pub fn as_triple(&self) -> &'static str {
        match self {
            Self::Aarch64AppleDarwin => "aarch64-apple-darwin",
            Self::X86_64AppleDarwin => "x86_64-apple-darwin",
            Self::Aarch64UnknownLinuxGnu => "aarch64-unknown-linux-gnu",
            Self::X86_64UnknownLinuxGnu => "x86_64-unknown-linux-gnu",
            Self::Aarch64UnknownLinuxMusl => "aarch64-unknown-linux-musl",
            Self::X86_64UnknownLinuxMusl => "x86_64-unknown-linux-musl",
            Self::X86_64PcWindowsMsvc => "x86_64-pc-windows-msvc",
        }
    }

    /// Archive format upstream uses for this triple.
    ///
    /// Only the Windows MSVC build ships as a zip.
    pub fn archive_format(&self) -> ArchiveFormat {
        match self {
            Self::X86_64PcWindowsMsvc => ArchiveFormat::Zip,
            _ => ArchiveFormat::TarGz,
        }
    }

    /// Whether installed executables carry an `.exe` suffix.
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::X86_64PcWindowsMsvc)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_triple())
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_triple() == s)
            .ok_or_else(|| PlatformError::UnknownTriple(s.to_string()))
    }
}

/// Archive container of a release asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveFormat {
    /// Gzip-compressed tar archive.
    #[serde(rename = "tar.gz")]
    TarGz,
    /// Zip archive.
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveFormat {
    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TarGz => "tar.gz",
            Self::Zip => "zip",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Resolve a host identifier string to its upstream platform.
///
/// # Errors
///
/// Returns [`PlatformError::UnsupportedHost`] for anything outside
/// [`HostId::ALL`].
pub fn resolve(host_id: &str) -> Result<Platform, PlatformError> {
    Ok(host_id.parse::<HostId>()?.platform())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_host_resolves() {
        for host in HostId::ALL {
            let platform = resolve(host.as_str()).unwrap();
            assert!(!platform.as_triple().is_empty());
            assert_eq!(
                platform.archive_format() == ArchiveFormat::Zip,
                platform.as_triple() == "x86_64-pc-windows-msvc",
                "archive format mismatch for {host}"
            );
        }
    }

    #[test]
    fn test_host_table_is_a_bijection() {
        let mut triples: Vec<Platform> = HostId::ALL.iter().map(HostId::platform).collect();
        triples.sort();
        triples.dedup();
        assert_eq!(triples.len(), Platform::ALL.len());
    }

    #[test]
    fn test_resolve_known_pairs() {
        assert_eq!(
            resolve("x86_64-linux").unwrap().as_triple(),
            "x86_64-unknown-linux-gnu"
        );
        assert_eq!(
            resolve("aarch64-linux-musl").unwrap().as_triple(),
            "aarch64-unknown-linux-musl"
        );
        assert_eq!(
            resolve("aarch64-darwin").unwrap().as_triple(),
            "aarch64-apple-darwin"
        );
    }

    #[test]
    fn test_resolve_unsupported() {
        assert_eq!(
            resolve("riscv64-linux"),
            Err(PlatformError::UnsupportedHost("riscv64-linux".to_string()))
        );
        assert!(resolve("X86_64-LINUX").is_err());
        assert!(resolve("").is_err());
    }

    #[test]
    fn test_triple_round_trip_through_from_str() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_triple().parse::<Platform>().unwrap(), platform);
        }
        assert!("aarch64-pc-windows-msvc".parse::<Platform>().is_err());
    }

    #[test]
    fn test_serde_names_match_strings() {
        let json = serde_json::to_string(&Platform::X86_64UnknownLinuxGnu).unwrap();
        assert_eq!(json, "\"x86_64-unknown-linux-gnu\"");
        let json = serde_json::to_string(&HostId::X86_64LinuxMusl).unwrap();
        assert_eq!(json, "\"x86_64-linux-musl\"");
        let json = serde_json::to_string(&ArchiveFormat::TarGz).unwrap();
        assert_eq!(json, "\"tar.gz\"");
    }
}
