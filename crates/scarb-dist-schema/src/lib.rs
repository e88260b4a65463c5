//! Shared types and registry wire format for scarb-dist.
//!
//! Everything in this crate is plain data: version identifiers, the fixed
//! host → platform table, validated digests and the JSON shapes of the
//! version registry and the installed version-info record.

/// Registry entries and the installed version-info record.
pub mod entry;
/// Validated SHA-256 digests.
pub mod hash;
pub mod platform;
pub mod version;

// Re-exports
pub use entry::*;
pub use hash::*;
pub use platform::*;
pub use version::*;

/// Upstream repository owner on the release host.
pub const UPSTREAM_OWNER: &str = "software-mansion";

/// Upstream project name; also the prefix of every release asset.
pub const UPSTREAM_PROJECT: &str = "scarb";

/// Executables every installation must provide under `bin/`.
///
/// `scarb-snforge-test-collector` was shipped by older releases only and is
/// deliberately not listed.
pub const REQUIRED_BINARIES: [&str; 5] = [
    "scarb",
    "scarb-cairo-language-server",
    "scarb-cairo-run",
    "scarb-cairo-test",
    "scarb-doc",
];

/// Executable that some archives ship but installations must not depend on.
pub const DISABLED_BINARY: &str = "scarb-snforge-test-collector";

/// Location of the version-info record, relative to the install root.
pub const VERSION_INFO_PATH: &str = "share/scarb/version-info.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_binaries_exclude_disabled() {
        assert!(!REQUIRED_BINARIES.contains(&DISABLED_BINARY));
        assert_eq!(REQUIRED_BINARIES[0], UPSTREAM_PROJECT);
    }
}
