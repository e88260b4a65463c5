//! Verify command

use std::path::Path;

use anyhow::{Context as _, Result};
use scarb_dist_core::types::HostId;
use scarb_dist_core::verify_install;
use scarb_dist_schema::{REQUIRED_BINARIES, VERSION_INFO_PATH, VersionInfoRecord};

use super::host_or_current;

/// Check an existing installation.
///
/// The target platform comes from `--host`, then from the installation's
/// version info, then from the machine running the check.
pub fn verify(dest: &Path, host: Option<HostId>) -> Result<()> {
    let info = read_version_info(dest)?;
    let platform = match (host, &info) {
        (Some(host), _) => host.platform(),
        (None, Some(info)) => info.build_platform,
        (None, None) => host_or_current(None)?.platform(),
    };

    verify_install(dest, platform, &REQUIRED_BINARIES)
        .with_context(|| format!("Installation at {} is incomplete", dest.display()))?;

    match info {
        Some(info) => println!(
            "scarb {} ({}) at {}: ok",
            info.version,
            info.build_platform,
            dest.display()
        ),
        None => println!("{}: ok (no version info)", dest.display()),
    }
    Ok(())
}

fn read_version_info(dest: &Path) -> Result<Option<VersionInfoRecord>> {
    let info_path = dest.join(VERSION_INFO_PATH);
    if !info_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&info_path)
        .with_context(|| format!("Failed to read {}", info_path.display()))?;
    let info = serde_json::from_str(&content)
        .with_context(|| format!("Invalid version info in {}", info_path.display()))?;
    Ok(Some(info))
}
