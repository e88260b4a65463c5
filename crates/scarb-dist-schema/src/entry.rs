use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hash::Sha256Digest;
use crate::platform::{HostId, Platform};
use crate::version::Version;

/// Everything the registry knows about one released version.
///
/// Serialized as `{"hashes": {...}, "metadata": {...}}` under the version key
/// of the registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Archive checksum per platform. A missing platform means upstream never
    /// published a build of this version for it.
    #[serde(default)]
    pub hashes: BTreeMap<Platform, Sha256Digest>,

    /// Release metadata copied from the release host.
    pub metadata: ReleaseMetadata,
}

impl VersionEntry {
    /// A version is stable when it is neither a prerelease nor a draft.
    pub fn is_stable(&self) -> bool {
        !(self.metadata.prerelease || self.metadata.draft)
    }

    /// Checksum recorded for `platform`, if any.
    pub fn hash_for(&self, platform: Platform) -> Option<&Sha256Digest> {
        self.hashes.get(&platform)
    }

    /// Platforms this version can be installed on.
    pub fn platforms(&self) -> impl Iterator<Item = Platform> + '_ {
        self.hashes.keys().copied()
    }
}

/// Release-level metadata of a [`VersionEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseMetadata {
    /// Publication timestamp reported by the release host.
    pub release_date: DateTime<Utc>,

    /// Marked as a prerelease upstream.
    #[serde(default)]
    pub prerelease: bool,

    /// Marked as a draft upstream.
    #[serde(default)]
    pub draft: bool,

    /// Cleaned-up release notes.
    #[serde(default)]
    pub changelog: Option<String>,

    /// Sum of download counts over all assets at the time of the last update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,

    /// Per-asset details keyed by asset file name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assets: BTreeMap<String, AssetRecord>,
}

/// One downloadable file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Direct download URL.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// Download counter at the time of the last update.
    pub download_count: u64,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Metadata written next to an installation describing what was installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfoRecord {
    /// Installed version.
    pub version: Version,
    /// Upstream publication timestamp.
    pub release_date: DateTime<Utc>,
    /// Whether the installed version is a prerelease.
    pub prerelease: bool,
    /// Host identifier the build was produced for.
    pub build_system: HostId,
    /// Upstream platform triple of the installed archive.
    pub build_platform: Platform,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = r#"{
        "hashes": {
            "x86_64-unknown-linux-gnu": "4d0f8c5b3a1e2d9c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d4c"
        },
        "metadata": {
            "releaseDate": "2024-09-04T12:14:27Z",
            "prerelease": false,
            "draft": false,
            "changelog": "Bug fixes"
        }
    }"#;

    #[test]
    fn test_parse_entry() {
        let entry: VersionEntry = serde_json::from_str(ENTRY).unwrap();
        assert!(entry.is_stable());
        assert!(entry.hash_for(Platform::X86_64UnknownLinuxGnu).is_some());
        assert!(entry.hash_for(Platform::X86_64PcWindowsMsvc).is_none());
        assert_eq!(entry.metadata.changelog.as_deref(), Some("Bug fixes"));
        assert!(entry.metadata.assets.is_empty());
    }

    #[test]
    fn test_stability_gate() {
        let mut entry: VersionEntry = serde_json::from_str(ENTRY).unwrap();
        entry.metadata.prerelease = true;
        assert!(!entry.is_stable());
        entry.metadata.prerelease = false;
        entry.metadata.draft = true;
        assert!(!entry.is_stable());
    }

    #[test]
    fn test_unknown_triple_rejected() {
        let bad = ENTRY.replace("x86_64-unknown-linux-gnu", "sparc-sun-solaris");
        assert!(serde_json::from_str::<VersionEntry>(&bad).is_err());
    }

    #[test]
    fn test_version_info_field_names() {
        let record = VersionInfoRecord {
            version: Version::parse("2.8.2").unwrap(),
            release_date: "2024-09-04T12:14:27Z".parse().unwrap(),
            prerelease: false,
            build_system: HostId::X86_64Linux,
            build_platform: Platform::X86_64UnknownLinuxGnu,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["version"], "2.8.2");
        assert_eq!(value["buildSystem"], "x86_64-linux");
        assert_eq!(value["buildPlatform"], "x86_64-unknown-linux-gnu");
        assert_eq!(value["prerelease"], false);
        assert!(value.get("releaseDate").is_some());
    }
}
