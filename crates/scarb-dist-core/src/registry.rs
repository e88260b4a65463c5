//! The version registry: version string → per-platform checksums + metadata.
//!
//! A [`Registry`] is loaded once per invocation and never mutated afterwards.
//! The update job produces a brand new value via [`Registry::from_entries`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{Version, VersionEntry};

/// Known-good release used when no registry file exists.
const FALLBACK_REGISTRY: &str = include_str!("fallback.json");

/// Errors that can occur when loading or querying the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry file exists but could not be read.
    #[error("Failed to read registry {}: {source}", path.display())]
    Read {
        /// Registry file path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The registry file is not valid registry JSON.
    #[error("Failed to parse registry {}: {source}", path.display())]
    Parse {
        /// Registry file path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The registry file parsed but lists no versions.
    #[error("Registry {} contains no versions", .0.display())]
    Empty(PathBuf),

    /// The requested version is not in the registry.
    #[error("Version {0} not found in registry")]
    VersionNotFound(String),
}

/// Immutable mapping from version to [`VersionEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    entries: BTreeMap<Version, VersionEntry>,
}

impl Registry {
    /// Load the registry file at `path`.
    ///
    /// A missing file yields [`Registry::fallback`], so callers always have at
    /// least one installable version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Read`] if the file exists but cannot be read,
    /// [`RegistryError::Parse`] if it is not valid registry JSON (including
    /// invalid version keys, unknown platform triples or malformed digests),
    /// and [`RegistryError::Empty`] if it lists no versions.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        if !path.exists() {
            info!(
                "no registry at {}, using embedded fallback",
                path.display()
            );
            return Ok(Self::fallback());
        }

        let content = fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let registry = Self::from_json(&content).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if registry.is_empty() {
            return Err(RegistryError::Empty(path.to_path_buf()));
        }

        debug!(
            "loaded {} versions from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Parse registry JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if `json` is not a valid registry.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Single-entry registry embedded at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the embedded fallback data is not a valid registry, which the
    /// test suite rules out.
    pub fn fallback() -> Self {
        Self::from_json(FALLBACK_REGISTRY).expect("embedded fallback registry is valid")
    }

    /// Build a registry from already validated entries.
    pub fn from_entries(entries: BTreeMap<Version, VersionEntry>) -> Self {
        Self { entries }
    }

    /// Look up a version by its exact string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::VersionNotFound`] if `version` is not a key.
    pub fn get(&self, version: &str) -> Result<&VersionEntry, RegistryError> {
        version
            .parse::<Version>()
            .ok()
            .and_then(|v| self.entries.get(&v))
            .ok_or_else(|| RegistryError::VersionNotFound(version.to_string()))
    }

    /// Look up an already parsed version.
    pub fn entry(&self, version: &Version) -> Option<&VersionEntry> {
        self.entries.get(version)
    }

    /// Whether `version` is a key.
    pub fn contains(&self, version: &Version) -> bool {
        self.entries.contains_key(version)
    }

    /// All versions, ascending.
    pub fn versions(&self) -> impl DoubleEndedIterator<Item = &Version> {
        self.entries.keys()
    }

    /// All `(version, entry)` pairs, ascending by version.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&Version, &VersionEntry)> {
        self.entries.iter()
    }

    /// Number of versions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry lists no versions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the registry, returning its entries.
    pub fn into_entries(self) -> BTreeMap<Version, VersionEntry> {
        self.entries
    }

    /// Pretty JSON with sorted keys, as written by the update job.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
