//! Stable/latest version selection and the named selectors exposed to users.

use std::collections::BTreeSet;
use std::str::FromStr;

use thiserror::Error;

use crate::registry::{Registry, RegistryError};
use crate::types::{Version, VersionEntry};

/// Errors from version selection.
#[derive(Error, Debug)]
pub enum SelectError {
    /// Asked for the maximum of an empty set.
    #[error("No versions to select from")]
    EmptySet,

    /// The selector names a version the registry does not know.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The selector is neither a keyword nor a version string.
    #[error("Invalid selector '{0}': expected default, latest, latest-stable or a version")]
    InvalidSelector(String),
}

/// Stability gate: neither prerelease nor draft.
pub fn is_stable(entry: &VersionEntry) -> bool {
    entry.is_stable()
}

/// Registry keys whose entries are stable.
pub fn stable_versions(registry: &Registry) -> BTreeSet<Version> {
    registry
        .iter()
        .filter(|(_, entry)| is_stable(entry))
        .map(|(version, _)| version.clone())
        .collect()
}

/// Maximum of `versions` under numeric `major.minor.patch` order.
///
/// # Errors
///
/// Returns [`SelectError::EmptySet`] if `versions` yields nothing.
pub fn latest<'a, I>(versions: I) -> Result<&'a Version, SelectError>
where
    I: IntoIterator<Item = &'a Version>,
{
    versions.into_iter().max().ok_or(SelectError::EmptySet)
}

/// Newest version in the registry, stable or not.
///
/// # Errors
///
/// Returns [`SelectError::EmptySet`] if the registry is empty.
pub fn latest_version(registry: &Registry) -> Result<Version, SelectError> {
    latest(registry.versions()).cloned()
}

/// Newest stable version in the registry.
///
/// # Errors
///
/// Returns [`SelectError::EmptySet`] if no entry is stable.
pub fn latest_stable(registry: &Registry) -> Result<Version, SelectError> {
    latest(&stable_versions(registry)).cloned()
}

/// A named entry point resolving to one registry version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Same as [`Selector::LatestStable`].
    Default,
    /// Newest version, including prereleases.
    Latest,
    /// Newest stable version.
    LatestStable,
    /// An exact registry key.
    Exact(Version),
}

impl Selector {
    /// Resolve to a concrete version present in `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::EmptySet`] if nothing qualifies, or
    /// [`SelectError::Registry`] if an exact version is not a registry key.
    pub fn resolve(&self, registry: &Registry) -> Result<Version, SelectError> {
        match self {
            Self::Default | Self::LatestStable => latest_stable(registry),
            Self::Latest => latest_version(registry),
            Self::Exact(version) => {
                if registry.contains(version) {
                    Ok(version.clone())
                } else {
                    Err(RegistryError::VersionNotFound(version.to_string()).into())
                }
            }
        }
    }
}

impl FromStr for Selector {
    type Err = SelectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "latest" => Ok(Self::Latest),
            "latest-stable" => Ok(Self::LatestStable),
            other => other
                .strip_prefix('v')
                .unwrap_or(other)
                .parse::<Version>()
                .map(Self::Exact)
                .map_err(|_| SelectError::InvalidSelector(s.to_string())),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Latest => write!(f, "latest"),
            Self::LatestStable => write!(f, "latest-stable"),
            Self::Exact(v) => write!(f, "{v}"),
        }
    }
}
