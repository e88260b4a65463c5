//! Release version identifiers and their total order.
//!
//! Registry keys are plain `MAJOR.MINOR.PATCH` strings, optionally followed by
//! a `-suffix` (e.g. `2.9.0-rc.1`). Ordering compares the three numeric fields
//! only; whether a release is a pre-release is carried out-of-band by the
//! registry metadata, not by the suffix.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing a [`Version`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string does not start with three dot-separated numeric fields.
    #[error("Invalid version '{0}': expected MAJOR.MINOR.PATCH")]
    Malformed(String),

    /// A `-` or `+` separator was present but nothing followed it.
    #[error("Invalid version '{0}': empty suffix")]
    EmptySuffix(String),
}

/// A release version as it appears in the registry (`2.8.2`, `2.9.0-rc.1`).
///
/// # Example
///
/// ```
/// use scarb_dist_schema::Version;
///
/// let a: Version = "2.8.2".parse().unwrap();
/// let b: Version = "2.8.10".parse().unwrap();
/// assert!(b > a);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    major: u64,
    minor: u64,
    patch: u64,
}

impl Version {
    /// Parse and validate a version string.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if the numeric core is not exactly three
    /// non-empty decimal fields, or if a suffix separator has nothing after it.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let (core, suffix) = match s.find(['-', '+']) {
            Some(idx) => (&s[..idx], Some(&s[idx + 1..])),
            None => (s, None),
        };

        if suffix.is_some_and(str::is_empty) {
            return Err(VersionError::EmptySuffix(s.to_string()));
        }

        let fields: Vec<&str> = core.split('.').collect();
        if fields.len() != 3 {
            return Err(VersionError::Malformed(s.to_string()));
        }

        let mut numbers = [0u64; 3];
        for (slot, field) in numbers.iter_mut().zip(&fields) {
            if field.is_empty() || !field.chars().all(|c| c.is_ascii_digit()) {
                return Err(VersionError::Malformed(s.to_string()));
            }
            *slot = field
                .parse()
                .map_err(|_| VersionError::Malformed(s.to_string()))?;
        }

        Ok(Self {
            raw: s.to_string(),
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
        })
    }

    /// The numeric `(major, minor, patch)` triple used for ordering.
    pub fn numeric(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// Return the version string exactly as it was parsed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // Keys sharing a numeric triple (`1.1.0` vs `1.1.0-rc`) fall back to
        // the raw string so the order stays total over distinct keys.
        self.numeric()
            .cmp(&other.numeric())
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.raw
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.raw)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.raw == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.raw == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_plain() {
        let version = v("2.8.2");
        assert_eq!(version.numeric(), (2, 8, 2));
        assert_eq!(version.as_str(), "2.8.2");
    }

    #[test]
    fn test_parse_with_suffix() {
        let version = v("1.1.0-rc.0");
        assert_eq!(version.numeric(), (1, 1, 0));
        assert_eq!(version.to_string(), "1.1.0-rc.0");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("2.8").is_err());
        assert!(Version::parse("2.8.2.1").is_err());
        assert!(Version::parse("v2.8.2").is_err());
        assert!(Version::parse("2..2").is_err());
        assert!(Version::parse("2.x.2").is_err());
        assert_eq!(
            Version::parse("2.8.2-"),
            Err(VersionError::EmptySuffix("2.8.2-".to_string()))
        );
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        assert!(v("2.8.10") > v("2.8.2"));
        assert!(v("2.10.0") > v("2.9.9"));
        assert!(v("10.0.0") > v("9.99.99"));
    }

    #[test]
    fn test_suffix_ignored_for_numeric_order() {
        assert!(v("2.9.0-rc.1") > v("2.8.99"));
        assert_eq!(v("1.1.0-rc").numeric(), v("1.1.0").numeric());
        assert_ne!(v("1.1.0-rc").cmp(&v("1.1.0")), Ordering::Equal);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&v("2.8.2")).unwrap();
        assert_eq!(json, "\"2.8.2\"");
        let back: Version = serde_json::from_str(&json).unwrap();
        assert_eq!(back, "2.8.2");
        assert!(serde_json::from_str::<Version>("\"latest\"").is_err());
    }
}
