use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors returned when a string is not a valid SHA-256 digest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion is not 64 characters long.
    #[error("Invalid SHA256 digest: expected 64 hex characters, got {len} in '{input}'")]
    Length {
        /// Number of characters found.
        len: usize,
        /// The rejected input.
        input: String,
    },

    /// The hex portion contains non-hex characters.
    #[error("Invalid SHA256 digest: contains non-hex characters in '{0}'")]
    NonHex(String),
}

/// A validated SHA256 digest (64 hex characters)
///
/// This newtype ensures that all digests in the system are validated at deserialization time,
/// preventing invalid hex strings from propagating into download verification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix. The stored form is
    /// lowercase without prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the hex portion is not exactly 64 ASCII hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        if hex.len() != 64 {
            return Err(DigestError::Length {
                len: hex.len(),
                input: s.clone(),
            });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s.clone()));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a freshly computed hex digest, ignoring case.
    pub fn matches(&self, actual_hex: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual_hex)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "4d0f8c5b3a1e2d9c7b6a5f4e3d2c1b0a9f8e7d6c5b4a3f2e1d0c9b8a7f6e5d4c";

    #[test]
    fn digest_accepts_prefix_and_uppercase() {
        let upper = DIGEST.to_uppercase();
        let d = Sha256Digest::new(format!("sha256:{upper}")).unwrap();
        assert_eq!(d.as_str(), DIGEST);
    }

    #[test]
    fn digest_rejects_bad_input() {
        assert!(matches!(
            Sha256Digest::new("abc123"),
            Err(DigestError::Length { len: 6, .. })
        ));
        let bad = format!("{}zz", &DIGEST[..62]);
        assert!(matches!(Sha256Digest::new(bad), Err(DigestError::NonHex(_))));
    }

    #[test]
    fn digest_matches_ignores_case() {
        let d = Sha256Digest::new(DIGEST).unwrap();
        assert!(d.matches(&DIGEST.to_uppercase()));
        assert!(!d.matches(&DIGEST.replace('4', "5")));
    }

    #[test]
    fn digest_deserialize_validates() {
        assert!(serde_json::from_str::<Sha256Digest>("\"nothex\"").is_err());
        let d: Sha256Digest = serde_json::from_str(&format!("\"{DIGEST}\"")).unwrap();
        assert_eq!(d.to_string(), DIGEST);
    }
}
