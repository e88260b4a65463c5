use anyhow::{Context, Result};
use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Default host serving release archives.
pub const DEFAULT_RELEASE_HOST: &str = "https://github.com";

/// Default REST API endpoint of the release host.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Registry file name inside the scarb-dist home.
pub const REGISTRY_FILE: &str = "versions.json";

/// Human-readable update log written next to the registry file.
pub const CHANGES_FILE: &str = "CHANGES.md";

/// Returns the scarb-dist home directory, or None if the user's home cannot be resolved.
pub fn try_dist_home() -> Option<PathBuf> {
    if let Ok(val) = std::env::var("SCARB_DIST_HOME") {
        return Some(PathBuf::from(val));
    }
    home_dir().map(|h| h.join(".scarb-dist"))
}

/// Runtime configuration, read from the environment.
///
/// | Variable | Default |
/// |---|---|
/// | `SCARB_DIST_HOME` | `~/.scarb-dist` |
/// | `SCARB_DIST_REGISTRY` | `$SCARB_DIST_HOME/versions.json` |
/// | `SCARB_DIST_RELEASE_HOST` | `https://github.com` |
/// | `SCARB_DIST_API_URL` | `https://api.github.com` |
/// | `GITHUB_TOKEN` | unset |
#[derive(Debug, Clone)]
pub struct DistConfig {
    /// Root for caches and the default registry location.
    pub home: PathBuf,
    /// Registry file to load.
    pub registry_path: PathBuf,
    /// Base URL release archives are downloaded from.
    pub release_host: String,
    /// Base URL of the release listing API.
    pub api_url: String,
    /// Token for authenticated API requests.
    pub github_token: Option<String>,
}

impl DistConfig {
    /// Configuration rooted at `home` with default hosts.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            registry_path: home.join(REGISTRY_FILE),
            home,
            release_host: DEFAULT_RELEASE_HOST.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            github_token: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SCARB_DIST_HOME` is unset and the user's home
    /// directory cannot be determined.
    pub fn from_env() -> Result<Self> {
        let home = try_dist_home()
            .context("Could not determine home directory. Set SCARB_DIST_HOME to override.")?;
        let mut config = Self::new(home);

        if let Ok(path) = std::env::var("SCARB_DIST_REGISTRY") {
            config.registry_path = PathBuf::from(path);
        }
        if let Ok(host) = std::env::var("SCARB_DIST_RELEASE_HOST") {
            config.release_host = host;
        }
        if let Ok(api) = std::env::var("SCARB_DIST_API_URL") {
            config.api_url = api;
        }
        config.github_token = std::env::var("GITHUB_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        Ok(config)
    }

    /// Override the registry location (e.g. from a `--registry` flag).
    pub fn with_registry(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.registry_path = path;
        }
        self
    }

    /// Download cache: `$SCARB_DIST_HOME/cache`
    pub fn cache_dir(&self) -> PathBuf {
        self.home.join("cache")
    }

    /// Update log next to the registry file.
    pub fn changes_path(&self) -> PathBuf {
        self.registry_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(CHANGES_FILE)
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_under_home() {
        let config = DistConfig::new("/tmp/sd");
        assert_eq!(config.registry_path, PathBuf::from("/tmp/sd/versions.json"));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/sd/cache"));
        assert_eq!(config.changes_path(), PathBuf::from("/tmp/sd/CHANGES.md"));
        assert_eq!(config.release_host, DEFAULT_RELEASE_HOST);
    }

    #[test]
    fn test_registry_override() {
        let config = DistConfig::new("/tmp/sd").with_registry(Some("/srv/versions/versions.json".into()));
        assert_eq!(config.changes_path(), PathBuf::from("/srv/versions/CHANGES.md"));
        let config = config.with_registry(None);
        assert_eq!(
            config.registry_path,
            PathBuf::from("/srv/versions/versions.json")
        );
    }

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://github.com/a/b/releases/download/v1/b-v1-x.tar.gz"),
            "b-v1-x.tar.gz"
        );
        assert_eq!(filename_from_url(""), "");
    }
}
