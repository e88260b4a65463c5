//! Subcommand implementations.

pub mod install;
pub mod list;
pub mod matrix;
pub mod resolve;
pub mod update;
pub mod verify;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use scarb_dist_core::io::download::HttpFetcher;
use scarb_dist_core::types::HostId;
use scarb_dist_core::{ArtifactBuilder, DistConfig, Registry};

use crate::ui::ConsoleReporter;

/// Configuration shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: DistConfig,
    pub quiet: bool,
}

impl Context {
    pub fn from_env(registry: Option<PathBuf>, quiet: bool) -> Result<Self> {
        Ok(Self {
            config: DistConfig::from_env()?.with_registry(registry),
            quiet,
        })
    }

    pub fn registry(&self) -> Result<Arc<Registry>> {
        Ok(Arc::new(Registry::load(&self.config.registry_path)?))
    }

    /// Builder with the download cache and console progress wired in.
    pub fn builder(&self) -> Result<ArtifactBuilder> {
        let client = HttpFetcher::default_client().context("Failed to create HTTP client")?;
        let fetcher = HttpFetcher::new(client).with_cache(self.config.cache_dir());

        Ok(ArtifactBuilder::new(self.registry()?, Arc::new(fetcher))
            .with_release_host(self.config.release_host.as_str())
            .with_reporter(Arc::new(ConsoleReporter::new(self.quiet))))
    }
}

/// The requested host, or the one this binary was built for.
pub fn host_or_current(host: Option<HostId>) -> Result<HostId> {
    host.or_else(HostId::current)
        .context("Unsupported platform: this machine is not a supported host, pass --host")
}
