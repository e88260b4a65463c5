//! Reporter trait for dependency injection
//!
//! This trait allows the build pipeline to report progress and status without
//! being coupled to a specific terminal implementation.

use crate::types::{Platform, Version};

pub trait Reporter: Send + Sync {
    /// Indicates a new section or phase has started (e.g. "Fetching", "Installing").
    fn section(&self, title: &str);

    /// A build started fetching its archive.
    fn downloading(&self, version: &Version, platform: Platform);

    /// Updates the state of a build to 'extracting'.
    fn extracting(&self, version: &Version, platform: Platform);

    /// Updates the state of a build to 'installing'.
    fn installing(&self, version: &Version, platform: Platform);

    /// Marks a build as successfully completed.
    fn done(&self, version: &Version, platform: Platform, detail: &str);

    /// Marks a build as failed with a specific reason.
    fn failed(&self, version: &Version, platform: Platform, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn section(&self, title: &str) {
        (**self).section(title);
    }
    fn downloading(&self, version: &Version, platform: Platform) {
        (**self).downloading(version, platform);
    }
    fn extracting(&self, version: &Version, platform: Platform) {
        (**self).extracting(version, platform);
    }
    fn installing(&self, version: &Version, platform: Platform) {
        (**self).installing(version, platform);
    }
    fn done(&self, version: &Version, platform: Platform, detail: &str) {
        (**self).done(version, platform, detail);
    }
    fn failed(&self, version: &Version, platform: Platform, reason: &str) {
        (**self).failed(version, platform, reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., verification, testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn section(&self, _: &str) {}
    fn downloading(&self, _: &Version, _: Platform) {}
    fn extracting(&self, _: &Version, _: Platform) {}
    fn installing(&self, _: &Version, _: Platform) {}
    fn done(&self, _: &Version, _: Platform, _: &str) {}
    fn failed(&self, _: &Version, _: Platform, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
