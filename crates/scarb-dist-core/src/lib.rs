//! Version registry, build selection and install pipeline for Scarb
//! distributions.

pub mod builder;
pub mod io;
pub mod paths;
pub mod registry;
pub mod reporter;
pub mod select;
pub mod types;
pub mod update;

pub use builder::{ArtifactBuilder, BuildDescriptor, BuildError, BuildJob, Stage, verify_install};
pub use paths::*;
pub use registry::{Registry, RegistryError};
pub use reporter::{NullReporter, Reporter};
pub use select::{Selector, latest, latest_stable, latest_version, stable_versions};

/// User Agent string for core operations
pub const USER_AGENT: &str = concat!("scarb-dist/", env!("CARGO_PKG_VERSION"));
