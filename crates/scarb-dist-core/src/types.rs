pub use scarb_dist_schema::{
    ArchiveFormat, HostId, Platform, PlatformError, ReleaseMetadata, Sha256Digest, Version,
    VersionEntry, VersionInfoRecord,
};
