//! Artifact builder: turns a version and host into an installed Scarb.
//!
//! A build is a straight pipeline, aborted at the first failure:
//!
//! | Stage | Work |
//! |---|---|
//! | `resolve` | Selector → registry version |
//! | `describe` | Version + host → [`BuildDescriptor`] |
//! | `fetch` | Download and verify the archive checksum |
//! | `extract` | Unpack the archive into a scratch directory |
//! | `install` | Copy `bin/` and `doc/` into the staging directory |
//! | `verify` | Every required binary is present and executable |
//! | `metadata` | Write `share/scarb/version-info.json` |
//!
//! Staging happens in a sibling of the destination; the destination only
//! appears once every stage has passed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use scarb_dist_schema::{REQUIRED_BINARIES, UPSTREAM_OWNER, UPSTREAM_PROJECT, VERSION_INFO_PATH};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::io::download::{DownloadError, Fetcher};
use crate::io::extract::{self, ExtractError};
use crate::paths::DEFAULT_RELEASE_HOST;
use crate::registry::{Registry, RegistryError};
use crate::reporter::{NullReporter, Reporter};
use crate::select::{SelectError, Selector};
use crate::types::{
    ArchiveFormat, HostId, Platform, PlatformError, Sha256Digest, Version, VersionInfoRecord,
};

/// Everything needed to fetch and verify one archive. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildDescriptor {
    /// Registry version being built.
    pub version: Version,
    /// Upstream triple the archive was built for.
    pub platform: Platform,
    /// Container format of the archive.
    pub archive_format: ArchiveFormat,
    /// Release asset URL.
    pub download_url: String,
    /// Digest the downloaded archive must hash to.
    pub expected_checksum: Sha256Digest,
}

/// Why a descriptor could not be derived.
#[derive(Error, Debug)]
pub enum DescribeError {
    /// Unknown version.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Unsupported host.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The version exists but ships nothing for this platform.
    #[error("No checksum for {version} on {platform}")]
    ChecksumMissing { version: String, platform: Platform },
}

/// Failure anywhere between selection and the installed tree.
#[derive(Error, Debug)]
pub enum InstallError {
    /// The selector resolved to nothing.
    #[error(transparent)]
    Select(#[from] SelectError),

    /// No descriptor for the version and host.
    #[error(transparent)]
    Describe(#[from] DescribeError),

    /// Transport failure or checksum mismatch.
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    /// Corrupt or unsafe archive.
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required top-level directory is absent from the archive.
    #[error("Archive has no {0}/ directory")]
    MissingDirectory(&'static str),

    /// Required binaries that are absent or not executable.
    #[error("Missing or non-executable binaries: {}", names.join(", "))]
    MissingBinary { names: Vec<String> },
}

/// Pipeline stage a build failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Selector to version.
    Resolve,
    /// Version and host to descriptor.
    Describe,
    /// Download and checksum.
    Fetch,
    /// Unpacking.
    Extract,
    /// Copying into the staging tree, or publishing it.
    Install,
    /// Required binaries check.
    Verify,
    /// Version info record.
    Metadata,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Resolve => "resolve",
            Self::Describe => "describe",
            Self::Fetch => "fetch",
            Self::Extract => "extract",
            Self::Install => "install",
            Self::Verify => "verify",
            Self::Metadata => "metadata",
        };
        f.write_str(name)
    }
}

/// A failed build, tagged with what was being built and where it stopped.
#[derive(Error, Debug)]
#[error("Build of scarb {version} for {platform} failed at {stage}: {source}")]
pub struct BuildError {
    /// Version, or the selector text if resolution failed.
    pub version: String,
    /// Target platform.
    pub platform: Platform,
    /// Where the pipeline stopped.
    pub stage: Stage,
    /// Underlying failure.
    #[source]
    pub source: InstallError,
}

/// One entry of a release matrix.
#[derive(Debug, Clone)]
pub struct BuildJob {
    /// Which version to build.
    pub selector: Selector,
    /// Target host.
    pub host: HostId,
    /// Installation directory for this job.
    pub dest: PathBuf,
}

/// Derives build descriptors from a shared registry and drives installs.
#[derive(Clone)]
pub struct ArtifactBuilder {
    registry: Arc<Registry>,
    fetcher: Arc<dyn Fetcher>,
    release_host: String,
    reporter: Arc<dyn Reporter>,
}

impl ArtifactBuilder {
    pub fn new(registry: Arc<Registry>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            registry,
            fetcher,
            release_host: DEFAULT_RELEASE_HOST.to_string(),
            reporter: Arc::new(NullReporter),
        }
    }

    /// Base URL release archives are served from (no trailing slash needed).
    pub fn with_release_host(mut self, host: impl Into<String>) -> Self {
        self.release_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Describe the archive of `version` for the host identifier `host_id`.
    ///
    /// # Errors
    ///
    /// Fails with [`DescribeError::Platform`] for an unsupported host,
    /// [`DescribeError::Registry`] for an unknown version and
    /// [`DescribeError::ChecksumMissing`] if upstream published no archive
    /// for that platform.
    pub fn describe(&self, version: &str, host_id: &str) -> Result<BuildDescriptor, DescribeError> {
        let host: HostId = host_id.parse()?;
        let version: Version = version
            .parse()
            .map_err(|_| RegistryError::VersionNotFound(version.to_string()))?;
        self.describe_for(&version, host)
    }

    /// Typed form of [`ArtifactBuilder::describe`].
    ///
    /// # Errors
    ///
    /// See [`ArtifactBuilder::describe`].
    pub fn describe_for(
        &self,
        version: &Version,
        host: HostId,
    ) -> Result<BuildDescriptor, DescribeError> {
        let entry = self
            .registry
            .entry(version)
            .ok_or_else(|| RegistryError::VersionNotFound(version.to_string()))?;
        let platform = host.platform();
        let expected_checksum =
            entry
                .hash_for(platform)
                .cloned()
                .ok_or_else(|| DescribeError::ChecksumMissing {
                    version: version.to_string(),
                    platform,
                })?;
        let archive_format = platform.archive_format();

        let download_url = format!(
            "{base}/{UPSTREAM_OWNER}/{UPSTREAM_PROJECT}/releases/download/v{version}/{UPSTREAM_PROJECT}-v{version}-{triple}.{ext}",
            base = self.release_host,
            triple = platform.as_triple(),
            ext = archive_format.extension(),
        );

        Ok(BuildDescriptor {
            version: version.clone(),
            platform,
            archive_format,
            download_url,
            expected_checksum,
        })
    }

    /// Fetch, verify, extract and copy `bin/` and `doc/` into `dest`.
    ///
    /// Every file under `dest/bin` is made executable. A checksum mismatch
    /// stops the install before anything is extracted.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::Download`] for transport failures and checksum
    /// mismatches, [`InstallError::Extract`] for corrupt archives,
    /// [`InstallError::MissingDirectory`] if the archive has no `bin/`, and
    /// [`InstallError::Io`] for filesystem failures.
    pub async fn install(&self, descriptor: &BuildDescriptor, dest: &Path) -> Result<(), InstallError> {
        let version = &descriptor.version;
        let platform = descriptor.platform;
        let work = tempfile::Builder::new().prefix("scarb-dist-").tempdir()?;

        self.reporter.downloading(version, platform);
        let archive = self
            .fetcher
            .fetch(
                &descriptor.download_url,
                &descriptor.expected_checksum,
                work.path(),
            )
            .await?;

        self.reporter.extracting(version, platform);
        let unpack_dir = work.path().join("unpacked");
        let format = descriptor.archive_format;
        let root = tokio::task::spawn_blocking(move || {
            let files = extract::extract(&archive, format, &unpack_dir)?;
            debug!("extracted {} files", files.len());
            Ok::<_, ExtractError>(extract::unpack_root(&unpack_dir)?)
        })
        .await
        .map_err(io::Error::other)??;

        self.reporter.installing(version, platform);
        let dest = dest.to_path_buf();
        let has_doc = tokio::task::spawn_blocking(move || install_tree(&root, &dest))
            .await
            .map_err(io::Error::other)??;
        if !has_doc {
            self.reporter
                .warning(&format!("scarb {version} for {platform} ships no doc/ directory"));
        }

        Ok(())
    }

    /// Write the version-info record for `descriptor` under `dest`.
    ///
    /// # Errors
    ///
    /// Fails if the version is not in the registry or the file cannot be
    /// written.
    pub fn write_version_info(
        &self,
        dest: &Path,
        descriptor: &BuildDescriptor,
        host: HostId,
    ) -> Result<PathBuf, InstallError> {
        let entry = self
            .registry
            .entry(&descriptor.version)
            .ok_or_else(|| {
                DescribeError::Registry(RegistryError::VersionNotFound(
                    descriptor.version.to_string(),
                ))
            })?;

        let record = VersionInfoRecord {
            version: descriptor.version.clone(),
            release_date: entry.metadata.release_date,
            prerelease: entry.metadata.prerelease,
            build_system: host,
            build_platform: descriptor.platform,
        };

        let path = dest.join(VERSION_INFO_PATH);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut json = serde_json::to_string_pretty(&record)?;
        json.push('\n');
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Run the whole pipeline for one selector and host into `dest`.
    ///
    /// An existing `dest` is replaced only after the new tree has passed
    /// verification. On failure `dest` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] naming the version, platform and stage.
    pub async fn build(
        &self,
        selector: &Selector,
        host: HostId,
        dest: &Path,
    ) -> Result<BuildDescriptor, BuildError> {
        let platform = host.platform();
        let fail = |version: String, stage: Stage, source: InstallError| BuildError {
            version,
            platform,
            stage,
            source,
        };

        let version = selector
            .resolve(&self.registry)
            .map_err(|e| fail(selector.to_string(), Stage::Resolve, e.into()))?;

        let result = self.build_version(&version, host, dest).await;
        match &result {
            Ok(_) => self
                .reporter
                .done(&version, platform, &dest.display().to_string()),
            Err(e) => self.reporter.failed(&version, platform, &e.source.to_string()),
        }
        result
    }

    async fn build_version(
        &self,
        version: &Version,
        host: HostId,
        dest: &Path,
    ) -> Result<BuildDescriptor, BuildError> {
        let platform = host.platform();
        let fail = |stage: Stage| {
            move |source: InstallError| BuildError {
                version: version.to_string(),
                platform,
                stage,
                source,
            }
        };

        let descriptor = self
            .describe_for(version, host)
            .map_err(|e| fail(Stage::Describe)(e.into()))?;
        info!("building scarb {version} for {platform}");

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let staging = fs::create_dir_all(&parent)
            .and_then(|()| {
                tempfile::Builder::new()
                    .prefix(".scarb-dist-staging-")
                    .tempdir_in(&parent)
            })
            .map_err(|e| fail(Stage::Install)(e.into()))?;

        self.install(&descriptor, staging.path()).await.map_err(|e| {
            let stage = match e {
                InstallError::Download(_) => Stage::Fetch,
                InstallError::Extract(_) => Stage::Extract,
                _ => Stage::Install,
            };
            fail(stage)(e)
        })?;

        verify_install(staging.path(), platform, &REQUIRED_BINARIES).map_err(fail(Stage::Verify))?;

        self.write_version_info(staging.path(), &descriptor, host)
            .map_err(fail(Stage::Metadata))?;

        publish(staging.path(), dest).map_err(|e| fail(Stage::Install)(e.into()))?;
        debug!("published {}", dest.display());

        Ok(descriptor)
    }

    /// Run independent builds, at most `concurrency` at a time.
    ///
    /// Each job succeeds or fails on its own; results come back in
    /// completion order.
    pub async fn build_matrix(
        &self,
        jobs: Vec<BuildJob>,
        concurrency: usize,
    ) -> Vec<(BuildJob, Result<BuildDescriptor, BuildError>)> {
        futures::stream::iter(jobs)
            .map(|job| async move {
                let result = self.build(&job.selector, job.host, &job.dest).await;
                (job, result)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Check that each name exists under `dest/bin` and is executable.
///
/// On Windows platforms the name is looked up with an `.exe` suffix as well.
///
/// # Errors
///
/// Returns [`InstallError::MissingBinary`] listing every name that failed.
pub fn verify_install(
    dest: &Path,
    platform: Platform,
    required: &[&str],
) -> Result<(), InstallError> {
    let bin = dest.join("bin");
    let names: Vec<String> = required
        .iter()
        .filter(|name| !has_executable(&bin, name, platform))
        .map(|name| (*name).to_string())
        .collect();

    if names.is_empty() {
        Ok(())
    } else {
        Err(InstallError::MissingBinary { names })
    }
}

fn has_executable(bin: &Path, name: &str, platform: Platform) -> bool {
    is_executable(&bin.join(name))
        || (platform.is_windows() && is_executable(&bin.join(format!("{name}.exe"))))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Copy `root/bin` (required) and `root/doc` (if present) into `dest`.
/// Returns whether `doc/` was installed.
fn install_tree(root: &Path, dest: &Path) -> Result<bool, InstallError> {
    let bin = root.join("bin");
    if !bin.is_dir() {
        return Err(InstallError::MissingDirectory("bin"));
    }
    copy_dir(&bin, &dest.join("bin"))?;
    mark_executable(&dest.join("bin"))?;

    let doc = root.join("doc");
    if !doc.is_dir() {
        return Ok(false);
    }
    copy_dir(&doc, &dest.join("doc"))?;
    Ok(true)
}

fn copy_dir(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let link = fs::read_link(src)?;
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

#[cfg(unix)]
fn mark_executable(bin: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    for entry in WalkDir::new(bin).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_file() {
            fs::set_permissions(entry.path(), fs::Permissions::from_mode(0o755))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_bin: &Path) -> io::Result<()> {
    Ok(())
}

/// Move a verified staging tree to `dest`, replacing what was there.
fn publish(staging: &Path, dest: &Path) -> io::Result<()> {
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::rename(staging, dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::download::HttpFetcher;
    use mockito::Server;
    use sha2::{Digest, Sha256};

    const ARCHIVE_PATH: &str = "/software-mansion/scarb/releases/download/v2.8.2/scarb-v2.8.2-x86_64-unknown-linux-gnu.tar.gz";

    fn archive(binaries: &[&str]) -> Vec<u8> {
        archive_at("scarb-v2.8.2-x86_64-unknown-linux-gnu/", binaries, true)
    }

    fn archive_at(prefix: &str, binaries: &[&str], with_doc: bool) -> Vec<u8> {
        let gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(gz);
        let mut files: Vec<(String, &[u8])> = binaries
            .iter()
            .map(|b| (format!("{prefix}bin/{b}"), b"#!/bin/sh\n".as_slice()))
            .collect();
        if with_doc {
            files.push((format!("{prefix}doc/README.md"), b"docs".as_slice()));
        }

        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn sha(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }

    fn registry(hash: &str) -> Arc<Registry> {
        Arc::new(
            Registry::from_json(&format!(
                r#"{{"2.8.2": {{
                    "hashes": {{ "x86_64-unknown-linux-gnu": "{hash}" }},
                    "metadata": {{ "releaseDate": "2024-09-04T12:14:27Z", "prerelease": false, "draft": false }}
                }}}}"#
            ))
            .unwrap(),
        )
    }

    #[derive(Default)]
    struct Warnings(std::sync::Mutex<Vec<String>>);

    impl Reporter for Warnings {
        fn section(&self, _: &str) {}
        fn downloading(&self, _: &Version, _: Platform) {}
        fn extracting(&self, _: &Version, _: Platform) {}
        fn installing(&self, _: &Version, _: Platform) {}
        fn done(&self, _: &Version, _: Platform, _: &str) {}
        fn failed(&self, _: &Version, _: Platform, _: &str) {}
        fn info(&self, _: &str) {}
        fn warning(&self, msg: &str) {
            self.0.lock().unwrap().push(msg.to_string());
        }
    }

    fn builder(registry: Arc<Registry>, host: &str) -> ArtifactBuilder {
        ArtifactBuilder::new(registry, Arc::new(HttpFetcher::new(reqwest::Client::new())))
            .with_release_host(host)
    }

    #[test]
    fn test_describe_url_and_checksum() {
        let hash = sha(b"archive");
        let b = builder(registry(&hash), "https://github.com/");
        let d = b.describe("2.8.2", "x86_64-linux").unwrap();
        assert_eq!(
            d.download_url,
            "https://github.com/software-mansion/scarb/releases/download/v2.8.2/scarb-v2.8.2-x86_64-unknown-linux-gnu.tar.gz"
        );
        assert!(d
            .download_url
            .ends_with("scarb-v2.8.2-x86_64-unknown-linux-gnu.tar.gz"));
        assert_eq!(d.expected_checksum.as_str(), hash);
        assert_eq!(d.archive_format, ArchiveFormat::TarGz);
    }

    #[test]
    fn test_describe_checksum_missing() {
        let b = builder(registry(&sha(b"a")), "https://github.com");
        assert!(matches!(
            b.describe("2.8.2", "x86_64-windows"),
            Err(DescribeError::ChecksumMissing { platform: Platform::X86_64PcWindowsMsvc, .. })
        ));
    }

    #[test]
    fn test_describe_unsupported_host_and_unknown_version() {
        let b = builder(registry(&sha(b"a")), "https://github.com");
        assert!(matches!(
            b.describe("2.8.2", "sparc-solaris"),
            Err(DescribeError::Platform(PlatformError::UnsupportedHost(_)))
        ));
        assert!(matches!(
            b.describe("9.9.9", "x86_64-linux"),
            Err(DescribeError::Registry(RegistryError::VersionNotFound(_)))
        ));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let b = builder(registry(&sha(b"a")), "https://github.com");
        let d = b.describe("2.8.2", "x86_64-linux").unwrap();
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["archiveFormat"], "tar.gz");
        assert_eq!(value["platform"], "x86_64-unknown-linux-gnu");
        assert!(value["downloadUrl"].is_string());
        assert!(value["expectedChecksum"].is_string());
    }

    #[tokio::test]
    async fn test_build_installs_verified_tree() {
        let body = archive(&REQUIRED_BINARIES);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("scarb");
        let b = builder(registry(&sha(&body)), &server.url());
        let d = b
            .build(&Selector::Default, HostId::X86_64Linux, &dest)
            .await
            .unwrap();

        assert_eq!(d.version, "2.8.2");
        assert!(dest.join("bin/scarb").is_file());
        assert!(dest.join("doc/README.md").is_file());
        verify_install(&dest, Platform::X86_64UnknownLinuxGnu, &REQUIRED_BINARIES).unwrap();

        let info: VersionInfoRecord =
            serde_json::from_str(&fs::read_to_string(dest.join(VERSION_INFO_PATH)).unwrap())
                .unwrap();
        assert_eq!(info.build_system, HostId::X86_64Linux);
        assert_eq!(info.build_platform, Platform::X86_64UnknownLinuxGnu);
        assert!(!info.prerelease);

        // only the published tree remains next to dest
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_stops_build() {
        let body = archive(&REQUIRED_BINARIES);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("scarb");
        let b = builder(registry(&sha(b"something else")), &server.url());
        let err = b
            .build(&Selector::Default, HostId::X86_64Linux, &dest)
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Fetch);
        assert_eq!(err.version, "2.8.2");
        assert_eq!(err.platform, Platform::X86_64UnknownLinuxGnu);
        assert!(matches!(
            err.source,
            InstallError::Download(DownloadError::HashMismatch { .. })
        ));
        assert!(!dest.exists());
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_verify() {
        let body = archive(&REQUIRED_BINARIES[..4]);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("scarb");
        let b = builder(registry(&sha(&body)), &server.url());
        let err = b
            .build(&Selector::Latest, HostId::X86_64Linux, &dest)
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Verify);
        match err.source {
            InstallError::MissingBinary { names } => assert_eq!(names, vec!["scarb-doc"]),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_resolve_failure_is_tagged() {
        let b = builder(registry(&sha(b"a")), "http://127.0.0.1:9");
        let selector: Selector = "3.0.0".parse().unwrap();
        let err = b
            .build(&selector, HostId::X86_64Linux, Path::new("unused"))
            .await
            .unwrap_err();
        assert_eq!(err.stage, Stage::Resolve);
        assert_eq!(err.version, "3.0.0");
    }

    #[test]
    fn test_verify_reports_all_missing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        match verify_install(dir.path(), Platform::X86_64UnknownLinuxGnu, &REQUIRED_BINARIES).unwrap_err() {
            InstallError::MissingBinary { names } => assert_eq!(names.len(), 5),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_disabled_binary_not_required() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        for name in REQUIRED_BINARIES {
            fs::write(bin.join(name), b"").unwrap();
        }
        mark_executable(&bin).unwrap();
        assert!(!bin.join(scarb_dist_schema::DISABLED_BINARY).exists());
        verify_install(dir.path(), Platform::X86_64UnknownLinuxGnu, &REQUIRED_BINARIES).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_verify_rejects_non_executable() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("scarb"), b"").unwrap();
        assert!(verify_install(dir.path(), Platform::X86_64UnknownLinuxGnu, &["scarb"]).is_err());
    }

    #[test]
    fn test_exe_suffix_only_on_windows() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("scarb.exe"), b"MZ").unwrap();
        mark_executable(&bin).unwrap();

        verify_install(dir.path(), Platform::X86_64PcWindowsMsvc, &["scarb"]).unwrap();
        match verify_install(dir.path(), Platform::X86_64UnknownLinuxGnu, &["scarb"]).unwrap_err() {
            InstallError::MissingBinary { names } => assert_eq!(names, vec!["scarb"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_build_flat_archive_without_doc() {
        let body = archive_at("", &REQUIRED_BINARIES, false);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body.clone())
            .create_async()
            .await;

        let out = tempfile::tempdir().unwrap();
        let dest = out.path().join("scarb");
        let warnings = Arc::new(Warnings::default());
        let b = builder(registry(&sha(&body)), &server.url()).with_reporter(warnings.clone());
        b.build(&Selector::Default, HostId::X86_64Linux, &dest)
            .await
            .unwrap();

        assert!(dest.join("bin/scarb").is_file());
        assert!(!dest.join("bin/bin").exists());
        assert!(!dest.join("doc").exists());
        let warnings = warnings.0.lock().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no doc/"));
    }

    #[tokio::test]
    async fn test_build_matrix_runs_every_job() {
        let body = archive(&REQUIRED_BINARIES);
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", ARCHIVE_PATH)
            .with_status(200)
            .with_body(body.clone())
            .expect(2)
            .create_async()
            .await;

        let out = tempfile::tempdir().unwrap();
        let b = builder(registry(&sha(&body)), &server.url());
        let jobs = vec![
            BuildJob {
                selector: Selector::Default,
                host: HostId::X86_64Linux,
                dest: out.path().join("a"),
            },
            BuildJob {
                selector: Selector::LatestStable,
                host: HostId::X86_64Linux,
                dest: out.path().join("b"),
            },
            BuildJob {
                selector: Selector::Default,
                host: HostId::X86_64Windows,
                dest: out.path().join("c"),
            },
        ];

        let results = b.build_matrix(jobs, 2).await;
        assert_eq!(results.len(), 3);
        for (job, result) in &results {
            if job.host == HostId::X86_64Windows {
                let err = result.as_ref().unwrap_err();
                assert_eq!(err.stage, Stage::Describe);
            } else {
                assert!(result.is_ok(), "{:?}", result);
                assert!(job.dest.join("bin/scarb").exists());
            }
        }
    }
}
