//! Registry update job.
//!
//! Polls the release host, verifies what changed since the last run and
//! rewrites the registry file. Existing entries are reused verbatim when the
//! upstream release date has not moved; entries no longer listed upstream
//! are kept.

pub mod github;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use futures::StreamExt;
use regex::Regex;
use scarb_dist_schema::{AssetRecord, UPSTREAM_PROJECT};
use tracing::{debug, info, warn};

use crate::registry::Registry;
use crate::types::{Platform, ReleaseMetadata, Sha256Digest, Version, VersionEntry};
use github::{GithubClient, GithubRelease};

/// Concurrent checksum downloads.
const CHECKSUM_CONCURRENCY: usize = 8;

static HTML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"));

/// Parse a `checksums.sha256` file into per-platform digests.
///
/// Lines look like `<hex>  scarb-v<version>-<triple>.<tar.gz|zip>`. Lines for
/// other files, unknown triples or malformed digests are ignored.
pub fn parse_checksums(text: &str, version: &str) -> BTreeMap<Platform, Sha256Digest> {
    let prefix = format!("{UPSTREAM_PROJECT}-v{version}-");
    let mut checksums = BTreeMap::new();

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(checksum), Some(filename)) = (parts.next(), parts.next()) else {
            continue;
        };
        // sha256sum marks binary-mode entries with a leading '*'
        let filename = filename.trim_start_matches('*');

        let Some(rest) = filename.strip_prefix(&prefix) else {
            continue;
        };
        let Some(triple) = rest
            .strip_suffix(".tar.gz")
            .or_else(|| rest.strip_suffix(".zip"))
        else {
            continue;
        };

        match (triple.parse::<Platform>(), Sha256Digest::new(checksum)) {
            (Ok(platform), Ok(digest)) => {
                debug!("checksum for {platform}: {}...", &digest.as_str()[..8]);
                checksums.insert(platform, digest);
            }
            (Err(e), _) => debug!("ignoring {filename}: {e}"),
            (_, Err(e)) => warn!("ignoring {filename}: {e}"),
        }
    }

    checksums
}

/// Strip HTML comments and trailing whitespace from release notes.
pub fn clean_changelog(body: Option<&str>) -> Option<String> {
    let body = HTML_COMMENT.replace_all(body?, "");
    let cleaned = body
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn asset_records(release: &GithubRelease) -> BTreeMap<String, AssetRecord> {
    release
        .assets
        .iter()
        .map(|a| {
            (
                a.name.clone(),
                AssetRecord {
                    url: a.browser_download_url.clone(),
                    size: a.size,
                    download_count: a.download_count,
                    created_at: a.created_at,
                    updated_at: a.updated_at,
                },
            )
        })
        .collect()
}

/// Outcome of one update run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Releases whose entry is present in the new registry.
    pub processed: usize,
    /// Versions that were not in the registry before.
    pub added: Vec<Version>,
    /// Versions whose entry was rebuilt because the release date moved.
    pub changed: Vec<Version>,
    /// Releases left out, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Prior entries not listed upstream anymore.
    pub preserved: Vec<Version>,
}

impl UpdateReport {
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.changed.is_empty())
    }
}

/// A computed registry and what differs from the file on disk.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub registry: Registry,
    pub report: UpdateReport,
}

/// Drives an update against one registry file.
#[derive(Debug, Clone)]
pub struct Updater {
    source: GithubClient,
    registry_path: PathBuf,
    changes_path: PathBuf,
}

impl Updater {
    pub fn new(source: GithubClient, registry_path: PathBuf, changes_path: PathBuf) -> Self {
        Self {
            source,
            registry_path,
            changes_path,
        }
    }

    /// Compute the next registry without touching the filesystem.
    pub async fn plan(&self) -> Result<UpdatePlan> {
        let current = load_current(&self.registry_path);
        info!("found {} existing versions", current.len());

        let releases = self.source.fetch_releases().await?;
        info!("fetched {} releases", releases.len());

        let mut entries = BTreeMap::new();
        let mut report = UpdateReport::default();
        let mut pending = Vec::new();

        for release in releases {
            let raw = release
                .tag_name
                .strip_prefix('v')
                .unwrap_or(&release.tag_name)
                .to_string();

            if release.draft {
                debug!("skipping draft {raw}");
                report.skipped.push((raw, "draft".into()));
                continue;
            }

            let version = match Version::parse(&raw) {
                Ok(v) => v,
                Err(e) => {
                    warn!("skipping release {}: {e}", release.tag_name);
                    report.skipped.push((raw, e.to_string()));
                    continue;
                }
            };

            let Some(published_at) = release.published_at else {
                warn!("skipping release {}: no publication date", release.tag_name);
                report.skipped.push((raw, "no publication date".into()));
                continue;
            };

            if let Some(existing) = current.get(&version) {
                if existing.metadata.release_date == published_at {
                    debug!("{version} already up to date");
                    entries.insert(version, existing.clone());
                    report.processed += 1;
                    continue;
                }
                info!("updating metadata for {version}");
            }

            pending.push((version, published_at, release));
        }

        let fetched: Vec<_> = futures::stream::iter(pending)
            .map(|(version, published_at, release)| async move {
                let text = self.source.fetch_checksums(&release.tag_name).await;
                (version, published_at, release, text)
            })
            .buffer_unordered(CHECKSUM_CONCURRENCY)
            .collect()
            .await;

        for (version, published_at, release, text) in fetched {
            let hashes = text
                .map(|t| parse_checksums(&t, version.as_str()))
                .unwrap_or_default();
            if hashes.is_empty() {
                warn!("skipping {version}: missing checksums");
                report
                    .skipped
                    .push((version.to_string(), "missing checksums".into()));
                continue;
            }

            let entry = VersionEntry {
                hashes,
                metadata: ReleaseMetadata {
                    release_date: published_at,
                    prerelease: release.prerelease,
                    draft: false,
                    changelog: clean_changelog(release.body.as_deref()),
                    download_count: Some(release.assets.iter().map(|a| a.download_count).sum()),
                    assets: asset_records(&release),
                },
            };

            if current.contains_key(&version) {
                report.changed.push(version.clone());
            } else {
                report.added.push(version.clone());
            }
            info!("processed {version}");
            entries.insert(version, entry);
            report.processed += 1;
        }

        for (version, entry) in current {
            if !entries.contains_key(&version) {
                debug!("keeping unlisted {version}");
                report.preserved.push(version.clone());
                entries.insert(version, entry);
            }
        }

        report.added.sort();
        report.changed.sort();

        Ok(UpdatePlan {
            registry: Registry::from_entries(entries),
            report,
        })
    }

    /// Write `plan` to disk: back up the old file, write the new registry and
    /// append to the change log. Returns `false` if there was nothing to write.
    pub fn apply(&self, plan: &UpdatePlan) -> Result<bool> {
        let path = &self.registry_path;
        if plan.registry.is_empty() {
            bail!(
                "Refusing to write an empty registry to {} ({} releases skipped)",
                path.display(),
                plan.report.skipped.len()
            );
        }
        if !plan.report.has_changes() && path.exists() {
            info!("registry already up to date");
            return Ok(false);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        if path.exists() {
            let backup = backup_path(path);
            fs::rename(path, &backup)
                .with_context(|| format!("Failed to back up {}", path.display()))?;
            info!("backed up registry to {}", backup.display());
        }

        let json = plan.registry.to_json_pretty()?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let mut log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.changes_path)
            .with_context(|| format!("Failed to open {}", self.changes_path.display()))?;
        log.write_all(render_changes(&plan.report, &plan.registry).as_bytes())?;

        info!(
            "wrote {} versions to {} ({} new, {} changed)",
            plan.registry.len(),
            path.display(),
            plan.report.added.len(),
            plan.report.changed.len()
        );
        Ok(true)
    }

    /// Plan and, unless `dry_run`, apply.
    pub async fn run(&self, dry_run: bool) -> Result<UpdateReport> {
        let plan = self.plan().await?;
        if dry_run {
            info!("dry run: not writing {}", self.registry_path.display());
        } else {
            self.apply(&plan)?;
        }
        Ok(plan.report)
    }
}

/// Prior entries, or nothing if the file is missing or unreadable.
fn load_current(path: &Path) -> BTreeMap<Version, VersionEntry> {
    if !path.exists() {
        info!("no existing registry at {}", path.display());
        return BTreeMap::new();
    }
    match fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|s| Ok(Registry::from_json(&s)?))
    {
        Ok(registry) => registry.into_entries(),
        Err(e) => {
            warn!("ignoring unreadable registry {}: {e}", path.display());
            BTreeMap::new()
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        "{name}.bak-{}",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Markdown section describing one update.
pub fn render_changes(report: &UpdateReport, registry: &Registry) -> String {
    let mut out = format!("## {}\n\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

    let mut section = |title: &str, versions: &[Version]| {
        if versions.is_empty() {
            return;
        }
        let _ = writeln!(out, "### {title}\n");
        for v in versions {
            let flag = match registry.entry(v) {
                Some(e) if e.metadata.prerelease => " (prerelease)",
                _ => "",
            };
            let platforms = registry.entry(v).map_or(0, |e| e.hashes.len());
            let _ = writeln!(out, "- {v}{flag}: {platforms} platforms");
        }
        out.push('\n');
    };

    section("Added", &report.added);
    section("Changed", &report.changed);
    out
}
