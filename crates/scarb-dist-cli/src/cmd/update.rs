//! Update command

use anyhow::Result;
use scarb_dist_core::update::Updater;
use scarb_dist_core::update::github::{GithubClient, build_client};

use super::Context;

/// Refresh the registry from the release host.
pub async fn update(ctx: &Context, dry_run: bool) -> Result<()> {
    let config = &ctx.config;
    let client = build_client(config.github_token.as_deref())?;
    let source = GithubClient::new(client, &config.api_url, &config.release_host);
    let updater = Updater::new(source, config.registry_path.clone(), config.changes_path());

    let report = updater.run(dry_run).await?;

    let prefix = if dry_run { "would add" } else { "added" };
    for v in &report.added {
        println!("{prefix}    {v}");
    }
    let prefix = if dry_run { "would update" } else { "updated" };
    for v in &report.changed {
        println!("{prefix}  {v}");
    }
    for (v, reason) in &report.skipped {
        println!("skipped  {v} ({reason})");
    }

    println!(
        "Processed: {}, New: {}, Changed: {}, Skipped: {}, Kept: {}",
        report.processed,
        report.added.len(),
        report.changed.len(),
        report.skipped.len(),
        report.preserved.len()
    );
    if dry_run {
        println!("Dry run: {} not modified", config.registry_path.display());
    }
    Ok(())
}
