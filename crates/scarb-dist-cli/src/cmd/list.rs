//! List command

use anyhow::Result;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{ContentArrangement, Table};
use scarb_dist_core::select::{latest_stable, latest_version};

use super::Context;

/// Print every registry version, newest first.
pub fn list(ctx: &Context) -> Result<()> {
    let registry = ctx.registry()?;
    let latest = latest_version(&registry).ok();
    let stable = latest_stable(&registry).ok();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Version", "Channel", "Released", "Platforms", "Tags"]);

    for (version, entry) in registry.iter().rev() {
        let channel = if entry.metadata.draft {
            "draft"
        } else if entry.metadata.prerelease {
            "prerelease"
        } else {
            "stable"
        };

        let mut tags = Vec::new();
        if latest.as_ref() == Some(version) {
            tags.push("latest");
        }
        if stable.as_ref() == Some(version) {
            tags.push("latest-stable");
        }

        table.add_row(vec![
            version.to_string(),
            channel.to_string(),
            entry.metadata.release_date.format("%Y-%m-%d").to_string(),
            entry.hashes.len().to_string(),
            tags.join(", "),
        ]);
    }

    println!("{table}");
    println!(
        "{} versions in {}",
        registry.len(),
        ctx.config.registry_path.display()
    );
    Ok(())
}
