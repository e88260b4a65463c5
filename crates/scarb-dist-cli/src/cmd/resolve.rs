//! Resolve command

use anyhow::Result;
use scarb_dist_core::select::Selector;
use scarb_dist_core::types::HostId;
use tracing::debug;

use super::{Context, host_or_current};

/// Print the build descriptor `selector` resolves to on `host`.
pub fn resolve(ctx: &Context, selector: &Selector, host: Option<HostId>) -> Result<()> {
    let host = host_or_current(host)?;
    let builder = ctx.builder()?;

    let version = selector.resolve(builder.registry())?;
    debug!("{selector} resolved to {version}");
    let descriptor = builder.describe_for(&version, host)?;

    println!("{}", serde_json::to_string_pretty(&descriptor)?);
    Ok(())
}
