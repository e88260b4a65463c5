//! Install command

use std::path::Path;

use anyhow::Result;
use scarb_dist_core::Reporter;
use scarb_dist_core::select::Selector;
use scarb_dist_core::types::HostId;

use super::{Context, host_or_current};
use crate::ui::ConsoleReporter;

/// Build `selector` for `host` into `dest`.
pub async fn install(
    ctx: &Context,
    selector: &Selector,
    dest: &Path,
    host: Option<HostId>,
) -> Result<()> {
    let host = host_or_current(host)?;
    let builder = ctx.builder()?;
    let reporter = ConsoleReporter::new(ctx.quiet);

    reporter.section(&format!("Installing scarb ({selector}) for {host}"));
    let descriptor = builder.build(selector, host, dest).await?;

    reporter.info(&format!(
        "scarb {} installed to {}",
        descriptor.version,
        dest.display()
    ));
    Ok(())
}
