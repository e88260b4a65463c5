//! Matrix command

use std::path::Path;

use anyhow::{Result, bail};
use scarb_dist_core::BuildJob;
use scarb_dist_core::select::Selector;
use scarb_dist_core::types::HostId;

use super::Context;

/// Build every (version, host) pair under `dest/<version>/<host>`.
pub async fn matrix(
    ctx: &Context,
    dest: &Path,
    hosts: &[HostId],
    selectors: &[Selector],
    jobs: usize,
) -> Result<()> {
    let builder = ctx.builder()?;
    let hosts = if hosts.is_empty() {
        HostId::ALL.to_vec()
    } else {
        hosts.to_vec()
    };

    let mut versions = Vec::new();
    for selector in selectors {
        let version = selector.resolve(builder.registry())?;
        if !versions.contains(&version) {
            versions.push(version);
        }
    }

    let build_jobs: Vec<BuildJob> = versions
        .iter()
        .flat_map(|version| {
            hosts.iter().map(move |&host| BuildJob {
                selector: Selector::Exact(version.clone()),
                host,
                dest: dest.join(version.as_str()).join(host.as_str()),
            })
        })
        .collect();

    let total = build_jobs.len();
    let results = builder.build_matrix(build_jobs, jobs).await;

    let mut failed = 0;
    for (job, result) in &results {
        match result {
            Ok(descriptor) => println!(
                "ok      {} {} -> {}",
                descriptor.version,
                job.host,
                job.dest.display()
            ),
            Err(e) => {
                failed += 1;
                println!("failed  {e}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {total} builds failed");
    }
    println!("{total} builds succeeded");
    Ok(())
}
